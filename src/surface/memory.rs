use async_trait::async_trait;

use super::TargetSurface;
use crate::error::SurfaceError;

/// A call made against a [`MemorySurface`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Insert(String),
    Remove(String),
    SetHead { id: String, content: String },
    RemoveHead(String),
}

/// In-memory surface that records every call it receives.
#[derive(Debug, Default)]
pub struct MemorySurface {
    sheets: Vec<String>,
    head: Vec<(String, String)>,
    ops: Vec<SurfaceOp>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed stylesheets, oldest first.
    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    /// Head style elements as `(id, content)`.
    pub fn head(&self) -> &[(String, String)] {
        &self.head
    }

    pub fn head_style(&self, id: &str) -> Option<&str> {
        self.head
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, content)| content.as_str())
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

#[async_trait]
impl TargetSurface for MemorySurface {
    async fn insert_css(&mut self, css: &str) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::Insert(css.to_string()));
        self.sheets.push(css.to_string());
        Ok(())
    }

    async fn remove_css(&mut self, css: &str) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::Remove(css.to_string()));
        if let Some(pos) = self.sheets.iter().position(|sheet| sheet == css) {
            self.sheets.remove(pos);
        }
        Ok(())
    }

    async fn set_head_style(&mut self, id: &str, content: &str) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::SetHead {
            id: id.to_string(),
            content: content.to_string(),
        });
        self.head.retain(|(existing, _)| existing != id);
        // New elements go first in the head.
        self.head.insert(0, (id.to_string(), content.to_string()));
        Ok(())
    }

    async fn remove_head_style(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::RemoveHead(id.to_string()));
        self.head.retain(|(existing, _)| existing != id);
        Ok(())
    }
}
