use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::TargetSurface;
use crate::error::SurfaceError;

const HEAD_OPEN: &str = "/* pagestyle:head ";

/// A user stylesheet file standing in for the page.
///
/// Head styles are rendered first, since `@import` must lead a stylesheet,
/// each wrapped in marker comments so a later session can find it again.
/// Installed sheets follow, concatenated verbatim. Reopening the file turns
/// the sheet section back into one installed sheet, which is exactly the text
/// the previous session installed when it left a single patch behind.
#[derive(Debug)]
pub struct StylesheetSurface {
    path: PathBuf,
    head: Vec<(String, String)>,
    sheets: Vec<String>,
}

impl StylesheetSurface {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SurfaceError> {
        let path = path.into();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let (head, sheets) = parse(&content);
        tracing::debug!(
            path = %path.display(),
            head = head.len(),
            sheets = sheets.len(),
            "opened stylesheet"
        );
        Ok(Self { path, head, sheets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, content) in &self.head {
            out.push_str(&format!("{HEAD_OPEN}{id} */\n{content}\n{}", end_marker(id)));
        }
        for sheet in &self.sheets {
            out.push_str(sheet);
        }
        out
    }

    async fn flush(&self) -> Result<(), SurfaceError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).await?;
            }
        }
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, self.render()).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

fn end_marker(id: &str) -> String {
    format!("/* pagestyle:end {id} */\n")
}

fn parse(content: &str) -> (Vec<(String, String)>, Vec<String>) {
    let mut head = Vec::new();
    let mut rest = content;

    while let Some(after) = rest.strip_prefix(HEAD_OPEN) {
        let Some((id, body)) = after.split_once(" */\n") else {
            break;
        };
        let end = format!("\n{}", end_marker(id));
        let Some((style, tail)) = body.split_once(&end) else {
            break;
        };
        head.push((id.to_string(), style.to_string()));
        rest = tail;
    }

    let sheets = if rest.is_empty() {
        Vec::new()
    } else {
        vec![rest.to_string()]
    };
    (head, sheets)
}

#[async_trait]
impl TargetSurface for StylesheetSurface {
    async fn insert_css(&mut self, css: &str) -> Result<(), SurfaceError> {
        if css.is_empty() {
            return Ok(());
        }
        self.sheets.push(css.to_string());
        self.flush().await
    }

    async fn remove_css(&mut self, css: &str) -> Result<(), SurfaceError> {
        let Some(pos) = self.sheets.iter().position(|sheet| sheet == css) else {
            return Ok(());
        };
        self.sheets.remove(pos);
        self.flush().await
    }

    async fn set_head_style(&mut self, id: &str, content: &str) -> Result<(), SurfaceError> {
        if id.contains("*/") || content.contains(&end_marker(id)) {
            return Err(SurfaceError::Rejected(format!(
                "head style {:?} would break the stylesheet markers",
                id
            )));
        }
        self.head.retain(|(existing, _)| existing != id);
        self.head.insert(0, (id.to_string(), content.to_string()));
        self.flush().await
    }

    async fn remove_head_style(&mut self, id: &str) -> Result<(), SurfaceError> {
        let before = self.head.len();
        self.head.retain(|(existing, _)| existing != id);
        if self.head.len() == before {
            return Ok(());
        }
        self.flush().await
    }
}
