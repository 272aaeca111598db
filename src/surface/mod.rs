pub mod memory;
pub mod stylesheet;

use async_trait::async_trait;

use crate::error::SurfaceError;

pub use memory::{MemorySurface, SurfaceOp};
pub use stylesheet::StylesheetSurface;

/// The page being restyled. Stylesheets are removed by the exact text they
/// were inserted with; head style elements are addressed by id.
#[async_trait]
pub trait TargetSurface: Send {
    /// Installs `css` as one more stylesheet.
    async fn insert_css(&mut self, css: &str) -> Result<(), SurfaceError>;

    /// Uninstalls one stylesheet whose text equals `css`. Does nothing when
    /// no installed sheet matches.
    async fn remove_css(&mut self, css: &str) -> Result<(), SurfaceError>;

    /// Creates or replaces the head style element `id`.
    async fn set_head_style(&mut self, id: &str, content: &str) -> Result<(), SurfaceError>;

    /// Removes the head style element `id` if it exists.
    async fn remove_head_style(&mut self, id: &str) -> Result<(), SurfaceError>;
}
