pub mod document;
pub mod store;

pub use document::ThemeDocument;
pub use store::{check_name, ThemeStore, DEFAULT_THEME_NAME, RESERVED_THEME_NAME};
