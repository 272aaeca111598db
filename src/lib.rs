pub mod config;
pub mod css;
pub mod error;
pub mod fields;
pub mod font_import;
pub mod last_input;
pub mod patch;
pub mod session;
pub mod storage;
pub mod surface;
pub mod theme;

pub use css::{CompilePolicy, CssCompiler, CssText};
pub use error::{Result, StorageError, StyleError, SurfaceError};
pub use fields::{FieldName, FieldSet};
pub use patch::ActivePatch;
pub use session::{Command, Outcome, Session};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use surface::{MemorySurface, StylesheetSurface, TargetSurface};
pub use theme::{ThemeDocument, ThemeStore};
