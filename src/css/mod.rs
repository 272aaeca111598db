pub mod compiler;

pub use compiler::{font_import_url, CompilePolicy, CssCompiler, CssText};
