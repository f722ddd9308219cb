pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod location;
pub mod reports;
pub mod scope;
pub mod script;
pub mod syntax;
pub mod types;

pub use compiler::{Compilation, Compiler};
pub use config::CompilerConfig;
pub use emit::{Emitter, format_code};
pub use error::{CompileError, CompileResult, ErrorKind, Level, SeaErrorExt};
pub use location::{Location, Span};
pub use scope::{ScopePath, ScopeStack};
pub use script::Script;
pub use types::{PrimitiveKind, TypeRegistry};

pub fn generate_error_report(error: &dyn SeaErrorExt) -> String {
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    format!(
        "SEALANG | {} | {} | {} | {}",
        error.level(),
        error.kind(),
        location,
        error.message()
    )
}

/// Compile `source` with the default configuration and return the final
/// formatted text.
pub fn compile_source(name: &str, source: &str) -> Result<String, Box<dyn SeaErrorExt>> {
    let script = Script::from_source(name, source);
    let compilation = Compiler::default().compile(&script)?;
    Ok(compilation.text()?)
}
