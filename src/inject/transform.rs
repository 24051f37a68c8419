//! Best-effort compatibility pass over the injected script.
//!
//! Lowers syntax newer than [`TARGET`] with oxc's transformer and prints the
//! result unminified, so the injected bridge runs in older viewer shells and
//! stays debuggable in devtools.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};
use thiserror::Error;

/// Oldest syntax level the output must run on
pub const TARGET: &str = "es2015";

#[derive(Debug, Error)]
pub enum TransformError {
    /// First diagnostic reported by the parser
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("invalid target `{TARGET}`: {0}")]
    Target(String),

    #[error("lowering failed: {0}")]
    Lowering(String),

    /// Lowering needed helpers that only load through `import`
    #[error("lowered script needs module imports")]
    NeedsModule,
}

/// Transform classic-script source. Top-level declarations stay global.
pub fn transform(source: &str) -> Result<String, TransformError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_script(true);
    let ret = Parser::new(&allocator, source, source_type).parse();

    if let Some(err) = ret.errors.first() {
        return Err(TransformError::Syntax(err.to_string()));
    }
    if ret.panicked {
        return Err(TransformError::Syntax("parser aborted".into()));
    }

    let mut program = ret.program;
    let options = TransformOptions::from_target(TARGET).map_err(TransformError::Target)?;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let ret = Transformer::new(&allocator, Path::new("livedoc-bridge.js"), &options)
        .build_with_scoping(scoping, &mut program);

    if let Some(err) = ret.errors.first() {
        return Err(TransformError::Lowering(err.to_string()));
    }
    if program.body.iter().any(|stmt| stmt.is_module_declaration()) {
        return Err(TransformError::NeedsModule);
    }

    Ok(Codegen::new()
        .with_scoping(Some(ret.scoping))
        .build(&program)
        .code)
}

/// Transform, falling back to `source` unchanged on failure.
///
/// Failure is logged only.
pub fn transform_or_original(source: &str) -> String {
    match transform(source) {
        Ok(code) => code,
        Err(e) => {
            crate::log!("inject"; "script left untransformed: {}", e);
            source.to_string()
        }
    }
}
