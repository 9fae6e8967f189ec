use thiserror::Error;

use crate::expr::ParseError;
use crate::spec::SpecError;

/// Errors surfaced by the generation entry points. Generation is
/// all-or-nothing: on any error no partial output is returned.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A resolved expression contains a conditional form the target
    /// cannot express without further translation work
    #[error("unsupported construct '{construct}' in expression for '{context}'")]
    UnsupportedConstruct { context: String, construct: String },

    /// A reserved extension point with no strategy for this backend
    #[error("{0} is not supported by this backend")]
    NotSupported(String),

    /// Malformed expression text, passed through unchanged
    #[error(transparent)]
    Expr(#[from] ParseError),

    /// Malformed specification, passed through unchanged
    #[error(transparent)]
    Spec(#[from] SpecError),
}
