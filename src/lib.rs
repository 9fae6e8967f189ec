//! Code generation for symbolic vector-field specifications.
//!
//! `vfcodegen` turns a declarative description of a dynamical system —
//! state variables, parameters, auxiliary functions, and symbolic
//! right-hand-side expressions — into syntactically complete MATLAB
//! source for an external differentiation/integration toolchain.
//!
//! The pipeline normalizes each expression, factors guided common
//! subexpressions ("reused terms") out into an ordered definition
//! block, threads the implicit parameter bundle through every call to a
//! user-defined auxiliary function, and assembles the output from a
//! fixed sequence of optional sections.
//!
//! # Quick Start
//!
//! ```
//! use vfcodegen::{FnSpec, GenOptions, MatlabGenerator};
//!
//! let spec = FnSpec::from_str(r#"{
//!     "name": "decay",
//!     "pars": ["a", "b"],
//!     "vars": ["x", "y"],
//!     "equations": { "x": "a*x", "y": "b*y" }
//! }"#).unwrap();
//! spec.validate().unwrap();
//!
//! let names = spec.vars.clone();
//! let exprs = spec.equations.clone();
//! let mut generator = MatlabGenerator::with_defaults(spec);
//! let generated = generator.generate_spec(&names, &exprs).unwrap();
//! assert!(generated.code.contains("y_(1) = a*x;"));
//! ```
//!
//! # Reused terms
//!
//! The `reuseterms` table of a [`FnSpec`] maps subexpression text to the
//! name its factored definition should carry. Resolution happens once
//! per batch, over all equations together, so sharing across equations
//! is detected; emitted definitions always precede their first use.
//! The names a pass reserves are available from
//! [`MatlabGenerator::protected_names`] afterwards — the generator never
//! mutates the specification.
//!
//! # Scope
//!
//! Conditional expressions (`if`, ternaries) are rejected with
//! [`CodegenError::UnsupportedConstruct`] rather than translated
//! unsafely; numeric integration and target-specific optimization of
//! the emitted code are out of scope.

pub mod codegen;
pub mod error;
pub mod expr;
pub mod reuse;
pub mod spec;

pub use codegen::matlab::{MatlabGenerator, MATLAB_CAPS, VFIELD_NAME};
pub use codegen::{
    CodeBuilder, GenOptions, GeneratedAuxFn, GeneratedFunction, TargetCaps,
};
pub use error::CodegenError;
pub use expr::{ParseError, SymbolicExpr};
pub use reuse::{process_reused, ReuseDef, ReuseResolution};
pub use spec::{AuxFnDef, FnSpec, SpecError};

/// Parse a specification from JSON.
pub fn parse_spec(json: &str) -> Result<FnSpec, SpecError> {
    FnSpec::from_str(json)
}

/// Parse and validate a specification.
pub fn validate_spec(json: &str) -> Result<FnSpec, SpecError> {
    let spec = FnSpec::from_str(json)?;
    spec.validate()?;
    Ok(spec)
}

/// Parse, validate, and generate the vector-field function for a JSON
/// specification in one call. Every declared state variable must carry
/// an equation.
pub fn generate_vector_field(
    json: &str,
    opts: GenOptions,
) -> Result<GeneratedFunction, CodegenError> {
    let spec = validate_spec(json)?;
    let names = spec.vars.clone();
    let exprs = spec.equations.clone();
    let mut generator = MatlabGenerator::new(spec, opts);
    generator.generate_spec(&names, &exprs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_vector_field_end_to_end() {
        let json = r#"{
            "name": "decay",
            "pars": ["a"],
            "vars": ["x"],
            "equations": { "x": "a*x" }
        }"#;
        let out = generate_vector_field(json, GenOptions::default()).unwrap();
        assert_eq!(out.name, "vfield");
        assert!(out.code.contains("y_(1) = a*x;"));
    }

    #[test]
    fn invalid_spec_fails_before_generation() {
        let json = r#"{
            "name": "bad",
            "pars": ["a", "a"],
            "vars": ["x"],
            "equations": { "x": "a*x" }
        }"#;
        assert!(matches!(
            generate_vector_field(json, GenOptions::default()),
            Err(CodegenError::Spec(SpecError::DuplicateParameter { .. }))
        ));
    }
}
