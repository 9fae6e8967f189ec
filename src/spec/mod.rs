//! The vector-field specification record.
//!
//! A [`FnSpec`] is the caller-owned description of one model: its
//! parameter and state-variable names, per-variable right-hand sides,
//! user-defined auxiliary functions, and the guidance table for
//! reused-subexpression factoring. It is read-only during generation;
//! names reserved by a generation pass are reported back explicitly by
//! the generator, never written into the spec.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    /// Names the generator reserves for itself plus target math builtins.
    /// Declared model names must not collide with any of these.
    static ref RESERVED_NAMES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        // generated-code identifiers
        for n in ["vfield", "vf_", "t_", "x_", "y_", "p_"] {
            s.insert(n);
        }
        // target keywords and math builtins
        for n in [
            "if", "else", "end", "pi", "abs", "sign", "mod", "floor", "ceil", "sqrt", "exp",
            "log", "log10", "pow", "min", "max", "sin", "cos", "tan", "asin", "acos", "atan",
            "atan2", "sinh", "cosh", "tanh",
        ] {
            s.insert(n);
        }
        s
    };
}

/// Whether `name` is reserved by the generator or the target language.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(name)
}

/// One auxiliary function: formal parameter names and a body expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxFnDef {
    /// Formal parameter names, in signature order.
    pub args: Vec<String>,
    /// Body expression text computing the single return value.
    pub body: String,
}

/// A vector-field specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FnSpec {
    /// Model identifier, used in generated documentation comments.
    pub name: String,

    /// Parameter names in declaration order.
    pub pars: Vec<String>,

    /// State-variable names in declaration order.
    pub vars: Vec<String>,

    /// Right-hand-side expression per state variable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub equations: BTreeMap<String, String>,

    /// User-defined auxiliary functions, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auxfns: BTreeMap<String, AuxFnDef>,

    /// Reused-term guidance: subexpression text mapped to the name its
    /// factored-out definition should carry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reuseterms: BTreeMap<String, String>,
}

impl FnSpec {
    /// Parse a specification from JSON.
    pub fn from_str(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the specification for name clashes and structural holes
    /// before code generation.
    pub fn validate(&self) -> Result<(), SpecError> {
        let mut seen = HashSet::new();
        for p in &self.pars {
            if !seen.insert(p.as_str()) {
                return Err(SpecError::DuplicateParameter { name: p.clone() });
            }
        }
        for v in &self.vars {
            if !seen.insert(v.as_str()) {
                return Err(SpecError::DuplicateVariable { name: v.clone() });
            }
        }

        for name in self.pars.iter().chain(self.vars.iter()) {
            if is_reserved(name) {
                return Err(SpecError::ReservedName { name: name.clone() });
            }
        }

        for (name, def) in &self.auxfns {
            if is_reserved(name) {
                return Err(SpecError::ReservedName { name: name.clone() });
            }
            if seen.contains(name.as_str()) {
                return Err(SpecError::shadowed(name, "auxiliary function"));
            }
            if def.body.trim().is_empty() {
                return Err(SpecError::empty(format!("auxiliary function '{}'", name)));
            }
            let mut args = HashSet::new();
            for a in &def.args {
                if is_reserved(a) {
                    return Err(SpecError::ReservedName { name: a.clone() });
                }
                if !args.insert(a.as_str()) {
                    return Err(SpecError::shadowed(a, format!("arguments of '{}'", name)));
                }
            }
        }

        for (subexpr, term) in &self.reuseterms {
            if subexpr.trim().is_empty() {
                return Err(SpecError::empty(format!("reused term '{}'", term)));
            }
            if is_reserved(term) {
                return Err(SpecError::ReservedName { name: term.clone() });
            }
            if seen.contains(term.as_str()) || self.auxfns.contains_key(term) {
                return Err(SpecError::shadowed(term, "reused term"));
            }
        }

        for (var, eqn) in &self.equations {
            if eqn.trim().is_empty() {
                return Err(SpecError::empty(format!("equation for '{}'", var)));
            }
        }

        Ok(())
    }
}

/// Errors in the structure or content of a specification.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Failed to parse the JSON form of a specification
    #[error("failed to parse specification: {0}")]
    Parse(#[from] serde_json::Error),

    /// A parameter name is declared twice
    #[error("duplicate parameter name: '{name}'")]
    DuplicateParameter { name: String },

    /// A state-variable name is declared twice
    #[error("duplicate variable name: '{name}'")]
    DuplicateVariable { name: String },

    /// A declared name collides with a generator or target name
    #[error("'{name}' is reserved by the generator or target language")]
    ReservedName { name: String },

    /// A name shadows an already-declared one
    #[error("name '{name}' in {context} shadows a declared name")]
    ShadowedName { name: String, context: String },

    /// A required expression is empty
    #[error("empty expression in {context}")]
    EmptyExpression { context: String },

    /// A state variable has no right-hand-side expression
    #[error("no equation supplied for state variable '{name}'")]
    MissingEquation { name: String },

    /// Name mangling would alias an existing name
    #[error("mangled name '{name}' collides with an existing name")]
    NameCollision { name: String },
}

impl SpecError {
    /// Create a shadowed-name error
    pub fn shadowed(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::ShadowedName {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Create an empty-expression error
    pub fn empty(context: impl Into<String>) -> Self {
        Self::EmptyExpression {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> FnSpec {
        FnSpec::from_str(
            r#"{
                "name": "decay",
                "pars": ["a", "b"],
                "vars": ["x", "y"],
                "equations": { "x": "a*x", "y": "b*y" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_and_validates_minimal_spec() {
        let spec = base_spec();
        assert_eq!(spec.vars, vec!["x", "y"]);
        spec.validate().unwrap();
    }

    #[test]
    fn rejects_duplicate_parameter() {
        let mut spec = base_spec();
        spec.pars.push("a".to_string());
        assert!(matches!(
            spec.validate(),
            Err(SpecError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn rejects_reserved_names() {
        let mut spec = base_spec();
        spec.vars.push("pi".to_string());
        assert!(matches!(spec.validate(), Err(SpecError::ReservedName { .. })));
    }

    #[test]
    fn rejects_auxfn_shadowing_parameter() {
        let mut spec = base_spec();
        spec.auxfns.insert(
            "a".to_string(),
            AuxFnDef {
                args: vec!["u".to_string()],
                body: "u*u".to_string(),
            },
        );
        assert!(matches!(spec.validate(), Err(SpecError::ShadowedName { .. })));
    }

    #[test]
    fn rejects_unknown_json_field() {
        let err = FnSpec::from_str(r#"{ "name": "m", "pars": [], "vars": [], "bogus": 1 }"#);
        assert!(matches!(err, Err(SpecError::Parse(_))));
    }

    #[test]
    fn json_round_trip() {
        let spec = base_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back = FnSpec::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
