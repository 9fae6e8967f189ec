//! MATLAB backend.
//!
//! Generates vector-field and auxiliary functions for the MATLAB
//! (ADMC++) target. MATLAB functions have no ambient parameter scope,
//! so every call to a user-defined auxiliary function is rewritten to
//! pass the parameter bundle `p_` explicitly.

use std::collections::{BTreeMap, BTreeSet};

use crate::codegen::{
    define_many, format_user_code, normalize, CodeBuilder, GenOptions, GeneratedAuxFn,
    GeneratedFunction, TargetCaps,
};
use crate::error::CodegenError;
use crate::expr::SymbolicExpr;
use crate::reuse::{process_reused, ReuseDef};
use crate::spec::{AuxFnDef, FnSpec, SpecError};

/// Capability set of the MATLAB target.
pub const MATLAB_CAPS: TargetCaps = TargetCaps {
    statement_terminator: ";",
    comment_prefix: "%",
    power_sign: "^",
    supports_conditionals: false,
};

/// Name of the generated vector-field function.
pub const VFIELD_NAME: &str = "vfield";

/// Suffix appended to auxiliary-function formal parameters to keep them
/// clear of resolver bookkeeping names.
const MANGLE_SUFFIX: &str = "__";

/// Code generator for the MATLAB target.
///
/// Not reentrant-safe: concurrent generation calls against generators
/// sharing one specification must be serialized by the caller.
pub struct MatlabGenerator {
    spec: FnSpec,
    opts: GenOptions,
    protected: BTreeSet<String>,
}

impl MatlabGenerator {
    pub fn new(spec: FnSpec, opts: GenOptions) -> Self {
        Self {
            spec,
            opts,
            protected: BTreeSet::new(),
        }
    }

    pub fn with_defaults(spec: FnSpec) -> Self {
        Self::new(spec, GenOptions::default())
    }

    pub fn spec(&self) -> &FnSpec {
        &self.spec
    }

    /// Names reserved by the most recent generation pass. Callers
    /// sharing one specification across backends persist these to keep
    /// later name choices collision-free.
    pub fn protected_names(&self) -> &BTreeSet<String> {
        &self.protected
    }

    /// Generate the vector-field function for the given state variables,
    /// in caller-supplied order, from their right-hand-side expressions.
    pub fn generate_spec(
        &mut self,
        names: &[String],
        exprs: &BTreeMap<String, String>,
    ) -> Result<GeneratedFunction, CodegenError> {
        let mut normalized = BTreeMap::new();
        for name in names {
            let src = exprs
                .get(name)
                .ok_or_else(|| SpecError::MissingEquation { name: name.clone() })?;
            let norm = normalize(src, &self.opts.power_sign)?;
            if norm.is_empty() {
                return Err(SpecError::empty(format!("equation for '{}'", name)).into());
            }
            normalized.insert(name.clone(), norm);
        }

        // one resolver call over the whole batch: subexpressions shared
        // across equations are only found when all are considered together
        let (reuse_block, rewritten) = self.resolve_reused(names, &normalized)?;

        let auxnames: Vec<String> = self.spec.auxfns.keys().cloned().collect();
        let mut result = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let mut expr = rewritten[name].clone();
            if let Some(construct) = expr.find_conditional() {
                if !MATLAB_CAPS.supports_conditionals {
                    return Err(CodegenError::UnsupportedConstruct {
                        context: name.clone(),
                        construct: construct.to_string(),
                    });
                }
            }
            if !auxnames.is_empty() {
                expr.add_arg_to_calls(&auxnames, "p_");
            }
            result.push(format!(
                "y_({}) = {}{}",
                i + 1,
                expr.to_code(&self.opts.power_sign),
                MATLAB_CAPS.statement_terminator
            ));
        }

        let mut b = CodeBuilder::new();
        b.section(format!(
            "function [vf_, y_] = {}(vf_, t_, x_, p_)\n\
             % Vector field definition for model {}\n\
             % Generated by vfcodegen for the MATLAB (ADMC++) target",
            VFIELD_NAME, self.spec.name
        ));
        if !self.spec.pars.is_empty() {
            b.section(format!(
                "% Parameter definitions\n\n{}",
                define_many(self.opts.define, &self.spec.pars, "p", 1)
            ));
        }
        if !names.is_empty() {
            b.section(format!(
                "% Variable definitions\n\n{}",
                define_many(self.opts.define, names, "x", 1)
            ));
        }
        b.section(format_user_code(self.opts.start.as_deref(), &MATLAB_CAPS));
        if !reuse_block.is_empty() {
            b.section(format!("% Reused term definitions\n{}", reuse_block));
        }
        b.section(result.join("\n"));
        b.section(format_user_code(self.opts.end.as_deref(), &MATLAB_CAPS));

        Ok(GeneratedFunction {
            code: b.render(),
            name: VFIELD_NAME.to_string(),
        })
    }

    /// Generate one auxiliary function. Formal parameters are mangled
    /// with a fixed suffix in the signature and the result body; the
    /// reuse-term block keeps its original names (long-standing,
    /// deliberately preserved behavior).
    pub fn generate_auxfun(
        &mut self,
        name: &str,
        def: &AuxFnDef,
        pars: Option<&[String]>,
    ) -> Result<GeneratedAuxFn, CodegenError> {
        let pars: Vec<String> = match pars {
            Some(p) => p.to_vec(),
            None => self.spec.pars.clone(),
        };
        let renames: BTreeMap<String, String> = def
            .args
            .iter()
            .map(|a| (a.clone(), format!("{}{}", a, MANGLE_SUFFIX)))
            .collect();

        let body = normalize(&def.body, &self.opts.power_sign)?;
        if body.is_empty() {
            return Err(SpecError::empty(format!("auxiliary function '{}'", name)).into());
        }
        let batch = BTreeMap::from([(name.to_string(), body)]);
        let (reuse_block, rewritten) = self.resolve_reused(&[name.to_string()], &batch)?;

        for mangled in renames.values() {
            if self.protected.contains(mangled) || pars.iter().any(|p| p == mangled) {
                return Err(SpecError::NameCollision {
                    name: mangled.clone(),
                }
                .into());
            }
        }

        let mut body = rewritten[name].clone();
        if let Some(construct) = body.find_conditional() {
            return Err(CodegenError::UnsupportedConstruct {
                context: name.to_string(),
                construct: construct.to_string(),
            });
        }
        body.map_names(&renames);
        let auxnames: Vec<String> = self.spec.auxfns.keys().cloned().collect();
        if !auxnames.is_empty() {
            body.add_arg_to_calls(&auxnames, "p_");
        }

        let mut vnames: Vec<String> = def.args.iter().map(|a| renames[a].clone()).collect();
        vnames.push("p_".to_string());

        let mut b = CodeBuilder::new();
        b.section(format!(
            "function y_ = {}({})\n\
             % Auxiliary function {} for model {}\n\
             % Generated by vfcodegen for the MATLAB (ADMC++) target",
            name,
            vnames.join(", "),
            name,
            self.spec.name
        ));
        if !pars.is_empty() {
            b.section(format!(
                "% Parameter definitions\n\n{}",
                define_many(self.opts.define, &pars, "p", 1)
            ));
        }
        if !reuse_block.is_empty() {
            b.section(format!("% Reused term definitions\n{}", reuse_block));
        }
        b.section(format!(
            "y_ = {}{}",
            body.to_code(&self.opts.power_sign),
            MATLAB_CAPS.statement_terminator
        ));

        let code = b.render();
        let doc = code.lines().take(5).collect::<Vec<_>>().join("\n");
        Ok(GeneratedAuxFn { code, doc })
    }

    /// Reserved extension point for target-specific custom generation.
    /// The MATLAB backend has no such strategy; every call fails.
    pub fn generate_special(
        &self,
        name: &str,
        _spec: &str,
    ) -> Result<GeneratedFunction, CodegenError> {
        Err(CodegenError::NotSupported(format!(
            "special generation for '{}' (matlab backend)",
            name
        )))
    }

    /// Resolve reused terms over one batch and flatten the returned
    /// definitions into a single ordered text block. Duplicate
    /// definitions (one term referenced from several equations) collapse
    /// last-writer-wins, keyed by term name.
    fn resolve_reused(
        &mut self,
        names: &[String],
        exprs: &BTreeMap<String, String>,
    ) -> Result<(String, BTreeMap<String, SymbolicExpr>), CodegenError> {
        let auxnames: Vec<String> = self.spec.auxfns.keys().cloned().collect();
        let res = process_reused(
            names,
            exprs,
            &self.spec.reuseterms,
            "",
            "",
            MATLAB_CAPS.statement_terminator,
            &self.opts.power_sign,
            move |expr| {
                if !auxnames.is_empty() {
                    expr.add_arg_to_calls(&auxnames, "p_");
                }
            },
        )?;
        self.protected = res.protected;

        let mut flattened: BTreeMap<String, ReuseDef> = BTreeMap::new();
        for name in names {
            if let Some(list) = res.defs.get(name) {
                for def in list {
                    flattened.insert(def.name.clone(), def.clone());
                }
            }
        }
        let block = res
            .order
            .iter()
            .filter_map(|term| flattened.get(term))
            .map(|def| def.code.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok((block, res.rewritten))
    }
}
