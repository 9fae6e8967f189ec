//! Reused-subexpression resolution.
//!
//! Given a batch of named expressions and a guidance table mapping
//! subexpression text to a reused-term name, [`process_reused`] factors
//! every guided subexpression that actually occurs out into an ordered
//! block of intermediate definitions and rewrites the expressions to
//! reference them. Resolution is a pure function: the reserved-name set
//! is part of the return value, and the caller decides whether to
//! persist it.

use std::collections::{BTreeMap, BTreeSet};

use crate::expr::{ParseError, SymbolicExpr, Token};

/// One emitted reused-term definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ReuseDef {
    /// Position in the global emission order.
    pub order: usize,
    /// The complete definition statement, delimiters included.
    pub code: String,
    /// The synthetic name the definition binds.
    pub name: String,
}

/// Result of resolving reused terms over one batch of expressions.
#[derive(Debug, Clone)]
pub struct ReuseResolution {
    /// Definitions required per input name, in emission order, including
    /// definitions a directly-referenced term itself depends on.
    pub defs: BTreeMap<String, Vec<ReuseDef>>,
    /// The input expressions rewritten to reference the factored terms.
    pub rewritten: BTreeMap<String, SymbolicExpr>,
    /// Names reserved by this resolution pass.
    pub protected: BTreeSet<String>,
    /// Global definition-before-use emission order of all used terms.
    pub order: Vec<String>,
}

/// Factor guided common subexpressions out of `exprs`.
///
/// Candidate subexpressions are matched as token subsequences, longest
/// first so that a term is matched before any smaller term nested inside
/// it, with guidance-table order as the deterministic tie-break.
/// Definition statements are assembled as
/// `{prefix}{name}{suffix} = {body}{terminator}`; `rewrite` is applied
/// to every definition body before serialization (the MATLAB backend
/// uses it to thread the parameter bundle through auxiliary-function
/// calls inside definitions).
#[allow(clippy::too_many_arguments)]
pub fn process_reused<F>(
    names: &[String],
    exprs: &BTreeMap<String, String>,
    reuseterms: &BTreeMap<String, String>,
    prefix: &str,
    suffix: &str,
    terminator: &str,
    power_sign: &str,
    rewrite: F,
) -> Result<ReuseResolution, ParseError>
where
    F: Fn(&mut SymbolicExpr),
{
    // (needle tokens, term name, guidance index), longest needle first
    let mut candidates: Vec<(Vec<Token>, String, usize)> = Vec::new();
    for (idx, (subexpr, term)) in reuseterms.iter().enumerate() {
        let needle = SymbolicExpr::parse(subexpr)?;
        candidates.push((needle.tokens().to_vec(), term.clone(), idx));
    }
    candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.2.cmp(&b.2)));

    let mut rewritten: BTreeMap<String, SymbolicExpr> = BTreeMap::new();
    let mut used: BTreeSet<String> = BTreeSet::new();
    for name in names {
        let Some(src) = exprs.get(name) else { continue };
        let mut expr = SymbolicExpr::parse(src)?;
        for (needle, term, _) in &candidates {
            if expr.replace_subsequence(needle, term) > 0 {
                used.insert(term.clone());
            }
        }
        rewritten.insert(name.clone(), expr);
    }

    // Factor used terms inside each other's definition bodies. Replacing
    // inside a definition can pull a further guidance term into use, so
    // iterate until no new term appears.
    let mut def_bodies: BTreeMap<String, SymbolicExpr> = BTreeMap::new();
    let mut queue: Vec<String> = used.iter().cloned().collect();
    while let Some(term) = queue.pop() {
        if def_bodies.contains_key(&term) {
            continue;
        }
        let subexpr = reuseterms
            .iter()
            .find(|(_, t)| **t == term)
            .map(|(s, _)| s.as_str())
            .unwrap_or_default();
        let mut body = SymbolicExpr::parse(subexpr)?;
        for (needle, other, _) in &candidates {
            if other == &term {
                continue;
            }
            if body.replace_subsequence(needle, other) > 0 && used.insert(other.clone()) {
                queue.push(other.clone());
            }
        }
        def_bodies.insert(term, body);
    }

    // Definition-before-use order: a term referencing another term must
    // come after it. Ready terms are emitted in guidance-table order.
    let gidx: BTreeMap<&str, usize> = reuseterms
        .values()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    let mut deps: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (term, body) in &def_bodies {
        let d = used
            .iter()
            .filter(|other| *other != term && body.references(other))
            .cloned()
            .collect();
        deps.insert(term.clone(), d);
    }
    let mut remaining: Vec<String> = used.iter().cloned().collect();
    remaining.sort_by_key(|t| gidx.get(t.as_str()).copied().unwrap_or(usize::MAX));
    let mut order: Vec<String> = Vec::with_capacity(remaining.len());
    let mut emitted: BTreeSet<String> = BTreeSet::new();
    while !remaining.is_empty() {
        let pos = remaining
            .iter()
            .position(|t| deps[t].iter().all(|d| emitted.contains(d)))
            // mutually-referencing guidance terms: fall back to table order
            .unwrap_or(0);
        let term = remaining.remove(pos);
        emitted.insert(term.clone());
        order.push(term);
    }

    let mut all_defs: BTreeMap<String, ReuseDef> = BTreeMap::new();
    for (i, term) in order.iter().enumerate() {
        let mut body = def_bodies[term].clone();
        rewrite(&mut body);
        let code = format!(
            "{}{}{} = {}{}",
            prefix,
            term,
            suffix,
            body.to_code(power_sign),
            terminator
        );
        all_defs.insert(
            term.clone(),
            ReuseDef {
                order: i,
                code,
                name: term.clone(),
            },
        );
    }

    // Per-name definition lists: directly referenced terms closed over
    // their definition dependencies, in emission order.
    let mut defs: BTreeMap<String, Vec<ReuseDef>> = BTreeMap::new();
    for name in names {
        let Some(expr) = rewritten.get(name) else { continue };
        let mut need: BTreeSet<String> = used
            .iter()
            .filter(|term| expr.references(term))
            .cloned()
            .collect();
        let mut stack: Vec<String> = need.iter().cloned().collect();
        while let Some(term) = stack.pop() {
            for dep in &deps[&term] {
                if need.insert(dep.clone()) {
                    stack.push(dep.clone());
                }
            }
        }
        let mut list: Vec<ReuseDef> = need.into_iter().map(|t| all_defs[&t].clone()).collect();
        list.sort_by_key(|d| d.order);
        defs.insert(name.clone(), list);
    }

    Ok(ReuseResolution {
        defs,
        rewritten,
        protected: used,
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(
        names: &[&str],
        exprs: &[(&str, &str)],
        terms: &[(&str, &str)],
    ) -> ReuseResolution {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let exprs: BTreeMap<String, String> = exprs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let terms: BTreeMap<String, String> = terms
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        process_reused(&names, &exprs, &terms, "", "", ";", "^", |_| {}).unwrap()
    }

    #[test]
    fn factors_shared_subexpression_once() {
        let res = resolve(
            &["x", "y"],
            &[("x", "(a+b)*x"), ("y", "(a+b)*y")],
            &[("a+b", "w0")],
        );
        assert_eq!(res.order, vec!["w0"]);
        assert_eq!(res.rewritten["x"].to_code("^"), "(w0)*x");
        assert_eq!(res.rewritten["y"].to_code("^"), "(w0)*y");
        assert_eq!(res.defs["x"].len(), 1);
        assert_eq!(res.defs["x"][0].code, "w0 = a+b;");
        assert!(res.protected.contains("w0"));
    }

    #[test]
    fn unused_guidance_terms_produce_no_definitions() {
        let res = resolve(&["x"], &[("x", "a*x")], &[("c+d", "w0")]);
        assert!(res.order.is_empty());
        assert!(res.protected.is_empty());
        assert!(res.defs["x"].is_empty());
    }

    #[test]
    fn nested_terms_are_ordered_definition_before_use() {
        let res = resolve(
            &["x"],
            &[("x", "exp(a+b)*c + exp(a+b)*d")],
            &[("a+b", "w0"), ("exp(a+b)", "w1")],
        );
        // w1's definition references w0, so w0 must be emitted first
        assert_eq!(res.order, vec!["w0", "w1"]);
        let defs = &res.defs["x"];
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].code, "w0 = a+b;");
        assert_eq!(defs[1].code, "w1 = exp(w0);");
        assert_eq!(res.rewritten["x"].to_code("^"), "w1*c+w1*d");
    }

    #[test]
    fn rewrite_hook_applies_to_definition_bodies() {
        let names = vec!["x".to_string()];
        let exprs = BTreeMap::from([("x".to_string(), "f(a)+f(a)".to_string())]);
        let terms = BTreeMap::from([("f(a)".to_string(), "w0".to_string())]);
        let res = process_reused(&names, &exprs, &terms, "", "", ";", "^", |e| {
            e.add_arg_to_calls(&["f".to_string()], "p_")
        })
        .unwrap();
        assert_eq!(res.defs["x"][0].code, "w0 = f(a, p_);");
        // the rewritten main expression is left for the backend to process
        assert_eq!(res.rewritten["x"].to_code("^"), "w0+w0");
    }

    #[test]
    fn delimiters_shape_the_definition_statement() {
        let names = vec!["x".to_string()];
        let exprs = BTreeMap::from([("x".to_string(), "(a+b)*2".to_string())]);
        let terms = BTreeMap::from([("a+b".to_string(), "w0".to_string())]);
        let res =
            process_reused(&names, &exprs, &terms, "double ", "", ";", "^", |_| {}).unwrap();
        assert_eq!(res.defs["x"][0].code, "double w0 = a+b;");
    }
}
