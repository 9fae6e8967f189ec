//! Shared backend code-generation pipeline.
//!
//! Every target backend follows the same shape: normalize the incoming
//! expressions, resolve reused terms over the whole batch, thread the
//! parameter bundle through auxiliary-function calls, and assemble the
//! output from a fixed sequence of optional sections. What varies per
//! target is captured in [`TargetCaps`] plus the backend's templates;
//! the MATLAB backend in [`matlab`] supplies only those.

pub mod matlab;

use crate::expr::{ParseError, SymbolicExpr};

/// Per-target capability set. A backend is this configuration plus its
/// two templates.
#[derive(Debug, Clone, Copy)]
pub struct TargetCaps {
    /// Appended to every emitted statement.
    pub statement_terminator: &'static str,
    /// Line-comment prefix of the target language.
    pub comment_prefix: &'static str,
    /// Default exponentiation token.
    pub power_sign: &'static str,
    /// Whether conditional expressions can be translated for this
    /// target. Backends without support reject them during generation.
    pub supports_conditionals: bool,
}

/// Renders one declaration line for `define_many`:
/// (name, bundle kind, 1-based index) -> declaration text.
pub type DefineFn = fn(&str, &str, usize) -> String;

fn default_define(name: &str, kind: &str, index: usize) -> String {
    format!("\t{} = {}_({});\n", name, kind, index)
}

/// Recognized generation options, defaulted per target.
#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Declaration-line renderer for parameter and variable definitions.
    pub define: DefineFn,
    /// Exponentiation token to emit.
    pub power_sign: String,
    /// Verbatim target code inserted before the result statements.
    pub start: Option<String>,
    /// Verbatim target code inserted after the result statements.
    pub end: Option<String>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            define: default_define,
            power_sign: matlab::MATLAB_CAPS.power_sign.to_string(),
            start: None,
            end: None,
        }
    }
}

/// A generated vector-field function.
#[derive(Debug, Clone)]
pub struct GeneratedFunction {
    /// Complete target source text.
    pub code: String,
    /// Name of the generated function.
    pub name: String,
}

/// A generated auxiliary function.
#[derive(Debug, Clone)]
pub struct GeneratedAuxFn {
    /// Complete target source text.
    pub code: String,
    /// Documentation excerpt: the first five lines of `code`.
    pub doc: String,
}

/// Ordered sequence of optional output sections. Empty sections are
/// dropped at push time, so optional content never leaves stray markers
/// or separators behind.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    sections: Vec<String>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one section; whitespace-only text is discarded.
    pub fn section(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.sections.push(text.trim_end().to_string());
        }
        self
    }

    /// Concatenate the sections, one blank line apart, with a trailing
    /// newline.
    pub fn render(&self) -> String {
        let mut out = self.sections.join("\n\n");
        out.push('\n');
        out
    }
}

/// Strip incidental formatting from expression text and standardize the
/// exponentiation token: parse and re-serialize.
pub fn normalize(text: &str, power_sign: &str) -> Result<String, ParseError> {
    Ok(SymbolicExpr::parse(text)?.to_code(power_sign))
}

/// One declaration line per name via the `define` option, indexed from
/// `start` (generated targets address bundles 1-based).
pub fn define_many(define: DefineFn, names: &[String], kind: &str, start: usize) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| define(name, kind, i + start))
        .collect()
}

/// Wrap caller-supplied verbatim target code in begin/end comment
/// markers, or return nothing when there is no code to insert.
pub fn format_user_code(code: Option<&str>, caps: &TargetCaps) -> String {
    match code {
        Some(code) if !code.trim().is_empty() => format!(
            "{} Verbatim code insert -- begin\n{}\n{} Verbatim code insert -- end",
            caps.comment_prefix,
            code.trim_end(),
            caps.comment_prefix
        ),
        _ => String::new(),
    }
}
