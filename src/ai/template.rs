//! Prompt templates with `{{$name}}` variable references.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::ai::ContextVariables;

/// A `{{$name}}` reference, whitespace allowed inside the braces.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static TEMPLATE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\$(\w+)\s*\}\}").unwrap());

/// A prompt template rendered against [`ContextVariables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    /// Creates a template from its source text.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Substitutes every variable reference with its value in `context`.
    ///
    /// Unset variables render as the empty string. Substituted values are
    /// not rescanned, so a diff that happens to contain `{{$input}}` is
    /// inserted literally.
    pub fn render(&self, context: &ContextVariables) -> String {
        TEMPLATE_VARIABLE
            .replace_all(&self.source, |caps: &Captures<'_>| {
                let name = &caps[1];
                context.get(name).map_or_else(
                    || {
                        debug!(variable = name, "Template variable not set");
                        String::new()
                    },
                    str::to_string,
                )
            })
            .into_owned()
    }
}
