//! Staged truncation of code to fit a token budget

use crate::model::{ClassSummary, FieldInfo, MethodInfo};
use crate::tokenizer::Tokenizer;
use ctxpress_core::AdvisorConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const DEFAULT_TOKEN_BUDGET: usize = 2048;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import .*;\n").expect("valid import regex"));

const ELIDED_CODE: &str = "        {some other code}\n";
const METHOD_INDENT: &str = "    ";
const TODO_MARKER: &str = "// TODO: implement the method ";

/// Code to place before and after the cursor in a completion prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPrompt {
    pub prefix_code: String,
    pub suffix_code: String,
}

impl FinalPrompt {
    pub fn new(prefix_code: impl Into<String>, suffix_code: impl Into<String>) -> Self {
        Self {
            prefix_code: prefix_code.into(),
            suffix_code: suffix_code.into(),
        }
    }

    fn prefix_only(prefix_code: impl Into<String>) -> Self {
        Self::new(prefix_code, String::new())
    }
}

/// Remove every single-line `import ...;` statement
pub fn strip_imports(code: &str) -> String {
    IMPORT_RE.replace_all(code, "").into_owned()
}

/// Picks how much code to send so the prompt stays within a token budget
///
/// Each operation tries progressively smaller renditions and returns the
/// first that fits. When nothing fits, the smallest rendition is returned
/// anyway; exceeding the budget is never an error.
#[derive(Debug)]
pub struct PromptStrategyAdvisor<T> {
    tokenizer: T,
    token_budget: usize,
}

impl<T: Tokenizer> PromptStrategyAdvisor<T> {
    pub fn new(tokenizer: T) -> Self {
        Self::with_budget(tokenizer, DEFAULT_TOKEN_BUDGET)
    }

    pub fn with_budget(tokenizer: T, token_budget: usize) -> Self {
        Self {
            tokenizer,
            token_budget,
        }
    }

    pub fn from_config(tokenizer: T, config: &AdvisorConfig) -> Self {
        Self::with_budget(tokenizer, config.token_budget)
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Strictly below the budget
    pub fn fits(&self, text: &str) -> bool {
        self.tokenizer.count_tokens(text) < self.token_budget
    }

    pub fn advise(&self, prefix_code: &str, suffix_code: &str) -> FinalPrompt {
        if self.fits(prefix_code) {
            return FinalPrompt::new(prefix_code, suffix_code);
        }

        let stripped = strip_imports(prefix_code);
        if !self.fits(&stripped) {
            debug!(
                tokens = self.tokenizer.count_tokens(&stripped),
                budget = self.token_budget,
                "Prefix over budget after removing imports"
            );
        }
        FinalPrompt::new(stripped, suffix_code)
    }

    /// Whole file, then the primary declaration, then a trimmed declaration
    pub fn advise_file(
        &self,
        file_text: &str,
        primary_declaration: &str,
        fields: &[FieldInfo],
        methods: &[MethodInfo],
        callee_type_name: &str,
    ) -> FinalPrompt {
        if self.fits(file_text) {
            debug!("Using whole file");
            return FinalPrompt::prefix_only(file_text);
        }

        if self.fits(primary_declaration) {
            debug!("Using primary declaration");
            return FinalPrompt::prefix_only(primary_declaration);
        }

        self.advise_declaration(primary_declaration, fields, methods, callee_type_name)
    }

    /// Narrow a declaration to the code that touches a field of the callee type
    pub fn advise_declaration(
        &self,
        declaration_text: &str,
        fields: &[FieldInfo],
        methods: &[MethodInfo],
        callee_type_name: &str,
    ) -> FinalPrompt {
        let base = self.advise(declaration_text, "").prefix_code;
        if self.fits(&base) {
            return FinalPrompt::prefix_only(base);
        }

        let Some(field) = fields.iter().find(|f| f.type_name == callee_type_name) else {
            debug!(callee = callee_type_name, "No field of callee type");
            return FinalPrompt::prefix_only(base);
        };

        let pattern = format!(r".*\s+{}\..*", regex::escape(&field.name));
        let (usage, line_usage) = match (
            Regex::new(&pattern),
            Regex::new(&format!("^(?:{})$", pattern)),
        ) {
            (Ok(usage), Ok(line_usage)) => (usage, line_usage),
            (Err(e), _) | (_, Err(e)) => {
                warn!(field = %field.name, error = %e, "Cannot build field usage pattern");
                return FinalPrompt::prefix_only(base);
            }
        };

        let using_methods = methods
            .iter()
            .filter(|m| usage.is_match(&m.text))
            .map(|m| format!("{}{}", METHOD_INDENT, m.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        if self.fits(&using_methods) {
            debug!(field = %field.name, "Using methods that reference the field");
            return FinalPrompt::prefix_only(using_methods);
        }

        debug!(field = %field.name, "Falling back to lines that reference the field");
        let mut lines = String::new();
        for line in declaration_text.lines().filter(|l| line_usage.is_match(l)) {
            lines.push_str(ELIDED_CODE);
            lines.push_str(line);
            lines.push('\n');
        }
        FinalPrompt::prefix_only(lines)
    }

    /// Ask for the missing methods the caller actually uses
    ///
    /// The suffix lists those names; the prefix is the file (or, when that
    /// is too large, the class outline) followed by a TODO marker naming them.
    pub fn advise_missing_methods(
        &self,
        file_text: &str,
        summary: &ClassSummary,
        used_method_names: &[String],
        missing_method_names: &[String],
    ) -> FinalPrompt {
        let suffix_code = missing_method_names
            .iter()
            .filter(|name| used_method_names.contains(name))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let with_file = with_todo_marker(file_text, &suffix_code);
        if self.fits(&with_file) {
            return FinalPrompt::new(with_file, suffix_code);
        }

        debug!(class = %summary.name, "Using class outline for missing methods");
        let with_summary = with_todo_marker(&summary.format(), &suffix_code);
        FinalPrompt::new(with_summary, suffix_code)
    }
}

fn with_todo_marker(text: &str, names: &str) -> String {
    let mut out = String::with_capacity(text.len() + TODO_MARKER.len() + names.len() + 1);
    out.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(TODO_MARKER);
    out.push_str(names);
    out
}
