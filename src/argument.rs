//! Positional arguments (spec.md §3 "Argument", §4.5 "Positional argument
//! coercion"). Grounded in the teacher's `expected_positional_args` counter
//! (`command::FliCommand`), generalized into a full per-slot declaration
//! list with coercion and variadic collection.

use crate::error::AuthoringError;
use crate::option::ParseArgFn;
use crate::value::Value;

#[derive(Clone)]
pub struct Argument {
    pub name: String,
    pub required: bool,
    pub variadic: bool,
    pub default_value: Option<Value>,
    pub parse_arg: Option<ParseArgFn>,
    pub choices: Option<Vec<String>>,
}

impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("variadic", &self.variadic)
            .finish()
    }
}

impl Argument {
    /// Declares a positional argument from `<name>`, `[name]`, or bare
    /// `name`, with an optional `...` suffix marking it variadic.
    pub fn new(decl: &str) -> Self {
        let trimmed = decl.trim();
        let required = trimmed.starts_with('<');
        let inner = trimmed.trim_start_matches(['<', '[']).trim_end_matches(['>', ']']);
        let variadic = inner.ends_with("...");
        let name = inner.trim_end_matches("...").to_string();

        Self {
            name,
            required,
            variadic,
            default_value: None,
            parse_arg: None,
            choices: None,
        }
    }

    pub fn default(mut self, value: Value) -> Result<Self, AuthoringError> {
        if self.required && self.parse_arg.is_none() {
            return Err(AuthoringError::DefaultOnRequiredArgument(self.name.clone()));
        }
        self.default_value = Some(value);
        Ok(self)
    }

    pub fn parser(mut self, f: ParseArgFn) -> Self {
        self.parse_arg = Some(f);
        self
    }

    pub fn choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }
}

/// Validates that `new_arg` may be appended after `existing`, per spec.md
/// §3's invariant: "a variadic argument, if present, must be the last
/// declared argument."
pub fn validate_append(existing: &[Argument], new_arg: &Argument) -> Result<(), AuthoringError> {
    if let Some(last) = existing.last() {
        if last.variadic {
            return Err(AuthoringError::VariadicNotLast(new_arg.name.clone()));
        }
    }
    Ok(())
}
