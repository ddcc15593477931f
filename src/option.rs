//! The flag model (spec.md §3 "Option", §4.1 "Flag-declaration parsing").
//!
//! Grounded in the teacher's `Fli::option` flag-string splitter
//! (`src/fli.rs`) and `option_parser::SingleOption`
//! (`src/option_parser/option_parser.rs`), generalized from a two-token
//! `split(" ")` into an explicit scanner that understands `-s, --long`,
//! `--long=<arg>`, `[arg]`, `<arg...>`, and `--no-` negation, per spec.md's
//! rules.

use std::collections::HashMap;

use crate::error::AuthoringError;
use crate::value::Value;

/// The argument slot an option declares, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSlot {
    /// No argument: a boolean/negation flag.
    None,
    /// `<arg>`: value required whenever the flag is seen.
    Required { variadic: bool },
    /// `[arg]`: value optional; `preset_arg` substitutes when absent.
    Optional { variadic: bool },
}

impl ArgSlot {
    pub fn is_variadic(&self) -> bool {
        matches!(
            self,
            ArgSlot::Required { variadic: true } | ArgSlot::Optional { variadic: true }
        )
    }

    pub fn takes_value(&self) -> bool {
        !matches!(self, ArgSlot::None)
    }

    pub fn is_required(&self) -> bool {
        matches!(self, ArgSlot::Required { .. })
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ArgSlot::Optional { .. })
    }
}

pub type ParseArgFn = fn(&str, Option<&Value>) -> Result<Value, String>;

/// A declared option (spec.md §3 "Option").
#[derive(Clone)]
pub struct Opt {
    pub short: Option<String>, // e.g. "-p"
    pub long: Option<String>,  // e.g. "--port"
    pub slot: ArgSlot,
    pub negate: bool,
    pub default_value: Option<Value>,
    pub preset_arg: Option<Value>,
    pub env_var: Option<String>,
    pub parse_arg: Option<ParseArgFn>,
    pub choices: Option<Vec<String>>,
    pub conflicts_with: Vec<String>,
    pub implied: HashMap<String, Value>,
    pub mandatory: bool,
    pub hidden: bool,
    pub description: String,
}

impl std::fmt::Debug for Opt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opt")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("slot", &self.slot)
            .field("negate", &self.negate)
            .field("attribute_name", &self.attribute_name())
            .finish()
    }
}

impl Opt {
    /// Parses a flag-declaration string per spec.md §4.1.
    ///
    /// Splitting: split on any run of `[ ,|]`; the arg-descriptor token
    /// (starting with `<` or `[`) is detached from whichever flag token
    /// precedes it. If only one flag token is found and it matches
    /// `^-[^-]$`, it is the short flag, not the long.
    pub fn new(flags: &str, description: &str) -> Result<Self, AuthoringError> {
        let tokens: Vec<&str> = flags
            .split(|c: char| c == ' ' || c == ',' || c == '|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut flag_tokens: Vec<&str> = Vec::new();
        let mut arg_token: Option<&str> = None;
        for tok in &tokens {
            if tok.starts_with('<') || tok.starts_with('[') {
                arg_token = Some(tok);
            } else {
                flag_tokens.push(tok);
            }
        }

        let (short, long) = match flag_tokens.as_slice() {
            [] => return Err(AuthoringError::InvalidFlagDeclaration(flags.to_string())),
            [one] => {
                if one.len() == 2 && one.starts_with('-') && !one.starts_with("--") {
                    (Some((*one).to_string()), None)
                } else {
                    (None, Some((*one).to_string()))
                }
            }
            [a, b, ..] => {
                if a.starts_with("--") {
                    (None, Some((*a).to_string()))
                } else {
                    (Some((*a).to_string()), Some((*b).to_string()))
                }
            }
        };

        let negate = long.as_deref().map(|l| l.starts_with("--no-")).unwrap_or(false);

        let slot = match arg_token {
            None => ArgSlot::None,
            Some(tok) => {
                let required = tok.starts_with('<');
                let variadic = tok.contains("...");
                if required {
                    ArgSlot::Required { variadic }
                } else {
                    ArgSlot::Optional { variadic }
                }
            }
        };

        let default_value = if negate { Some(Value::Bool(true)) } else { None };

        Ok(Self {
            short,
            long,
            slot,
            negate,
            default_value,
            preset_arg: None,
            env_var: None,
            parse_arg: None,
            choices: None,
            conflicts_with: Vec::new(),
            implied: HashMap::new(),
            mandatory: false,
            hidden: false,
            description: description.to_string(),
        })
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn preset(mut self, value: Value) -> Self {
        self.preset_arg = Some(value);
        self
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    pub fn parser(mut self, f: ParseArgFn) -> Self {
        self.parse_arg = Some(f);
        self
    }

    pub fn choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn conflicts_with(mut self, attr: impl Into<String>) -> Self {
        self.conflicts_with.push(attr.into());
        self
    }

    pub fn implies(mut self, attr: impl Into<String>, value: Value) -> Self {
        self.implied.insert(attr.into(), value);
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// `name()`: strips leading dashes from the long flag (falling back to
    /// the short flag).
    pub fn name(&self) -> String {
        let raw = self.long.as_deref().or(self.short.as_deref()).unwrap_or("");
        raw.trim_start_matches('-').to_string()
    }

    /// `attribute_name()`: strips leading dashes, strips a leading `no-`,
    /// then lower-camel-cases hyphen segments (spec.md §4.1).
    pub fn attribute_name(&self) -> String {
        let mut n = self.name();
        if let Some(rest) = n.strip_prefix("no-") {
            n = rest.to_string();
        }
        camel_case(&n)
    }

    /// The positive long flag of a `--no-foo` pair, i.e. `--foo`.
    pub fn positive_twin_flag(&self) -> Option<String> {
        self.long
            .as_deref()
            .and_then(|l| l.strip_prefix("--no-"))
            .map(|rest| format!("--{rest}"))
    }

    pub fn matches_flag(&self, token: &str) -> bool {
        self.short.as_deref() == Some(token) || self.long.as_deref() == Some(token)
    }
}

fn camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for (i, part) in s.split('-').enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            out.push_str(part);
        } else {
            capitalize_next = true;
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                if capitalize_next {
                    out.extend(first.to_uppercase());
                } else {
                    out.push(first);
                }
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_value_long_and_short() {
        let o = Opt::new("-p, --port <n>", "").unwrap();
        assert_eq!(o.short.as_deref(), Some("-p"));
        assert_eq!(o.long.as_deref(), Some("--port"));
        assert!(matches!(o.slot, ArgSlot::Required { variadic: false }));
        assert_eq!(o.attribute_name(), "port");
    }

    #[test]
    fn parses_negated_boolean() {
        let o = Opt::new("--no-sauce", "").unwrap();
        assert!(o.negate);
        assert_eq!(o.attribute_name(), "sauce");
        assert_eq!(o.default_value, Some(Value::Bool(true)));
        assert_eq!(o.positive_twin_flag().as_deref(), Some("--sauce"));
    }

    #[test]
    fn single_short_only_flag_is_short_not_long() {
        let o = Opt::new("-x <n>", "").unwrap();
        assert_eq!(o.short.as_deref(), Some("-x"));
        assert_eq!(o.long, None);
    }

    #[test]
    fn camel_cases_hyphenated_attribute_name() {
        let o = Opt::new("--some-name <v>", "").unwrap();
        assert_eq!(o.attribute_name(), "someName");
    }

    #[test]
    fn variadic_optional_value() {
        let o = Opt::new("-f, --flag [v...]", "").unwrap();
        assert!(o.slot.is_variadic());
        assert!(o.slot.is_optional());
    }

    #[test]
    fn declaration_with_no_flag_token_is_rejected() {
        let err = Opt::new("<n>", "").unwrap_err();
        assert!(matches!(err, AuthoringError::InvalidFlagDeclaration(_)));
        let err = Opt::new("", "").unwrap_err();
        assert!(matches!(err, AuthoringError::InvalidFlagDeclaration(_)));
    }
}
