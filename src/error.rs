//! The structured error type (spec.md §3, §7), grounded in the teacher's
//! `error.rs` (`thiserror::Error` derive, `Result<T>` alias, constructor
//! helpers), re-keyed onto spec.md's stable string codes and extended with
//! an `exit_code`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A single structured failure, carrying everything spec.md §3 requires:
/// an exit code, a stable machine-readable code, a human message, and an
/// optional wrapped cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    pub exit_code: i32,
    pub code: &'static str,
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(code: &'static str, exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            code,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("commander.invalidArgument", 1, message)
    }

    pub fn missing_argument(message: impl Into<String>) -> Self {
        Self::new("commander.missingArgument", 1, message)
    }

    pub fn excess_arguments(message: impl Into<String>) -> Self {
        Self::new("commander.excessArguments", 1, message)
    }

    pub fn unknown_option(message: impl Into<String>) -> Self {
        Self::new("commander.unknownOption", 1, message)
    }

    pub fn unknown_command(message: impl Into<String>) -> Self {
        Self::new("commander.unknownCommand", 1, message)
    }

    pub fn option_missing_argument(message: impl Into<String>) -> Self {
        Self::new("commander.optionMissingArgument", 1, message)
    }

    pub fn missing_mandatory_option_value(message: impl Into<String>) -> Self {
        Self::new("commander.missingMandatoryOptionValue", 1, message)
    }

    pub fn conflicting_option(message: impl Into<String>) -> Self {
        Self::new("commander.conflictingOption", 1, message)
    }

    pub fn help(message: impl Into<String>) -> Self {
        Self::new("commander.help", 0, message)
    }

    pub fn help_displayed(message: impl Into<String>) -> Self {
        Self::new("commander.helpDisplayed", 0, message)
    }

    pub fn version(message: impl Into<String>) -> Self {
        Self::new("commander.version", 0, message)
    }

    pub fn execute_sub_command_async(message: impl Into<String>) -> Self {
        Self::new("commander.executeSubCommandAsync", 1, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new("commander.error", 1, message)
    }

    /// True for the two control-flow codes that represent successful help
    /// rendering rather than a failure (spec.md §6: "0 for successful help
    /// display").
    pub fn is_help_flow(&self) -> bool {
        matches!(self.code, "commander.help" | "commander.helpDisplayed")
    }
}

/// Authoring errors: mistakes made by the library *user* while declaring
/// commands/options/arguments, raised eagerly at registration time rather
/// than during a parse (spec.md §7 "Authoring errors").
#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("option '{0}' is already declared on this command")]
    DuplicateOption(String),

    #[error("invalid option flag declaration '{0}': no short or long flag found")]
    InvalidFlagDeclaration(String),

    #[error(
        "a variadic argument must be the last registered argument (tried to add '{0}' after one)"
    )]
    VariadicNotLast(String),

    #[error("argument '{0}' is required and has a default value but no parse_arg coercer")]
    DefaultOnRequiredArgument(String),

    #[error("pass_through_options was set on '{0}' but no ancestor enables positional_options")]
    PassThroughWithoutPositionalAncestor(String),

    #[error("alias '{0}' is equal to its own command's name")]
    AliasEqualsCommandName(String),

    #[error("alias '{0}' clashes with a sibling command or alias")]
    AliasClash(String),

    #[error("invalid argv source '{0}'; expected one of node, user, electron, eval")]
    InvalidArgvSource(String),

    #[error("invalid life-cycle hook event '{0}'")]
    InvalidHookEvent(String),

    #[error("invalid help-text position '{0}'")]
    InvalidHelpTextPosition(String),
}
