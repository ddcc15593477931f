//! Argv source selection and the debugger-port rewrite (spec.md §6).
//!
//! Grounded in the teacher's `Fli::run` (`std::env::args().collect()`),
//! generalized from a single hard-coded `argv[1..]` convention into the
//! four `from` values spec.md §6 names.

use crate::error::AuthoringError;

/// Where the raw argv slice came from, and therefore how many leading
/// tokens are not user arguments (spec.md §6 "Argv source selection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgvSource {
    /// `argv[0]` is the interpreter, `argv[1]` is the script path.
    Node,
    /// Every token is a user argument.
    User,
    /// `argv[1]` or `argv[2]`, depending on whether the host reports a
    /// "default app" launch.
    Electron { default_app: bool },
    /// The process was launched via an eval-style flag (`-e`, `-p`,
    /// `--eval`, `--print`): `argv[1..]` are user args.
    Eval,
}

impl ArgvSource {
    pub fn parse(name: &str) -> Result<Self, AuthoringError> {
        match name {
            "node" => Ok(ArgvSource::Node),
            "user" => Ok(ArgvSource::User),
            "eval" => Ok(ArgvSource::Eval),
            "electron" => Ok(ArgvSource::Electron { default_app: false }),
            other => Err(AuthoringError::InvalidArgvSource(other.to_string())),
        }
    }
}

/// Result of splitting a raw argv slice per `ArgvSource` (spec.md §6).
pub struct SplitArgv {
    pub script_path: Option<String>,
    pub user_args: Vec<String>,
}

/// Splits `argv` (the full process argv, including the interpreter slot)
/// according to `source`.
pub fn split_argv(argv: &[String], source: ArgvSource) -> SplitArgv {
    match source {
        ArgvSource::Node => SplitArgv {
            script_path: argv.get(1).cloned(),
            user_args: argv.get(2..).map(|s| s.to_vec()).unwrap_or_default(),
        },
        ArgvSource::User => SplitArgv {
            script_path: None,
            user_args: argv.to_vec(),
        },
        ArgvSource::Eval => SplitArgv {
            script_path: None,
            user_args: argv.get(1..).map(|s| s.to_vec()).unwrap_or_default(),
        },
        ArgvSource::Electron { default_app } => {
            let start = if default_app { 2 } else { 1 };
            SplitArgv {
                script_path: argv.get(1).cloned(),
                user_args: argv.get(start..).map(|s| s.to_vec()).unwrap_or_default(),
            }
        }
    }
}

/// Rewrites `--inspect`, `--inspect-brk`, and `--inspect-port` tokens
/// (bare, `=port`, `=host:port`, or `=host`) by incrementing their port by
/// one, preserving the host. A literal port `0` is left untouched. Used
/// when spawning an executable subcommand so its debugger port never
/// collides with the parent's (spec.md §6).
///
/// Pure and deterministic: same input always produces the same output.
pub fn rewrite_inspect_port(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| rewrite_one(t)).collect()
}

fn rewrite_one(token: &str) -> String {
    const FLAGS: [&str; 3] = ["--inspect", "--inspect-brk", "--inspect-port"];

    for flag in FLAGS {
        if token == flag {
            return token.to_string();
        }
        if let Some(rest) = token.strip_prefix(&format!("{flag}=")) {
            return format!("{flag}={}", rewrite_host_port(rest));
        }
    }
    token.to_string()
}

fn rewrite_host_port(spec: &str) -> String {
    if let Some((host, port)) = spec.rsplit_once(':') {
        return match port.parse::<u32>() {
            Ok(0) => spec.to_string(),
            Ok(p) => format!("{host}:{}", p + 1),
            Err(_) => spec.to_string(),
        };
    }
    match spec.parse::<u32>() {
        Ok(0) => spec.to_string(),
        Ok(p) => (p + 1).to_string(),
        Err(_) => spec.to_string(),
    }
}
