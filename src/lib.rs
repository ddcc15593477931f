//! A declarative command-tree argument parser: commands, options and
//! positional arguments; a token parser that classifies argv against the
//! active command; a value resolver that merges CLI, environment,
//! implied, and default sources under a fixed precedence; and a
//! dispatcher that walks the command tree running life-cycle hooks.
//!
//! Grounded in the `fli` crate's command/option model
//! (`command.rs`/`option.rs`/`argument.rs`/`value.rs`), generalized onto
//! an arena-indexed command tree (`command::CommandArena`) with a
//! separated token parser and value resolver (`parser::tokenizer`,
//! `parser::resolver`) and an explicit dispatcher (`dispatch`). See
//! `DESIGN.md` for the per-module grounding ledger.

pub mod argument;
pub mod argv;
pub mod command;
pub mod display;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod hooks;
pub mod option;
pub mod parser;
pub mod program;
pub mod suggest;
pub mod value;

pub use command::{Command, CommandArena, CommandId};
pub use error::{Error, Result};
pub use option::Opt;
pub use program::{CommandHandle, Program};
pub use value::{Value, ValueSource};
