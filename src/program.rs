//! The public builder surface (spec.md §1: "CLI surface exposed to
//! library users as fluent builder chaining ... is not part of the
//! semantic contract being specified", but SPEC_FULL.md keeps it as this
//! crate's actual public API, in the teacher's idiom).
//!
//! Grounded in the teacher's `Fli`/`app::Fli` facade (`src/app.rs`:
//! `Fli::command` returning `&mut FliCommand` for chaining, `Fli::run`
//! driving argv collection), generalized onto the arena-indexed
//! `CommandArena` + `dispatch::dispatch` pair instead of an owned
//! `HashMap<String, FliCommand>` tree.

use crate::argument::Argument;
use crate::argv::{split_argv, ArgvSource};
use crate::command::{CommandArena, CommandId};
use crate::display::OutputSinks;
use crate::dispatch;
use crate::error::{AuthoringError, Error};
use crate::hooks::{ActionFn, HookEvent, HookFn, HookOutcome};
use crate::option::Opt;
use crate::value::Value;

/// A CLI program: owns the command arena and the output sinks every
/// render/error report passes through (spec.md §6).
pub struct Program {
    pub arena: CommandArena,
    pub root: CommandId,
    pub sinks: OutputSinks,
    pub argv_source: ArgvSource,
    /// Whether `run` calls `std::process::exit` on a terminal error/help
    /// outcome, or returns it to the caller instead (spec.md §6 "exit
    /// override").
    pub exit_on_error: bool,
    pub show_help_after_error: bool,
}

impl Program {
    pub fn new(name: &str) -> Self {
        let (arena, root) = CommandArena::new(name);
        Self {
            arena,
            root,
            sinks: OutputSinks::default(),
            argv_source: ArgvSource::Node,
            exit_on_error: true,
            show_help_after_error: false,
        }
    }

    pub fn root_handle(&mut self) -> CommandHandle<'_> {
        CommandHandle {
            arena: &mut self.arena,
            id: self.root,
        }
    }

    /// Sets the root command's version string and registers the `-V,
    /// --version` option that triggers it (spec.md §3 "`version` and
    /// associated version option").
    pub fn version(&mut self, version: &str) -> Result<&mut Self, AuthoringError> {
        self.arena.get_mut(self.root).version = Some(version.to_string());
        self.arena
            .get_mut(self.root)
            .add_option(Opt::new("-V, --version", "output the version number")?)?;
        Ok(self)
    }

    pub fn description(&mut self, d: &str) -> &mut Self {
        self.arena.get_mut(self.root).description = d.to_string();
        self
    }

    /// Runs the parse+dispatch walk over already-split user argv,
    /// resolving any deferred hook/action completion inline (spec.md §9
    /// `parse`/`parse_async` split — this crate has no async runtime, so
    /// `parse` alone is sufficient; see `src/hooks.rs`).
    pub fn parse(&mut self, user_args: Vec<String>) -> Result<(), Error> {
        dispatch::dispatch(&mut self.arena, self.root, user_args, &mut self.sinks).resolve()
    }

    /// Splits the full process argv per `self.argv_source` and parses the
    /// user-argument slice (spec.md §6 "Argv source selection").
    pub fn parse_argv(&mut self, argv: &[String]) -> Result<(), Error> {
        let split = split_argv(argv, self.argv_source);
        self.parse(split.user_args)
    }

    /// Convenience entry point: collects `std::env::args()`, parses, and on
    /// error reports through the configured sinks and exits with the
    /// error's carried exit code (spec.md §7 "error-display pipeline"),
    /// unless `exit_on_error` is false.
    pub fn run(&mut self) {
        let argv: Vec<String> = std::env::args().collect();
        if let Err(e) = self.parse_argv(&argv) {
            self.report(&e);
            if self.exit_on_error {
                std::process::exit(e.exit_code);
            }
        }
    }

    fn report(&mut self, error: &Error) {
        if error.is_help_flow() {
            return;
        }
        self.sinks.report_error(error);
        if self.show_help_after_error {
            crate::help::render_help_to_stderr(&self.arena, self.root, &mut self.sinks);
        }
    }
}

/// A mutable view onto one command node, borrowed from a `Program`'s
/// arena. Mirrors the teacher's `&mut FliCommand` chaining handle.
pub struct CommandHandle<'a> {
    arena: &'a mut CommandArena,
    id: CommandId,
}

impl<'a> CommandHandle<'a> {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn description(&mut self, d: &str) -> &mut Self {
        self.arena.get_mut(self.id).description = d.to_string();
        self
    }

    pub fn option(&mut self, flags: &str, description: &str) -> Result<&mut Self, AuthoringError> {
        let opt = Opt::new(flags, description)?;
        self.add_option(opt)
    }

    pub fn add_option(&mut self, opt: Opt) -> Result<&mut Self, AuthoringError> {
        self.arena.get_mut(self.id).add_option(opt)?;
        Ok(self)
    }

    pub fn argument(&mut self, decl: &str) -> Result<&mut Self, AuthoringError> {
        let arg = Argument::new(decl);
        self.arena.get_mut(self.id).add_argument(arg)?;
        Ok(self)
    }

    pub fn add_argument(&mut self, arg: Argument) -> Result<&mut Self, AuthoringError> {
        self.arena.get_mut(self.id).add_argument(arg)?;
        Ok(self)
    }

    pub fn alias(&mut self, alias: &str) -> Result<&mut Self, AuthoringError> {
        self.arena.get_mut(self.id).add_alias(alias)?;
        Ok(self)
    }

    pub fn action(&mut self, f: ActionFn) -> &mut Self {
        self.arena.get_mut(self.id).set_action(f);
        self
    }

    pub fn on(&mut self, event: HookEvent, hook: HookFn) -> &mut Self {
        self.arena.get_mut(self.id).on(event, hook);
        self
    }

    pub fn default_command(&mut self, name: &str) -> &mut Self {
        self.arena.get_mut(self.id).default_command_name = Some(name.to_string());
        self
    }

    pub fn allow_unknown_option(&mut self, yes: bool) -> &mut Self {
        self.arena.get_mut(self.id).allow_unknown_option = yes;
        self
    }

    pub fn allow_excess_arguments(&mut self, yes: bool) -> &mut Self {
        self.arena.get_mut(self.id).allow_excess_arguments = yes;
        self
    }

    pub fn combine_flag_and_optional_value(&mut self, yes: bool) -> &mut Self {
        self.arena.get_mut(self.id).combine_flag_and_optional_value = yes;
        self
    }

    pub fn enable_positional_options(&mut self, yes: bool) -> &mut Self {
        self.arena.get_mut(self.id).enable_positional_options = yes;
        self
    }

    /// Sets pass-through mode, rejecting the combination spec.md §7 lists
    /// as an authoring error: "`pass_through_options` on a child whose
    /// parent lacks `enable_positional_options`".
    pub fn pass_through_options(&mut self, yes: bool) -> Result<&mut Self, AuthoringError> {
        if yes {
            let parent_ok = self
                .arena
                .get(self.id)
                .parent
                .map(|p| self.arena.get(p).enable_positional_options)
                .unwrap_or(true);
            if !parent_ok {
                return Err(AuthoringError::PassThroughWithoutPositionalAncestor(
                    self.arena.get(self.id).name.clone(),
                ));
            }
        }
        self.arena.get_mut(self.id).pass_through_options = yes;
        Ok(self)
    }

    pub fn hidden(&mut self, yes: bool) -> &mut Self {
        self.arena.get_mut(self.id).hidden = yes;
        self
    }

    pub fn command(&mut self, name: &str) -> Result<CommandHandle<'_>, AuthoringError> {
        let child_id = self.arena.add_command(self.id, name)?;
        Ok(CommandHandle { arena: self.arena, id: child_id })
    }

    pub fn opt_value(&self, attr: &str) -> Option<&Value> {
        self.arena.get(self.id).option_values.get(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn scenario_required_value_option_parses_from_cli() {
        fn to_int(raw: &str, _old: Option<&Value>) -> Result<Value, String> {
            raw.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
        }

        let mut program = Program::new("s");
        program
            .root_handle()
            .add_option(Opt::new("-p, --port <n>", "").unwrap().parser(to_int))
            .unwrap()
            .action(|cmd| {
                assert_eq!(cmd.option_values.get("port"), Some(&Value::Int(80)));
                HookOutcome::ok()
            });

        program
            .parse(vec!["--port".to_string(), "80".to_string()])
            .unwrap();
        assert_eq!(
            program.arena.get(program.root).option_value_sources.get("port"),
            Some(&crate::value::ValueSource::Cli)
        );
    }

    #[test]
    fn scenario_variadic_argument_collects_remaining_operands() {
        static CALLED: AtomicBool = AtomicBool::new(false);
        fn act(cmd: &crate::command::Command) -> HookOutcome {
            assert_eq!(cmd.processed_args[0], Value::Str("one".into()));
            assert_eq!(
                cmd.processed_args[1],
                Value::List(vec![Value::Str("two".into()), Value::Str("three".into())])
            );
            CALLED.store(true, Ordering::SeqCst);
            HookOutcome::ok()
        }

        let mut program = Program::new("s");
        {
            let mut root = program.root_handle();
            root.argument("<a>").unwrap();
            root.argument("[bs...]").unwrap();
            root.action(act);
        }
        program
            .parse(vec!["one".to_string(), "two".to_string(), "three".to_string()])
            .unwrap();
        assert!(CALLED.load(Ordering::SeqCst));
    }

    #[test]
    fn scenario_env_precedence_then_cli_override() {
        let mut program = Program::new("s");
        program
            .root_handle()
            .add_option(
                Opt::new("--port <n>", "")
                    .unwrap()
                    .default(Value::Str("80".into()))
                    .env("PROGRAM_TEST_PORT"),
            )
            .unwrap()
            .action(|_| HookOutcome::ok());

        std::env::set_var("PROGRAM_TEST_PORT", "9000");
        program.parse(vec![]).unwrap();
        assert_eq!(
            program.arena.get(program.root).option_values.get("port"),
            Some(&Value::Str("9000".into()))
        );
        assert_eq!(
            program.arena.get(program.root).option_value_sources.get("port"),
            Some(&crate::value::ValueSource::Env)
        );

        program
            .parse(vec!["--port".to_string(), "1234".to_string()])
            .unwrap();
        assert_eq!(
            program.arena.get(program.root).option_values.get("port"),
            Some(&Value::Str("1234".into()))
        );
        assert_eq!(
            program.arena.get(program.root).option_value_sources.get("port"),
            Some(&crate::value::ValueSource::Cli)
        );
        std::env::remove_var("PROGRAM_TEST_PORT");
    }

    #[test]
    fn version_flag_short_circuits_with_version_error_code() {
        let mut program = Program::new("s");
        program.version("1.2.3").unwrap();
        program.root_handle().action(|_| HookOutcome::ok());
        let err = program.parse(vec!["--version".to_string()]).unwrap_err();
        assert_eq!(err.code, "commander.version");
    }

    #[test]
    fn subcommand_tree_dispatches_to_child_action() {
        static CALLED: AtomicBool = AtomicBool::new(false);
        fn act(_cmd: &crate::command::Command) -> HookOutcome {
            CALLED.store(true, Ordering::SeqCst);
            HookOutcome::ok()
        }

        let mut program = Program::new("s");
        program.root_handle().command("build").unwrap().action(act);
        program.parse(vec!["build".to_string()]).unwrap();
        assert!(CALLED.load(Ordering::SeqCst));
    }
}
