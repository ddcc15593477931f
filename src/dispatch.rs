//! The command-tree dispatcher (spec.md §4.3 "Dispatcher / parse walk").
//!
//! Grounded in the teacher's `Fli::run` recursive-descent dispatch
//! (`src/fli.rs`: subcommand lookup by walking `cammands_hash_tables`,
//! then recursing into the matched child), generalized to walk the
//! arena-indexed tree instead of owned `HashMap` children, to run the
//! life-cycle hooks the teacher's `run` skips entirely, and to raise
//! spec.md's structured, stably-coded errors instead of printing help and
//! calling `process::exit` inline.

use crate::command::{Command, CommandArena, CommandId};
use crate::display::OutputSinks;
use crate::error::{Error, Result};
use crate::help;
use crate::hooks::{self, ActionFn, HookEvent, HookOutcome};
use crate::parser::{positional, resolver, tokenizer};
use crate::suggest;
use crate::value::{Value, ValueSource};

/// Runs the full parse+dispatch walk starting at `id` with the already
/// source-selected user argv (spec.md §4.3, steps 1-8). Mirrors
/// `Command::parse`/`parse_async` (spec.md §9): callers that never
/// register a hook or action returning `HookOutcome::Pending` can call
/// `.resolve()` on the result immediately; callers that might need to
/// await one do so explicitly.
pub fn dispatch(arena: &mut CommandArena, id: CommandId, argv: Vec<String>, sinks: &mut OutputSinks) -> HookOutcome {
    materialize_implicit_help_child(arena, id);

    let tokenize_result = {
        let cmd = arena.get(id);
        tokenizer::tokenize(&argv, cmd, |tok| arena.find_child(id, tok).is_some())
    };
    let parsed = match tokenize_result {
        Ok(r) => r,
        Err(e) => return HookOutcome::err(e),
    };

    {
        let cmd = arena.get_mut(id);
        cmd.raw_args = argv;
        cmd.args = parsed.operands.iter().chain(parsed.unknown.iter()).cloned().collect();
    }

    for event in &parsed.events {
        if let Err(e) = resolver::apply_event(arena.get_mut(id), event, ValueSource::Cli) {
            return HookOutcome::err(e);
        }
    }

    {
        let cmd = arena.get_mut(id);
        if let Err(e) = resolver::apply_env(cmd) {
            return HookOutcome::err(e);
        }
        resolver::apply_implied(cmd);
    }

    let operands = parsed.operands;
    let unknown = parsed.unknown;

    if let Some(first) = operands.first() {
        if let Some(child_id) = arena.find_child(id, first) {
            let chain = hooks::ancestor_chain(arena, id);
            if let Err(e) = hooks::run_hooks(HookEvent::PreSubcommand, &chain, arena.get(child_id)) {
                return HookOutcome::err(e);
            }
            let mut child_argv = operands[1..].to_vec();
            child_argv.extend(unknown);
            return dispatch(arena, child_id, child_argv, sinks);
        }

        if help::is_help_command_token(arena.get(id), first) {
            return dispatch_help_command(arena, id, &operands[1..], sinks);
        }
    }

    if let Some(default_name) = arena.get(id).default_command_name.clone() {
        if let Some(default_id) = arena.find_child(id, &default_name) {
            let mut merged = operands;
            merged.extend(unknown);
            return dispatch(arena, default_id, merged, sinks);
        }
    }

    let cmd = arena.get(id);
    if operands.is_empty() && cmd.has_children() && !cmd.has_action() {
        help::render_help_to_stderr(arena, id, sinks);
        return HookOutcome::err(Error::new("commander.error", 1, "no command specified"));
    }

    process_leaf(arena, id, operands, unknown, sinks)
}

/// Resolves `operands[0]` (if present) against `id`'s children and renders
/// its help, or falls back to re-invoking parse on `id` itself with
/// `--help` synthesized (spec.md §4.3 step 5).
fn dispatch_help_command(
    arena: &mut CommandArena,
    id: CommandId,
    rest: &[String],
    sinks: &mut OutputSinks,
) -> HookOutcome {
    match rest.first().and_then(|name| arena.find_child(id, name)) {
        Some(target) => {
            help::render_help(arena, target, sinks);
            HookOutcome::err(Error::help_displayed(format!(
                "displayed help for '{}'",
                arena.get(target).name
            )))
        }
        None => {
            help::render_help(arena, id, sinks);
            HookOutcome::err(Error::help_displayed(format!(
                "displayed help for '{}'",
                arena.get(id).name
            )))
        }
    }
}

/// Synthesizes `id`'s implicit help child, if spec.md §6 says one is
/// wanted and none exists yet ("lazy-created on first query", spec.md
/// §3). A no-op once the child has been created.
fn materialize_implicit_help_child(arena: &mut CommandArena, id: CommandId) {
    if !help::wants_implicit_help_child(arena, id) {
        return;
    }
    if let Ok(help_id) = arena.add_command(id, "help") {
        arena.get_mut(help_id).description = "display help for command".to_string();
        let _ = arena
            .get_mut(help_id)
            .add_argument(crate::argument::Argument::new("[command]"));
    }
}

/// Leaf processing (spec.md §4.3 step 8): help-flag short circuit,
/// mandatory/conflict validation, then either action dispatch or the
/// no-action fallback paths.
fn process_leaf(
    arena: &mut CommandArena,
    id: CommandId,
    operands: Vec<String>,
    unknown: Vec<String>,
    sinks: &mut OutputSinks,
) -> HookOutcome {
    if help::contains_help_flag(&unknown, arena.get(id)) {
        help::render_help(arena, id, sinks);
        return HookOutcome::err(Error::help_displayed(format!(
            "displayed help for '{}'",
            arena.get(id).name
        )));
    }

    if let Some(version_text) = version_requested(arena.get(id)) {
        sinks.write_out(&version_text);
        return HookOutcome::err(Error::version(version_text));
    }

    let chain = arena.ancestors(id);
    if let Err(e) = validate_mandatory(arena, &chain) {
        return HookOutcome::err(e);
    }
    if let Err(e) = validate_conflicts(arena, &chain) {
        return HookOutcome::err(e);
    }

    let has_action = arena.get(id).has_action();
    if has_action {
        if !arena.get(id).allow_unknown_option {
            if let Some(tok) = unknown.iter().find(|t| t.starts_with('-')) {
                return HookOutcome::err(unknown_option_error(arena, id, tok));
            }
        }
        return dispatch_action(arena, id, operands, sinks);
    }

    if !operands.is_empty() {
        let cmd = arena.get(id);
        if cmd.has_children() {
            return HookOutcome::err(unknown_command_error(arena, id, &operands[0]));
        }
    }

    match positional::coerce_arguments(
        &arena.get(id).registered_arguments.clone(),
        &operands,
        arena.get(id).allow_excess_arguments,
    ) {
        Ok(values) => {
            arena.get_mut(id).processed_args = values;
            HookOutcome::ok()
        }
        Err(e) => HookOutcome::err(e),
    }
}

/// Coerces positional args, then runs `preAction -> action -> postAction`
/// (spec.md §4.6).
fn dispatch_action(
    arena: &mut CommandArena,
    id: CommandId,
    operands: Vec<String>,
    _sinks: &mut OutputSinks,
) -> HookOutcome {
    let registered = arena.get(id).registered_arguments.clone();
    let allow_excess = arena.get(id).allow_excess_arguments;
    let values = match positional::coerce_arguments(&registered, &operands, allow_excess) {
        Ok(v) => v,
        Err(e) => return HookOutcome::err(e),
    };
    arena.get_mut(id).processed_args = values;

    let chain = hooks::ancestor_chain(arena, id);
    let action_cmd_snapshot_id = id;
    if let Err(e) = hooks::run_hooks(HookEvent::PreAction, &chain, arena.get(action_cmd_snapshot_id)) {
        return HookOutcome::err(e);
    }

    let action: ActionFn = match arena.get(id).action {
        Some(a) => a,
        None => return HookOutcome::ok(),
    };
    let outcome = action(arena.get(id));
    if let Err(e) = outcome.resolve() {
        return HookOutcome::err(e);
    }

    let chain = hooks::ancestor_chain(arena, id);
    if let Err(e) = hooks::run_hooks(HookEvent::PostAction, &chain, arena.get(id)) {
        return HookOutcome::err(e);
    }
    HookOutcome::ok()
}

/// Returns the rendered version text if this leaf's `--version`-shaped
/// option is set and a version string is configured (spec.md §3
/// "`version` and associated version option").
fn version_requested(cmd: &Command) -> Option<String> {
    let version = cmd.version.as_ref()?;
    match cmd.option_values.get("version") {
        Some(Value::Bool(true)) => Some(version.clone()),
        _ => None,
    }
}

/// Mandatory-option validation (spec.md §4.3 "Mandatory-validation
/// traversal"): for each command from root to leaf in `chain`, every
/// option marked `mandatory` must have a recorded value.
fn validate_mandatory(arena: &CommandArena, chain: &[CommandId]) -> Result<()> {
    for &id in chain {
        let cmd = arena.get(id);
        for opt in &cmd.options {
            if !opt.mandatory {
                continue;
            }
            let attr = opt.attribute_name();
            if !cmd.option_values.contains_key(&attr) {
                return Err(Error::missing_mandatory_option_value(format!(
                    "required option '{}' not specified",
                    opt.long.as_deref().or(opt.short.as_deref()).unwrap_or(&attr)
                )));
            }
        }
    }
    Ok(())
}

/// Conflict validation (spec.md §4.3 "Conflict validation per command"):
/// for each command in `chain`, take options whose current source is not
/// `Default`; for each whose `conflicts_with` intersects that set, raise
/// `commander.conflictingOption`, preferring the env-var name and the dual
/// positive/negative twin that actually produced the value.
fn validate_conflicts(arena: &CommandArena, chain: &[CommandId]) -> Result<()> {
    for &id in chain {
        let cmd = arena.get(id);
        let active: Vec<String> = cmd
            .option_value_sources
            .iter()
            .filter(|(_, src)| **src != ValueSource::Default)
            .map(|(attr, _)| attr.clone())
            .collect();

        for attr in &active {
            let Some(opt) = resolver::source_option_for_attr(cmd, attr) else {
                continue;
            };
            for other_attr in &opt.conflicts_with {
                if active.contains(other_attr) {
                    let other_opt = resolver::source_option_for_attr(cmd, other_attr);
                    return Err(Error::conflicting_option(format!(
                        "option '{}' cannot be used with option '{}'",
                        describe_option(cmd, opt, attr),
                        other_opt
                            .map(|o| describe_option(cmd, o, other_attr))
                            .unwrap_or_else(|| other_attr.clone()),
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Names an option for an error message: its env var if that is the
/// source currently recorded for it, else its long/short flag.
fn describe_option(cmd: &Command, opt: &crate::option::Opt, attr: &str) -> String {
    if cmd.option_value_sources.get(attr) == Some(&ValueSource::Env) {
        if let Some(var) = &opt.env_var {
            return format!("{var} (env)");
        }
    }
    opt.long.clone().or_else(|| opt.short.clone()).unwrap_or_else(|| attr.to_string())
}

fn unknown_option_error(arena: &CommandArena, id: CommandId, token: &str) -> Error {
    let candidates = collect_visible_long_flags_for_suggestion(arena, id);
    let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let hint = suggest::suggest(token, &refs);
    let msg = if hint.is_empty() {
        format!("unknown option '{token}'")
    } else {
        format!("unknown option '{token}' {hint}")
    };
    Error::unknown_option(msg)
}

fn unknown_command_error(arena: &CommandArena, id: CommandId, token: &str) -> Error {
    let cmd = arena.get(id);
    let names: Vec<String> = cmd
        .commands
        .iter()
        .map(|&c| arena.get(c).name.clone())
        .collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let hint = suggest::suggest(token, &refs);
    let msg = if hint.is_empty() {
        format!("unknown command '{token}'")
    } else {
        format!("unknown command '{token}' {hint}")
    };
    Error::unknown_command(msg)
}

/// Walks upward from `id` collecting visible long flags, stopping after
/// (and including) the first ancestor with `enable_positional_options`
/// (spec.md §7 "Suggestion policy").
fn collect_visible_long_flags_for_suggestion(arena: &CommandArena, id: CommandId) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = Some(id);
    while let Some(cid) = cur {
        let cmd = arena.get(cid);
        out.extend(cmd.visible_long_flags().map(str::to_string));
        if cmd.enable_positional_options {
            break;
        }
        cur = cmd.parent;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookContext;
    use crate::option::Opt;
    use crate::value::Value;

    fn toks(s: &[&str]) -> Vec<String> {
        s.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn cli_flag_with_implied_option_propagates_through_full_dispatch() {
        let (mut arena, root) = CommandArena::new("app");
        arena
            .get_mut(root)
            .add_option(Opt::new("--fast", "").unwrap().implies("cache", Value::Bool(true)))
            .unwrap();
        arena.get_mut(root).add_option(Opt::new("--cache", "").unwrap()).unwrap();
        arena.get_mut(root).set_action(|_cmd: &Command| HookOutcome::ok());

        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["--fast"]), &mut sinks);
        assert!(outcome.resolve().is_ok());
        assert_eq!(arena.get(root).option_values.get("cache"), Some(&Value::Bool(true)));
        assert_eq!(
            arena.get(root).option_value_sources.get("cache"),
            Some(&crate::value::ValueSource::Implied)
        );
    }

    #[test]
    fn leaf_without_children_coerces_arguments() {
        let (mut arena, root) = CommandArena::new("app");
        arena
            .get_mut(root)
            .add_argument(crate::argument::Argument::new("<file>"))
            .unwrap();
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["a.txt"]), &mut sinks);
        assert!(outcome.resolve().is_ok());
        assert_eq!(
            arena.get(root).processed_args,
            vec![Value::Str("a.txt".into())]
        );
    }

    #[test]
    fn subcommand_dispatch_descends_with_remaining_tokens() {
        let (mut arena, root) = CommandArena::new("app");
        let sub = arena.add_command(root, "sub").unwrap();
        arena.get_mut(sub).add_option(Opt::new("-v", "").unwrap()).unwrap();
        arena.get_mut(sub).allow_unknown_option = true;
        arena
            .get_mut(sub)
            .set_action(|_cmd: &Command| HookOutcome::ok());
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["sub", "-v", "--unknown"]), &mut sinks);
        assert!(outcome.resolve().is_ok());
        assert_eq!(arena.get(sub).args, vec!["--unknown".to_string()]);
    }

    #[test]
    fn unknown_option_errors_unless_allowed() {
        let (mut arena, root) = CommandArena::new("app");
        let sub = arena.add_command(root, "sub").unwrap();
        arena.get_mut(sub).add_option(Opt::new("-v", "").unwrap()).unwrap();
        arena
            .get_mut(sub)
            .set_action(|_cmd: &Command| HookOutcome::ok());
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["sub", "-v", "--unknown"]), &mut sinks);
        let err = outcome.resolve().unwrap_err();
        assert_eq!(err.code, "commander.unknownOption");
    }

    #[test]
    fn mandatory_option_missing_errors() {
        let (mut arena, root) = CommandArena::new("app");
        arena
            .get_mut(root)
            .add_option(Opt::new("--token <t>", "").unwrap().mandatory())
            .unwrap();
        arena.get_mut(root).set_action(|_cmd: &Command| HookOutcome::ok());
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&[]), &mut sinks);
        let err = outcome.resolve().unwrap_err();
        assert_eq!(err.code, "commander.missingMandatoryOptionValue");
    }

    #[test]
    fn conflicting_options_error() {
        let (mut arena, root) = CommandArena::new("app");
        arena
            .get_mut(root)
            .add_option(Opt::new("--silent", "").unwrap().conflicts_with("verbose"))
            .unwrap();
        arena
            .get_mut(root)
            .add_option(Opt::new("--verbose", "").unwrap())
            .unwrap();
        arena.get_mut(root).set_action(|_cmd: &Command| HookOutcome::ok());
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(
            &mut arena,
            root,
            toks(&["--silent", "--verbose"]),
            &mut sinks,
        );
        let err = outcome.resolve().unwrap_err();
        assert_eq!(err.code, "commander.conflictingOption");
    }

    #[test]
    fn hooks_ordered_root_to_leaf_across_three_levels() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static ORDER: AtomicUsize = AtomicUsize::new(0);
        static PRE_ROOT: AtomicUsize = AtomicUsize::new(0);
        static PRE_MID: AtomicUsize = AtomicUsize::new(0);
        static PRE_LEAF: AtomicUsize = AtomicUsize::new(0);
        static POST_ROOT: AtomicUsize = AtomicUsize::new(0);
        static POST_MID: AtomicUsize = AtomicUsize::new(0);
        static POST_LEAF: AtomicUsize = AtomicUsize::new(0);

        fn mark(slot: &AtomicUsize) {
            slot.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        }
        fn pre_root(_ctx: &HookContext) -> HookOutcome { mark(&PRE_ROOT); HookOutcome::ok() }
        fn pre_mid(_ctx: &HookContext) -> HookOutcome { mark(&PRE_MID); HookOutcome::ok() }
        fn pre_leaf(_ctx: &HookContext) -> HookOutcome { mark(&PRE_LEAF); HookOutcome::ok() }
        fn post_root(_ctx: &HookContext) -> HookOutcome { mark(&POST_ROOT); HookOutcome::ok() }
        fn post_mid(_ctx: &HookContext) -> HookOutcome { mark(&POST_MID); HookOutcome::ok() }
        fn post_leaf(_ctx: &HookContext) -> HookOutcome { mark(&POST_LEAF); HookOutcome::ok() }
        fn noop_action(_cmd: &Command) -> HookOutcome { HookOutcome::ok() }

        let (mut arena, root) = CommandArena::new("app");
        arena.get_mut(root).on(HookEvent::PreAction, pre_root);
        arena.get_mut(root).on(HookEvent::PostAction, post_root);
        let mid = arena.add_command(root, "mid").unwrap();
        arena.get_mut(mid).on(HookEvent::PreAction, pre_mid);
        arena.get_mut(mid).on(HookEvent::PostAction, post_mid);
        let leaf = arena.add_command(mid, "leaf").unwrap();
        arena.get_mut(leaf).on(HookEvent::PreAction, pre_leaf);
        arena.get_mut(leaf).on(HookEvent::PostAction, post_leaf);
        arena.get_mut(leaf).set_action(noop_action);

        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["mid", "leaf"]), &mut sinks);
        assert!(outcome.resolve().is_ok());

        assert!(PRE_ROOT.load(Ordering::SeqCst) < PRE_MID.load(Ordering::SeqCst));
        assert!(PRE_MID.load(Ordering::SeqCst) < PRE_LEAF.load(Ordering::SeqCst));
        assert!(PRE_LEAF.load(Ordering::SeqCst) < POST_LEAF.load(Ordering::SeqCst));
        assert!(POST_LEAF.load(Ordering::SeqCst) < POST_MID.load(Ordering::SeqCst));
        assert!(POST_MID.load(Ordering::SeqCst) < POST_ROOT.load(Ordering::SeqCst));
    }

    #[test]
    fn unknown_command_with_children_suggests_closest() {
        let (mut arena, root) = CommandArena::new("app");
        arena.add_command(root, "serve").unwrap();
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&["serv"]), &mut sinks);
        let err = outcome.resolve().unwrap_err();
        assert_eq!(err.code, "commander.unknownCommand");
        assert!(err.message.contains("serve"));
    }

    #[test]
    fn hooks_fire_around_action_in_declared_order() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static ORDER: AtomicUsize = AtomicUsize::new(0);
        static PRE: AtomicUsize = AtomicUsize::new(0);
        static ACT: AtomicUsize = AtomicUsize::new(0);
        static POST: AtomicUsize = AtomicUsize::new(0);

        fn pre(_ctx: &HookContext) -> HookOutcome {
            PRE.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            HookOutcome::ok()
        }
        fn post(_ctx: &HookContext) -> HookOutcome {
            POST.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            HookOutcome::ok()
        }
        fn action(_cmd: &Command) -> HookOutcome {
            ACT.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            HookOutcome::ok()
        }

        let (mut arena, root) = CommandArena::new("app");
        arena.get_mut(root).on(HookEvent::PreAction, pre);
        arena.get_mut(root).on(HookEvent::PostAction, post);
        arena.get_mut(root).set_action(action);
        let mut sinks = OutputSinks::default();
        let outcome = dispatch(&mut arena, root, toks(&[]), &mut sinks);
        assert!(outcome.resolve().is_ok());
        assert!(PRE.load(Ordering::SeqCst) < ACT.load(Ordering::SeqCst));
        assert!(ACT.load(Ordering::SeqCst) < POST.load(Ordering::SeqCst));
    }
}
