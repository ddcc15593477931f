//! The help interface contract (spec.md §6 "Help command contract").
//!
//! Grounded in the teacher's `display::print_app_header` /
//! `display::print_usage` / `display::print_item_list`, wired to the
//! arena-indexed command tree and to spec.md's implicit-vs-explicit help
//! command and `-h, --help` option rules.

use crate::command::{Command, CommandArena, CommandId, HelpCommandState, HelpOptionState};
use crate::display::OutputSinks;

/// The flags that trigger this command's help option, or `None` if help
/// is disabled on it.
pub fn help_flags(cmd: &Command) -> Option<(Option<String>, Option<String>)> {
    match &cmd.help_option {
        HelpOptionState::Default => Some((Some("-h".to_string()), Some("--help".to_string()))),
        HelpOptionState::Custom(opt) => Some((opt.short.clone(), opt.long.clone())),
        HelpOptionState::Disabled => None,
    }
}

/// True if any token in `unknown` is this command's help flag (spec.md
/// §4.3 step 8: "If a help flag token is present in `unknown`").
pub fn contains_help_flag(unknown: &[String], cmd: &Command) -> bool {
    let Some((short, long)) = help_flags(cmd) else {
        return false;
    };
    unknown
        .iter()
        .any(|t| short.as_deref() == Some(t.as_str()) || long.as_deref() == Some(t.as_str()))
}

/// Whether `token` names the help command on `cmd` (implicit default name
/// `"help"`, or the explicit name spec.md §6 allows configuring).
pub fn is_help_command_token(cmd: &Command, token: &str) -> bool {
    match &cmd.help_command {
        HelpCommandState::Implicit => token == "help",
        HelpCommandState::Explicit(name) => token == name,
        HelpCommandState::Disabled => false,
    }
}

/// Whether an implicit help child should be synthesized for `cmd` (spec.md
/// §6: "added when a command has children and no action and no `help`
/// child already").
pub fn wants_implicit_help_child(arena: &CommandArena, id: CommandId) -> bool {
    let cmd = arena.get(id);
    matches!(cmd.help_command, HelpCommandState::Implicit)
        && cmd.has_children()
        && !cmd.has_action()
        && !cmd
            .commands
            .iter()
            .any(|&c| arena.get(c).invocation_names().any(|n| n == "help"))
}

/// Renders `id`'s help screen to `sinks.out` (spec.md §6).
pub fn render_help(arena: &CommandArena, id: CommandId, sinks: &mut OutputSinks) {
    let text = build_help_text(arena, id);
    sinks.write_out(text.trim_end());
}

/// Renders `id`'s help screen to `sinks.err` — used for the "no command
/// given" path (spec.md §4.3 step 7: "show help on stderr").
pub fn render_help_to_stderr(arena: &CommandArena, id: CommandId, sinks: &mut OutputSinks) {
    let text = build_help_text(arena, id);
    sinks.write_err(text.trim_end());
}

fn build_help_text(arena: &CommandArena, id: CommandId) -> String {
    let cmd = arena.get(id);
    let path = command_path(arena, id);

    let mut out = String::new();
    out.push_str(&format!("Usage: {}{}\n", path, usage_suffix(cmd)));
    if !cmd.description.is_empty() {
        out.push('\n');
        out.push_str(&cmd.description);
        out.push('\n');
    }

    if !cmd.registered_arguments.is_empty() {
        out.push_str("\nArguments:\n");
        for arg in &cmd.registered_arguments {
            let bracket = if arg.required { format!("<{}>", arg.name) } else { format!("[{}]", arg.name) };
            out.push_str(&format!("  {bracket}\n"));
        }
    }

    if !cmd.options.iter().any(|o| !o.hidden) || help_flags(cmd).is_some() {
        out.push_str("\nOptions:\n");
        for opt in cmd.options.iter().filter(|o| !o.hidden) {
            out.push_str(&format!(
                "  {}{}  {}\n",
                opt.short.as_deref().map(|s| format!("{s}, ")).unwrap_or_default(),
                opt.long.as_deref().unwrap_or(""),
                opt.description
            ));
        }
        if let Some((short, long)) = help_flags(cmd) {
            out.push_str(&format!(
                "  {}{}  display help for command\n",
                short.map(|s| format!("{s}, ")).unwrap_or_default(),
                long.unwrap_or_default()
            ));
        }
    }

    if cmd.has_children() {
        out.push_str("\nCommands:\n");
        for &child_id in &cmd.commands {
            let child = arena.get(child_id);
            if child.hidden {
                continue;
            }
            out.push_str(&format!("  {}  {}\n", child.name, child.description));
        }
    }

    out
}

fn usage_suffix(cmd: &Command) -> String {
    if let Some(u) = &cmd.usage {
        return format!(" {u}");
    }
    let mut parts = Vec::new();
    if !cmd.options.is_empty() {
        parts.push("[options]".to_string());
    }
    if cmd.has_children() {
        parts.push("[command]".to_string());
    }
    for arg in &cmd.registered_arguments {
        parts.push(if arg.required { format!("<{}>", arg.name) } else { format!("[{}]", arg.name) });
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" {}", parts.join(" "))
    }
}

fn command_path(arena: &CommandArena, id: CommandId) -> String {
    arena
        .ancestors(id)
        .iter()
        .map(|&c| arena.get(c).name.clone())
        .collect::<Vec<_>>()
        .join(" ")
}
