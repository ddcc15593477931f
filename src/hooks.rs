//! Life-cycle hooks and the async-completion pipeline (spec.md §4.6, §5,
//! §9 "Async hooks & actions").
//!
//! Grounded in the teacher's callback-slot pattern
//! (`command::FliCommand::callback`, `command::PreservedOption::callback`,
//! both plain `fn(&FliCallbackData)`), generalized into ordered hook lists
//! per event plus a `HookOutcome` so a hook may defer completion without
//! pulling in an async runtime — see SPEC_FULL.md §4.6 for why.

use crate::command::{Command, CommandId};
use crate::error::Result;

/// Context handed to a life-cycle hook or action callback.
pub struct HookContext<'a> {
    pub this_command: &'a Command,
    pub other_command: &'a Command,
}

/// The three life-cycle events named in spec.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    PreSubcommand,
    PreAction,
    PostAction,
}

pub type HookFn = fn(&HookContext) -> HookOutcome;
pub type ActionFn = fn(&Command) -> HookOutcome;

/// Either an immediately-finished result, or a deferred completion thunk —
/// the Rust stand-in for "a thenable/future/task" (spec.md §9).
pub enum HookOutcome {
    Done(Result<()>),
    Pending(Box<dyn FnOnce() -> Result<()>>),
}

impl HookOutcome {
    pub fn ok() -> Self {
        HookOutcome::Done(Ok(()))
    }

    pub fn err(e: crate::error::Error) -> Self {
        HookOutcome::Done(Err(e))
    }

    /// Resolves this outcome to a final result, running the deferred thunk
    /// inline if present. This is the "resume when it completes" step from
    /// spec.md §5 — there is nothing to block on since `Pending` already
    /// holds the full continuation.
    pub fn resolve(self) -> Result<()> {
        match self {
            HookOutcome::Done(r) => r,
            HookOutcome::Pending(thunk) => thunk(),
        }
    }
}

#[derive(Default, Clone)]
pub struct HookList {
    pub(crate) pre_subcommand: Vec<HookFn>,
    pub(crate) pre_action: Vec<HookFn>,
    pub(crate) post_action: Vec<HookFn>,
}

impl HookList {
    pub fn add(&mut self, event: HookEvent, hook: HookFn) {
        match event {
            HookEvent::PreSubcommand => self.pre_subcommand.push(hook),
            HookEvent::PreAction => self.pre_action.push(hook),
            HookEvent::PostAction => self.post_action.push(hook),
        }
    }
}

/// Runs every hook registered for `event` across the ancestor chain
/// `chain` (root-first), invoking each command's hooks in declaration
/// order, per spec.md §4.6: "for `preSubcommand` and `preAction`, walk
/// ancestors root→leaf, in declaration order within each; for
/// `postAction`, walk leaf→root ... with hook lists themselves reversed
/// as a whole."
///
/// `chain` must already be ordered root-first; this function reverses it
/// internally for `PostAction`. Stops and returns the first error
/// encountered, resolving any `Pending` outcome along the way.
pub fn run_hooks(
    event: HookEvent,
    chain: &[&Command],
    other: &Command,
) -> Result<()> {
    let ordered: Vec<&&Command> = match event {
        HookEvent::PreSubcommand | HookEvent::PreAction => chain.iter().collect(),
        HookEvent::PostAction => chain.iter().rev().collect(),
    };

    for cmd in ordered {
        let hooks: &[HookFn] = match event {
            HookEvent::PreSubcommand => &cmd.hooks.pre_subcommand,
            HookEvent::PreAction => &cmd.hooks.pre_action,
            HookEvent::PostAction => &cmd.hooks.post_action,
        };
        let hooks: Vec<HookFn> = match event {
            HookEvent::PostAction => hooks.iter().rev().copied().collect(),
            _ => hooks.to_vec(),
        };
        for hook in hooks {
            let ctx = HookContext {
                this_command: cmd,
                other_command: other,
            };
            hook(&ctx).resolve()?;
        }
    }
    Ok(())
}

/// Resolves an ancestor-path (root-first) of `CommandId`s into `&Command`
/// references, used to feed `run_hooks`.
pub fn ancestor_chain<'a>(
    arena: &'a crate::command::CommandArena,
    leaf: CommandId,
) -> Vec<&'a Command> {
    let mut path = Vec::new();
    let mut cur = Some(leaf);
    while let Some(id) = cur {
        let cmd = arena.get(id);
        path.push(cmd);
        cur = cmd.parent;
    }
    path.reverse();
    path
}
