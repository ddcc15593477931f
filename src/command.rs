//! The command tree (spec.md §3 "Command"). Grounded in the teacher's
//! `command::FliCommand`, generalized from an owning
//! `HashMap<String, FliCommand>` into an arena of nodes addressed by
//! `CommandId` indices, per spec.md §9 ("Parent back-references ... index
//! into an arena of commands"), so ancestor state can be read without
//! re-borrowing children out of a parent.

use std::collections::HashMap;

use crate::argument::{self, Argument};
use crate::error::AuthoringError;
use crate::hooks::{ActionFn, HookEvent, HookFn, HookList};
use crate::option::Opt;
use crate::value::{Value, ValueSource};

/// Index of a `Command` inside a `CommandArena`. Not an owning pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum HelpOptionState {
    /// Auto-created on first query, using the default `-h, --help` flag.
    Default,
    Custom(Box<Opt>),
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HelpCommandState {
    /// Implicit: added only when this command has children, no action,
    /// and no `help` child already (spec.md §6).
    Implicit,
    Explicit(String),
    Disabled,
}

/// One node in the command tree.
pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,

    pub registered_arguments: Vec<Argument>,
    pub options: Vec<Opt>,
    pub commands: Vec<CommandId>,
    pub parent: Option<CommandId>,

    pub allow_unknown_option: bool,
    pub allow_excess_arguments: bool,
    pub combine_flag_and_optional_value: bool,
    pub store_options_as_properties: bool,
    pub enable_positional_options: bool,
    pub pass_through_options: bool,
    pub hidden: bool,

    pub default_command_name: Option<String>,
    pub executable_handler: bool,
    pub executable_file: Option<String>,
    pub executable_dir: Option<String>,

    pub help_option: HelpOptionState,
    pub help_command: HelpCommandState,

    pub version: Option<String>,
    pub description: String,
    pub summary: String,
    pub usage: Option<String>,
    pub args_description: Option<String>,

    pub hooks: HookList,
    pub action: Option<ActionFn>,

    // Per-invocation parse state, overwritten on every parse (spec.md §3).
    pub raw_args: Vec<String>,
    pub args: Vec<String>,
    pub processed_args: Vec<Value>,
    pub option_values: HashMap<String, Value>,
    pub option_value_sources: HashMap<String, ValueSource>,
}

impl Command {
    fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            registered_arguments: Vec::new(),
            options: Vec::new(),
            commands: Vec::new(),
            parent: None,
            allow_unknown_option: false,
            allow_excess_arguments: true,
            combine_flag_and_optional_value: true,
            store_options_as_properties: false,
            enable_positional_options: false,
            pass_through_options: false,
            hidden: false,
            default_command_name: None,
            executable_handler: false,
            executable_file: None,
            executable_dir: None,
            help_option: HelpOptionState::Default,
            help_command: HelpCommandState::Implicit,
            version: None,
            description: String::new(),
            summary: String::new(),
            usage: None,
            args_description: None,
            hooks: HookList::default(),
            action: None,
            raw_args: Vec::new(),
            args: Vec::new(),
            processed_args: Vec::new(),
            option_values: HashMap::new(),
            option_value_sources: HashMap::new(),
        }
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn has_children(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Registers an option, writing its default value with source
    /// `Default` immediately (spec.md §4.4: "Defaults are written once at
    /// option registration ... including the implicit `true` default
    /// assigned to `--no-foo`").
    pub fn add_option(&mut self, opt: Opt) -> Result<(), AuthoringError> {
        let attr = opt.attribute_name();
        if self.options.iter().any(|o| o.attribute_name() == attr) {
            return Err(AuthoringError::DuplicateOption(attr));
        }
        if let Some(default) = opt.default_value.clone() {
            self.option_values.insert(attr.clone(), default);
            self.option_value_sources.insert(attr, ValueSource::Default);
        }
        self.options.push(opt);
        Ok(())
    }

    pub fn add_argument(&mut self, arg: Argument) -> Result<(), AuthoringError> {
        argument::validate_append(&self.registered_arguments, &arg)?;
        self.registered_arguments.push(arg);
        Ok(())
    }

    pub fn add_alias(&mut self, alias: &str) -> Result<(), AuthoringError> {
        if alias == self.name {
            return Err(AuthoringError::AliasEqualsCommandName(alias.to_string()));
        }
        self.aliases.push(alias.to_string());
        Ok(())
    }

    pub fn on(&mut self, event: HookEvent, hook: HookFn) {
        self.hooks.add(event, hook);
    }

    pub fn set_action(&mut self, action: ActionFn) {
        self.action = Some(action);
    }

    /// All names this command may be invoked by: its canonical name
    /// followed by aliases, first alias being canonical for help
    /// (spec.md §3).
    pub fn invocation_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn find_option(&self, flag: &str) -> Option<&Opt> {
        self.options.iter().find(|o| o.matches_flag(flag))
    }

    pub fn find_option_mut(&mut self, flag: &str) -> Option<&mut Opt> {
        self.options.iter_mut().find(|o| o.matches_flag(flag))
    }

    pub fn find_option_by_attr(&self, attr: &str) -> Option<&Opt> {
        self.options.iter().find(|o| o.attribute_name() == attr)
    }

    pub fn visible_long_flags(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .filter(|o| !o.hidden)
            .filter_map(|o| o.long.as_deref())
    }
}

/// Owns every `Command` node; children/parents are `CommandId` indices
/// into `nodes`, never owning pointers (spec.md §9).
pub struct CommandArena {
    nodes: Vec<Command>,
}

impl CommandArena {
    pub fn new(root_name: &str) -> (Self, CommandId) {
        let mut arena = Self { nodes: Vec::new() };
        let root = arena.push(Command::bare(root_name));
        (arena, root)
    }

    fn push(&mut self, cmd: Command) -> CommandId {
        let id = CommandId(self.nodes.len());
        self.nodes.push(cmd);
        id
    }

    pub fn get(&self, id: CommandId) -> &Command {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: CommandId) -> &mut Command {
        &mut self.nodes[id.0]
    }

    /// Adds a new child command under `parent`, returning its id.
    pub fn add_command(
        &mut self,
        parent: CommandId,
        name: &str,
    ) -> Result<CommandId, AuthoringError> {
        {
            let parent_cmd = self.get(parent);
            for &child_id in &parent_cmd.commands {
                let child = self.get(child_id);
                if child.invocation_names().any(|n| n == name) {
                    return Err(AuthoringError::AliasClash(name.to_string()));
                }
            }
        }
        let mut cmd = Command::bare(name);
        cmd.parent = Some(parent);
        let id = self.push(cmd);
        self.get_mut(parent).commands.push(id);
        Ok(id)
    }

    /// Looks up a direct child of `parent` by name or alias.
    pub fn find_child(&self, parent: CommandId, token: &str) -> Option<CommandId> {
        self.get(parent)
            .commands
            .iter()
            .copied()
            .find(|&id| self.get(id).invocation_names().any(|n| n == token))
    }

    pub fn ancestors(&self, id: CommandId) -> Vec<CommandId> {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            path.push(c);
            cur = self.get(c).parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_command_creates_child() {
        let (mut arena, root) = CommandArena::new("app");
        let child = arena.add_command(root, "build").unwrap();
        assert_eq!(arena.get(child).name, "build");
        assert_eq!(arena.get(child).parent, Some(root));
        assert_eq!(arena.get(root).commands, vec![child]);
    }

    #[test]
    fn find_child_by_alias() {
        let (mut arena, root) = CommandArena::new("app");
        let child = arena.add_command(root, "build").unwrap();
        arena.get_mut(child).add_alias("b").unwrap();
        assert_eq!(arena.find_child(root, "b"), Some(child));
    }

    #[test]
    fn sibling_name_clash_rejected() {
        let (mut arena, root) = CommandArena::new("app");
        arena.add_command(root, "build").unwrap();
        assert!(arena.add_command(root, "build").is_err());
    }

    #[test]
    fn option_default_recorded_with_default_source() {
        let (mut arena, root) = CommandArena::new("app");
        let opt = Opt::new("--no-sauce", "").unwrap();
        arena.get_mut(root).add_option(opt).unwrap();
        let cmd = arena.get(root);
        assert_eq!(cmd.option_values.get("sauce"), Some(&Value::Bool(true)));
        assert_eq!(cmd.option_value_sources.get("sauce"), Some(&ValueSource::Default));
    }

    #[test]
    fn duplicate_option_attribute_rejected() {
        let (mut arena, root) = CommandArena::new("app");
        arena
            .get_mut(root)
            .add_option(Opt::new("-p, --port <n>", "").unwrap())
            .unwrap();
        let err = arena
            .get_mut(root)
            .add_option(Opt::new("--port <n>", "").unwrap());
        assert!(err.is_err());
    }
}
