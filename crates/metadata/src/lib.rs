//! Descriptor model for a declarative command-line interface.
//!
//! A CLI definition is assembled once, before any parsing, into a
//! [`GlobalMetadata`] tree: global options, command groups, commands, their
//! options and positional arguments. The tree is immutable after construction
//! and may be shared (via `Arc`) across any number of concurrent parses.
//!
//! Definitions are built either programmatically through [`CliBuilder`] or
//! from the versioned JSON format in [`definition`]. Both paths run the same
//! definition-time checks; anything that survives them is safe to hand to the
//! parsing engine.

pub mod builder;
pub mod definition;
mod error;

pub use builder::{CliBuilder, GroupBuilder};
pub use definition::CliDefinition;
pub use error::DefinitionError;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Declared type of an option or argument payload.
///
/// Built-in kinds are converted by the engine's default converter set;
/// `Custom` kinds require a converter registered under the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    Bool,
    Integer,
    Float,
    Decimal,
    String,
    /// Exact, case-sensitive match against the declared constants.
    Enum(Vec<String>),
    /// ISO-8601 calendar date (`2024-06-30`).
    Date,
    /// Converted by a caller-registered converter of the same name.
    Custom(String),
}

impl ValueKind {
    /// Short label used in diagnostics.
    pub fn label(&self) -> &str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Enum(_) => "enum",
            ValueKind::Date => "date",
            ValueKind::Custom(name) => name,
        }
    }
}

/// Scope an option was declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionScope {
    Global,
    Group,
    Command,
}

impl fmt::Display for OptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptionScope::Global => "global",
            OptionScope::Group => "group",
            OptionScope::Command => "command",
        };
        f.write_str(s)
    }
}

/// A single flag definition.
///
/// All names denote the same logical option (`-v`, `--verbose`); the first
/// name is the *title* used in diagnostics. Arity is the number of value
/// tokens one occurrence consumes; zero-arity options are boolean flags.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMetadata {
    names: Vec<String>,
    kind: ValueKind,
    arity: usize,
    description: String,
    required: bool,
    hidden: bool,
    scope: OptionScope,
    default_value: Option<String>,
}

impl OptionMetadata {
    /// A zero-arity boolean flag.
    pub fn flag<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            kind: ValueKind::Bool,
            arity: 0,
            description: String::new(),
            required: false,
            hidden: false,
            scope: OptionScope::Command,
            default_value: None,
        }
    }

    /// An option that consumes one value token of the given kind.
    pub fn valued<I, S>(names: I, kind: ValueKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut option = Self::flag(names);
        option.kind = kind;
        option.arity = 1;
        option
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Number of value tokens consumed per occurrence.
    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub(crate) fn with_scope(mut self, scope: OptionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Primary name, used in diagnostics and as the multimap key.
    pub fn title(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact-name match; any accepted name suffices.
    pub fn matches(&self, token: &str) -> bool {
        self.names.iter().any(|name| name == token)
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn value_arity(&self) -> usize {
        self.arity
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn scope(&self) -> OptionScope {
        self.scope
    }

    pub fn declared_default(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

/// The single positional-argument slot of a command.
///
/// A `multiple` slot absorbs every remaining positional token; a single slot
/// holds at most one value (except after `--`, which forces passthrough).
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentsMetadata {
    title: String,
    description: String,
    usage: String,
    required: bool,
    multiple: bool,
    kind: ValueKind,
}

impl ArgumentsMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            usage: String::new(),
            required: false,
            multiple: true,
            kind: ValueKind::String,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Verbatim synopsis placeholder, e.g. `<name> <url>`.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the slot to a single value.
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn title_text(&self) -> &str {
        &self.title
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn usage_text(&self) -> String {
        if self.usage.is_empty() {
            format!("<{}>", self.title)
        } else {
            self.usage.clone()
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn value_kind(&self) -> &ValueKind {
        &self.kind
    }
}

/// A named command: its own options, an optional positional slot, and the
/// group membership tags honored by the builder's fold pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMetadata {
    name: String,
    description: String,
    discussion: Option<String>,
    hidden: bool,
    group_names: Vec<String>,
    options: Vec<Arc<OptionMetadata>>,
    arguments: Option<ArgumentsMetadata>,
}

impl CommandMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            discussion: None,
            hidden: false,
            group_names: Vec::new(),
            options: Vec::new(),
            arguments: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Long-form discussion shown in command usage.
    pub fn discussion(mut self, discussion: impl Into<String>) -> Self {
        self.discussion = Some(discussion.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Declare membership in a named group; the builder folds the command in.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group_names.push(group.into());
        self
    }

    pub fn option(mut self, option: OptionMetadata) -> Self {
        self.options
            .push(Arc::new(option.with_scope(OptionScope::Command)));
        self
    }

    pub fn arguments(mut self, arguments: ArgumentsMetadata) -> Self {
        self.arguments = Some(arguments);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn discussion_text(&self) -> Option<&str> {
        self.discussion.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Command-scoped options only; see [`GlobalMetadata::resolved_options`]
    /// for the full set applicable to an invocation.
    pub fn command_options(&self) -> &[Arc<OptionMetadata>] {
        &self.options
    }

    pub fn arguments_slot(&self) -> Option<&ArgumentsMetadata> {
        self.arguments.as_ref()
    }
}

/// A command group: group-scoped options, member commands, and an optional
/// default command used when no command token follows the group name.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroupMetadata {
    name: String,
    description: String,
    discussion: Option<String>,
    options: Vec<Arc<OptionMetadata>>,
    default_command: Option<Arc<CommandMetadata>>,
    commands: Vec<Arc<CommandMetadata>>,
}

impl CommandGroupMetadata {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn discussion_text(&self) -> Option<&str> {
        self.discussion.as_deref()
    }

    pub fn group_options(&self) -> &[Arc<OptionMetadata>] {
        &self.options
    }

    pub fn default_command(&self) -> Option<&Arc<CommandMetadata>> {
        self.default_command.as_ref()
    }

    pub fn commands(&self) -> &[Arc<CommandMetadata>] {
        &self.commands
    }

    pub fn find_command(&self, name: &str) -> Option<&Arc<CommandMetadata>> {
        self.commands.iter().find(|command| command.name() == name)
    }

    /// Membership by identity, not by name.
    pub fn contains(&self, command: &Arc<CommandMetadata>) -> bool {
        self.commands.iter().any(|member| Arc::ptr_eq(member, command))
    }

    pub(crate) fn assemble(
        name: String,
        description: String,
        discussion: Option<String>,
        options: Vec<Arc<OptionMetadata>>,
        default_command: Option<Arc<CommandMetadata>>,
        commands: Vec<Arc<CommandMetadata>>,
    ) -> Self {
        Self { name, description, discussion, options, default_command, commands }
    }

    pub(crate) fn push_command(&mut self, command: Arc<CommandMetadata>) {
        self.commands.push(command);
    }

    pub(crate) fn set_default_command(&mut self, command: Arc<CommandMetadata>) {
        self.default_command = Some(command);
    }
}

/// Root of a CLI definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalMetadata {
    name: String,
    nav_order: Option<i32>,
    description: String,
    options: Vec<Arc<OptionMetadata>>,
    default_command: Option<Arc<CommandMetadata>>,
    commands: Vec<Arc<CommandMetadata>>,
    groups: Vec<Arc<CommandGroupMetadata>>,
}

impl GlobalMetadata {
    pub fn builder(name: impl Into<String>) -> CliBuilder {
        CliBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nav_order(&self) -> Option<i32> {
        self.nav_order
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn global_options(&self) -> &[Arc<OptionMetadata>] {
        &self.options
    }

    /// Default command applied when no group and no command token matched.
    pub fn default_command(&self) -> Option<&Arc<CommandMetadata>> {
        self.default_command.as_ref()
    }

    /// Ungrouped commands.
    pub fn commands(&self) -> &[Arc<CommandMetadata>] {
        &self.commands
    }

    pub fn groups(&self) -> &[Arc<CommandGroupMetadata>] {
        &self.groups
    }

    pub fn find_group(&self, name: &str) -> Option<&Arc<CommandGroupMetadata>> {
        self.groups.iter().find(|group| group.name() == name)
    }

    /// Ungrouped command lookup.
    pub fn find_command(&self, name: &str) -> Option<&Arc<CommandMetadata>> {
        self.commands.iter().find(|command| command.name() == name)
    }

    /// Any command, ungrouped or grouped, together with its owning group.
    pub fn find_command_anywhere(
        &self,
        name: &str,
    ) -> Option<(Arc<CommandMetadata>, Option<Arc<CommandGroupMetadata>>)> {
        if let Some(command) = self.find_command(name) {
            return Some((command.clone(), None));
        }
        for group in &self.groups {
            if let Some(command) = group.find_command(name) {
                return Some((command.clone(), Some(group.clone())));
            }
        }
        None
    }

    /// Full option set applicable to `command` when matched under `group`:
    /// global, then group, then command options, in declaration order.
    pub fn resolved_options(
        &self,
        group: Option<&CommandGroupMetadata>,
        command: &CommandMetadata,
    ) -> Vec<Arc<OptionMetadata>> {
        let mut resolved = self.options.clone();
        if let Some(group) = group {
            resolved.extend(group.group_options().iter().cloned());
        }
        resolved.extend(command.command_options().iter().cloned());
        resolved
    }

    pub(crate) fn assemble(
        name: String,
        nav_order: Option<i32>,
        description: String,
        options: Vec<Arc<OptionMetadata>>,
        default_command: Option<Arc<CommandMetadata>>,
        commands: Vec<Arc<CommandMetadata>>,
        groups: Vec<Arc<CommandGroupMetadata>>,
    ) -> Self {
        Self { name, nav_order, description, options, default_command, commands, groups }
    }
}
