//! Fluent assembly of a [`GlobalMetadata`] tree.
//!
//! The builder is the programmatic replacement for reflection-style loaders:
//! commands and options are declared explicitly, then [`CliBuilder::build`]
//! runs the two-pass group fold and every definition-time invariant check.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    CommandGroupMetadata, CommandMetadata, DefinitionError, GlobalMetadata, OptionMetadata,
    OptionScope, ValueKind,
};

/// Builder for one command group.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    name: String,
    description: String,
    discussion: Option<String>,
    options: Vec<OptionMetadata>,
    default_command: Option<String>,
    commands: Vec<CommandMetadata>,
}

impl GroupBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            discussion: None,
            options: Vec::new(),
            default_command: None,
            commands: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn discussion(mut self, discussion: impl Into<String>) -> Self {
        self.discussion = Some(discussion.into());
        self
    }

    /// Add a group-scoped option.
    pub fn option(mut self, option: OptionMetadata) -> Self {
        self.options.push(option);
        self
    }

    /// Name of the command run when no command token follows the group name.
    /// Must resolve to a member command at build time.
    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    pub fn command(mut self, command: CommandMetadata) -> Self {
        self.commands.push(command);
        self
    }
}

/// Builder for a complete CLI definition.
#[derive(Debug, Clone)]
pub struct CliBuilder {
    name: String,
    nav_order: Option<i32>,
    description: String,
    options: Vec<OptionMetadata>,
    default_command: Option<String>,
    commands: Vec<CommandMetadata>,
    groups: Vec<GroupBuilder>,
}

impl CliBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nav_order: None,
            description: String::new(),
            options: Vec::new(),
            default_command: None,
            commands: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn nav_order(mut self, nav_order: i32) -> Self {
        self.nav_order = Some(nav_order);
        self
    }

    /// Add a global option, available before any group or command token.
    pub fn option(mut self, option: OptionMetadata) -> Self {
        self.options.push(option);
        self
    }

    /// Add an ungrouped command. Commands carrying group membership tags are
    /// folded into those groups by [`build`](Self::build).
    pub fn command(mut self, command: CommandMetadata) -> Self {
        self.commands.push(command);
        self
    }

    /// Name of the command run when the input names no group and no command.
    /// Must resolve to an ungrouped command at build time.
    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    pub fn group(mut self, group: GroupBuilder) -> Self {
        self.groups.push(group);
        self
    }

    /// Assemble the metadata tree and run every definition-time check.
    pub fn build(self) -> Result<GlobalMetadata, DefinitionError> {
        for option in &self.options {
            check_option(option)?;
        }
        for group in &self.groups {
            for option in &group.options {
                check_option(option)?;
            }
        }

        let global_options: Vec<Arc<OptionMetadata>> = self
            .options
            .into_iter()
            .map(|option| Arc::new(option.with_scope(OptionScope::Global)))
            .collect();

        let mut ungrouped: Vec<Arc<CommandMetadata>> =
            self.commands.into_iter().map(Arc::new).collect();

        // Explicit group declarations first; the fold below may extend them.
        let mut groups: Vec<CommandGroupMetadata> = Vec::with_capacity(self.groups.len());
        let mut group_defaults: Vec<Option<String>> = Vec::with_capacity(self.groups.len());
        for builder in self.groups {
            if groups.iter().any(|group| group.name() == builder.name) {
                return Err(DefinitionError::DuplicateGroup { name: builder.name });
            }
            let options = builder
                .options
                .into_iter()
                .map(|option| Arc::new(option.with_scope(OptionScope::Group)))
                .collect();
            let commands = builder.commands.into_iter().map(Arc::new).collect();
            groups.push(CommandGroupMetadata::assemble(
                builder.name,
                builder.description,
                builder.discussion,
                options,
                None,
                commands,
            ));
            group_defaults.push(builder.default_command);
        }

        fold_tagged_commands(&mut ungrouped, &mut groups, &mut group_defaults);

        // Group defaults resolve against the post-fold member lists.
        for (group, default) in groups.iter_mut().zip(group_defaults) {
            if let Some(name) = default {
                let Some(member) = group.find_command(&name).cloned() else {
                    return Err(DefinitionError::DanglingDefaultCommand {
                        command: name,
                        scope: format!("group '{}'", group.name()),
                    });
                };
                group.set_default_command(member);
            }
        }

        check_duplicate_commands(&ungrouped, "the top-level commands")?;
        for group in &groups {
            check_duplicate_commands(group.commands(), &format!("group '{}'", group.name()))?;
        }

        let default_command = match self.default_command {
            Some(name) => match ungrouped.iter().find(|command| command.name() == name) {
                Some(command) => Some(command.clone()),
                None => {
                    return Err(DefinitionError::DanglingDefaultCommand {
                        command: name,
                        scope: "the top-level commands".to_string(),
                    });
                }
            },
            None => None,
        };

        for command in &ungrouped {
            check_resolved_names(&global_options, &[], command)?;
        }
        for group in &groups {
            for command in group.commands() {
                check_resolved_names(&global_options, group.group_options(), command)?;
            }
        }

        Ok(GlobalMetadata::assemble(
            self.name,
            self.nav_order,
            self.description,
            global_options,
            default_command,
            ungrouped,
            groups.into_iter().map(Arc::new).collect(),
        ))
    }
}

fn check_option(option: &OptionMetadata) -> Result<(), DefinitionError> {
    if option.names().is_empty() || option.names().iter().any(String::is_empty) {
        return Err(DefinitionError::EmptyOptionNames);
    }
    if option.value_arity() == 0 && *option.kind() != ValueKind::Bool {
        return Err(DefinitionError::FlagArity {
            option: option.title().to_string(),
            kind: option.kind().label().to_string(),
        });
    }
    Ok(())
}

/// Second assembly pass: commands that declare group membership tags join
/// those groups (created on demand) and leave the ungrouped list. A command
/// declared inside one group and tagged with another joins both.
fn fold_tagged_commands(
    ungrouped: &mut Vec<Arc<CommandMetadata>>,
    groups: &mut Vec<CommandGroupMetadata>,
    group_defaults: &mut Vec<Option<String>>,
) {
    let mut all: Vec<Arc<CommandMetadata>> = ungrouped.clone();
    for group in groups.iter() {
        all.extend(group.commands().iter().cloned());
    }

    for command in &all {
        for tag in command.group_names() {
            match groups.iter().position(|group| group.name() == tag.as_str()) {
                Some(index) => {
                    let group = &mut groups[index];
                    if !group.contains(command) && group.find_command(command.name()).is_none() {
                        group.push_command(command.clone());
                    }
                }
                None => {
                    groups.push(CommandGroupMetadata::assemble(
                        tag.clone(),
                        String::new(),
                        None,
                        Vec::new(),
                        None,
                        vec![command.clone()],
                    ));
                    group_defaults.push(None);
                }
            }
        }
    }

    ungrouped.retain(|command| command.group_names().is_empty());
}

fn check_duplicate_commands(
    commands: &[Arc<CommandMetadata>],
    scope: &str,
) -> Result<(), DefinitionError> {
    let mut seen: HashMap<&str, &Arc<CommandMetadata>> = HashMap::new();
    for command in commands {
        if let Some(previous) = seen.insert(command.name(), command) {
            if !Arc::ptr_eq(previous, command) {
                return Err(DefinitionError::DuplicateCommand {
                    name: command.name().to_string(),
                    scope: scope.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// No two distinct options within one command's resolved set may share a
/// name string.
fn check_resolved_names(
    global: &[Arc<OptionMetadata>],
    group: &[Arc<OptionMetadata>],
    command: &Arc<CommandMetadata>,
) -> Result<(), DefinitionError> {
    for option in command.command_options() {
        check_option(option)?;
    }

    let mut claimed: HashMap<&str, &Arc<OptionMetadata>> = HashMap::new();
    let resolved = global
        .iter()
        .chain(group.iter())
        .chain(command.command_options().iter());
    for option in resolved {
        for name in option.names() {
            if let Some(previous) = claimed.insert(name, option) {
                if !Arc::ptr_eq(previous, option) {
                    return Err(DefinitionError::AmbiguousOptionName {
                        name: name.clone(),
                        first: previous.title().to_string(),
                        second: option.title().to_string(),
                        command: command.name().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgumentsMetadata;

    fn show() -> CommandMetadata {
        CommandMetadata::new("show").option(OptionMetadata::flag(["-n"]))
    }

    fn add() -> CommandMetadata {
        CommandMetadata::new("add")
            .option(OptionMetadata::valued(["-t"], ValueKind::String))
            .arguments(ArgumentsMetadata::new("name-url"))
    }

    #[test]
    fn builds_groups_and_defaults() {
        let global = CliBuilder::new("git")
            .option(OptionMetadata::flag(["-v", "--verbose"]))
            .group(
                GroupBuilder::new("remote")
                    .default_command("show")
                    .command(show())
                    .command(add()),
            )
            .build()
            .unwrap();

        let remote = global.find_group("remote").unwrap();
        assert_eq!(remote.commands().len(), 2);
        assert_eq!(remote.default_command().unwrap().name(), "show");
        assert_eq!(global.global_options().len(), 1);
        assert_eq!(global.global_options()[0].scope(), crate::OptionScope::Global);
    }

    #[test]
    fn folds_tagged_commands_into_groups() {
        let global = CliBuilder::new("git")
            .group(GroupBuilder::new("remote").command(show()))
            .command(CommandMetadata::new("prune").in_group("remote"))
            .command(CommandMetadata::new("status"))
            .build()
            .unwrap();

        let remote = global.find_group("remote").unwrap();
        assert!(remote.find_command("prune").is_some());
        // Folded commands leave the ungrouped list; untagged ones stay.
        assert!(global.find_command("prune").is_none());
        assert!(global.find_command("status").is_some());
    }

    #[test]
    fn fold_creates_missing_groups() {
        let global = CliBuilder::new("git")
            .command(CommandMetadata::new("gc").in_group("maintenance"))
            .build()
            .unwrap();

        let group = global.find_group("maintenance").unwrap();
        assert_eq!(group.commands().len(), 1);
        assert_eq!(group.commands()[0].name(), "gc");
    }

    #[test]
    fn group_default_resolves_against_folded_members() {
        let global = CliBuilder::new("git")
            .group(GroupBuilder::new("remote").default_command("prune"))
            .command(CommandMetadata::new("prune").in_group("remote"))
            .build()
            .unwrap();

        let remote = global.find_group("remote").unwrap();
        assert_eq!(remote.default_command().unwrap().name(), "prune");
    }

    #[test]
    fn dangling_group_default_is_rejected() {
        let err = CliBuilder::new("git")
            .group(GroupBuilder::new("remote").default_command("show"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DanglingDefaultCommand { .. }));
    }

    #[test]
    fn dangling_global_default_is_rejected() {
        let err = CliBuilder::new("git")
            .command(show())
            .default_command("status")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DanglingDefaultCommand {
                command: "status".to_string(),
                scope: "the top-level commands".to_string(),
            }
        );
    }

    #[test]
    fn ambiguous_option_names_are_rejected() {
        let err = CliBuilder::new("git")
            .option(OptionMetadata::flag(["-v", "--verbose"]))
            .command(CommandMetadata::new("log").option(OptionMetadata::flag(["-v"])))
            .build()
            .unwrap_err();
        match err {
            DefinitionError::AmbiguousOptionName { name, command, .. } => {
                assert_eq!(name, "-v");
                assert_eq!(command, "log");
            }
            other => panic!("expected AmbiguousOptionName, got: {other:?}"),
        }
    }

    #[test]
    fn same_name_in_sibling_commands_is_fine() {
        let built = CliBuilder::new("git")
            .command(CommandMetadata::new("log").option(OptionMetadata::flag(["-n"])))
            .command(CommandMetadata::new("show").option(OptionMetadata::flag(["-n"])))
            .build();
        assert!(built.is_ok());
    }

    #[test]
    fn zero_arity_non_bool_is_rejected() {
        let err = CliBuilder::new("git")
            .option(OptionMetadata::valued(["-n"], ValueKind::Integer).arity(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::FlagArity { .. }));
    }

    #[test]
    fn duplicate_command_names_are_rejected() {
        let err = CliBuilder::new("git")
            .command(CommandMetadata::new("show"))
            .command(CommandMetadata::new("show"))
            .build()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateCommand { .. }));
    }
}
