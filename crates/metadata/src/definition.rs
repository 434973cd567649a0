//! Versioned JSON definition format.
//!
//! A `CliDefinition` is the declarative mirror of the builder API: plain
//! serde structs with kebab-case field names, carrying a `format-version`
//! discriminator so the payload can evolve. Lowering to [`GlobalMetadata`]
//! goes through [`CliBuilder`], so a definition file is subject to exactly
//! the same checks as a programmatic definition.

use serde::{Deserialize, Serialize};

use crate::builder::{CliBuilder, GroupBuilder};
use crate::{
    ArgumentsMetadata, CommandMetadata, DefinitionError, GlobalMetadata, OptionMetadata, ValueKind,
};

/// Format version this crate reads and writes.
pub const DEFINITION_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionDef {
    pub names: Vec<String>,
    #[serde(default)]
    pub kind: ValueKind,
    /// Value tokens consumed per occurrence; defaults to 0 for `bool`
    /// options and 1 otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl OptionDef {
    fn into_option(self) -> OptionMetadata {
        let arity = self
            .arity
            .unwrap_or(if self.kind == ValueKind::Bool { 0 } else { 1 });
        let mut option = OptionMetadata::valued(self.names, self.kind).arity(arity);
        option = option.description(self.description);
        if self.required {
            option = option.required();
        }
        if self.hidden {
            option = option.hidden();
        }
        if let Some(value) = self.default_value {
            option = option.default_value(value);
        }
        option
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentsDef {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(default)]
    pub required: bool,
    /// Variable-length slot absorbing all remaining positional tokens.
    #[serde(default = "default_multiple")]
    pub multiple: bool,
    #[serde(default = "default_argument_kind")]
    pub kind: ValueKind,
}

fn default_multiple() -> bool {
    true
}

fn default_argument_kind() -> ValueKind {
    ValueKind::String
}

impl ArgumentsDef {
    fn into_arguments(self) -> ArgumentsMetadata {
        let mut arguments = ArgumentsMetadata::new(self.title)
            .description(self.description)
            .usage(self.usage)
            .kind(self.kind);
        if self.required {
            arguments = arguments.required();
        }
        if !self.multiple {
            arguments = arguments.single();
        }
        arguments
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Group membership tags honored by the builder's fold pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<ArgumentsDef>,
}

impl CommandDef {
    fn into_command(self) -> CommandMetadata {
        let mut command = CommandMetadata::new(self.name).description(self.description);
        if let Some(discussion) = self.discussion {
            command = command.discussion(discussion);
        }
        if self.hidden {
            command = command.hidden();
        }
        for group in self.groups {
            command = command.in_group(group);
        }
        for option in self.options {
            command = command.option(option.into_option());
        }
        if let Some(arguments) = self.arguments {
            command = command.arguments(arguments.into_arguments());
        }
        command
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroupDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDef>,
}

impl GroupDef {
    fn into_group(self) -> GroupBuilder {
        let mut group = GroupBuilder::new(self.name).description(self.description);
        if let Some(discussion) = self.discussion {
            group = group.discussion(discussion);
        }
        for option in self.options {
            group = group.option(option.into_option());
        }
        if let Some(default) = self.default_command {
            group = group.default_command(default);
        }
        for command in self.commands {
            group = group.command(command.into_command());
        }
        group
    }
}

/// Root of the declarative definition payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliDefinition {
    pub format_version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_order: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDef>,
}

impl CliDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            format_version: DEFINITION_FORMAT_VERSION,
            name: name.into(),
            nav_order: None,
            description: String::new(),
            options: Vec::new(),
            default_command: None,
            commands: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DefinitionError> {
        let definition: CliDefinition =
            serde_json::from_slice(bytes).map_err(|err| DefinitionError::InvalidJson {
                message: err.to_string(),
            })?;
        if definition.format_version != DEFINITION_FORMAT_VERSION {
            return Err(DefinitionError::UnsupportedFormatVersion {
                found: definition.format_version,
                expected: DEFINITION_FORMAT_VERSION,
            });
        }
        Ok(definition)
    }

    pub fn from_json_str(text: &str) -> Result<Self, DefinitionError> {
        Self::from_json_slice(text.as_bytes())
    }

    /// Encode as JSON. A stable structure is the goal, not stable whitespace.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Lower through the builder, running every definition-time check.
    pub fn into_metadata(self) -> Result<GlobalMetadata, DefinitionError> {
        let mut builder = CliBuilder::new(self.name).description(self.description);
        if let Some(nav_order) = self.nav_order {
            builder = builder.nav_order(nav_order);
        }
        for option in self.options {
            builder = builder.option(option.into_option());
        }
        if let Some(default) = self.default_command {
            builder = builder.default_command(default);
        }
        for command in self.commands {
            builder = builder.command(command.into_command());
        }
        for group in self.groups {
            builder = builder.group(group.into_group());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    {
        "format-version": 1,
        "name": "git",
        "description": "the stupid content tracker",
        "options": [
            { "names": ["-v", "--verbose"], "description": "Verbose mode" }
        ],
        "groups": [
            {
                "name": "remote",
                "description": "Manage remotes",
                "default-command": "show",
                "commands": [
                    {
                        "name": "show",
                        "options": [ { "names": ["-n"] } ]
                    },
                    {
                        "name": "add",
                        "options": [
                            { "names": ["-t"], "kind": "string", "description": "Track branch" }
                        ],
                        "arguments": { "title": "name-url", "usage": "<name> <url>" }
                    }
                ]
            }
        ]
    }
    "#;

    #[test]
    fn lowers_to_metadata() {
        let definition = CliDefinition::from_json_str(SAMPLE).unwrap();
        let global = definition.into_metadata().unwrap();

        assert_eq!(global.name(), "git");
        assert_eq!(global.global_options().len(), 1);
        let remote = global.find_group("remote").unwrap();
        assert_eq!(remote.default_command().unwrap().name(), "show");
        let add = remote.find_command("add").unwrap();
        assert_eq!(add.command_options()[0].value_arity(), 1);
        assert!(add.arguments_slot().is_some());
    }

    #[test]
    fn bool_kind_defaults_to_zero_arity() {
        let definition = CliDefinition::from_json_str(SAMPLE).unwrap();
        let global = definition.into_metadata().unwrap();
        let verbose = &global.global_options()[0];
        assert_eq!(verbose.value_arity(), 0);
        assert_eq!(*verbose.kind(), ValueKind::Bool);
    }

    #[test]
    fn rejects_unknown_format_version() {
        let err = CliDefinition::from_json_str(r#"{"format-version": 2, "name": "x"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnsupportedFormatVersion { found: 2, expected: 1 }
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let err = CliDefinition::from_json_str("{").unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidJson { .. }));
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let definition = CliDefinition::from_json_str(SAMPLE).unwrap();
        let text = definition.to_json_string();
        let reparsed = CliDefinition::from_json_str(&text).unwrap();
        assert_eq!(reparsed.name, "git");
        assert_eq!(reparsed.groups.len(), 1);
        assert_eq!(reparsed.groups[0].commands.len(), 2);
    }
}
