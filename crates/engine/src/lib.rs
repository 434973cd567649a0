//! Declarative command-line parsing engine.
//!
//! Feed a [`Cli`] a metadata tree (see `tiller-metadata`) and a raw token
//! sequence; get back either a fully resolved [`Invocation`] or exactly one
//! [`ParseError`]. The engine is a pure, synchronous computation: a shared
//! `&Cli` is safe across threads, every parse allocates its own state, and
//! nothing here prints or performs I/O. Tracing events are emitted at match
//! points for callers that install a subscriber.

mod bind;
mod convert;
mod error;
mod parser;
mod state;
pub mod usage;
mod validator;

pub use bind::{BoundCommand, FromInvocation};
pub use convert::{TypeConverter, Value};
pub use error::ParseError;
pub use state::{Context, ParseState, ParsedOptions};

use std::sync::Arc;

use tiller_metadata::{
    CommandGroupMetadata, CommandMetadata, DefinitionError, GlobalMetadata, OptionMetadata,
};

use crate::parser::Parser;

/// A ready-to-parse CLI: immutable metadata plus a converter registry.
///
/// Construction runs the converter-coverage checks, so a `Cli` that exists
/// can convert every value kind its definition mentions.
#[derive(Debug, Clone)]
pub struct Cli {
    metadata: Arc<GlobalMetadata>,
    converter: TypeConverter,
}

impl Cli {
    pub fn new(metadata: GlobalMetadata) -> Result<Self, DefinitionError> {
        Self::with_converter(metadata, TypeConverter::new())
    }

    pub fn with_converter(
        metadata: GlobalMetadata,
        converter: TypeConverter,
    ) -> Result<Self, DefinitionError> {
        check_converter_coverage(&metadata, &converter)?;
        Ok(Self {
            metadata: Arc::new(metadata),
            converter,
        })
    }

    pub fn metadata(&self) -> &GlobalMetadata {
        &self.metadata
    }

    pub fn converter(&self) -> &TypeConverter {
        &self.converter
    }

    /// Parse a token sequence into a resolved invocation.
    ///
    /// When no command token matched, the group default command (or, with no
    /// group matched, the global default) is substituted before validation.
    pub fn parse<I, S>(&self, args: I) -> Result<Invocation, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let state = Parser::new(&self.metadata, &self.converter).parse(args)?;
        let state = self.apply_default_command(state);
        validator::validate(&self.metadata, &state)?;
        into_invocation(state)
    }

    /// Parse with a forced target command: tokens are classified as usual,
    /// then the named command is substituted before validation. Options
    /// parsed under a scope the forced command does not belong to surface as
    /// [`ParseError::OptionUnexpected`].
    pub fn parse_with_command<I, S>(&self, name: &str, args: I) -> Result<Invocation, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some((command, _)) = self.metadata.find_command_anywhere(name) else {
            return Err(ParseError::CommandUnrecognized {
                tokens: vec![name.to_string()],
            });
        };
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let state = Parser::new(&self.metadata, &self.converter).parse(args)?;
        let state = state.with_command(command);
        validator::validate(&self.metadata, &state)?;
        into_invocation(state)
    }

    /// Fold an invocation against its declared options, applying defaults.
    pub fn bind(&self, invocation: &Invocation) -> Result<BoundCommand, ParseError> {
        bind::bind(self, invocation, &self.converter)
    }

    fn apply_default_command(&self, state: ParseState) -> ParseState {
        if state.command().is_some() {
            return state;
        }
        let fallback = match state.group() {
            Some(group) => group.default_command().cloned(),
            None => self.metadata.default_command().cloned(),
        };
        match fallback {
            Some(command) => {
                tracing::debug!(command = command.name(), "applying default command");
                state.with_command(command)
            }
            None => state,
        }
    }

    /// Option set the invocation's command answers to: global options, the
    /// owning group's options (when the command is actually a member of the
    /// matched group), and the command's own.
    pub(crate) fn resolved_options_for(&self, invocation: &Invocation) -> Vec<Arc<OptionMetadata>> {
        let group = invocation
            .group()
            .filter(|group| group.contains(invocation.command()));
        self.metadata
            .resolved_options(group.map(Arc::as_ref), invocation.command())
    }
}

/// A successfully resolved command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    command: Arc<CommandMetadata>,
    group: Option<Arc<CommandGroupMetadata>>,
    options: ParsedOptions,
    arguments: Vec<Value>,
}

impl Invocation {
    pub fn command(&self) -> &Arc<CommandMetadata> {
        &self.command
    }

    pub fn group(&self) -> Option<&Arc<CommandGroupMetadata>> {
        self.group.as_ref()
    }

    pub fn options(&self) -> &ParsedOptions {
        &self.options
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Canonical token form: group, command, one occurrence per arity-sized
    /// value chunk of each option, then `--` and the positional values.
    /// Re-parsing the result yields an equal invocation.
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(group) = &self.group {
            tokens.push(group.name().to_string());
        }
        tokens.push(self.command.name().to_string());
        for (option, values) in self.options.iter() {
            if option.value_arity() == 0 {
                for _ in values {
                    tokens.push(option.title().to_string());
                }
            } else {
                for chunk in values.chunks(option.value_arity()) {
                    tokens.push(option.title().to_string());
                    tokens.extend(chunk.iter().map(Value::to_string));
                }
            }
        }
        if !self.arguments.is_empty() {
            tokens.push("--".to_string());
            tokens.extend(self.arguments.iter().map(Value::to_string));
        }
        tokens
    }

    pub fn to_json(&self) -> serde_json::Value {
        let options: serde_json::Map<String, serde_json::Value> = self
            .options
            .iter()
            .map(|(option, values)| {
                let rendered: Vec<serde_json::Value> =
                    values.iter().map(Value::to_json).collect();
                (option.title().to_string(), serde_json::Value::Array(rendered))
            })
            .collect();
        let arguments: Vec<serde_json::Value> =
            self.arguments.iter().map(Value::to_json).collect();
        serde_json::json!({
            "command": self.command.name(),
            "group": self.group.as_ref().map(|group| group.name()),
            "options": options,
            "arguments": arguments,
        })
    }
}

fn into_invocation(state: ParseState) -> Result<Invocation, ParseError> {
    let ParseState {
        group,
        command,
        options,
        arguments,
        ..
    } = state;
    let Some(command) = command else {
        return Err(ParseError::CommandMissing);
    };
    Ok(Invocation {
        command,
        group,
        options,
        arguments,
    })
}

fn check_option_kinds(
    options: &[Arc<OptionMetadata>],
    converter: &TypeConverter,
) -> Result<(), DefinitionError> {
    for option in options {
        if !converter.supports(option.kind()) {
            return Err(DefinitionError::UnregisteredType {
                kind: option.kind().label().to_string(),
                target: option.title().to_string(),
            });
        }
        if let Some(raw) = option.declared_default() {
            if converter.convert(option.title(), option.kind(), raw).is_err() {
                return Err(DefinitionError::InvalidDefault {
                    target: option.title().to_string(),
                    value: raw.to_string(),
                    kind: option.kind().label().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_command_kinds(
    command: &CommandMetadata,
    converter: &TypeConverter,
) -> Result<(), DefinitionError> {
    check_option_kinds(command.command_options(), converter)?;
    if let Some(arguments) = command.arguments_slot() {
        if !converter.supports(arguments.value_kind()) {
            return Err(DefinitionError::UnregisteredType {
                kind: arguments.value_kind().label().to_string(),
                target: arguments.title_text().to_string(),
            });
        }
    }
    Ok(())
}

fn check_converter_coverage(
    metadata: &GlobalMetadata,
    converter: &TypeConverter,
) -> Result<(), DefinitionError> {
    check_option_kinds(metadata.global_options(), converter)?;
    for command in metadata.commands() {
        check_command_kinds(command, converter)?;
    }
    for group in metadata.groups() {
        check_option_kinds(group.group_options(), converter)?;
        for command in group.commands() {
            check_command_kinds(command, converter)?;
        }
    }
    Ok(())
}
