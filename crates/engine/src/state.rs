//! Mutable accumulator threaded through one parser run.

use std::sync::Arc;

use indexmap::IndexMap;
use tiller_metadata::{CommandGroupMetadata, CommandMetadata, OptionMetadata};

use crate::convert::Value;

/// Classification context of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Global,
    Group,
    Command,
    /// Transient: an option is awaiting one or more value tokens. Ending a
    /// parse here means a promised value never arrived.
    Option,
    /// Terminal positional collection, entered by `--`.
    Args,
}

/// Insertion-ordered multimap from option to converted values.
///
/// Repeated occurrences of an option accumulate under one entry; order is
/// accumulation order across all occurrences. Entries are keyed by the
/// option's title, which is unique within any one parse by the
/// definition-time ambiguity check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOptions {
    entries: IndexMap<String, OptionValues>,
}

#[derive(Debug, Clone, PartialEq)]
struct OptionValues {
    option: Arc<OptionMetadata>,
    values: Vec<Value>,
}

impl ParsedOptions {
    pub(crate) fn push(&mut self, option: &Arc<OptionMetadata>, value: Value) {
        self.entries
            .entry(option.title().to_string())
            .or_insert_with(|| OptionValues {
                option: option.clone(),
                values: Vec::new(),
            })
            .values
            .push(value);
    }

    pub fn contains(&self, option: &OptionMetadata) -> bool {
        self.entries.contains_key(option.title())
    }

    /// Values accumulated for an option, in input order.
    pub fn get(&self, option: &OptionMetadata) -> Option<&[Value]> {
        self.entries
            .get(option.title())
            .map(|entry| entry.values.as_slice())
    }

    /// Lookup by any accepted name of the option.
    pub fn get_by_name(&self, name: &str) -> Option<&[Value]> {
        self.entries
            .values()
            .find(|entry| entry.option.matches(name))
            .map(|entry| entry.values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<OptionMetadata>, &[Value])> {
        self.entries
            .values()
            .map(|entry| (&entry.option, entry.values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Terminal result of one parser run, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseState {
    pub(crate) context: Context,
    pub(crate) group: Option<Arc<CommandGroupMetadata>>,
    pub(crate) command: Option<Arc<CommandMetadata>>,
    pub(crate) pending_option: Option<Arc<OptionMetadata>>,
    pub(crate) options: ParsedOptions,
    pub(crate) arguments: Vec<Value>,
    pub(crate) unparsed: Vec<String>,
}

impl ParseState {
    pub(crate) fn new() -> Self {
        Self {
            context: Context::Global,
            group: None,
            command: None,
            pending_option: None,
            options: ParsedOptions::default(),
            arguments: Vec::new(),
            unparsed: Vec::new(),
        }
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn group(&self) -> Option<&Arc<CommandGroupMetadata>> {
        self.group.as_ref()
    }

    pub fn command(&self) -> Option<&Arc<CommandMetadata>> {
        self.command.as_ref()
    }

    /// The option still awaiting values when input ended, if any.
    pub fn pending_option(&self) -> Option<&Arc<OptionMetadata>> {
        self.pending_option.as_ref()
    }

    pub fn options(&self) -> &ParsedOptions {
        &self.options
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Tokens the parser could not classify.
    pub fn unparsed_input(&self) -> &[String] {
        &self.unparsed
    }

    /// The one controlled transition available after parsing: substitute a
    /// resolved default (or forced) command. Everything else is untouched,
    /// including a transient `Context::Option` left by truncated input.
    pub fn with_command(mut self, command: Arc<CommandMetadata>) -> Self {
        self.command = Some(command);
        self
    }
}
