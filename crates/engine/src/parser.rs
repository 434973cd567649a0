//! Token-classification state machine.
//!
//! One pass over the raw tokens against a [`GlobalMetadata`] tree: global
//! options first, then an optional group name (widening the option scope to
//! the group's options), then a command name (widening again), then an
//! interleave of option matching and positional collection until the tokens
//! run out. A bare `--` switches permanently to positional passthrough.
//! Tokens that match nothing land in the state's unparsed input for the
//! validator to report.

use std::iter::Peekable;
use std::sync::Arc;
use std::vec;

use tiller_metadata::{ArgumentsMetadata, CommandMetadata, GlobalMetadata, OptionMetadata};

use crate::convert::{TypeConverter, Value};
use crate::error::ParseError;
use crate::state::{Context, ParseState};

const SEPARATOR: &str = "--";

type Tokens = Peekable<vec::IntoIter<String>>;

pub(crate) struct Parser<'a> {
    metadata: &'a GlobalMetadata,
    converter: &'a TypeConverter,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(metadata: &'a GlobalMetadata, converter: &'a TypeConverter) -> Self {
        Self { metadata, converter }
    }

    pub(crate) fn parse(&self, args: Vec<String>) -> Result<ParseState, ParseError> {
        let mut tokens: Tokens = args.into_iter().peekable();
        let mut state = ParseState::new();

        let mut scope: Vec<Arc<OptionMetadata>> = self.metadata.global_options().to_vec();
        self.parse_options(&mut tokens, &mut state, Context::Global, &scope)?;

        if let Some(peek) = tokens.peek() {
            if let Some(group) = self.metadata.find_group(peek).cloned() {
                tokens.next();
                tracing::debug!(group = group.name(), "matched command group");
                scope.extend(group.group_options().iter().cloned());
                state.group = Some(group);
                state.context = Context::Group;
                self.parse_options(&mut tokens, &mut state, Context::Group, &scope)?;
            }
        }

        let candidates: Vec<Arc<CommandMetadata>> = match state.group.as_ref() {
            Some(group) => group.commands().to_vec(),
            None => self.metadata.commands().to_vec(),
        };

        let Some(peek) = tokens.peek() else {
            return Ok(state);
        };
        match candidates.iter().find(|command| command.name() == peek.as_str()) {
            None => {
                // Nothing at this position can match anymore; everything
                // left is unparsed input.
                state.unparsed.extend(tokens);
            }
            Some(command) => {
                let command = command.clone();
                tokens.next();
                tracing::debug!(command = command.name(), "matched command");
                scope.extend(command.command_options().iter().cloned());
                state.command = Some(command.clone());
                state.context = Context::Command;

                while tokens.peek().is_some() {
                    self.parse_options(&mut tokens, &mut state, Context::Command, &scope)?;
                    self.parse_arguments(&mut tokens, &mut state, command.arguments_slot())?;
                }
            }
        }

        Ok(state)
    }

    /// Consume as many leading option occurrences as match `allowed`.
    /// `resume` is the context restored after each completed option.
    fn parse_options(
        &self,
        tokens: &mut Tokens,
        state: &mut ParseState,
        resume: Context,
        allowed: &[Arc<OptionMetadata>],
    ) -> Result<(), ParseError> {
        while let Some(peek) = tokens.peek() {
            let Some(option) = allowed.iter().find(|option| option.matches(peek)).cloned()
            else {
                break;
            };
            tokens.next();
            tracing::trace!(option = option.title(), "matched option");
            state.context = Context::Option;
            state.pending_option = Some(option.clone());

            if option.value_arity() == 0 {
                state.options.push(&option, Value::Bool(true));
            } else {
                let mut values = Vec::with_capacity(option.value_arity());
                while values.len() < option.value_arity() {
                    let Some(token) = tokens.next() else {
                        // Promised values never arrived: end the pass in
                        // Option context with nothing bound.
                        return Ok(());
                    };
                    values.push(self.converter.convert(
                        option.title(),
                        option.kind(),
                        &token,
                    )?);
                }
                for value in values {
                    state.options.push(&option, value);
                }
            }

            state.pending_option = None;
            state.context = resume;
        }
        Ok(())
    }

    fn parse_arguments(
        &self,
        tokens: &mut Tokens,
        state: &mut ParseState,
        arguments: Option<&ArgumentsMetadata>,
    ) -> Result<(), ParseError> {
        let Some(peek) = tokens.peek() else {
            return Ok(());
        };
        if peek.as_str() == SEPARATOR {
            tokens.next();
            state.context = Context::Args;
            tracing::trace!("separator seen; remaining tokens are positional");
            while tokens.peek().is_some() {
                self.parse_argument(tokens, state, arguments, true)?;
            }
            return Ok(());
        }
        self.parse_argument(tokens, state, arguments, false)
    }

    /// Consume one token as a positional value. Without the separator, a
    /// single-value slot stops absorbing once filled and a command without
    /// an arguments slot absorbs nothing; such tokens become unparsed input.
    fn parse_argument(
        &self,
        tokens: &mut Tokens,
        state: &mut ParseState,
        arguments: Option<&ArgumentsMetadata>,
        raw: bool,
    ) -> Result<(), ParseError> {
        let Some(token) = tokens.next() else {
            return Ok(());
        };
        match arguments {
            Some(slot) if raw || slot.is_multiple() || state.arguments.is_empty() => {
                let value =
                    self.converter
                        .convert(slot.title_text(), slot.value_kind(), &token)?;
                state.arguments.push(value);
            }
            _ => state.unparsed.push(token),
        }
        Ok(())
    }
}
