//! Post-parse validation.
//!
//! Turns a terminal [`ParseState`] (after any default-command substitution)
//! into either success or one specific [`ParseError`]. The checks run in a
//! fixed order and the first failing check wins; callers can rely on that
//! order when rendering diagnostics.

use std::sync::Arc;

use tiller_metadata::{CommandGroupMetadata, GlobalMetadata};

use crate::error::ParseError;
use crate::state::{Context, ParseState};

/// The group whose option scope applies to the resolved command: the matched
/// group if the command is actually one of its members, otherwise none (a
/// substituted command does not inherit the options of a group it does not
/// belong to).
fn owning_group<'a>(state: &'a ParseState) -> Option<&'a Arc<CommandGroupMetadata>> {
    let command = state.command()?;
    state.group().filter(|group| group.contains(command))
}

pub(crate) fn validate(
    metadata: &GlobalMetadata,
    state: &ParseState,
) -> Result<(), ParseError> {
    let Some(command) = state.command() else {
        if state.unparsed_input().is_empty() {
            return Err(ParseError::CommandMissing);
        }
        return Err(ParseError::CommandUnrecognized {
            tokens: state.unparsed_input().to_vec(),
        });
    };

    if let Some(arguments) = command.arguments_slot() {
        if arguments.is_required() && state.arguments().is_empty() {
            return Err(ParseError::ArgumentsMissing {
                title: arguments.title_text().to_string(),
            });
        }
    }

    if !state.unparsed_input().is_empty() {
        return Err(ParseError::ArgumentsUnexpected {
            tokens: state.unparsed_input().to_vec(),
        });
    }

    if state.context() == Context::Option {
        if let Some(option) = state.pending_option() {
            return Err(ParseError::OptionMissingValue {
                option: option.title().to_string(),
            });
        }
    }

    let resolved =
        metadata.resolved_options(owning_group(state).map(Arc::as_ref), command);

    for option in &resolved {
        if option.is_required() && !state.options().contains(option) {
            return Err(ParseError::OptionMissing {
                option: option.title().to_string(),
            });
        }
    }

    for (option, _) in state.options().iter() {
        let known = resolved
            .iter()
            .any(|candidate| Arc::ptr_eq(candidate, option));
        if !known {
            return Err(ParseError::OptionUnexpected {
                option: option.title().to_string(),
                scope: option.scope(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TypeConverter;
    use crate::parser::Parser;
    use tiller_metadata::{
        ArgumentsMetadata, CliBuilder, CommandMetadata, GroupBuilder, OptionMetadata, ValueKind,
    };

    fn metadata() -> GlobalMetadata {
        CliBuilder::new("tool")
            .option(OptionMetadata::flag(["-v"]))
            .command(
                CommandMetadata::new("copy")
                    .option(OptionMetadata::valued(["--into"], ValueKind::String).required())
                    .arguments(ArgumentsMetadata::new("sources").required()),
            )
            .command(CommandMetadata::new("status"))
            .group(
                GroupBuilder::new("remote")
                    .option(OptionMetadata::valued(["--depth"], ValueKind::Integer))
                    .default_command("show")
                    .command(CommandMetadata::new("show")),
            )
            .build()
            .unwrap()
    }

    fn run(tokens: &[&str]) -> (GlobalMetadata, ParseState) {
        let metadata = metadata();
        let converter = TypeConverter::new();
        let args = tokens.iter().map(|token| token.to_string()).collect();
        let state = Parser::new(&metadata, &converter).parse(args).unwrap();
        (metadata, state)
    }

    #[test]
    fn empty_input_is_command_missing() {
        let (metadata, state) = run(&[]);
        assert_eq!(validate(&metadata, &state), Err(ParseError::CommandMissing));
    }

    #[test]
    fn unknown_tokens_without_command_are_unrecognized() {
        let (metadata, state) = run(&["frobnicate", "now"]);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::CommandUnrecognized {
                tokens: vec!["frobnicate".to_string(), "now".to_string()],
            })
        );
    }

    #[test]
    fn missing_required_arguments_outranks_unparsed_input() {
        // A substituted command with an empty required slot wins over the
        // stray tokens that failed to match anything.
        let (metadata, state) = run(&["frobnicate"]);
        let copy = metadata.find_command("copy").unwrap().clone();
        let state = state.with_command(copy);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::ArgumentsMissing { title: "sources".to_string() })
        );
    }

    #[test]
    fn missing_required_arguments_outranks_missing_option_value() {
        let (metadata, state) = run(&["copy", "--into"]);
        assert_eq!(state.context(), Context::Option);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::ArgumentsMissing { title: "sources".to_string() })
        );
    }

    #[test]
    fn stray_scope_option_is_rejected_after_substitution() {
        // A group option parsed before the command was forced to an
        // ungrouped one is not in the resolved set.
        let (metadata, state) = run(&["remote", "--depth", "2"]);
        let status = metadata.find_command("status").unwrap().clone();
        let state = state.with_command(status);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::OptionUnexpected {
                option: "--depth".to_string(),
                scope: tiller_metadata::OptionScope::Group,
            })
        );
    }

    #[test]
    fn unparsed_input_with_command_is_arguments_unexpected() {
        let (metadata, state) = run(&["status", "leftover"]);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::ArgumentsUnexpected {
                tokens: vec!["leftover".to_string()],
            })
        );
    }

    #[test]
    fn truncated_option_value_is_reported_by_title() {
        let (metadata, state) = run(&["copy", "src", "--into"]);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::OptionMissingValue { option: "--into".to_string() })
        );
    }

    #[test]
    fn missing_required_option_names_primary_name() {
        let (metadata, state) = run(&["copy", "src"]);
        assert_eq!(
            validate(&metadata, &state),
            Err(ParseError::OptionMissing { option: "--into".to_string() })
        );
    }

    #[test]
    fn complete_invocation_validates() {
        let (metadata, state) = run(&["-v", "copy", "--into", "dst", "a", "b"]);
        assert_eq!(validate(&metadata, &state), Ok(()));
    }

    #[test]
    fn group_default_command_validates() {
        let (metadata, state) = run(&["remote"]);
        let default = state.group().unwrap().default_command().unwrap().clone();
        let state = state.with_command(default);
        assert_eq!(validate(&metadata, &state), Ok(()));
    }
}
