use thiserror::Error;
use tiller_metadata::OptionScope;

/// Parse failures, one variant per reportable condition.
///
/// Parsing is a pure function of its input; every error is terminal and is
/// returned to the caller as a value. Nothing in the engine prints or logs
/// the failure itself, so each variant carries the context a caller needs to
/// render a message: offending tokens, option titles, argument titles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// No command resolved and no input to blame.
    #[error("no command specified")]
    CommandMissing,

    /// Leading tokens matched neither a group nor a command name.
    #[error("'{}' is not a recognized command", .tokens.join(" "))]
    CommandUnrecognized { tokens: Vec<String> },

    /// The command requires positional arguments and none were supplied.
    #[error("required argument '{title}' is missing")]
    ArgumentsMissing { title: String },

    /// Trailing tokens could not be classified.
    #[error("unexpected arguments: {}", .tokens.join(", "))]
    ArgumentsUnexpected { tokens: Vec<String> },

    /// Input ended while an option still awaited its promised value tokens.
    #[error("option '{option}' requires a value")]
    OptionMissingValue { option: String },

    /// A required option never appeared.
    #[error("required option '{option}' is missing")]
    OptionMissing { option: String },

    /// A parsed option is not in the resolved command's option set. The
    /// scope records where the stray option was declared.
    #[error("{scope} option '{option}' is not valid for the resolved command")]
    OptionUnexpected { option: String, scope: OptionScope },

    /// A token could not be converted to the declared value type.
    #[error("cannot convert '{token}' to {kind} for '{target}': {reason}")]
    Conversion {
        token: String,
        target: String,
        kind: String,
        reason: String,
    },
}
