use thiserror::Error;

/// Errors raised while a CLI definition is assembled or checked.
///
/// These are definition-time failures, reported before any parsing happens;
/// nothing in this taxonomy can occur while classifying tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("option declared with no names")]
    EmptyOptionNames,

    #[error(
        "option name '{name}' is claimed by both '{first}' and '{second}' \
         within the scope of command '{command}'"
    )]
    AmbiguousOptionName {
        name: String,
        first: String,
        second: String,
        command: String,
    },

    #[error("zero-arity option '{option}' must be boolean, not {kind}")]
    FlagArity { option: String, kind: String },

    #[error("command '{name}' is declared more than once in {scope}")]
    DuplicateCommand { name: String, scope: String },

    #[error("group '{name}' is declared more than once")]
    DuplicateGroup { name: String },

    #[error("default command '{command}' is not a member of {scope}")]
    DanglingDefaultCommand { command: String, scope: String },

    #[error("unsupported definition format-version {found} (expected {expected})")]
    UnsupportedFormatVersion { found: u32, expected: u32 },

    #[error("definition is not valid JSON: {message}")]
    InvalidJson { message: String },

    #[error("no converter registered for value type '{kind}' used by '{target}'")]
    UnregisteredType { kind: String, target: String },

    #[error("default value '{value}' for '{target}' is not a valid {kind}")]
    InvalidDefault {
        target: String,
        value: String,
        kind: String,
    },
}
