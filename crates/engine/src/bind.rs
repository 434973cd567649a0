//! Binding resolved invocations onto plain data.
//!
//! The engine stops at an [`Invocation`]: descriptors plus converted values.
//! Binding folds that against the command's declared option set — options
//! absent from the multimap fall back to their declared default — and hands
//! the caller a [`BoundCommand`] to pull typed values from. Callers with
//! their own command representations implement [`FromInvocation`] on top.

use indexmap::IndexMap;

use crate::convert::{TypeConverter, Value};
use crate::error::ParseError;
use crate::{Cli, Invocation};

/// Plain-data result of binding an invocation.
///
/// Holds one entry per declared option that has values (parsed or default),
/// keyed by the option's title, plus the positional values in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCommand {
    command: String,
    options: IndexMap<String, Vec<Value>>,
    arguments: Vec<Value>,
}

impl BoundCommand {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All values bound to the option with this title.
    pub fn values(&self, title: &str) -> &[Value] {
        self.options
            .get(title)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First bound value, if any.
    pub fn first(&self, title: &str) -> Option<&Value> {
        self.values(title).first()
    }

    /// Whether a boolean flag was set (or defaulted to true).
    pub fn flag(&self, title: &str) -> bool {
        self.first(title).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn option_entries(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.options
            .iter()
            .map(|(title, values)| (title.as_str(), values.as_slice()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let options: serde_json::Map<String, serde_json::Value> = self
            .options
            .iter()
            .map(|(title, values)| {
                let rendered: Vec<serde_json::Value> =
                    values.iter().map(Value::to_json).collect();
                (title.clone(), serde_json::Value::Array(rendered))
            })
            .collect();
        let arguments: Vec<serde_json::Value> =
            self.arguments.iter().map(Value::to_json).collect();
        serde_json::json!({
            "command": self.command,
            "options": options,
            "arguments": arguments,
        })
    }
}

/// Fold an invocation against its command's declared options.
///
/// Iteration is over the resolved option set, so entries appear in scope
/// declaration order regardless of the order options were typed in.
pub(crate) fn bind(
    cli: &Cli,
    invocation: &Invocation,
    converter: &TypeConverter,
) -> Result<BoundCommand, ParseError> {
    let mut options: IndexMap<String, Vec<Value>> = IndexMap::new();
    for option in cli.resolved_options_for(invocation) {
        if let Some(values) = invocation.options().get(&option) {
            options.insert(option.title().to_string(), values.to_vec());
        } else if let Some(raw) = option.declared_default() {
            let value = converter.convert(option.title(), option.kind(), raw)?;
            options.insert(option.title().to_string(), vec![value]);
        }
    }

    Ok(BoundCommand {
        command: invocation.command().name().to_string(),
        options,
        arguments: invocation.arguments().to_vec(),
    })
}

/// Seam for callers that map bound values onto their own command types.
pub trait FromInvocation: Sized {
    type Error;

    fn from_invocation(bound: &BoundCommand) -> Result<Self, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_metadata::{
        ArgumentsMetadata, CliBuilder, CommandMetadata, OptionMetadata, ValueKind,
    };

    fn cli() -> Cli {
        let metadata = CliBuilder::new("tool")
            .option(OptionMetadata::flag(["-v"]))
            .command(
                CommandMetadata::new("serve")
                    .option(
                        OptionMetadata::valued(["--port"], ValueKind::Integer)
                            .default_value("8080"),
                    )
                    .option(OptionMetadata::valued(["--host"], ValueKind::String))
                    .arguments(ArgumentsMetadata::new("roots")),
            )
            .build()
            .unwrap();
        Cli::new(metadata).unwrap()
    }

    #[test]
    fn absent_options_fall_back_to_declared_defaults() {
        let cli = cli();
        let bound = cli.bind(&cli.parse(["serve", "www"]).unwrap()).unwrap();

        assert_eq!(bound.command(), "serve");
        assert_eq!(bound.first("--port"), Some(&Value::Integer(8080)));
        // No default declared and not supplied: no entry at all.
        assert!(bound.first("--host").is_none());
        assert!(!bound.flag("-v"));
        assert_eq!(bound.arguments(), &[Value::String("www".to_string())]);
    }

    #[test]
    fn parsed_values_win_over_defaults() {
        let cli = cli();
        let bound = cli
            .bind(&cli.parse(["-v", "serve", "--port", "9000"]).unwrap())
            .unwrap();

        assert!(bound.flag("-v"));
        assert_eq!(bound.first("--port"), Some(&Value::Integer(9000)));
    }

    #[test]
    fn entries_follow_scope_declaration_order() {
        let cli = cli();
        let bound = cli
            .bind(&cli.parse(["serve", "--host", "a", "-v"]).unwrap())
            .unwrap();

        let titles: Vec<&str> = bound.option_entries().map(|(title, _)| title).collect();
        // Global before command options, ports before hosts as declared.
        assert_eq!(titles, vec!["-v", "--port", "--host"]);
    }

    #[derive(Debug, PartialEq)]
    struct Serve {
        port: i64,
        verbose: bool,
        roots: Vec<String>,
    }

    impl FromInvocation for Serve {
        type Error = String;

        fn from_invocation(bound: &BoundCommand) -> Result<Self, String> {
            let port = bound
                .first("--port")
                .and_then(Value::as_integer)
                .ok_or_else(|| "missing --port".to_string())?;
            let roots = bound
                .arguments()
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect();
            Ok(Serve {
                port,
                verbose: bound.flag("-v"),
                roots,
            })
        }
    }

    #[test]
    fn typed_targets_build_from_bound_values() {
        let cli = cli();
        let bound = cli.bind(&cli.parse(["serve", "www"]).unwrap()).unwrap();
        let serve = Serve::from_invocation(&bound).unwrap();
        assert_eq!(
            serve,
            Serve {
                port: 8080,
                verbose: false,
                roots: vec!["www".to_string()],
            }
        );
    }

    #[test]
    fn renders_json() {
        let cli = cli();
        let bound = cli.bind(&cli.parse(["serve", "www"]).unwrap()).unwrap();
        let json = bound.to_json();
        assert_eq!(json["command"], "serve");
        assert_eq!(json["options"]["--port"][0], 8080);
        assert_eq!(json["arguments"][0], "www");
    }
}
