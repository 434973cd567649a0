//! Usage text rendering.
//!
//! Read-only traversal of the metadata model; nothing here ever sees a
//! parse. Output follows the classic man-page section layout (NAME,
//! SYNOPSIS, OPTIONS, COMMANDS), with hidden options and commands omitted.

use std::sync::Arc;

use tiller_metadata::{
    CommandGroupMetadata, CommandMetadata, GlobalMetadata, OptionMetadata,
};

const INDENT: &str = "    ";

fn placeholder(option: &OptionMetadata) -> String {
    let mut out = String::new();
    for _ in 0..option.value_arity() {
        out.push_str(&format!(" <{}>", option.kind().label()));
    }
    out
}

/// `[ -v | --verbose ]` style synopsis token for one option.
fn synopsis_token(option: &OptionMetadata) -> String {
    format!("[ {}{} ]", option.names().join(" | "), placeholder(option))
}

fn synopsis_options(options: &[Arc<OptionMetadata>]) -> String {
    options
        .iter()
        .filter(|option| !option.is_hidden())
        .map(|option| synopsis_token(option))
        .collect::<Vec<_>>()
        .join(" ")
}

fn option_rows(options: &[Arc<OptionMetadata>]) -> Vec<(String, String)> {
    options
        .iter()
        .filter(|option| !option.is_hidden())
        .map(|option| {
            let left = format!("{}{}", option.names().join(", "), placeholder(option));
            let mut right = option.description_text().trim().to_string();
            if option.is_required() {
                if right.is_empty() {
                    right.push_str("(required)");
                } else {
                    right.push_str(" (required)");
                }
            }
            (left, right)
        })
        .collect()
}

fn push_section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push('\n');
}

fn push_rows(out: &mut String, rows: &[(String, String)]) {
    for (left, right) in rows {
        out.push_str(INDENT);
        out.push_str(left);
        out.push('\n');
        if !right.is_empty() {
            out.push_str(INDENT);
            out.push_str(INDENT);
            out.push_str(right);
            out.push('\n');
        }
    }
}

fn push_name(out: &mut String, path: &str, description: &str) {
    push_section(out, "NAME");
    out.push_str(INDENT);
    if description.trim().is_empty() {
        out.push_str(path);
    } else {
        out.push_str(&format!("{} - {}", path, description.trim()));
    }
    out.push('\n');
}

/// Top-level usage: global options plus every visible command, grouped
/// commands prefixed with their group name.
pub fn global_usage(global: &GlobalMetadata) -> String {
    let mut out = String::new();
    push_name(&mut out, global.name(), global.description_text());

    push_section(&mut out, "SYNOPSIS");
    out.push_str(INDENT);
    let options = synopsis_options(global.global_options());
    if options.is_empty() {
        out.push_str(&format!("{} <command> [ <args> ]", global.name()));
    } else {
        out.push_str(&format!("{} {} <command> [ <args> ]", global.name(), options));
    }
    out.push('\n');

    let rows = option_rows(global.global_options());
    if !rows.is_empty() {
        push_section(&mut out, "OPTIONS");
        push_rows(&mut out, &rows);
    }

    push_section(&mut out, "COMMANDS");
    let mut rows: Vec<(String, String)> = Vec::new();
    for command in global.commands() {
        if !command.is_hidden() {
            rows.push((
                command.name().to_string(),
                command.description_text().trim().to_string(),
            ));
        }
    }
    for group in global.groups() {
        for command in group.commands() {
            if !command.is_hidden() {
                rows.push((
                    format!("{} {}", group.name(), command.name()),
                    command.description_text().trim().to_string(),
                ));
            }
        }
    }
    push_rows(&mut out, &rows);

    out
}

/// Group usage: global + group options and the member commands, with the
/// default command marked.
pub fn group_usage(global: &GlobalMetadata, group: &CommandGroupMetadata) -> String {
    let mut out = String::new();
    let path = format!("{} {}", global.name(), group.name());
    push_name(&mut out, &path, group.description_text());

    push_section(&mut out, "SYNOPSIS");
    out.push_str(INDENT);
    let mut synopsis = global.name().to_string();
    let globals = synopsis_options(global.global_options());
    if !globals.is_empty() {
        synopsis.push_str(&format!(" {globals}"));
    }
    synopsis.push_str(&format!(" {}", group.name()));
    let groups = synopsis_options(group.group_options());
    if !groups.is_empty() {
        synopsis.push_str(&format!(" {groups}"));
    }
    synopsis.push_str(" <command> [ <args> ]");
    out.push_str(&synopsis);
    out.push('\n');

    let mut rows = option_rows(global.global_options());
    rows.extend(option_rows(group.group_options()));
    if !rows.is_empty() {
        push_section(&mut out, "OPTIONS");
        push_rows(&mut out, &rows);
    }

    push_section(&mut out, "COMMANDS");
    let rows: Vec<(String, String)> = group
        .commands()
        .iter()
        .filter(|command| !command.is_hidden())
        .map(|command| {
            let is_default = group
                .default_command()
                .is_some_and(|default| Arc::ptr_eq(default, command));
            let mut description = command.description_text().trim().to_string();
            if is_default {
                if description.is_empty() {
                    description.push_str("(default)");
                } else {
                    description.push_str(" (default)");
                }
            }
            (command.name().to_string(), description)
        })
        .collect();
    push_rows(&mut out, &rows);

    if let Some(discussion) = group.discussion_text() {
        push_section(&mut out, "DISCUSSION");
        out.push_str(INDENT);
        out.push_str(discussion.trim_end());
        out.push('\n');
    }

    out
}

/// Command usage: full resolved option set, positional slot, discussion.
pub fn command_usage(
    global: &GlobalMetadata,
    group: Option<&CommandGroupMetadata>,
    command: &CommandMetadata,
) -> String {
    let mut out = String::new();
    let path = match group {
        Some(group) => format!("{} {} {}", global.name(), group.name(), command.name()),
        None => format!("{} {}", global.name(), command.name()),
    };
    push_name(&mut out, &path, command.description_text());

    push_section(&mut out, "SYNOPSIS");
    out.push_str(INDENT);
    let mut synopsis = global.name().to_string();
    let globals = synopsis_options(global.global_options());
    if !globals.is_empty() {
        synopsis.push_str(&format!(" {globals}"));
    }
    if let Some(group) = group {
        synopsis.push_str(&format!(" {}", group.name()));
        let groups = synopsis_options(group.group_options());
        if !groups.is_empty() {
            synopsis.push_str(&format!(" {groups}"));
        }
    }
    synopsis.push_str(&format!(" {}", command.name()));
    let commands = synopsis_options(command.command_options());
    if !commands.is_empty() {
        synopsis.push_str(&format!(" {commands}"));
    }
    if let Some(arguments) = command.arguments_slot() {
        synopsis.push_str(&format!(" [--] {}", arguments.usage_text()));
    }
    out.push_str(&synopsis);
    out.push('\n');

    let rows = option_rows(&global.resolved_options(group, command));
    if !rows.is_empty() {
        push_section(&mut out, "OPTIONS");
        push_rows(&mut out, &rows);
    }

    if let Some(arguments) = command.arguments_slot() {
        push_section(&mut out, "ARGUMENTS");
        let mut description = arguments.description_text().trim().to_string();
        if arguments.is_required() {
            if description.is_empty() {
                description.push_str("(required)");
            } else {
                description.push_str(" (required)");
            }
        }
        push_rows(&mut out, &[(arguments.usage_text(), description)]);
    }

    if let Some(discussion) = command.discussion_text() {
        push_section(&mut out, "DISCUSSION");
        out.push_str(INDENT);
        out.push_str(discussion.trim_end());
        out.push('\n');
    }

    out
}

/// Markdown summary: one table of command groups, one of ungrouped
/// commands, both sorted by name.
pub fn global_summary_markdown(global: &GlobalMetadata) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n", global.name()));

    if !global.description_text().trim().is_empty() {
        out.push('\n');
        out.push_str(global.description_text().trim());
        out.push('\n');
    }

    let mut groups: Vec<&Arc<CommandGroupMetadata>> = global.groups().iter().collect();
    groups.sort_by(|a, b| a.name().cmp(b.name()));
    if !groups.is_empty() {
        out.push_str("\n| Command Group | Description |\n");
        out.push_str("|---------------|-------------|\n");
        for group in groups {
            out.push_str(&format!(
                "| `{}` | {} |\n",
                group.name(),
                group.description_text().trim()
            ));
        }
    }

    let mut commands: Vec<&Arc<CommandMetadata>> = global
        .commands()
        .iter()
        .filter(|command| !command.is_hidden())
        .collect();
    commands.sort_by(|a, b| a.name().cmp(b.name()));
    if !commands.is_empty() {
        out.push_str("\n| Command | Description |\n");
        out.push_str("|---------|-------------|\n");
        for command in commands {
            out.push_str(&format!(
                "| `{}` | {} |\n",
                command.name(),
                command.description_text().trim()
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_metadata::{
        ArgumentsMetadata, CliBuilder, CommandMetadata, GroupBuilder, OptionMetadata, ValueKind,
    };

    fn metadata() -> GlobalMetadata {
        CliBuilder::new("git")
            .description("the stupid content tracker")
            .option(OptionMetadata::flag(["-v", "--verbose"]).description("Verbose mode"))
            .option(OptionMetadata::flag(["--trace"]).hidden())
            .command(CommandMetadata::new("status").description("Show the working tree status"))
            .command(CommandMetadata::new("debug-dump").hidden())
            .group(
                GroupBuilder::new("remote")
                    .description("Manage tracked repositories")
                    .default_command("show")
                    .command(CommandMetadata::new("show").description("Show remotes"))
                    .command(
                        CommandMetadata::new("add")
                            .description("Add a remote")
                            .option(
                                OptionMetadata::valued(["-t"], ValueKind::String)
                                    .description("Track only the given branch"),
                            )
                            .arguments(
                                ArgumentsMetadata::new("name-url")
                                    .usage("<name> <url>")
                                    .required(),
                            ),
                    ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn global_usage_lists_visible_commands() {
        let text = global_usage(&metadata());
        assert!(text.contains("NAME"));
        assert!(text.contains("git - the stupid content tracker"));
        assert!(text.contains("-v, --verbose"));
        assert!(text.contains("status"));
        assert!(text.contains("remote add"));
        assert!(!text.contains("--trace"));
        assert!(!text.contains("debug-dump"));
    }

    #[test]
    fn group_usage_marks_default_command() {
        let metadata = metadata();
        let remote = metadata.find_group("remote").unwrap();
        let text = group_usage(&metadata, remote);
        assert!(text.contains("git remote - Manage tracked repositories"));
        assert!(text.contains("(default)"));
        assert!(text.contains("add"));
    }

    #[test]
    fn command_usage_shows_resolved_options_and_arguments() {
        let metadata = metadata();
        let remote = metadata.find_group("remote").unwrap().clone();
        let add = remote.find_command("add").unwrap().clone();
        let text = command_usage(&metadata, Some(remote.as_ref()), &add);
        assert!(text.contains("git remote add - Add a remote"));
        // Global options are part of the command's resolved set.
        assert!(text.contains("-v, --verbose"));
        assert!(text.contains("-t <string>"));
        assert!(text.contains("[--] <name> <url>"));
        assert!(text.contains("ARGUMENTS"));
        assert!(text.contains("(required)"));
    }

    #[test]
    fn markdown_summary_tables_are_sorted() {
        let text = global_summary_markdown(&metadata());
        assert!(text.starts_with("# git"));
        assert!(text.contains("| Command Group | Description |"));
        assert!(text.contains("| `remote` | Manage tracked repositories |"));
        assert!(text.contains("| `status` | Show the working tree status |"));
        assert!(!text.contains("debug-dump"));
    }
}
