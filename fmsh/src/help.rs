//! Help text views over the command registry

use crate::registry::{Command, CommandRegistry};

impl CommandRegistry {
    /// Full listing, grouped by category. Empty categories are skipped.
    pub fn generate_help_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Available commands:\n");

        for (category, commands) in self.all_commands_by_category() {
            if commands.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{}:\n", category.title()));
            for cmd in commands {
                out.push_str(&format_summary_line(self, cmd));
            }
        }

        out.push_str("\nUse 'man COMMAND' or 'COMMAND --help' for more information.\n");
        out
    }

    /// Detailed help for one command or alias; `None` when unknown.
    pub fn generate_command_help(&self, name: &str) -> Option<String> {
        let cmd = self.get(name)?;
        let doc = &cmd.doc;

        let mut out = String::new();
        out.push_str(&format!("{} - {}\n", cmd.name, doc.description));
        out.push_str(&format!("\nCategory: {}\n", doc.category.title()));
        if !doc.syntax.is_empty() {
            out.push_str(&format!("Usage:    {}\n", doc.syntax));
        }
        if !doc.example.is_empty() {
            out.push_str(&format!("Example:  {}\n", doc.example));
        }
        let aliases = self.aliases_for_command(&cmd.name);
        if !aliases.is_empty() {
            out.push_str(&format!("Aliases:  {}\n", aliases.join(", ")));
        }
        if cmd.requires_confirmation {
            out.push_str("Asks for confirmation before running.\n");
        }
        if !doc.details.is_empty() {
            out.push('\n');
            out.push_str(&doc.details);
            out.push('\n');
        }
        Some(out)
    }
}

fn format_summary_line(registry: &CommandRegistry, cmd: &Command) -> String {
    let aliases = registry.aliases_for_command(&cmd.name);
    if aliases.is_empty() {
        format!("  {:12} {}\n", cmd.name, cmd.doc.description)
    } else {
        format!(
            "  {:12} {} (aliases: {})\n",
            cmd.name,
            cmd.doc.description,
            aliases.join(", ")
        )
    }
}

/// `--help` counts only as the first argument, so it can still be passed
/// as data (e.g. `write notes.txt --help`).
pub fn wants_help(args: &[String]) -> bool {
    args.first().is_some_and(|a| a == "--help")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FmshResult;
    use crate::registry::{Category, CommandContext, CommandDoc};

    fn noop(_args: &[String], _ctx: &mut CommandContext<'_>) -> FmshResult<()> {
        Ok(())
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register_fn(
            "rm",
            noop,
            CommandDoc::new(Category::FileOperations, "Delete a file")
                .syntax("rm <path_to_file>")
                .example("rm old.txt")
                .details("Directories are refused; use rmdir."),
            true,
        );
        registry.register_fn("pwd", noop, CommandDoc::new(Category::Navigation, "Print working directory"), false);
        registry.register_alias("del", "rm").unwrap();
        registry
    }

    #[test]
    fn test_help_text_groups_by_category() {
        let text = registry().generate_help_text();
        let nav = text.find("Navigation:").unwrap();
        let files = text.find("File Operations:").unwrap();
        assert!(nav < files);
        assert!(text.contains("rm           Delete a file (aliases: del)"));
        assert!(!text.contains("Compression:"));
    }

    #[test]
    fn test_command_help() {
        let registry = registry();
        let help = registry.generate_command_help("del").unwrap();
        assert!(help.starts_with("rm - Delete a file\n"));
        assert!(help.contains("Usage:    rm <path_to_file>"));
        assert!(help.contains("Example:  rm old.txt"));
        assert!(help.contains("Aliases:  del"));
        assert!(help.contains("Asks for confirmation"));
        assert!(help.contains("Directories are refused"));
    }

    #[test]
    fn test_command_help_unknown_is_none() {
        assert!(registry().generate_command_help("nope").is_none());
    }

    #[test]
    fn test_wants_help() {
        assert!(wants_help(&["--help".to_string()]));
        assert!(wants_help(&["--help".to_string(), "x".to_string()]));
        assert!(!wants_help(&["x".to_string(), "--help".to_string()]));
        assert!(!wants_help(&["-h".to_string()]));
        assert!(!wants_help(&[]));
    }
}
