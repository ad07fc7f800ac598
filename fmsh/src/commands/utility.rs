use super::register_aliases;
use crate::error::{FmshError, FmshResult};
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    registry.register_fn(
        "man",
        man,
        CommandDoc::new(Category::Utility, "Show help for all commands or for one")
            .syntax("man [command]")
            .example("man cp"),
        false,
    );
    register_aliases(registry, "man", &["help", "?"])?;

    registry.register_fn(
        "clear",
        |_args: &[String], ctx: &mut CommandContext<'_>| {
            ctx.console.clear();
            Ok(())
        },
        CommandDoc::new(Category::Utility, "Clear the screen").syntax("clear"),
        false,
    );
    register_aliases(registry, "clear", &["cls"])?;

    registry.register_fn(
        "version",
        |_args: &[String], ctx: &mut CommandContext<'_>| {
            ctx.console.print(&format!("fmsh v{VERSION}"));
            Ok(())
        },
        CommandDoc::new(Category::Utility, "Print the version").syntax("version"),
        false,
    );
    register_aliases(registry, "version", &["ver", "-v", "--version"])?;

    registry.register_fn(
        ".exit",
        |_args: &[String], _ctx: &mut CommandContext<'_>| Err(FmshError::Exit),
        CommandDoc::new(Category::Utility, "Leave the file manager").syntax(".exit"),
        false,
    );
    register_aliases(registry, ".exit", &["exit", "quit", "q"])?;

    Ok(())
}

fn man(args: &[String], ctx: &mut CommandContext<'_>) -> FmshResult<()> {
    let text = match args.first() {
        None => ctx.registry.generate_help_text(),
        Some(name) => ctx
            .registry
            .generate_command_help(name)
            .ok_or_else(|| FmshError::UnknownCommand(name.clone()))?,
    };
    ctx.console.print(text.trim_end());
    Ok(())
}
