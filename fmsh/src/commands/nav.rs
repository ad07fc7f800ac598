use super::{arg, register_aliases};
use crate::cancel::CancellationToken;
use crate::engine::format::format_size;
use crate::engine::{nav, EntryKind};
use crate::error::FmshResult;
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry, Handler};
use async_trait::async_trait;

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    registry.register_fn(
        "up",
        |_args: &[String], ctx: &mut CommandContext<'_>| {
            nav::up(ctx.session);
            Ok(())
        },
        CommandDoc::new(Category::Navigation, "Go to the parent directory")
            .syntax("up")
            .details("Does nothing at the root of the file system."),
        false,
    );

    registry.register(
        "cd",
        Cd,
        CommandDoc::new(Category::Navigation, "Change the current directory")
            .syntax("cd <path>")
            .example("cd ~/projects"),
        false,
    );

    registry.register(
        "ls",
        Ls,
        CommandDoc::new(Category::Navigation, "List directory contents")
            .syntax("ls [path]")
            .example("ls src")
            .details("Directories come first, then files, each sorted by name."),
        false,
    );
    register_aliases(registry, "ls", &["dir"])?;

    registry.register_fn(
        "pwd",
        |_args: &[String], ctx: &mut CommandContext<'_>| {
            ctx.console.print(&ctx.session.cwd_display());
            Ok(())
        },
        CommandDoc::new(Category::Navigation, "Print the current directory").syntax("pwd"),
        false,
    );

    Ok(())
}

struct Cd;

#[async_trait]
impl Handler for Cd {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let target = arg(args, 0, "path_to_directory")?;
        nav::change_dir(ctx.session, target, token).await?;
        Ok(())
    }
}

struct Ls;

#[async_trait]
impl Handler for Ls {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let dir = args
            .first()
            .map_or_else(|| ctx.session.cwd.clone(), |p| ctx.session.resolve_path(p));
        let entries = nav::list_dir(&dir, token).await?;

        if entries.is_empty() {
            ctx.console.print("(empty)");
            return Ok(());
        }

        let rows: Vec<Vec<String>> = entries
            .into_iter()
            .map(|e| {
                let size = if e.kind == EntryKind::Directory {
                    String::new()
                } else {
                    format_size(e.size)
                };
                vec![e.name, e.kind.as_str().to_string(), size]
            })
            .collect();
        ctx.console.table(&["Name", "Type", "Size"], &rows);
        Ok(())
    }
}
