use super::{arg, register_aliases, take_switch};
use crate::cancel::CancellationToken;
use crate::engine::search;
use crate::error::{FmshError, FmshResult};
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry, Handler};
use async_trait::async_trait;
use regex::RegexBuilder;
use std::path::PathBuf;

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    registry.register(
        "find",
        Find,
        CommandDoc::new(Category::Search, "Find files and directories by name")
            .syntax("find <pattern> [directory]")
            .example("find \"*.rs\" src")
            .details(
                "Patterns may use *, ? and [...] classes. A pattern without them\n\
                 matches every name that contains it.",
            ),
        false,
    );
    register_aliases(registry, "find", &["search"])?;

    registry.register(
        "grep",
        Grep,
        CommandDoc::new(Category::Search, "Search file contents with a regular expression")
            .syntax("grep [-i] <regex> [path]")
            .example("grep -i todo src")
            .details("Files that are not valid UTF-8 are skipped."),
        false,
    );

    registry.register(
        "where",
        Where,
        CommandDoc::new(Category::Search, "Locate files with exactly this name, ignoring case")
            .syntax("where <file_name> [directory]")
            .example("where readme.md"),
        false,
    );

    Ok(())
}

fn search_root(ctx: &CommandContext<'_>, args: &[String], index: usize) -> PathBuf {
    args.get(index)
        .map_or_else(|| ctx.session.cwd.clone(), |p| ctx.session.resolve_path(p))
}

struct Find;

#[async_trait]
impl Handler for Find {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let pattern = arg(args, 0, "pattern")?;
        let root = search_root(ctx, args, 1);
        let console = ctx.console;

        let count = search::find(&root, pattern, token, |path| console.print(&path.display().to_string())).await?;
        if count == 0 {
            console.notice("No matches found");
        }
        Ok(())
    }
}

struct Grep;

#[async_trait]
impl Handler for Grep {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let (ignore_case, rest) = take_switch(args, &["i", "ignore-case"]);
        let pattern = arg(&rest, 0, "regex")?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| FmshError::InvalidArgument(format!("invalid regular expression: {e}")))?;
        let target = search_root(ctx, &rest, 1);
        let console = ctx.console;

        let count = search::grep(&target, &regex, token, |m| {
            console.print(&format!("{}:{}: {}", m.path.display(), m.line_number, m.line));
        })
        .await?;
        if count == 0 {
            console.notice("No matches found");
        }
        Ok(())
    }
}

struct Where;

#[async_trait]
impl Handler for Where {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let name = arg(args, 0, "file_name")?;
        let root = search_root(ctx, args, 1);
        let console = ctx.console;

        let count = search::where_is(&root, name, token, |path| console.print(&path.display().to_string())).await?;
        if count == 0 {
            console.notice(&format!("'{name}' not found"));
        }
        Ok(())
    }
}
