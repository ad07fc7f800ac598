use super::{arg, register_aliases, take_switch};
use crate::cancel::CancellationToken;
use crate::engine::files;
use crate::engine::format::{format_mode, format_size, format_system_time};
use crate::error::FmshResult;
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry, Handler};
use async_trait::async_trait;

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    let doc = |description: &str| CommandDoc::new(Category::FileOperations, description);

    registry.register(
        "cat",
        Cat,
        doc("Print the contents of a file")
            .syntax("cat <path_to_file>")
            .example("cat \"my notes.txt\""),
        false,
    );
    register_aliases(registry, "cat", &["type"])?;

    registry.register(
        "add",
        Add,
        doc("Create an empty file")
            .syntax("add <new_file_name>")
            .details("Fails if a file or directory with that name already exists."),
        false,
    );
    register_aliases(registry, "add", &["touch"])?;

    registry.register(
        "write",
        WriteFile,
        doc("Replace the contents of a file")
            .syntax("write <path_to_file> [content...]")
            .example("write notes.txt \"hello world\"")
            .details("Creates the file if needed. Without content the file is emptied."),
        false,
    );

    registry.register(
        "mkdir",
        MakeDir,
        doc("Create a directory").syntax("mkdir <new_directory_name>"),
        false,
    );
    register_aliases(registry, "mkdir", &["md"])?;

    registry.register(
        "rn",
        Rename,
        doc("Rename a file or directory in place")
            .syntax("rn <path_to_file> <new_file_name>")
            .example("rn draft.txt final.txt"),
        false,
    );
    register_aliases(registry, "rn", &["rename", "mv"])?;

    registry.register(
        "cp",
        CopyFile,
        doc("Copy a file")
            .syntax("cp <path_to_file> <path_to_new_directory_or_file>")
            .example("cp report.pdf backup/")
            .details("Never overwrites. A partially written copy is removed if the copy fails or is interrupted."),
        false,
    );
    register_aliases(registry, "cp", &["copy"])?;

    registry.register(
        "move",
        Move,
        doc("Move a file (copy, then delete the source)")
            .syntax("move <path_to_file> <path_to_new_directory_or_file>"),
        false,
    );

    registry.register(
        "rm",
        Remove,
        doc("Delete a file").syntax("rm <path_to_file>"),
        true,
    );
    register_aliases(registry, "rm", &["del", "delete"])?;

    registry.register(
        "rmdir",
        RemoveDir,
        doc("Delete a directory")
            .syntax("rmdir [-r] <path_to_directory>")
            .details("Without -r the directory must be empty."),
        true,
    );
    register_aliases(registry, "rmdir", &["rd"])?;

    registry.register(
        "info",
        Info,
        doc("Show type, size, permissions and timestamps of a path").syntax("info <path>"),
        false,
    );
    register_aliases(registry, "info", &["stat"])?;

    Ok(())
}

struct Cat;

#[async_trait]
impl Handler for Cat {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        let text = files::read_text(&path, token).await?;
        ctx.console.print(text.trim_end_matches('\n'));
        Ok(())
    }
}

struct Add;

#[async_trait]
impl Handler for Add {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, _token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "new_file_name")?);
        files::create_file(&path).await?;
        ctx.console.success(&format!("Created {}", path.display()));
        Ok(())
    }
}

struct WriteFile;

#[async_trait]
impl Handler for WriteFile {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        let content = args[1..].join(" ");
        files::write_file(&path, &content, token).await?;
        ctx.console.success(&format!("Wrote {} to {}", format_size(content.len() as u64), path.display()));
        Ok(())
    }
}

struct MakeDir;

#[async_trait]
impl Handler for MakeDir {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, _token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "new_directory_name")?);
        files::make_dir(&path).await?;
        ctx.console.success(&format!("Created directory {}", path.display()));
        Ok(())
    }
}

struct Rename;

#[async_trait]
impl Handler for Rename {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, _token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        let new_name = arg(args, 1, "new_file_name")?;
        let target = files::rename(&path, new_name).await?;
        ctx.console.success(&format!("Renamed to {}", target.display()));
        Ok(())
    }
}

struct CopyFile;

#[async_trait]
impl Handler for CopyFile {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let src = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        let dst = ctx.session.resolve_path(arg(args, 1, "path_to_new_directory")?);
        let target = files::copy_file(&src, &dst, token).await?;
        ctx.console.success(&format!("Copied to {}", target.display()));
        Ok(())
    }
}

struct Move;

#[async_trait]
impl Handler for Move {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let src = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        let dst = ctx.session.resolve_path(arg(args, 1, "path_to_new_directory")?);
        let target = files::move_file(&src, &dst, token).await?;
        ctx.console.success(&format!("Moved to {}", target.display()));
        Ok(())
    }
}

struct Remove;

#[async_trait]
impl Handler for Remove {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, _token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "path_to_file")?);
        files::remove_file(&path).await?;
        ctx.console.success(&format!("Deleted {}", path.display()));
        Ok(())
    }
}

struct RemoveDir;

#[async_trait]
impl Handler for RemoveDir {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let (recursive, rest) = take_switch(args, &["r", "recursive"]);
        let path = ctx.session.resolve_path(arg(&rest, 0, "path_to_directory")?);
        files::remove_dir(&path, recursive, token).await?;
        ctx.console.success(&format!("Deleted directory {}", path.display()));
        Ok(())
    }
}

struct Info;

#[async_trait]
impl Handler for Info {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, _token: &CancellationToken) -> FmshResult<()> {
        let path = ctx.session.resolve_path(arg(args, 0, "path")?);
        let info = files::info(&path).await?;

        let mut rows = vec![
            vec!["Path".to_string(), info.path.display().to_string()],
            vec!["Type".to_string(), info.kind.as_str().to_string()],
            vec!["Size".to_string(), format!("{} ({} bytes)", format_size(info.size), info.size)],
        ];
        if let Some(mode) = info.mode {
            rows.push(vec!["Permissions".to_string(), format_mode(mode)]);
        }
        rows.push(vec!["Modified".to_string(), format_system_time(info.modified)]);
        rows.push(vec!["Created".to_string(), format_system_time(info.created)]);

        ctx.console.table(&["Property", "Value"], &rows);
        Ok(())
    }
}
