use super::arg;
use crate::cancel::CancellationToken;
use crate::engine::hash::{hash_file, HashAlgorithm};
use crate::error::FmshResult;
use crate::parser::parse_flags;
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry, Handler};
use async_trait::async_trait;

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    registry.register(
        "hash",
        Hash { fixed: None },
        CommandDoc::new(Category::Hash, "Print the digest of a file")
            .syntax("hash <path_to_file> [--algorithm=<md5|sha1|sha256|sha512>]")
            .example("hash archive.tar -a md5")
            .details("The default algorithm is sha256. Output is lowercase hex."),
        false,
    );

    for algorithm in HashAlgorithm::ALL {
        let name = algorithm.as_str();
        registry.register(
            name,
            Hash {
                fixed: Some(algorithm),
            },
            CommandDoc::new(Category::Hash, format!("Print the {name} digest of a file"))
                .syntax(format!("{name} <path_to_file>")),
            false,
        );
    }

    Ok(())
}

/// `hash` with a selectable algorithm, or one of the fixed shortcuts.
struct Hash {
    fixed: Option<HashAlgorithm>,
}

#[async_trait]
impl Handler for Hash {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let parsed = parse_flags(args);
        let algorithm = match (self.fixed, parsed.value_of(&["algorithm", "a"])) {
            (Some(fixed), _) => fixed,
            (None, Some(name)) => name.parse()?,
            (None, None) => HashAlgorithm::default(),
        };
        let path = ctx.session.resolve_path(arg(&parsed.remaining, 0, "path_to_file")?);

        let digest = hash_file(&path, algorithm, token).await?;
        ctx.console.print(&digest);
        Ok(())
    }
}
