use super::arg;
use crate::cancel::CancellationToken;
use crate::engine::compress::{self, Codec, Direction};
use crate::error::FmshResult;
use crate::parser::parse_flags;
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry, Handler};
use async_trait::async_trait;

const SHORTCUTS: [(&str, Codec, Direction); 6] = [
    ("brotli", Codec::Brotli, Direction::Compress),
    ("gzip", Codec::Gzip, Direction::Compress),
    ("deflate", Codec::Deflate, Direction::Compress),
    ("unbrotli", Codec::Brotli, Direction::Decompress),
    ("gunzip", Codec::Gzip, Direction::Decompress),
    ("inflate", Codec::Deflate, Direction::Decompress),
];

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    registry.register(
        "compress",
        Transform {
            direction: Direction::Compress,
            fixed: None,
        },
        CommandDoc::new(Category::Compression, "Compress a file")
            .syntax("compress <path_to_file> <path_to_destination> [--algorithm=<brotli|gzip|deflate>]")
            .example("compress log.txt log.txt.br")
            .details(
                "The default algorithm is brotli. The destination must not exist;\n\
                 an existing directory receives <name>.<br|gz|zz>.",
            ),
        false,
    );

    registry.register(
        "decompress",
        Transform {
            direction: Direction::Decompress,
            fixed: None,
        },
        CommandDoc::new(Category::Compression, "Decompress a file")
            .syntax("decompress <path_to_file> <path_to_destination> [--algorithm=<brotli|gzip|deflate>]")
            .example("decompress log.txt.br log.txt"),
        false,
    );

    for (name, codec, direction) in SHORTCUTS {
        let verb = match direction {
            Direction::Compress => "Compress",
            Direction::Decompress => "Decompress",
        };
        registry.register(
            name,
            Transform {
                direction,
                fixed: Some(codec),
            },
            CommandDoc::new(Category::Compression, format!("{verb} a file with {codec}"))
                .syntax(format!("{name} <path_to_file> <path_to_destination>")),
            false,
        );
    }

    Ok(())
}

struct Transform {
    direction: Direction,
    fixed: Option<Codec>,
}

#[async_trait]
impl Handler for Transform {
    async fn call(&self, args: &[String], ctx: &mut CommandContext<'_>, token: &CancellationToken) -> FmshResult<()> {
        let parsed = parse_flags(args);
        let codec = match (self.fixed, parsed.value_of(&["algorithm", "a"])) {
            (Some(fixed), _) => fixed,
            (None, Some(name)) => name.parse()?,
            (None, None) => Codec::default(),
        };
        let src = ctx.session.resolve_path(arg(&parsed.remaining, 0, "path_to_file")?);
        let dst = ctx.session.resolve_path(arg(&parsed.remaining, 1, "path_to_destination")?);

        let target = match self.direction {
            Direction::Compress => compress::compress(&src, &dst, codec, token).await?,
            Direction::Decompress => compress::decompress(&src, &dst, codec, token).await?,
        };
        ctx.console.success(&format!("Wrote {}", target.display()));
        Ok(())
    }
}
