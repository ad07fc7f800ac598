//! Streaming compression and decompression
//!
//! Codec pipelines are synchronous (`brotli` and `flate2` work on
//! `Read`/`Write`), so they run on the blocking pool. The pipeline reads
//! [`STREAM_CHUNK_SIZE`] bytes at a time and checks the token between
//! chunks; the async side removes the destination if the pipeline fails.

use super::STREAM_CHUNK_SIZE;
use crate::cancel::{self, CancellationToken};
use crate::error::{FmshError, FmshResult};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_LG_WINDOW: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Brotli,
    Gzip,
    /// zlib-wrapped deflate
    Deflate,
}

impl Codec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brotli => "brotli",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Brotli => "br",
            Self::Gzip => "gz",
            Self::Deflate => "zz",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = FmshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brotli" | "br" => Ok(Self::Brotli),
            "gzip" | "gz" => Ok(Self::Gzip),
            "deflate" | "zlib" => Ok(Self::Deflate),
            _ => Err(FmshError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

/// Compress `src` into `dst`. Returns the path actually written.
pub async fn compress(src: &Path, dst: &Path, codec: Codec, token: &CancellationToken) -> FmshResult<PathBuf> {
    transform(src, dst, codec, Direction::Compress, token).await
}

/// Decompress `src` into `dst`. Returns the path actually written.
pub async fn decompress(src: &Path, dst: &Path, codec: Codec, token: &CancellationToken) -> FmshResult<PathBuf> {
    transform(src, dst, codec, Direction::Decompress, token).await
}

async fn transform(
    src: &Path,
    dst: &Path,
    codec: Codec,
    direction: Direction,
    token: &CancellationToken,
) -> FmshResult<PathBuf> {
    cancel::check(token)?;
    super::require_file(src, token).await?;
    let target = destination(src, dst, codec, direction).await?;
    if super::exists(&target).await {
        return Err(FmshError::AlreadyExists(target));
    }

    let job_src = src.to_path_buf();
    let job_dst = target.clone();
    let job_token = token.clone();
    let result = tokio::task::spawn_blocking(move || run(&job_src, &job_dst, codec, direction, &job_token))
        .await
        .map_err(|e| FmshError::Io(std::io::Error::other(e)))
        .and_then(|r| r);

    match result {
        Ok(bytes) => {
            tracing::debug!(
                src = %src.display(),
                dst = %target.display(),
                codec = %codec,
                ?direction,
                bytes,
                "Transformed file"
            );
            Ok(target)
        }
        Err(e) => {
            cancel::discard_partial(&target).await;
            Err(e)
        }
    }
}

/// An existing directory as destination means "into it": compression appends
/// the codec extension, decompression strips it when present.
async fn destination(src: &Path, dst: &Path, codec: Codec, direction: Direction) -> FmshResult<PathBuf> {
    if !tokio::fs::metadata(dst).await.is_ok_and(|m| m.is_dir()) {
        return Ok(dst.to_path_buf());
    }
    let name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FmshError::InvalidArgument(format!("{} has no file name", src.display())))?;

    let name = match direction {
        Direction::Compress => format!("{name}.{}", codec.extension()),
        Direction::Decompress => name
            .strip_suffix(&format!(".{}", codec.extension()))
            .filter(|stem| !stem.is_empty())
            .map_or(name.clone(), str::to_string),
    };
    Ok(dst.join(name))
}

fn run(src: &Path, dst: &Path, codec: Codec, direction: Direction, token: &CancellationToken) -> FmshResult<u64> {
    let input = File::open(src).map_err(|e| FmshError::from_io(e, src))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|e| FmshError::from_io(e, dst))?;

    match direction {
        Direction::Compress => encode(codec, input, output, token).map(|(bytes, _)| bytes),
        Direction::Decompress => decode(codec, input, output, token).map(|(bytes, _)| bytes),
    }
}

/// Feed `input` through the encoder into `output`; returns bytes consumed.
pub(crate) fn encode<R: Read, W: Write>(
    codec: Codec,
    mut input: R,
    output: W,
    token: &CancellationToken,
) -> FmshResult<(u64, W)> {
    match codec {
        Codec::Brotli => {
            let mut encoder =
                brotli::CompressorWriter::new(output, BROTLI_BUFFER_SIZE, BROTLI_QUALITY, BROTLI_LG_WINDOW);
            let bytes = pump(&mut input, &mut encoder, token)?;
            encoder.flush()?;
            Ok((bytes, encoder.into_inner()))
        }
        Codec::Gzip => {
            let mut encoder = GzEncoder::new(output, Compression::default());
            let bytes = pump(&mut input, &mut encoder, token)?;
            Ok((bytes, encoder.finish()?))
        }
        Codec::Deflate => {
            let mut encoder = ZlibEncoder::new(output, Compression::default());
            let bytes = pump(&mut input, &mut encoder, token)?;
            Ok((bytes, encoder.finish()?))
        }
    }
}

/// Feed `input` through the decoder into `output`; returns bytes produced.
pub(crate) fn decode<R: Read, W: Write>(
    codec: Codec,
    input: R,
    mut output: W,
    token: &CancellationToken,
) -> FmshResult<(u64, W)> {
    let bytes = match codec {
        Codec::Brotli => pump(&mut brotli::Decompressor::new(input, BROTLI_BUFFER_SIZE), &mut output, token)?,
        Codec::Gzip => pump(&mut GzDecoder::new(input), &mut output, token)?,
        Codec::Deflate => pump(&mut ZlibDecoder::new(input), &mut output, token)?,
    };
    output.flush()?;
    Ok((bytes, output))
}

fn pump<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    token: &CancellationToken,
) -> FmshResult<u64> {
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        cancel::check(token)?;
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> Vec<u8> {
        "The quick brown fox jumps over the lazy dog.\n"
            .repeat(10_000)
            .into_bytes()
    }

    #[test]
    fn test_codec_names() {
        assert_eq!("BROTLI".parse::<Codec>().unwrap(), Codec::Brotli);
        assert_eq!("gz".parse::<Codec>().unwrap(), Codec::Gzip);
        assert_eq!("zlib".parse::<Codec>().unwrap(), Codec::Deflate);
        assert!(matches!(
            "lzma".parse::<Codec>(),
            Err(FmshError::UnsupportedAlgorithm(_))
        ));
    }

    #[tokio::test]
    async fn test_every_codec_restores_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("input.txt");
        fs::write(&src, sample()).unwrap();
        let token = CancellationToken::new();

        for codec in [Codec::Brotli, Codec::Gzip, Codec::Deflate] {
            let packed = dir.path().join(format!("packed.{}", codec.extension()));
            let restored = dir.path().join(format!("restored.{codec}"));
            compress(&src, &packed, codec, &token).await.unwrap();
            assert!(fs::metadata(&packed).unwrap().len() < sample().len() as u64);
            decompress(&packed, &restored, codec, &token).await.unwrap();
            assert_eq!(fs::read(&restored).unwrap(), sample(), "{codec}");
        }
    }

    #[tokio::test]
    async fn test_directory_destination_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.txt");
        fs::write(&src, "hello").unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        fs::create_dir(dir.path().join("back")).unwrap();
        let token = CancellationToken::new();

        let packed = compress(&src, &dir.path().join("out"), Codec::Gzip, &token)
            .await
            .unwrap();
        assert_eq!(packed, dir.path().join("out/notes.txt.gz"));
        let restored = decompress(&packed, &dir.path().join("back"), Codec::Gzip, &token)
            .await
            .unwrap();
        assert_eq!(restored, dir.path().join("back/notes.txt"));
    }

    #[tokio::test]
    async fn test_existing_destination_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("a.txt.br");
        fs::write(&src, "a").unwrap();
        fs::write(&dst, "keep").unwrap();
        let token = CancellationToken::new();

        let err = compress(&src, &dst, Codec::Brotli, &token).await.unwrap_err();
        assert!(matches!(err, FmshError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_aborted_before_start_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("a.txt.br");
        fs::write(&src, sample()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        assert!(compress(&src, &dst, Codec::Brotli, &token).await.unwrap_err().is_aborted());
        assert!(!dst.exists());
    }

    #[tokio::test]
    async fn test_corrupt_input_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bogus.gz");
        let dst = dir.path().join("bogus.txt");
        fs::write(&src, b"definitely not gzip data").unwrap();
        let token = CancellationToken::new();

        assert!(decompress(&src, &dst, Codec::Gzip, &token).await.is_err());
        assert!(!dst.exists());
    }

    /// Reader that cancels the token after handing out its first chunk.
    struct CancelAfterFirstRead<'a> {
        inner: &'a [u8],
        token: CancellationToken,
    }

    impl Read for CancelAfterFirstRead<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.token.cancel();
            Ok(n)
        }
    }

    #[test]
    fn test_pipeline_stops_between_chunks() {
        let data = vec![7u8; STREAM_CHUNK_SIZE * 4];
        let token = CancellationToken::new();
        let reader = CancelAfterFirstRead {
            inner: &data,
            token: token.clone(),
        };
        let err = encode(Codec::Gzip, reader, Vec::new(), &token).unwrap_err();
        assert!(err.is_aborted());
    }
}
