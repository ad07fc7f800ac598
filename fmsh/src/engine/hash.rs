//! File digests

use super::STREAM_CHUNK_SIZE;
use crate::cancel::{self, CancellationToken};
use crate::error::{FmshError, FmshResult};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = FmshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(FmshError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Hex digest of a file, read in chunks with a token check between them.
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm, token: &CancellationToken) -> FmshResult<String> {
    match algorithm {
        HashAlgorithm::Md5 => digest_file::<Md5>(path, token).await,
        HashAlgorithm::Sha1 => digest_file::<Sha1>(path, token).await,
        HashAlgorithm::Sha256 => digest_file::<Sha256>(path, token).await,
        HashAlgorithm::Sha512 => digest_file::<Sha512>(path, token).await,
    }
}

pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => format!("{:x}", Md5::digest(data)),
        HashAlgorithm::Sha1 => format!("{:x}", Sha1::digest(data)),
        HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
        HashAlgorithm::Sha512 => format!("{:x}", Sha512::digest(data)),
    }
}

async fn digest_file<D>(path: &Path, token: &CancellationToken) -> FmshResult<String>
where
    D: Digest + Send,
{
    cancel::check(token)?;
    super::require_file(path, token).await?;
    let mut file = cancel::guard_path(token, path, tokio::fs::File::open(path)).await?;

    let mut hasher = D::new();
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let n = cancel::guard(token, file.read(&mut buf)).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex(&hasher.finalize()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        let err = "crc32".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, FmshError::UnsupportedAlgorithm(name) if name == "crc32"));
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(hash_bytes(b"abc", HashAlgorithm::Md5), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            hash_bytes(b"abc", HashAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hash_bytes(b"abc", HashAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(hash_bytes(b"abc", HashAlgorithm::Sha512).starts_with("ddaf35a193617aba"));
    }

    #[tokio::test]
    async fn test_hash_file_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let token = CancellationToken::new();
        for algorithm in HashAlgorithm::ALL {
            let digest = hash_file(&path, algorithm, &token).await.unwrap();
            assert_eq!(digest, hash_bytes(&data, algorithm), "{algorithm}");
        }
    }

    #[tokio::test]
    async fn test_hash_aborted_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "abc").unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = hash_file(&path, HashAlgorithm::Sha256, &token).await.unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test]
    async fn test_hash_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let err = hash_file(dir.path(), HashAlgorithm::Md5, &token).await.unwrap_err();
        assert!(matches!(err, FmshError::IsADirectory(_)));
    }
}
