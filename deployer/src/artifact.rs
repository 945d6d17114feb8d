//! Artifact resolution boundary
//!
//! Resolution and download of archive artifacts happens outside this crate;
//! the deployer only consumes the resolved result and derives the checksum
//! Nomad uses to verify the download before executing it.

use async_trait::async_trait;

use crate::errors::DeployerError;

/// A resolved archive artifact
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    /// Fetchable URI handed to the Nomad artifact getter
    pub uri: String,

    /// File name under the artifact destination directory
    pub filename: String,

    /// Artifact content, used for checksum derivation
    pub content: Vec<u8>,
}

/// Resolves an archive coordinate to a fetchable artifact
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    async fn resolve(&self, coordinate: &str) -> Result<ResolvedArtifact, DeployerError>;
}

/// Calculate the MD5 checksum of artifact content as lowercase hex
pub fn md5_checksum(content: &[u8]) -> String {
    use md5::{Digest, Md5};
    let mut hasher = Md5::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Hex encoding utilities
mod hex {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(data: impl AsRef<[u8]>) -> String {
        let data = data.as_ref();
        let mut result = String::with_capacity(data.len() * 2);
        for byte in data {
            result.push(HEX_CHARS[(byte >> 4) as usize] as char);
            result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
        }
        result
    }
}
