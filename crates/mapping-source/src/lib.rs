//! Mapping source adapters.
//!
//! Implements the [`routing::MappingProvider`] trait for the two places a
//! mapping table can live:
//!
//! | Variant | Content | Fingerprint |
//! |---------|---------|-------------|
//! | [`MappingSource::File`] | file bytes | SHA-256 of the bytes read, lowercase hex |
//! | [`MappingSource::Url`] | `GET <address>` | first token of `GET <address>.sha256` |
//!
//! The remote fingerprint still costs a request; what an unchanged value
//! saves is the download and reparse of the full table.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File and HTTP access live here. The `relay` crate
//! only sees [`routing::MappingProvider`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use routing::{Fingerprint, MappingProvider, SourceError};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Timeout applied to every remote request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Suffix of the companion fingerprint resource of a remote mapping.
pub const FINGERPRINT_SUFFIX: &str = ".sha256";

/// Where the mapping table is read from.
#[derive(Debug, Clone)]
pub enum MappingSource {
    /// A file on the local file system.
    File {
        /// Path of the mapping file.
        path: PathBuf,
    },
    /// A remote document fetched over HTTP(S).
    Url {
        /// URL of the mapping document.
        address: String,
        /// Client shared by content and fingerprint requests.
        client: Client,
    },
}

impl MappingSource {
    /// Creates a file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Creates a URL source with a client using [`REQUEST_TIMEOUT`].
    ///
    /// `accept_invalid_certs` disables TLS certificate verification, for
    /// self-hosted servers with private certificates.
    pub fn url(address: impl Into<String>, accept_invalid_certs: bool) -> Result<Self, SourceError> {
        let address = address.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| SourceError::Http {
                location: address.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::Url { address, client })
    }

    /// Picks the URL source when `url` is set, the file source otherwise.
    pub fn from_location(
        file: impl Into<PathBuf>,
        url: Option<String>,
        accept_invalid_certs: bool,
    ) -> Result<Self, SourceError> {
        match url.filter(|u| !u.is_empty()) {
            Some(address) => Self::url(address, accept_invalid_certs),
            None => Ok(Self::file(file)),
        }
    }

    /// Address of the fingerprint resource for a URL source.
    pub fn fingerprint_address(address: &str) -> String {
        format!("{address}{FINGERPRINT_SUFFIX}")
    }
}

#[async_trait]
impl MappingProvider for MappingSource {
    fn location(&self) -> String {
        match self {
            Self::File { path } => path.display().to_string(),
            Self::Url { address, .. } => address.clone(),
        }
    }

    async fn fetch_content(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            Self::File { path } => read_file(path).await,
            Self::Url { address, client } => http_get(client, address).await,
        }
    }

    async fn fetch_fingerprint(&self) -> Result<Fingerprint, SourceError> {
        match self {
            Self::File { path } => {
                let content = read_file(path).await?;
                self.content_fingerprint(&content)
                    .ok_or_else(|| SourceError::EmptyFingerprint {
                        location: path.display().to_string(),
                    })
            }
            Self::Url { address, client } => {
                let location = Self::fingerprint_address(address);
                let body = http_get(client, &location).await?;
                parse_fingerprint(&body).ok_or(SourceError::EmptyFingerprint { location })
            }
        }
    }

    fn content_fingerprint(&self, content: &[u8]) -> Option<Fingerprint> {
        match self {
            Self::File { .. } => Fingerprint::new(sha256_hex(content)),
            Self::Url { .. } => None,
        }
    }
}

/// Lowercase hex SHA-256 of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Extracts the fingerprint from a `.sha256` body.
///
/// Accepts a bare digest or `sha256sum` output (`<digest>  <file>`).
pub fn parse_fingerprint(body: &[u8]) -> Option<Fingerprint> {
    let text = String::from_utf8_lossy(body);
    text.split_whitespace().next().and_then(Fingerprint::new)
}

async fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    tokio::fs::read(path).await.map_err(|e| SourceError::Io {
        location: path.display().to_string(),
        message: e.to_string(),
    })
}

async fn http_get(client: &Client, address: &str) -> Result<Vec<u8>, SourceError> {
    debug!(address, "fetching");
    let http_error = |e: reqwest::Error| SourceError::Http {
        location: address.to_string(),
        message: e.to_string(),
    };

    let response = client.get(address).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            location: address.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(http_error)?;
    Ok(body.to_vec())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
