//! Avatar mirroring
//!
//! Copies a provider-hosted avatar into local storage at bind-registration
//! time so profiles do not hotlink provider CDNs. Mirroring is best-effort:
//! any failure is logged and the profile simply keeps no avatar.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AccountError;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam for copying remote avatars into local storage.
#[async_trait]
pub trait AvatarMirror: Send + Sync {
    /// Mirror `source_url` for `username`, returning the locally served URL,
    /// or `None` when the download or write failed.
    async fn mirror(&self, source_url: &str, username: &str) -> Option<String>;
}

/// Production mirror: downloads over HTTP and writes under an uploads
/// directory served by the application.
pub struct HttpAvatarMirror {
    http: reqwest::Client,
    uploads_dir: PathBuf,
    public_base: String,
}

impl HttpAvatarMirror {
    pub fn new(uploads_dir: PathBuf, public_base: String) -> Result<Self, AccountError> {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| AccountError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            uploads_dir,
            public_base,
        })
    }

    fn extension_for(content_type: Option<&str>) -> &'static str {
        match content_type {
            Some(ct) if ct.contains("png") => "png",
            Some(ct) if ct.contains("gif") => "gif",
            Some(ct) if ct.contains("webp") => "webp",
            _ => "jpg",
        }
    }

    async fn try_mirror(&self, source_url: &str, username: &str) -> Result<String, String> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| format!("download failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("download returned {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let ext = Self::extension_for(content_type.as_deref());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("download body failed: {e}"))?;

        let filename = format!("avatar_{}_{}.{ext}", username, Utc::now().timestamp());
        let path = self.uploads_dir.join(&filename);

        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| format!("create uploads dir failed: {e}"))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("write failed: {e}"))?;

        Ok(format!(
            "{}/uploads/{filename}",
            self.public_base.trim_end_matches('/')
        ))
    }
}

#[async_trait]
impl AvatarMirror for HttpAvatarMirror {
    async fn mirror(&self, source_url: &str, username: &str) -> Option<String> {
        match self.try_mirror(source_url, username).await {
            Ok(url) => Some(url),
            Err(reason) => {
                tracing::warn!(%source_url, %username, %reason, "avatar mirror failed");
                None
            }
        }
    }
}
