use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use super::DocumentStore;
use crate::error::StoreError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// File info returned by the document endpoint. Only `content` is used;
/// directories come back without it.
#[derive(Debug, Deserialize)]
struct FileInfo {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// A vault server reached over HTTP.
///
/// Documents are read with `GET {base}/api/v1/d/{path}` and written with
/// `PUT {base}/api/v1/d/files/{path}` carrying the raw text.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base: Url,
    client: Client,
}

impl HttpStore {
    /// # Errors
    ///
    /// Fails when `base_url` is not an absolute http(s) URL or the client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let base = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StoreError::InvalidPath(base_url.to_string()))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| StoreError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { base, client })
    }

    /// `{base}/api/v1/d/{prefix...}/{path}` with each segment encoded.
    fn url(&self, prefix: &[&str], path: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidPath(path.to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "d"])
            .extend(prefix)
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
        url: &Url,
        path: &str,
    ) -> Result<Response, StoreError> {
        let response = request.send().map_err(|source| StoreError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(path.to_string())),
            StatusCode::FORBIDDEN => Err(StoreError::InvalidPath(path.to_string())),
            _ => Err(StoreError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                detail: error_detail(response),
            }),
        }
    }
}

/// The server's `detail` message, or the body or reason phrase.
fn error_detail(response: Response) -> String {
    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let Ok(body) = response.text() else {
        return reason;
    };
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => error.detail,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => reason,
    }
}

impl DocumentStore for HttpStore {
    fn load(&self, path: &str) -> Result<String, StoreError> {
        let url = self.url(&[], path)?;
        debug!(%url, "loading document");
        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");
        let info: FileInfo = self
            .send(request, &url, path)?
            .json()
            .map_err(|source| StoreError::Decode {
                url: url.to_string(),
                source,
            })?;
        info.content
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn save(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let url = self.url(&["files"], path)?;
        debug!(%url, bytes = content.len(), "saving document");
        let request = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(content.to_string());
        self.send(request, &url, path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.base.to_string()
    }
}
