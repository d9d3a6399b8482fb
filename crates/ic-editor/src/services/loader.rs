//! Fetching image bytes for `ImageObject` URLs.

use super::{ServiceError, ServiceResult};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn fetch(&self, url: &str) -> ServiceResult<Vec<u8>>;
}

/// Handles `data:` URLs, `file://` URLs and bare paths, and http(s).
pub struct DefaultAssetLoader {
    http: reqwest::Client,
}

impl DefaultAssetLoader {
    pub fn new() -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl AssetLoader for DefaultAssetLoader {
    async fn fetch(&self, url: &str) -> ServiceResult<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            log::debug!("fetching asset {url}");
            let response = self.http.get(url).send().await?;
            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let body = response.text().await.unwrap_or_default();
                return Err(ServiceError::Api { status, body });
            }
            return Ok(response.bytes().await?.to_vec());
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(tokio::fs::read(path).await?)
    }
}

/// Decode `data:[<mime>][;base64],<payload>`.
pub fn decode_data_url(url: &str) -> ServiceResult<Vec<u8>> {
    let rest = url.strip_prefix("data:").ok_or(ServiceError::InvalidDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(ServiceError::InvalidDataUrl)?;
    if meta.split(';').any(|part| part == "base64") {
        Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn data_urls_decode() {
        assert_eq!(decode_data_url("data:image/png;base64,AQID").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_data_url("data:text/plain,hi").unwrap(), b"hi".to_vec());
        assert!(matches!(decode_data_url("data:image/png;base64"), Err(ServiceError::InvalidDataUrl)));
        assert!(matches!(decode_data_url("data:;base64,@@@"), Err(ServiceError::Base64(_))));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let path = std::env::temp_dir().join(format!("ic-loader-test-{}.bin", std::process::id()));
        std::fs::write(&path, [9u8, 8, 7]).unwrap();
        let loader = DefaultAssetLoader::new().unwrap();

        let bare = loader.fetch(path.to_str().unwrap()).await.unwrap();
        let prefixed = loader.fetch(&format!("file://{}", path.display())).await.unwrap();
        assert_eq!(bare, vec![9, 8, 7]);
        assert_eq!(prefixed, bare);

        let _ = std::fs::remove_file(&path);
        assert!(matches!(loader.fetch(path.to_str().unwrap()).await, Err(ServiceError::Io(_))));
    }
}
