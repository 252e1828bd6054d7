use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use image::DynamicImage;
use reqwest::{Client, Response};
use tracing::debug;

use crate::{FetchConfig, FetchError, ImageFetcher};

/// Production fetcher: one GET per URL over a shared `reqwest` client.
///
/// No retries. The client-level timeout covers the whole request including
/// the body read.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_image_bytes: Option<u64>,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        cfg.validate()?;
        let client = Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(cfg.timeout())
            .user_agent(cfg.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            max_image_bytes: cfg.max_image_bytes,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        read_body(url, response, self.max_image_bytes).await
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        let body = self.fetch_bytes(url).await?;
        debug!(url, bytes = body.len(), "image_downloaded");

        let owned_url = url.to_string();
        tokio::task::spawn_blocking(move || decode_image(&owned_url, &body))
            .await
            .map_err(|e| FetchError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?
    }
}

/// Reads the body chunk by chunk so an oversize response is cut off as soon
/// as it crosses `limit`, whether or not the server sent a Content-Length.
async fn read_body(
    url: &str,
    mut response: Response,
    limit: Option<u64>,
) -> Result<Bytes, FetchError> {
    if let (Some(limit), Some(len)) = (limit, response.content_length()) {
        if len > limit {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?
    {
        if let Some(limit) = limit {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Decode an in-memory image, guessing the format from its magic bytes.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    image::load_from_memory(bytes).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
