pub mod dto;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::AppError;

/// Metadata resolved for a video reference id.
#[derive(Clone, Debug)]
pub struct VideoInfo {
    pub title: String,
    pub author: Option<String>,
}

/// Lookup of the video reference a lecture embeds. `Ok(None)` means the id
/// resolved to nothing; callers log and keep going either way.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn lookup(&self, video_id: &str) -> Result<Option<VideoInfo>, AppError>;
}

pub struct YouTubeOembedClient {
    client: Client,
}

impl YouTubeOembedClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::BadRequest(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VideoCatalog for YouTubeOembedClient {
    async fn lookup(&self, video_id: &str) -> Result<Option<VideoInfo>, AppError> {
        let url = format!(
            "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v={}&format=json",
            video_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| AppError::InternalServerError)?;

        if !response.status().is_success() {
            debug!("oEmbed lookup for {} answered {}", video_id, response.status());
            return Ok(None);
        }

        let body: dto::OembedResponse = response
            .json()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to parse oEmbed response: {}", e)))?;

        Ok(Some(VideoInfo {
            title: body.title,
            author: body.author_name,
        }))
    }
}

pub struct NoopVideoCatalog;

#[async_trait]
impl VideoCatalog for NoopVideoCatalog {
    async fn lookup(&self, _video_id: &str) -> Result<Option<VideoInfo>, AppError> {
        Ok(None)
    }
}
