//! X (Twitter) API v2 client authenticated with an OAuth 2.0 user token.

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{MediaAttachment, Post, PostError, SocialPoster};

/// Production API root.
pub const DEFAULT_API_BASE: &str = "https://api.x.com/2";

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Serialize)]
struct MediaMetadataRequest<'a> {
    id: &'a str,
    metadata: MediaMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct MediaMetadata<'a> {
    alt_text: AltText<'a>,
}

#[derive(Debug, Serialize)]
struct AltText<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<MediaIds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<Reply<'a>>,
}

#[derive(Debug, Serialize)]
struct MediaIds {
    media_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Reply<'a> {
    in_reply_to_tweet_id: &'a str,
}

/// Posts threads to X.
#[derive(Debug, Clone)]
pub struct XPoster {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl XPoster {
    /// Creates a poster against the production API.
    #[must_use]
    pub fn new(client: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self::with_api_base(client, access_token, DEFAULT_API_BASE)
    }

    /// Creates a poster against another API root.
    #[must_use]
    pub fn with_api_base(
        client: reqwest::Client,
        access_token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Uploads an image and sets its alt text. Returns the media id.
    async fn upload_media(&self, media: &MediaAttachment) -> Result<String, PostError> {
        let bytes = tokio::fs::read(&media.path)
            .await
            .map_err(|source| PostError::Media {
                path: media.path.display().to_string(),
                source,
            })?;
        let file_name = media
            .path
            .file_name()
            .map_or_else(|| "image.png".to_string(), |n| n.to_string_lossy().into_owned());

        let form = multipart::Form::new()
            .text("media_category", "tweet_image")
            .part(
                "media",
                multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("image/png")?,
            );

        let url = format!("{}/media/upload", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let uploaded: DataEnvelope<IdOnly> = decode(&url, response).await?;
        let media_id = uploaded.data.id;

        let url = format!("{}/media/metadata", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&MediaMetadataRequest {
                id: &media_id,
                metadata: MediaMetadata {
                    alt_text: AltText {
                        text: &media.alt_text,
                    },
                },
            })
            .send()
            .await?;
        check_status(&url, response).await?;

        log::debug!("Uploaded {} as media {media_id}", media.path.display());
        Ok(media_id)
    }

    /// Publishes one post and returns its id.
    async fn create_post(
        &self,
        post: &Post,
        in_reply_to: Option<&str>,
    ) -> Result<String, PostError> {
        let mut media_ids = Vec::with_capacity(post.media.len());
        for media in &post.media {
            media_ids.push(self.upload_media(media).await?);
        }

        let url = format!("{}/tweets", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&CreatePostRequest {
                text: &post.text,
                media: (!media_ids.is_empty()).then_some(MediaIds { media_ids }),
                reply: in_reply_to.map(|id| Reply {
                    in_reply_to_tweet_id: id,
                }),
            })
            .send()
            .await?;
        let created: DataEnvelope<IdOnly> = decode(&url, response).await?;
        Ok(created.data.id)
    }
}

#[async_trait]
impl SocialPoster for XPoster {
    async fn post_thread(&self, posts: &[Post]) -> Result<(), PostError> {
        let mut previous: Option<String> = None;
        for post in posts {
            let id = self.create_post(post, previous.as_deref()).await?;
            log::debug!("Published post {id}");
            previous = Some(id);
        }
        if let Some(last) = previous {
            log::info!("Published thread of {} post(s), last {last}", posts.len());
        }
        Ok(())
    }
}

async fn check_status(url: &str, response: reqwest::Response) -> Result<String, PostError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(PostError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn decode<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, PostError> {
    let body = check_status(url, response).await?;
    serde_json::from_str(&body).map_err(|source| PostError::Decode {
        url: url.to_string(),
        source,
    })
}
