use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;

use crate::api::models::{VideoListRequest, VideoListResponse};
use crate::config::Config;

pub struct ApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    pub fn videos_url(&self) -> String {
        format!("{}/api/videos", self.base_url)
    }

    /// Fetches title, channel and duration for each video id.
    pub fn get_list_data(&self, ids: &[String]) -> Result<VideoListResponse, ApiError> {
        if ids.is_empty() {
            return Ok(VideoListResponse::default());
        }

        debug!("Fetching metadata for {} videos", ids.len());

        let mut request = self
            .client
            .post(self.videos_url())
            .json(&VideoListRequest { ids });

        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send()?;

        match resp.status().as_u16() {
            200..=299 => Ok(resp.json()?),
            401 | 403 => Err(ApiError::Unauthorized),
            404 => Err(ApiError::NotFound),
            code => Err(ApiError::Http(code)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP error: {0}")]
    Http(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn videos_url_ignores_trailing_slash() {
        let config = Config {
            server_url: "http://localhost:3000/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config);
        assert_eq!(client.videos_url(), "http://localhost:3000/api/videos");
    }

    #[test]
    fn empty_id_list_skips_the_request() {
        let config = Config {
            server_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config);
        let response = client.get_list_data(&[]).unwrap();
        assert!(response.items.is_empty());
    }
}
