use std::{
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use log::info;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;

pub const RANDOM_VIDEO_URL: &str = "https://devpicker.com/public/api/random-youtube-videos.php";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""id":"([^"]+)""#).expect("video id pattern is valid"));

#[derive(Serialize)]
struct RandomVideoRequest {
    #[serde(rename = "timestampReal")]
    timestamp_real: u64,
}

/// First `"id":"..."` value of a random-video service response.
pub fn extract_video_id(body: &str) -> Option<&str> {
    VIDEO_ID
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

/// Picks a random YouTube video through an external service.
#[derive(Clone)]
pub struct RandomVideo {
    pub web_url: String,
    pub client: Client,
}

impl Default for RandomVideo {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomVideo {
    pub fn new() -> Self {
        Self {
            web_url: RANDOM_VIDEO_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Returns a watch link for a freshly picked video.
    pub async fn pick(&self) -> anyhow::Result<String> {
        let timestamp_real = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        info!("Picking random video... : {}", self.web_url);
        let body = self
            .client
            .post(&self.web_url)
            .json(&RandomVideoRequest { timestamp_real })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let id = extract_video_id(&body)
            .with_context(|| format!("no video id in response from {}", self.web_url))?;
        Ok(format!("{YOUTUBE_WATCH_URL}{id}"))
    }
}

#[cfg(test)]
mod random_video_test {
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn picker(server: &MockServer) -> RandomVideo {
        RandomVideo {
            web_url: format!("{}/random", server.uri()),
            client: Client::new(),
        }
    }

    #[test]
    fn should_extract_first_video_id() {
        let body = r#"[{"id":"dQw4w9WgXcQ","title":"x"},{"id":"second"}]"#;
        assert_eq!(extract_video_id(body), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn should_return_none_without_id() {
        assert_eq!(extract_video_id(r#"{"error":"rate limited"}"#), None);
        assert_eq!(extract_video_id(r#"{"id":""}"#), None);
    }

    #[test]
    fn should_serialize_timestamp_field_name() {
        let json = serde_json::to_string(&RandomVideoRequest {
            timestamp_real: 1700000000,
        })
        .unwrap();
        assert_eq!(json, r#"{"timestampReal":1700000000}"#);
    }

    #[test]
    fn should_compile_video_id_pattern() {
        assert_eq!(LazyLock::force(&VIDEO_ID).captures_len(), 2);
    }

    #[tokio::test]
    async fn should_build_watch_link_from_service_response() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/random"))
            .and(matchers::body_string_contains("timestampReal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "dQw4w9WgXcQ", "title": "first"},
                {"id": "second", "title": "second"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let link = picker(&server).pick().await.unwrap();

        assert_eq!(link, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn should_fail_when_response_has_no_video() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "rate limited"})))
            .mount(&server)
            .await;

        let error = picker(&server).pick().await.unwrap_err();

        assert!(error.to_string().contains("no video id"));
    }

    #[tokio::test]
    async fn should_fail_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(picker(&server).pick().await.is_err());
    }
}
