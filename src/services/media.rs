// Exercise video probe
//
// Checks whether an exercise's demonstration video can be fetched. Failures
// are reported as a status for the front end to display and never returned
// as errors.

use crate::models::Exercise;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStatus {
    /// The exercise has no video attached
    Missing,
    Ready,
    Failed { reason: String },
}

impl MediaStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, MediaStatus::Ready)
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaStatus::Missing => write!(f, "no video"),
            MediaStatus::Ready => write!(f, "video ready"),
            MediaStatus::Failed { reason } => write!(f, "video failed to load ({})", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoProbe {
    client: Client,
}

impl VideoProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for video probe: {}", e);
                Client::new()
            });
        Self { client }
    }

    /// Issue a HEAD request against `url`
    pub async fn probe(&self, url: &str) -> MediaStatus {
        match self.client.head(url).send().await {
            Ok(response) if response.status().is_success() => MediaStatus::Ready,
            Ok(response) => {
                tracing::warn!("Video {} answered {}", url, response.status());
                MediaStatus::Failed {
                    reason: format!("HTTP {}", response.status().as_u16()),
                }
            }
            Err(e) => {
                tracing::warn!("Video {} unreachable: {}", url, e);
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    "unreachable".to_string()
                };
                MediaStatus::Failed { reason }
            }
        }
    }

    pub async fn probe_exercise(&self, exercise: &Exercise) -> MediaStatus {
        match exercise.video_url.as_deref() {
            Some(url) if !url.trim().is_empty() => self.probe(url).await,
            _ => MediaStatus::Missing,
        }
    }
}

impl Default for VideoProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;

    #[test]
    fn test_status_display() {
        assert_eq!(MediaStatus::Missing.to_string(), "no video");
        assert_eq!(
            MediaStatus::Failed {
                reason: "HTTP 404".to_string()
            }
            .to_string(),
            "video failed to load (HTTP 404)"
        );
        assert!(MediaStatus::Ready.is_ready());
    }

    #[tokio::test]
    async fn test_exercise_without_video_is_missing() {
        let catalog = Catalog::builtin();
        let mut exercise = catalog.exercise("pushups").unwrap().clone();
        exercise.video_url = None;

        let status = VideoProbe::default().probe_exercise(&exercise).await;
        assert_eq!(status, MediaStatus::Missing);
    }

    #[tokio::test]
    async fn test_unreachable_url_fails_gracefully() {
        let probe = VideoProbe::new(Duration::from_millis(500));
        let status = probe.probe("http://127.0.0.1:9/missing.mp4").await;
        assert!(matches!(status, MediaStatus::Failed { .. }));
    }
}
