//! Rating submission over HTTP
//!
//! Ratings are the one request/response exchange in a session. No timeout
//! is imposed here and nothing is retried; the user repeats the action.

use std::future::Future;

use colloquy_core::{RatingSubmission, SubmissionError};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;

/// Something that can deliver a rating submission
pub trait RatingSubmitter {
    fn submit(
        &self,
        username: &str,
        submission: &RatingSubmission,
    ) -> impl Future<Output = Result<(), SubmissionError>> + Send;
}

/// Submits ratings to the server's `/rate/final` endpoint
#[derive(Debug, Clone)]
pub struct HttpRatingSubmitter {
    client: reqwest::Client,
    endpoint: Endpoint,
    token: Option<String>,
}

impl HttpRatingSubmitter {
    pub fn new(endpoint: Endpoint, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }
}

impl RatingSubmitter for HttpRatingSubmitter {
    async fn submit(
        &self,
        username: &str,
        submission: &RatingSubmission,
    ) -> Result<(), SubmissionError> {
        let url = self.endpoint.rating_url(username)?;
        debug!(discussion_id = %submission.discussion_id, "Submitting ratings");

        let mut request = self.client.post(url).json(submission);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(status, &body);
        warn!(status = %status, message = %message, "Ratings rejected");
        Err(SubmissionError::ServerRejected(message))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Human-readable reason from an error response body
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{DiscussionId, RatingMatrix};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One-shot HTTP server: captures the request head and body, answers
    /// with `status` and a JSON `body`
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (Endpoint, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::new(listener.local_addr().unwrap().to_string(), false);

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client hung up before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            while buf.len() < head_end + length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client hung up before sending the body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let request_body = String::from_utf8_lossy(&buf[head_end..head_end + length]).into_owned();

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            (head, request_body)
        });

        (endpoint, server)
    }

    /// Talks to the local listener directly, whatever proxy the environment sets
    fn local_submitter(endpoint: Endpoint, token: Option<String>) -> HttpRatingSubmitter {
        HttpRatingSubmitter {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            endpoint,
            token,
        }
    }

    fn submission() -> RatingSubmission {
        let mut ratings = RatingMatrix::new();
        ratings
            .entry("bob".to_string())
            .or_default()
            .insert("politeness".to_string(), 4);
        RatingSubmission {
            discussion_id: DiscussionId::from("42"),
            ratings,
        }
    }

    #[tokio::test]
    async fn test_submit_posts_ratings_with_token() {
        let (endpoint, server) = serve_once("200 OK", "{}").await;
        let submitter = local_submitter(endpoint, Some("secret-token".into()));

        submitter.submit("alice", &submission()).await.unwrap();

        let (head, body) = server.await.unwrap();
        assert!(head.starts_with("post /rate/final?username=alice http/1.1"));
        assert!(head.contains("authorization: bearer secret-token"));

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["discussionId"], serde_json::json!(42));
        assert_eq!(body["ratings"]["bob"]["politeness"], serde_json::json!(4));
    }

    #[tokio::test]
    async fn test_submit_surfaces_server_rejection() {
        let (endpoint, server) =
            serve_once("403 Forbidden", r#"{"error":"Not a participant"}"#).await;
        let submitter = local_submitter(endpoint, None);

        let result = submitter.submit("alice", &submission()).await;
        assert_eq!(
            result,
            Err(SubmissionError::ServerRejected("Not a participant".into()))
        );

        let (head, _) = server.await.unwrap();
        assert!(!head.contains("authorization:"));
    }

    #[test]
    fn test_rejection_prefers_message_field() {
        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, r#"{"message":"Fill everything"}"#),
            "Fill everything"
        );
        assert_eq!(
            rejection_message(StatusCode::FORBIDDEN, r#"{"error":"Not a participant"}"#),
            "Not a participant"
        );
    }

    #[test]
    fn test_rejection_falls_back_to_status() {
        assert_eq!(
            rejection_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "500 Internal Server Error"
        );
        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, r#"{"message":""}"#),
            "400 Bad Request"
        );
    }
}
