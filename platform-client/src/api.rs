use crate::retry::{lock, RetryConfig, RetryExecutor};
use crate::PlatformAdapter;
use chainpulse_core::{CoreError, GeneratedContent, ObservedPost, PlatformConfig, PlatformError};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const TIMELINE_PAGE_SIZE: &str = "5";

/// Envelope every X API v2 object endpoint responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct XResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<XApiProblem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XApiProblem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XTweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct FollowRequest<'a> {
    target_user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FollowResult {
    #[serde(default)]
    following: bool,
    #[serde(default)]
    pending_follow: bool,
}

/// Platform adapter backed by the X API v2 with a user-context token.
#[derive(Debug)]
pub struct XApiClient {
    http_client: Client,
    api_base: String,
    access_token: String,
    retry: RetryExecutor,
    me: Mutex<Option<XUser>>,
    user_ids: Mutex<HashMap<String, String>>,
}

impl XApiClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, CoreError> {
        Self::with_retry(config, RetryConfig::x_api())
    }

    pub fn with_retry(config: &PlatformConfig, retry: RetryConfig) -> Result<Self, CoreError> {
        let access_token =
            config
                .access_token
                .clone()
                .ok_or_else(|| PlatformError::AuthenticationFailed {
                    reason: "no access token configured".to_string(),
                })?;

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token,
            retry: RetryExecutor::new(retry),
            me: Mutex::new(None),
            user_ids: Mutex::new(HashMap::new()),
        })
    }

    /// Lets shutdown cut retry backoff waits short.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.retry = self.retry.with_shutdown(shutdown);
        self
    }

    /// The authenticated account, once [`PlatformAdapter::connect`] succeeded.
    pub fn me(&self) -> Option<XUser> {
        lock(&self.me).clone()
    }

    async fn make_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(&self.access_token);
        if !query_params.is_empty() {
            request_builder = request_builder.query(query_params);
        }
        if let Some(body) = body {
            request_builder = request_builder.json(body);
        }

        debug!("Making X API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            if e.is_timeout() {
                CoreError::Platform(PlatformError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            warn!("Request failed with status: {} for {}", status, endpoint);
            return Err(map_status(status, retry_after, endpoint).into());
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse response from {}: {}", endpoint, e);
            PlatformError::InvalidResponse {
                details: format!("unexpected body from {}", endpoint),
            }
            .into()
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, CoreError> {
        self.retry
            .execute(operation, || {
                self.make_request(method.clone(), endpoint, query_params, body.as_ref())
            })
            .await
    }

    fn my_id(&self) -> Result<String, CoreError> {
        lock(&self.me)
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or_else(|| {
                PlatformError::SessionUnavailable {
                    reason: "not connected".to_string(),
                }
                .into()
            })
    }

    async fn user_id(&self, handle: &str) -> Result<String, CoreError> {
        let handle = handle.trim_start_matches('@');
        let key = handle.to_lowercase();
        if let Some(id) = lock(&self.user_ids).get(&key) {
            return Ok(id.clone());
        }

        let endpoint = format!("/2/users/by/username/{}", handle);
        let response: XResponse<XUser> = self
            .request("lookup_user", Method::GET, &endpoint, &[], None)
            .await?;
        let user = response.data.ok_or_else(|| PlatformError::UserNotFound {
            handle: handle.to_string(),
        })?;

        debug!("Resolved @{} to user id {}", handle, user.id);
        lock(&self.user_ids).insert(key, user.id.clone());
        Ok(user.id)
    }

    async fn create_tweet(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<XTweet, CoreError> {
        let request = CreateTweetRequest {
            text,
            reply: in_reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
        };
        let body = serde_json::to_value(&request)?;

        let response: XResponse<XTweet> = self
            .request("create_tweet", Method::POST, "/2/tweets", &[], Some(body))
            .await?;
        response.data.ok_or_else(|| {
            PlatformError::InvalidResponse {
                details: problem_details(&response.errors),
            }
            .into()
        })
    }

    async fn follow_user(&self, handle: &str) -> Result<FollowResult, CoreError> {
        let source_id = self.my_id()?;
        let target_id = self.user_id(handle).await?;
        let body = serde_json::to_value(FollowRequest {
            target_user_id: &target_id,
        })?;

        let endpoint = format!("/2/users/{}/following", source_id);
        let response: XResponse<FollowResult> = self
            .request("follow", Method::POST, &endpoint, &[], Some(body))
            .await?;
        response.data.ok_or_else(|| {
            PlatformError::InvalidResponse {
                details: problem_details(&response.errors),
            }
            .into()
        })
    }

    /// Latest original posts of an account, retweets and replies excluded.
    async fn timeline(&self, handle: &str) -> Result<Vec<XTweet>, CoreError> {
        let user_id = self.user_id(handle).await?;
        let endpoint = format!("/2/users/{}/tweets", user_id);
        let response: XResponse<Vec<XTweet>> = self
            .request(
                "fetch_latest",
                Method::GET,
                &endpoint,
                &[
                    ("max_results", TIMELINE_PAGE_SIZE),
                    ("exclude", "retweets,replies"),
                    ("tweet.fields", "created_at"),
                ],
                None,
            )
            .await?;
        Ok(response.data.unwrap_or_default())
    }
}

impl PlatformAdapter for XApiClient {
    async fn connect(&self) -> Result<(), CoreError> {
        let response: XResponse<XUser> = self
            .request("users_me", Method::GET, "/2/users/me", &[], None)
            .await
            .map_err(|e| PlatformError::SessionUnavailable {
                reason: e.to_string(),
            })?;
        let user = response.data.ok_or_else(|| PlatformError::SessionUnavailable {
            reason: problem_details(&response.errors),
        })?;

        info!("Connected to X as @{} ({})", user.username, user.id);
        *lock(&self.me) = Some(user);
        Ok(())
    }

    async fn post(&self, content: &GeneratedContent) -> Result<(), CoreError> {
        let mut previous: Option<String> = None;
        for (index, chunk) in content.chunks().iter().enumerate() {
            let tweet = self
                .create_tweet(chunk, previous.as_deref())
                .await
                .map_err(|e| action_failed("post", &format!("chunk {}", index + 1), e))?;
            debug!("Posted chunk {} as tweet {}", index + 1, tweet.id);
            previous = Some(tweet.id);
        }
        Ok(())
    }

    async fn reply(&self, target: &ObservedPost, text: &str) -> Result<(), CoreError> {
        let tweet = self
            .create_tweet(text, Some(&target.id))
            .await
            .map_err(|e| action_failed("reply", &target.url, e))?;
        info!("Replied to {} with tweet {}", target.url, tweet.id);
        Ok(())
    }

    async fn follow(&self, handle: &str) -> Result<(), CoreError> {
        let outcome = self
            .follow_user(handle)
            .await
            .map_err(|e| action_failed("follow", handle, e))?;
        debug!(
            "Follow @{}: following={} pending={}",
            handle, outcome.following, outcome.pending_follow
        );
        Ok(())
    }

    async fn fetch_latest(&self, handle: &str) -> Result<Option<ObservedPost>, CoreError> {
        let tweets = self
            .timeline(handle)
            .await
            .map_err(|e| action_failed("fetch_latest", handle, e))?;
        Ok(latest_post(handle, tweets))
    }

    async fn close(&self) -> Result<(), CoreError> {
        lock(&self.user_ids).clear();
        if let Some(user) = lock(&self.me).take() {
            info!("Closed X session for @{}", user.username);
        }
        Ok(())
    }
}

/// Newest timestamped tweet of a timeline page, as an observed post.
pub fn latest_post(handle: &str, tweets: Vec<XTweet>) -> Option<ObservedPost> {
    let handle = handle.trim_start_matches('@');
    tweets
        .into_iter()
        .filter_map(|tweet| tweet.created_at.map(|created_at| (created_at, tweet)))
        .max_by_key(|(created_at, _)| *created_at)
        .map(|(timestamp, tweet)| ObservedPost {
            url: format!("https://x.com/{}/status/{}", handle, tweet.id),
            id: tweet.id,
            author: handle.to_string(),
            text: tweet.text,
            timestamp,
        })
}

pub fn map_status(status: StatusCode, retry_after: Option<u64>, endpoint: &str) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::AuthenticationFailed {
            reason: format!("{} returned {}", endpoint, status),
        },
        404 => PlatformError::InvalidResponse {
            details: format!("{} not found", endpoint),
        },
        429 => PlatformError::RateLimitExceeded {
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        code if status.is_server_error() => PlatformError::ServerError { status_code: code },
        _ => PlatformError::InvalidResponse {
            details: format!("{} returned {}", endpoint, status),
        },
    }
}

fn problem_details(errors: &[XApiProblem]) -> String {
    errors
        .iter()
        .filter_map(|problem| problem.detail.as_deref().or(problem.title.as_deref()))
        .next()
        .unwrap_or("response carried no data")
        .to_string()
}

/// Auth problems and open circuits stay as they are so callers can tell a
/// dead session from one failed action.
fn action_failed(action: &str, target: &str, error: CoreError) -> CoreError {
    match error {
        CoreError::Platform(
            PlatformError::AuthenticationFailed { .. } | PlatformError::SessionUnavailable { .. },
        ) => error,
        other => PlatformError::ActionFailed {
            action: action.to_string(),
            target: target.to_string(),
            reason: other.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> PlatformConfig {
        PlatformConfig {
            access_token: Some("user-token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_requires_token() {
        let result = XApiClient::new(&PlatformConfig::default());
        assert!(matches!(
            result,
            Err(CoreError::Platform(PlatformError::AuthenticationFailed { .. }))
        ));
        assert!(XApiClient::new(&config()).is_ok());
    }

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, None, "/2/tweets"),
            PlatformError::AuthenticationFailed { .. }
        ));
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, Some(15), "/2/tweets"),
            PlatformError::RateLimitExceeded { retry_after: 15 }
        );
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, None, "/2/tweets"),
            PlatformError::RateLimitExceeded { retry_after: 60 }
        );
        assert_eq!(
            map_status(StatusCode::BAD_GATEWAY, None, "/2/tweets"),
            PlatformError::ServerError { status_code: 502 }
        );
    }

    #[test]
    fn test_latest_post_picks_newest() {
        let tweets = vec![
            XTweet {
                id: "100".to_string(),
                text: "older".to_string(),
                created_at: Some(Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()),
            },
            XTweet {
                id: "200".to_string(),
                text: "newer".to_string(),
                created_at: Some(Utc.with_ymd_and_hms(2026, 10, 17, 11, 0, 0).unwrap()),
            },
            XTweet {
                id: "300".to_string(),
                text: "undated".to_string(),
                created_at: None,
            },
        ];

        let post = latest_post("@VitalikButerin", tweets).unwrap();
        assert_eq!(post.id, "200");
        assert_eq!(post.author, "VitalikButerin");
        assert_eq!(post.url, "https://x.com/VitalikButerin/status/200");
    }

    #[test]
    fn test_latest_post_empty_timeline() {
        assert_eq!(latest_post("cobie", Vec::new()), None);
    }

    #[test]
    fn test_action_failed_keeps_auth_errors() {
        let auth: CoreError = PlatformError::AuthenticationFailed {
            reason: "revoked".to_string(),
        }
        .into();
        assert!(matches!(
            action_failed("post", "chunk 1", auth),
            CoreError::Platform(PlatformError::AuthenticationFailed { .. })
        ));

        let server: CoreError = PlatformError::ServerError { status_code: 500 }.into();
        assert!(matches!(
            action_failed("follow", "cobie", server),
            CoreError::Platform(PlatformError::ActionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_follow_requires_connection() {
        let client = XApiClient::new(&config()).unwrap();
        let result = client.follow("cobie").await;
        assert!(matches!(
            result,
            Err(CoreError::Platform(PlatformError::SessionUnavailable { .. }))
        ));
    }
}
