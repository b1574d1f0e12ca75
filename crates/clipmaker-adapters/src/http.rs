use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use clipmaker_core::error::{IdentityError, PlatformError};
use clipmaker_core::platform::{AccessChecker, Directory, IdentityVerifier};
use clipmaker_core::types::{AccessDecision, ExperienceProfile, UserProfile, VerifiedIdentity};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// Connection settings for [`HttpPlatformClient`].
#[derive(Clone)]
pub struct HttpPlatformConfig {
    pub base_url: String,
    pub api_key: String,
    pub app_id: String,
    pub timeout: Duration,
}

impl fmt::Debug for HttpPlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPlatformConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("app_id", &self.app_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
    app_id: &'a str,
}

/// Platform API client. Every call carries `Authorization: Bearer <api key>`.
#[derive(Clone)]
pub struct HttpPlatformClient {
    client: Client,
    base_url: Url,
    api_key: String,
    app_id: String,
}

impl fmt::Debug for HttpPlatformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPlatformClient")
            .field("base_url", &self.base_url.as_str())
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl HttpPlatformClient {
    pub fn new(config: HttpPlatformConfig) -> Result<Self, PlatformError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            PlatformError::Upstream(format!(
                "invalid platform base url '{}': {}",
                config.base_url, err
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Upstream(format!(
                "platform base url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PlatformError::Upstream(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            app_id: config.app_id,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        not_found: impl FnOnce() -> PlatformError,
    ) -> Result<T, PlatformError> {
        debug!(%url, "platform GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| PlatformError::Upstream(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        decode(response).await.map_err(|failure| match failure {
            Failure::Status(status, body) => {
                PlatformError::Upstream(format!("platform returned {}: {}", status, body))
            }
            Failure::Transport(message) => PlatformError::Upstream(message),
            Failure::Decode(message) => PlatformError::Malformed(message),
        })
    }
}

enum Failure {
    Status(StatusCode, String),
    Transport(String),
    Decode(String),
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Failure> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| Failure::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(Failure::Status(status, body));
    }
    serde_json::from_str(&body).map_err(|err| Failure::Decode(err.to_string()))
}

#[async_trait]
impl IdentityVerifier for HttpPlatformClient {
    fn backend(&self) -> &'static str {
        "http"
    }

    async fn verify_user_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = self.endpoint(&["v1", "tokens", "verify"]);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&VerifyTokenRequest {
                token,
                app_id: &self.app_id,
            })
            .send()
            .await
            .map_err(|err| IdentityError::Upstream(err.to_string()))?;

        decode(response).await.map_err(|failure| match failure {
            Failure::Status(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, body) => {
                IdentityError::InvalidToken(body)
            }
            Failure::Status(status, body) => {
                IdentityError::Upstream(format!("platform returned {}: {}", status, body))
            }
            Failure::Transport(message) => IdentityError::Upstream(message),
            Failure::Decode(message) => IdentityError::Malformed(message),
        })
    }
}

#[async_trait]
impl AccessChecker for HttpPlatformClient {
    async fn check_access(
        &self,
        user_id: &str,
        experience_id: &str,
    ) -> Result<AccessDecision, PlatformError> {
        let url = self.endpoint(&["v1", "experiences", experience_id, "access", user_id]);
        self.get_json(url, || PlatformError::experience_not_found(experience_id))
            .await
    }
}

#[async_trait]
impl Directory for HttpPlatformClient {
    async fn get_user(&self, user_id: &str) -> Result<UserProfile, PlatformError> {
        let url = self.endpoint(&["v1", "users", user_id]);
        self.get_json(url, || PlatformError::user_not_found(user_id))
            .await
    }

    async fn get_experience(
        &self,
        experience_id: &str,
    ) -> Result<ExperienceProfile, PlatformError> {
        let url = self.endpoint(&["v1", "experiences", experience_id]);
        self.get_json(url, || PlatformError::experience_not_found(experience_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use clipmaker_core::types::AccessLevel;
    use std::net::SocketAddr;

    const API_KEY: &str = "test-key";

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(|value| value == format!("Bearer {}", API_KEY))
            .unwrap_or(false)
    }

    async fn verify(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, "bad api key").into_response();
        }
        if body.get("app_id").and_then(|v| v.as_str()) != Some("app_test") {
            return (AxumStatus::FORBIDDEN, "wrong app").into_response();
        }
        match body.get("token").and_then(|v| v.as_str()) {
            Some("good-token") => Json(serde_json::json!({ "user_id": "user_1" })).into_response(),
            Some("garbled") => (AxumStatus::OK, "not json").into_response(),
            Some("boom") => (AxumStatus::BAD_GATEWAY, "upstream down").into_response(),
            _ => (AxumStatus::UNAUTHORIZED, "invalid token").into_response(),
        }
    }

    async fn access(Path((experience_id, user_id)): Path<(String, String)>) -> impl IntoResponse {
        if experience_id == "exp_missing" {
            return AxumStatus::NOT_FOUND.into_response();
        }
        let has_access = experience_id == "exp_1" && user_id == "user_1";
        let access_level = if has_access { "customer" } else { "no_access" };
        Json(serde_json::json!({
            "has_access": has_access,
            "access_level": access_level,
        }))
        .into_response()
    }

    async fn user(Path(user_id): Path<String>) -> impl IntoResponse {
        if user_id != "user_1" {
            return AxumStatus::NOT_FOUND.into_response();
        }
        Json(serde_json::json!({ "id": "user_1", "name": "Ada", "username": "ada" }))
            .into_response()
    }

    async fn experience(Path(experience_id): Path<String>) -> impl IntoResponse {
        if experience_id == "exp_garbled" {
            return Json(serde_json::json!({ "title": "no id" })).into_response();
        }
        Json(serde_json::json!({ "id": experience_id, "name": "Clip Studio" })).into_response()
    }

    async fn spawn_stub() -> SocketAddr {
        let app = Router::new()
            .route("/api/v1/tokens/verify", post(verify))
            .route(
                "/api/v1/experiences/:experience_id/access/:user_id",
                get(access),
            )
            .route("/api/v1/users/:user_id", get(user))
            .route("/api/v1/experiences/:experience_id", get(experience));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(addr: SocketAddr, api_key: &str) -> HttpPlatformClient {
        HttpPlatformClient::new(HttpPlatformConfig {
            base_url: format!("http://{}/api/", addr),
            api_key: api_key.to_string(),
            app_id: "app_test".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn verifies_token_and_resolves_profiles() {
        let addr = spawn_stub().await;
        let client = client(addr, API_KEY);

        let identity = client.verify_user_token("good-token").await.unwrap();
        assert_eq!(identity.user_id, "user_1");

        let decision = client.check_access("user_1", "exp_1").await.unwrap();
        assert!(decision.has_access);
        assert_eq!(decision.access_level, AccessLevel::Customer);

        let user = client.get_user("user_1").await.unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada"));

        let experience = client.get_experience("exp_1").await.unwrap();
        assert_eq!(experience.name, "Clip Studio");
    }

    #[tokio::test]
    async fn rejected_and_broken_tokens_map_to_identity_errors() {
        let addr = spawn_stub().await;
        let client = client(addr, API_KEY);

        assert!(matches!(
            client.verify_user_token("stolen").await,
            Err(IdentityError::InvalidToken(_))
        ));
        assert!(matches!(
            client.verify_user_token("garbled").await,
            Err(IdentityError::Malformed(_))
        ));
        assert!(matches!(
            client.verify_user_token("boom").await,
            Err(IdentityError::Upstream(_))
        ));

        let wrong_key = self::client(addr, "other-key");
        assert!(matches!(
            wrong_key.verify_user_token("good-token").await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn lookups_distinguish_missing_and_malformed() {
        let addr = spawn_stub().await;
        let client = client(addr, API_KEY);

        assert!(!client.check_access("user_2", "exp_1").await.unwrap().has_access);
        assert!(matches!(
            client.check_access("user_1", "exp_missing").await,
            Err(PlatformError::NotFound { kind: "experience", .. })
        ));
        assert!(matches!(
            client.get_user("user_9").await,
            Err(PlatformError::NotFound { kind: "user", .. })
        ));
        assert!(matches!(
            client.get_experience("exp_garbled").await,
            Err(PlatformError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn ids_are_encoded_as_single_path_segments() {
        let addr = spawn_stub().await;
        let client = client(addr, API_KEY);
        let url = client.endpoint(&["v1", "users", "../admin"]);
        assert!(url.path().ends_with("/v1/users/..%2Fadmin"));
    }

    #[tokio::test]
    async fn unreachable_platform_is_an_upstream_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(addr, API_KEY);
        assert!(matches!(
            client.verify_user_token("good-token").await,
            Err(IdentityError::Upstream(_))
        ));
        assert!(matches!(
            client.get_user("user_1").await,
            Err(PlatformError::Upstream(_))
        ));
    }

    #[test]
    fn rejects_unusable_base_url() {
        let err = HttpPlatformClient::new(HttpPlatformConfig {
            base_url: "not a url".into(),
            api_key: API_KEY.into(),
            app_id: "app".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(matches!(err, PlatformError::Upstream(_)));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = HttpPlatformConfig {
            base_url: "https://api.example".into(),
            api_key: "sk_live_secret".into(),
            app_id: "app".into(),
            timeout: Duration::from_secs(1),
        };
        assert!(!format!("{:?}", config).contains("sk_live_secret"));
    }
}
