use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::{AttendanceStore, Authenticator, RosterSource};
use crate::config::BackendConfig;
use crate::error::{BackendError, ConfigError, ErrorResponse};
use crate::models::{AttendancePayload, ClassRoster, Confirmation, LoginRequest, LoginResponse, User};

/// REST implementation of every collaborator, talking to the attendance server.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::Invalid {
                key: "ATTENDANCE_API_URL",
                value: config.base_url.clone(),
            })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl RosterSource for HttpBackend {
    async fn fetch_class_roster(&self, class_id: &str) -> Result<ClassRoster, BackendError> {
        let url = self.url(&["api", "faculty", "class", class_id, "students"]);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        parse_response(response).await
    }
}

#[async_trait]
impl AttendanceStore for HttpBackend {
    async fn create_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError> {
        let url = self.url(&["api", "faculty", "attendance"]);
        debug!("POST {} class={} date={}", url, payload.class_id, payload.date);

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response).await
    }

    async fn amend_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError> {
        let url = self.url(&["api", "faculty", "attendance", "rectify"]);
        debug!("PUT {} class={} date={}", url, payload.class_id, payload.date);

        let response = self
            .client
            .put(url)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response).await
    }
}

#[async_trait]
impl Authenticator for HttpBackend {
    async fn login(&self, user_id: &str) -> Result<User, BackendError> {
        let url = self.url(&["api", "auth", "login"]);
        let request_body = LoginRequest {
            user_id: user_id.to_string(),
        };

        let response = self
            .client
            .post(url)
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;
        let body: LoginResponse = parse_response(response).await?;
        Ok(body.user)
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse response body: {}", e);
            BackendError::Unavailable(format!("malformed response: {}", e))
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| if body.is_empty() { status.to_string() } else { body });

    Err(match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::CONFLICT => BackendError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => BackendError::Validation(message),
        _ => BackendError::Unavailable(format!("{}: {}", status, message)),
    })
}
