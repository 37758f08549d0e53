use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, RequestBuilder, Response};
use shared::{
    domain::{Graph, GraphId, UserSummary},
    error::{ApiError, ApiException},
    protocol::{Alert, AlertLevel},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

const GRAPHS_PATH: &str = "api/graphs";
const USERS_PATH: &str = "api/users";
const EVENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0} is unavailable")]
    Unavailable(&'static str),
}

impl ClientError {
    /// HTTP status of the failed response, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(exception) => Some(exception.status),
            ClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Persistence for graph entities. Every call settles exactly once.
#[async_trait]
pub trait GraphResource: Send + Sync {
    async fn get(&self, id: GraphId) -> Result<Graph>;
    async fn create(&self, graph: &Graph) -> Result<Graph>;
    async fn update(&self, graph: &Graph) -> Result<Graph>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<UserSummary>>;
}

pub struct MissingGraphResource;

#[async_trait]
impl GraphResource for MissingGraphResource {
    async fn get(&self, _id: GraphId) -> Result<Graph> {
        Err(ClientError::Unavailable("graph resource"))
    }

    async fn create(&self, _graph: &Graph) -> Result<Graph> {
        Err(ClientError::Unavailable("graph resource"))
    }

    async fn update(&self, _graph: &Graph) -> Result<Graph> {
        Err(ClientError::Unavailable("graph resource"))
    }
}

pub struct MissingUserDirectory;

#[async_trait]
impl UserDirectory for MissingUserDirectory {
    async fn list(&self) -> Result<Vec<UserSummary>> {
        Err(ClientError::Unavailable("user directory"))
    }
}

/// Side-channel notifications raised while talking to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Alert(Alert),
    Error { status: u16, error: ApiError },
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Prefix of the `X-<app>-alert` / `X-<app>-params` / `X-<app>-error` headers.
    pub app_name: String,
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_name: "visualizer2App".into(),
            auth_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

struct AlertHeaders {
    alert: String,
    params: String,
    error: String,
}

impl AlertHeaders {
    fn for_app(app_name: &str) -> Self {
        let prefix = format!("x-{}", app_name.to_ascii_lowercase());
        Self {
            alert: format!("{prefix}-alert"),
            params: format!("{prefix}-params"),
            error: format!("{prefix}-error"),
        }
    }
}

/// reqwest-backed client for the admin REST API.
pub struct RestClient {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
    headers: AlertHeaders,
    events: broadcast::Sender<ClientEvent>,
}

impl RestClient {
    pub fn new(settings: &ClientSettings) -> Result<Arc<Self>> {
        let mut raw_base = settings.base_url.trim().to_string();
        if !raw_base.ends_with('/') {
            raw_base.push('/');
        }
        let base_url = Url::parse(&raw_base)?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Arc::new(Self {
            http,
            base_url,
            auth_token: settings
                .auth_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            headers: AlertHeaders::for_app(&settings.app_name),
            events,
        }))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Publishes header alerts for successful responses and turns failures into
    /// [`ApiException`]s, publishing them as [`ClientEvent::Error`] as well.
    async fn intercept(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            if let Some(alert) = self.alert_from_headers(response.headers()) {
                debug!(message = %alert.message, "backend alert");
                let _ = self.events.send(ClientEvent::Alert(alert));
            }
            return Ok(response);
        }

        let header_message = header_text(response.headers(), &self.headers.error);
        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
            let message = header_message
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            ApiError::new(message)
        });

        warn!(
            status = status.as_u16(),
            message = %error.message,
            "admin api request failed"
        );
        let _ = self.events.send(ClientEvent::Error {
            status: status.as_u16(),
            error: error.clone(),
        });
        Err(ApiException::new(status.as_u16(), error).into())
    }

    fn alert_from_headers(&self, headers: &HeaderMap) -> Option<Alert> {
        let message = header_text(headers, &self.headers.alert)?;
        Some(Alert {
            level: AlertLevel::Success,
            message,
            param: header_text(headers, &self.headers.params),
        })
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl GraphResource for RestClient {
    async fn get(&self, id: GraphId) -> Result<Graph> {
        let url = self.endpoint(&format!("{GRAPHS_PATH}/{}", id.0))?;
        let response = self.authorize(self.http.get(url)).send().await?;
        Ok(self.intercept(response).await?.json().await?)
    }

    async fn create(&self, graph: &Graph) -> Result<Graph> {
        if graph.id.is_some() {
            return Err(ClientError::InvalidRequest(
                "a new graph cannot already have an id".into(),
            ));
        }
        let url = self.endpoint(GRAPHS_PATH)?;
        let response = self.authorize(self.http.post(url)).json(graph).send().await?;
        Ok(self.intercept(response).await?.json().await?)
    }

    async fn update(&self, graph: &Graph) -> Result<Graph> {
        if graph.id.is_none() {
            return Err(ClientError::InvalidRequest(
                "graph has no id; create it before updating".into(),
            ));
        }
        let url = self.endpoint(GRAPHS_PATH)?;
        let response = self.authorize(self.http.put(url)).json(graph).send().await?;
        Ok(self.intercept(response).await?.json().await?)
    }
}

#[async_trait]
impl UserDirectory for RestClient {
    async fn list(&self) -> Result<Vec<UserSummary>> {
        let url = self.endpoint(USERS_PATH)?;
        let response = self.authorize(self.http.get(url)).send().await?;
        Ok(self.intercept(response).await?.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
