use super::models::{ErrorBody, FacetsRequest, SourceTracksRequest};
use crate::{
    config::ClientConfig,
    error::{Result, TransferError},
    traits::TransferBackend,
};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    collection::{
        CollectionRef, FacetSuggestions, ManagedCollection, ProviderCollection, SourceItemsPage,
    },
    transfer::{ExecutionResult, PreviewResult, TransferRequest},
};
use std::{sync::OnceLock, time::Duration};
use tracing::debug;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

fn limit_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(?:max(?:imum)?|limit|up to|at most)\D{0,24}?(\d+)").ok())
        .as_ref()
}

/// Pulls the ceiling out of messages like "max of 500 tracks per action".
fn parse_limit(message: &str) -> Option<u32> {
    limit_pattern()?
        .captures(message)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Whether a rejection message is about the per-action item ceiling.
fn mentions_item_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    let about_size = lower.contains("max") || lower.contains("limit") || lower.contains("too many");
    let about_items = ["track", "song", "item", "per action"]
        .iter()
        .any(|word| lower.contains(word));
    about_size && about_items
}

/// Maps an HTTP failure onto the transfer error taxonomy.
pub(crate) fn error_for_status(status: StatusCode, detail: Option<String>) -> TransferError {
    let message = |fallback: &str| detail.clone().unwrap_or_else(|| fallback.to_string());
    let too_many = || TransferError::TooManyItems {
        requested: None,
        limit: detail.as_deref().and_then(parse_limit),
    };

    match status.as_u16() {
        401 | 403 => TransferError::NotAuthorized(message("You are not allowed to manage this playlist")),
        404 => TransferError::NotFound(message("Playlist not found")),
        413 => too_many(),
        400 | 409 | 422 => match detail.as_deref() {
            Some(d) if mentions_item_limit(d) => too_many(),
            _ => TransferError::Validation(message("The transfer request was rejected")),
        },
        code => TransferError::Transport(format!("{code}: {}", message("Request failed"))),
    }
}

#[derive(Debug, Clone)]
pub struct VotunaClient {
    base_url: Url,
    api_token: Option<String>,
    client: Client,
}

#[derive(Default)]
pub struct VotunaClientBuilder {
    base_url: Option<String>,
    api_token: Option<String>,
    timeout: Option<Duration>,
}

impl VotunaClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let builder = Self::new()
            .base_url(&config.base_url)
            .timeout(config.request_timeout);
        match &config.api_token {
            Some(token) => builder.api_token(token),
            None => builder,
        }
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn api_token(mut self, token: &str) -> Self {
        self.api_token = Some(token.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<VotunaClient> {
        let base_url_str = self.base_url.ok_or(TransferError::NotConfigured)?;
        // Trailing slash so that `join` appends instead of replacing the last segment.
        let base_url = Url::parse(&format!("{}/", base_url_str.trim_end_matches('/')))?;
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(VotunaClient {
            base_url,
            api_token: self.api_token,
            client,
        })
    }
}

impl VotunaClient {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("api/v1/{path}"))?)
    }

    async fn make_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<B>,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("Request: {} {}", method, url);
        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        if let Some(b) = body {
            request = request.json(&b);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            Ok(serde_json::from_str(&text)?)
        } else {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message())
                .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()));
            debug!("Request failed with {}: {:?}", status, detail);
            Err(error_for_status(status, detail))
        }
    }

    fn management_path(current_id: i64, action: &str) -> String {
        format!("votuna/playlists/{current_id}/management/{action}")
    }
}

#[async_trait]
impl TransferBackend for VotunaClient {
    fn id(&self) -> &'static str {
        "votuna"
    }

    async fn list_provider_collections(&self, provider: &str) -> Result<Vec<ProviderCollection>> {
        self.make_request::<_, ()>(
            Method::GET,
            &format!("playlists/providers/{provider}"),
            &[],
            None,
        )
        .await
    }

    async fn search_provider_collections(
        &self,
        provider: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ProviderCollection>> {
        self.make_request::<_, ()>(
            Method::GET,
            &format!("playlists/providers/{provider}/search"),
            &[("q", query.to_string()), ("limit", limit.to_string())],
            None,
        )
        .await
    }

    async fn list_managed_collections(&self) -> Result<Vec<ManagedCollection>> {
        self.make_request::<_, ()>(Method::GET, "votuna/playlists", &[], None)
            .await
    }

    async fn suggest_facets(
        &self,
        current_id: i64,
        source: &CollectionRef,
    ) -> Result<FacetSuggestions> {
        self.make_request(
            Method::POST,
            &Self::management_path(current_id, "facets"),
            &[],
            Some(FacetsRequest { source }),
        )
        .await
    }

    async fn browse_source_items(
        &self,
        current_id: i64,
        source: &CollectionRef,
        search: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<SourceItemsPage> {
        self.make_request(
            Method::POST,
            &Self::management_path(current_id, "source-tracks"),
            &[],
            Some(SourceTracksRequest {
                source,
                search,
                limit,
                offset,
            }),
        )
        .await
    }

    async fn preview_transfer(
        &self,
        current_id: i64,
        request: &TransferRequest,
    ) -> Result<PreviewResult> {
        self.make_request(
            Method::POST,
            &Self::management_path(current_id, "preview"),
            &[],
            Some(request),
        )
        .await
    }

    async fn execute_transfer(
        &self,
        current_id: i64,
        request: &TransferRequest,
    ) -> Result<ExecutionResult> {
        self.make_request(
            Method::POST,
            &Self::management_path(current_id, "execute"),
            &[],
            Some(request),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        assert!(matches!(
            VotunaClientBuilder::new().build(),
            Err(TransferError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = VotunaClientBuilder::new()
            .base_url("https://example.test/backend/")
            .build()
            .unwrap();
        assert_eq!(
            client
                .endpoint(&VotunaClient::management_path(7, "preview"))
                .unwrap()
                .as_str(),
            "https://example.test/backend/api/v1/votuna/playlists/7/management/preview"
        );
    }

    #[test]
    fn test_auth_statuses() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, None);
        assert!(matches!(err, TransferError::NotAuthorized(_)));
        let err = error_for_status(StatusCode::FORBIDDEN, Some("Owner only".into()));
        assert_eq!(err.to_string(), "Owner only");
    }

    #[test]
    fn test_not_found() {
        let err = error_for_status(StatusCode::NOT_FOUND, Some("Playlist not found".into()));
        assert!(matches!(err, TransferError::NotFound(m) if m == "Playlist not found"));
    }

    #[test]
    fn test_validation_vs_limit() {
        let err = error_for_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("selection_values must not be empty".into()),
        );
        assert!(matches!(err, TransferError::Validation(_)));

        let err = error_for_status(
            StatusCode::BAD_REQUEST,
            Some("Selection exceeds the max of 500 tracks per action".into()),
        );
        assert!(matches!(
            err,
            TransferError::TooManyItems {
                requested: None,
                limit: Some(500)
            }
        ));
    }

    #[test]
    fn test_payload_too_large_without_detail() {
        let err = error_for_status(StatusCode::PAYLOAD_TOO_LARGE, None);
        assert!(matches!(
            err,
            TransferError::TooManyItems {
                requested: None,
                limit: None
            }
        ));
    }

    #[test]
    fn test_server_errors_are_transport() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, None);
        assert!(matches!(err, TransferError::Transport(_)));
        assert_eq!(err.to_string(), "Network error: 502: Request failed");
    }

    #[test]
    fn test_error_body_detail_forms() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "Nope"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Nope"));

        let body: ErrorBody = serde_json::from_str(
            r#"{"detail": [{"loc": ["body", "title"], "msg": "field required"}, {"msg": "bad mode"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("field required; bad mode"));

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.message(), None);
    }
}
