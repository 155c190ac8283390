//! The field-service platform API client.

use crate::auth::TokenManager;
use crate::config::RemoteConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldsync_engine::{FetchWindow, RemoteEntitySource, SyncError, SyncResult};
use fieldsync_model::{EntityKind, RemoteEntity};
use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// How long one API request may take before the client gives up.
/// The engine deliberately has no timeout of its own; a stuck call here
/// would otherwise block its loop indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the field-service platform's REST API.
///
/// Implements the engine's [`RemoteEntitySource`] contract. All auth state
/// lives inside; a request rejected with 401 is retried once after a forced
/// token refresh before the failure is surfaced as [`SyncError::Auth`].
pub struct FsmClient {
    http: reqwest::Client,
    config: RemoteConfig,
    tokens: TokenManager,
}

impl FsmClient {
    /// Creates a client from a configuration.
    pub fn new(config: RemoteConfig) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {e}")))?;
        let tokens = TokenManager::new(http.clone(), config.clone());
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    async fn authorized(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> SyncResult<reqwest::Response> {
        let mut refreshed = false;
        loop {
            let token = self.tokens.token().await?;
            let mut builder = self
                .http
                .request(method.clone(), url)
                .header(AUTHORIZATION, format!("Zoho-oauthtoken {token}"))
                .header("orgId", &self.config.org_id)
                .query(query);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                SyncError::transport_retryable(format!("request to {url} failed: {e}"))
            })?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                // The cached token may have been revoked before its
                // bookkeeping expiry.
                debug!("platform rejected the access token; refreshing and retrying");
                self.tokens.invalidate().await;
                refreshed = true;
                continue;
            }
            if status.is_success() {
                return Ok(response);
            }

            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, &detail));
        }
    }
}

#[async_trait]
impl RemoteEntitySource for FsmClient {
    async fn fetch(
        &self,
        kind: EntityKind,
        window: FetchWindow,
        page_size: u32,
    ) -> SyncResult<Vec<RemoteEntity>> {
        let resource = resource_path(kind);
        let url = format!("{}/fsm/v1/{resource}", self.config.base_url);

        let mut query = vec![("per_page".to_string(), page_size.to_string())];
        if let Some(since) = window.modified_since {
            query.push(("modified_time".to_string(), since.to_rfc3339()));
        }

        let response = self.authorized(Method::GET, &url, &query, None).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::transport_fatal(format!("malformed fetch response: {e}")))?;

        let entities: Vec<RemoteEntity> = extract_items(body, resource)
            .into_iter()
            .filter_map(|item| parse_entity(kind, item))
            .collect();
        debug!(kind = %kind, count = entities.len(), "fetched remote entities");
        Ok(entities)
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> SyncResult<String> {
        let url = format!("{}/fsm/v1/{}", self.config.base_url, resource_path(kind));
        let response = self
            .authorized(Method::POST, &url, &[], Some(payload))
            .await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::transport_fatal(format!("malformed create response: {e}")))?;

        let id = extract_created_id(&body).ok_or_else(|| {
            SyncError::transport_fatal(format!("create response for {kind} carries no id"))
        })?;
        debug!(kind = %kind, remote_id = %id, "created remote entity");
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, remote_id: &str, payload: &Value) -> SyncResult<()> {
        let url = format!(
            "{}/fsm/v1/{}/{remote_id}",
            self.config.base_url,
            resource_path(kind)
        );
        self.authorized(Method::PUT, &url, &[], Some(payload))
            .await?;
        debug!(kind = %kind, remote_id = %remote_id, "updated remote entity");
        Ok(())
    }
}

/// API resource path for a kind.
fn resource_path(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Customer => "customers",
        EntityKind::Technician => "technicians",
        EntityKind::WorkOrder => "workorders",
        EntityKind::Appointment => "appointments",
    }
}

/// Pulls the entity list out of a fetch response body.
///
/// The platform wraps lists either not at all, under `data`, or under the
/// resource name, depending on endpoint and API vintage.
fn extract_items(body: Value, resource: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("data") {
                return items;
            }
            if let Some(Value::Array(items)) = map.remove(resource) {
                return items;
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Maps one raw item into a [`RemoteEntity`], skipping items with no id.
fn parse_entity(kind: EntityKind, item: Value) -> Option<RemoteEntity> {
    let id = match item_id(&item) {
        Some(id) => id,
        None => {
            warn!(kind = %kind, "skipping fetched entity without an id");
            return None;
        }
    };
    let modified_at = item_modified_time(&item).unwrap_or_else(Utc::now);
    Some(RemoteEntity::new(id, modified_at, item))
}

fn item_id(item: &Value) -> Option<String> {
    match item.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn item_modified_time(item: &Value) -> Option<DateTime<Utc>> {
    ["Modified_Time", "modified_time"]
        .iter()
        .find_map(|field| item.get(*field))
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Pulls the new entity's id out of a create response body.
fn extract_created_id(body: &Value) -> Option<String> {
    item_id(body).or_else(|| body.get("data").and_then(item_id))
}

/// Maps a non-success HTTP status to the engine's error taxonomy.
fn status_error(status: StatusCode, detail: &str) -> SyncError {
    let detail = detail.chars().take(200).collect::<String>();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::Auth(format!("{status}: {detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => SyncError::RateLimited(format!("{status}: {detail}")),
        StatusCode::REQUEST_TIMEOUT => {
            SyncError::transport_retryable(format!("{status}: {detail}"))
        }
        s if s.is_server_error() => SyncError::transport_retryable(format!("{status}: {detail}")),
        _ => SyncError::transport_fatal(format!("{status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_paths() {
        assert_eq!(resource_path(EntityKind::WorkOrder), "workorders");
        assert_eq!(resource_path(EntityKind::Customer), "customers");
        assert_eq!(resource_path(EntityKind::Technician), "technicians");
        assert_eq!(resource_path(EntityKind::Appointment), "appointments");
    }

    #[test]
    fn items_extracted_from_every_wrapping() {
        let bare = json!([{"id": "1"}]);
        assert_eq!(extract_items(bare, "workorders").len(), 1);

        let data = json!({"data": [{"id": "1"}, {"id": "2"}]});
        assert_eq!(extract_items(data, "workorders").len(), 2);

        let named = json!({"workorders": [{"id": "1"}]});
        assert_eq!(extract_items(named, "workorders").len(), 1);

        let unrelated = json!({"message": "no results"});
        assert!(extract_items(unrelated, "workorders").is_empty());
    }

    #[test]
    fn entity_parsing_reads_id_and_modified_time() {
        let item = json!({
            "id": "WO-1001",
            "Modified_Time": "2024-06-01T08:30:00+05:30",
            "subject": "Boiler inspection"
        });
        let entity = parse_entity(EntityKind::WorkOrder, item).unwrap();
        assert_eq!(entity.remote_id, "WO-1001");
        assert_eq!(
            entity.modified_at,
            "2024-06-01T03:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(entity.payload["subject"], "Boiler inspection");

        let numeric = json!({"id": 42, "modified_time": "2024-06-01T00:00:00Z"});
        let entity = parse_entity(EntityKind::Customer, numeric).unwrap();
        assert_eq!(entity.remote_id, "42");

        assert!(parse_entity(EntityKind::Customer, json!({"name": "no id"})).is_none());
    }

    #[test]
    fn created_id_found_at_top_level_or_under_data() {
        assert_eq!(
            extract_created_id(&json!({"id": "WO-42"})).as_deref(),
            Some("WO-42")
        );
        assert_eq!(
            extract_created_id(&json!({"data": {"id": 7}})).as_deref(),
            Some("7")
        );
        assert!(extract_created_id(&json!({"message": "created"})).is_none());
    }

    #[test]
    fn status_mapping_matches_error_taxonomy() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            SyncError::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            SyncError::RateLimited(_)
        ));
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(!status_error(StatusCode::UNPROCESSABLE_ENTITY, "").is_transient());
    }
}
