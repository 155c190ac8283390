//! Control-surface handlers.

use crate::auth::WebhookVerifier;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::messages::{
    AckResponse, HealthResponse, RecordsRequest, RecordsResponse, StartRequest, TriggerRequest,
    TriggerResponse, WebhookEvent, WebhookResponse,
};
use chrono::Utc;
use fieldsync_engine::{RecordFilter, RecordStore, RemoteEntitySource, SyncEngine, SyncError};
use fieldsync_model::{EngineStatus, EntityKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The operations the front door is permitted to call.
///
/// Everything goes through the engine; the handlers never read or write
/// record or cursor state directly.
pub struct ControlHandler<R: RemoteEntitySource, S: RecordStore> {
    engine: Arc<SyncEngine<R, S>>,
    config: ServerConfig,
    verifier: WebhookVerifier,
}

impl<R, S> ControlHandler<R, S>
where
    R: RemoteEntitySource + 'static,
    S: RecordStore + 'static,
{
    /// Creates a handler around an engine.
    pub fn new(engine: Arc<SyncEngine<R, S>>, config: ServerConfig) -> Self {
        let verifier = WebhookVerifier::new(config.webhook_secret.clone());
        Self {
            engine,
            config,
            verifier,
        }
    }

    /// Health check.
    pub fn handle_health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".into(),
            timestamp: Utc::now(),
        }
    }

    /// Runs one ad-hoc cycle and reports it.
    pub async fn handle_trigger(&self, request: TriggerRequest) -> ServerResult<TriggerResponse> {
        let result = self.engine.trigger_manual(request.force).await?;
        Ok(TriggerResponse {
            message: format!(
                "cycle finished: {} records across {} passes",
                result.records_processed(),
                result.outcomes.len()
            ),
            result,
        })
    }

    /// Engine status snapshot.
    pub async fn handle_status(&self) -> ServerResult<EngineStatus> {
        Ok(self.engine.status().await?)
    }

    /// Starts continuous sync.
    pub fn handle_start(&self, request: StartRequest) -> ServerResult<AckResponse> {
        let interval = request
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_interval);
        self.engine.start_continuous(interval)?;
        Ok(AckResponse {
            message: format!("continuous sync started ({}s interval)", interval.as_secs()),
        })
    }

    /// Requests continuous sync to stop after the in-flight cycle.
    pub fn handle_stop(&self) -> AckResponse {
        self.engine.stop_continuous();
        AckResponse {
            message: "continuous sync stop requested".into(),
        }
    }

    /// Verifies and processes an inbound webhook.
    ///
    /// Entity-update events trigger a non-forced cycle; a cycle already in
    /// flight will pick the change up anyway, so that case is acknowledged
    /// rather than failed. Unknown events are acknowledged and ignored.
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> ServerResult<WebhookResponse> {
        self.verifier.verify(raw_body, signature)?;

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| ServerError::InvalidRequest(format!("malformed webhook body: {e}")))?;

        let Some(kind) = event_entity_kind(&event.event_type) else {
            warn!(event_type = %event.event_type, "ignoring unknown webhook event");
            return Ok(WebhookResponse {
                message: format!("event {} ignored", event.event_type),
                triggered: false,
            });
        };

        info!(event_type = %event.event_type, kind = %kind, "webhook received");
        match self.engine.trigger_manual(false).await {
            Ok(result) => Ok(WebhookResponse {
                message: format!(
                    "cycle triggered by {}: {} records",
                    event.event_type,
                    result.records_processed()
                ),
                triggered: true,
            }),
            Err(SyncError::AlreadyRunning) => Ok(WebhookResponse {
                message: "a cycle is already in flight; change will be picked up".into(),
                triggered: false,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-through record access for dashboards.
    pub async fn handle_records(&self, request: RecordsRequest) -> ServerResult<RecordsResponse> {
        let filter = RecordFilter {
            state: request.state,
            origin: request.origin,
        };
        let records = self.engine.records(request.kind, filter).await?;
        Ok(RecordsResponse {
            kind: request.kind,
            count: records.len(),
            records,
        })
    }
}

/// Maps a webhook event name to the entity kind it concerns.
fn event_entity_kind(event_type: &str) -> Option<EntityKind> {
    match event_type {
        "work_order_updated" => Some(EntityKind::WorkOrder),
        "customer_updated" => Some(EntityKind::Customer),
        "technician_updated" => Some(EntityKind::Technician),
        "appointment_updated" => Some(EntityKind::Appointment),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use fieldsync_engine::{EngineConfig, MemoryRecordStore, MockRemoteSource};
    use fieldsync_model::{CursorStatus, RemoteEntity};
    use serde_json::json;

    fn handler() -> ControlHandler<MockRemoteSource, MemoryRecordStore> {
        let config = EngineConfig::default().with_kinds(vec![EntityKind::WorkOrder]);
        let engine = Arc::new(SyncEngine::new(
            config,
            MockRemoteSource::new(),
            MemoryRecordStore::new(),
        ));
        ControlHandler::new(engine, ServerConfig::new(b"webhook-secret".to_vec()))
    }

    fn seed_work_order(handler: &ControlHandler<MockRemoteSource, MemoryRecordStore>) {
        handler.engine.source_ref().seed_entities(
            EntityKind::WorkOrder,
            vec![RemoteEntity::new(
                "WO-1",
                "2024-06-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap(),
                json!({"subject": "a"}),
            )],
        );
    }

    fn signed(handler: &ControlHandler<MockRemoteSource, MemoryRecordStore>, body: &str) -> String {
        handler.verifier.sign(body.as_bytes())
    }

    #[tokio::test]
    async fn trigger_runs_a_cycle() {
        let handler = handler();
        seed_work_order(&handler);

        let response = handler
            .handle_trigger(TriggerRequest::default())
            .await
            .unwrap();
        assert!(response.result.succeeded());
        assert_eq!(response.result.records_processed(), 1);
    }

    #[tokio::test]
    async fn status_exposes_cursors() {
        let handler = handler();
        seed_work_order(&handler);
        handler
            .handle_trigger(TriggerRequest::default())
            .await
            .unwrap();

        let status = handler.handle_status().await.unwrap();
        assert!(!status.is_running);
        assert_eq!(
            status.cursors[&EntityKind::WorkOrder].last_status,
            CursorStatus::Success
        );
    }

    #[tokio::test]
    async fn webhook_with_valid_signature_triggers_cycle() {
        let handler = handler();
        seed_work_order(&handler);

        let body = r#"{
            "event_type": "work_order_updated",
            "data": {"id": "WO-1"},
            "timestamp": "2024-06-01T10:00:00Z"
        }"#;
        let signature = signed(&handler, body);

        let response = handler
            .handle_webhook(body.as_bytes(), &signature)
            .await
            .unwrap();
        assert!(response.triggered);

        let records = handler
            .handle_records(RecordsRequest {
                kind: EntityKind::WorkOrder,
                state: None,
                origin: None,
            })
            .await
            .unwrap();
        assert_eq!(records.count, 1);
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_rejected() {
        let handler = handler();
        let body = r#"{"event_type": "work_order_updated", "data": {}, "timestamp": "t"}"#;

        let result = handler.handle_webhook(body.as_bytes(), "deadbeef").await;
        assert!(matches!(result, Err(ServerError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn unknown_webhook_event_is_acknowledged_not_run() {
        let handler = handler();
        let body = r#"{"event_type": "invoice_paid", "data": {}, "timestamp": "t"}"#;
        let signature = signed(&handler, body);

        let response = handler
            .handle_webhook(body.as_bytes(), &signature)
            .await
            .unwrap();
        assert!(!response.triggered);
        assert!(response.message.contains("ignored"));
    }

    #[tokio::test]
    async fn start_and_stop_continuous() {
        let handler = handler();

        let ack = handler
            .handle_start(StartRequest {
                interval_secs: Some(1),
            })
            .unwrap();
        assert!(ack.message.contains("started"));

        // A second start is the control-level already-running signal.
        let err = handler
            .handle_start(StartRequest::default())
            .unwrap_err();
        assert!(matches!(err, ServerError::AlreadyRunning));

        handler.handle_stop();
        handler.engine.join_continuous().await;
        assert!(!handler.engine.is_continuous());
    }

    #[tokio::test]
    async fn health_answers() {
        let handler = handler();
        let health = handler.handle_health();
        assert_eq!(health.status, "healthy");
    }
}
