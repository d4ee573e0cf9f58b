//! # Flat Wire Codec
//!
//! JSON form of the worker messages, used when a context boundary is a real
//! process or transport boundary:
//!
//! ```text
//! { "kind": "<tag>", "op"?: "start|stop|restart", "payload"?: {..},
//!   "result"?: {"value": .., "verified": ..} | ErrorEnvelope,
//!   "generation"?: n, "requestId"?: n }
//! ```
//!
//! Unknown `kind` tags decode to `Ok(None)` so older receivers ignore newer
//! task families.

use crate::messages::{Delivery, SyncData, TaskParams, TaskSpec, WorkerCommand, WorkerEvent};
use serde::{Deserialize, Serialize};
use shared_types::{ErrorEnvelope, Generation, TaskKind, TaskOp, TrustedValue};
use thiserror::Error;
use tracing::debug;

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed JSON or payload shape.
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required by the message is missing.
    #[error("Missing field `{field}` for kind {kind}")]
    MissingField {
        /// Task kind of the message.
        kind: TaskKind,
        /// Field name.
        field: &'static str,
    },
}

/// Result slot of an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireResult {
    /// A delivered value.
    Value(TrustedValue<serde_json::Value>),
    /// A failure.
    Error(ErrorEnvelope),
}

/// The flat envelope used in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    /// Task kind tag.
    pub kind: String,
    /// Lifecycle operation (inbound only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<TaskOp>,
    /// Kind-specific payload (inbound only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Delivered value or error (outbound only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WireResult>,
    /// Generation stamp (outbound only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Tick id (outbound deliveries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl WireEnvelope {
    fn bare(kind: TaskKind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            op: None,
            payload: None,
            result: None,
            generation: None,
            request_id: None,
        }
    }

    /// Parse the kind tag; `None` when this build does not know it.
    fn known_kind(&self) -> Option<TaskKind> {
        match self.kind.parse::<TaskKind>() {
            Ok(kind) => Some(kind),
            Err(err) => {
                debug!(error = %err, "[bus] Ignoring message for unknown task kind");
                None
            }
        }
    }
}

fn spec_payload(spec: &TaskSpec) -> Result<serde_json::Value, CodecError> {
    Ok(serde_json::json!({
        "intervalMs": spec.interval_ms,
        "params": spec.params.to_value()?,
    }))
}

fn spec_from_payload(kind: TaskKind, payload: Option<serde_json::Value>) -> Result<TaskSpec, CodecError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawSpec {
        interval_ms: u64,
        params: serde_json::Value,
    }

    let payload = payload.ok_or(CodecError::MissingField {
        kind,
        field: "payload",
    })?;
    let raw: RawSpec = serde_json::from_value(payload)?;
    Ok(TaskSpec::new(
        TaskParams::from_value(kind, raw.params)?,
        raw.interval_ms,
    ))
}

/// Encode an inbound command.
pub fn encode_command(command: &WorkerCommand) -> Result<String, CodecError> {
    let mut envelope = WireEnvelope::bare(command.kind());
    envelope.op = Some(command.op());
    match command {
        WorkerCommand::Start(spec) | WorkerCommand::Restart(spec) => {
            envelope.payload = Some(spec_payload(spec)?);
        }
        WorkerCommand::Stop(_) => {}
    }
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode an inbound command. `Ok(None)` for unknown kinds.
pub fn decode_command(json: &str) -> Result<Option<WorkerCommand>, CodecError> {
    let envelope: WireEnvelope = serde_json::from_str(json)?;
    let Some(kind) = envelope.known_kind() else {
        return Ok(None);
    };
    let op = envelope.op.ok_or(CodecError::MissingField { kind, field: "op" })?;
    let command = match op {
        TaskOp::Start => WorkerCommand::Start(spec_from_payload(kind, envelope.payload)?),
        TaskOp::Restart => WorkerCommand::Restart(spec_from_payload(kind, envelope.payload)?),
        TaskOp::Stop => WorkerCommand::Stop(kind),
    };
    Ok(Some(command))
}

/// Encode an outbound event.
pub fn encode_event(event: &WorkerEvent) -> Result<String, CodecError> {
    let mut envelope = WireEnvelope::bare(event.kind());
    envelope.generation = Some(event.generation().0);
    match event {
        WorkerEvent::Delivered(delivery) => {
            envelope.request_id = Some(delivery.request_id);
            envelope.result = Some(WireResult::Value(TrustedValue::new(
                delivery.value.value.to_value()?,
                delivery.value.verified,
            )));
        }
        WorkerEvent::Failed { error, .. } => {
            envelope.result = Some(WireResult::Error(error.clone()));
        }
    }
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode an outbound event. `Ok(None)` for unknown kinds.
pub fn decode_event(json: &str) -> Result<Option<WorkerEvent>, CodecError> {
    let envelope: WireEnvelope = serde_json::from_str(json)?;
    let Some(kind) = envelope.known_kind() else {
        return Ok(None);
    };
    let generation = Generation(envelope.generation.unwrap_or_default());
    let result = envelope.result.ok_or(CodecError::MissingField {
        kind,
        field: "result",
    })?;
    let event = match result {
        WireResult::Value(value) => WorkerEvent::Delivered(Delivery {
            generation,
            request_id: envelope.request_id.unwrap_or_default(),
            value: TrustedValue::new(SyncData::from_value(kind, value.value)?, value.verified),
        }),
        WireResult::Error(error) => WorkerEvent::Failed {
            kind,
            generation,
            error,
        },
    };
    Ok(Some(event))
}
