use std::fmt::{Display, Formatter};

use hedge_core::{Failure, FailureKind, ProviderId, StageRecord};
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{failure_exit_code, CliError};

/// Request identifier (UUID v4) stamped on every envelope and forwarded
/// downstream by `relay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: RequestId,
    pub generated_at: String,
    pub latency_ms: u64,
    pub providers: Vec<ProviderId>,
    pub stages: Vec<StageRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeError {
    pub code: &'static str,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub message: String,
    #[serde(skip)]
    pub exit_code: u8,
}

impl From<&Failure> for EnvelopeError {
    fn from(failure: &Failure) -> Self {
        Self {
            code: failure.code(),
            kind: failure.kind(),
            stage: failure.stage().map(str::to_owned),
            message: failure.message().to_owned(),
            exit_code: failure_exit_code(failure.kind()),
        }
    }
}

/// The single JSON document a command prints.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

impl Envelope {
    pub fn new(meta: EnvelopeMeta, data: Value, failure: Option<&Failure>) -> Self {
        Self {
            meta,
            data,
            error: failure.map(EnvelopeError::from),
        }
    }
}

pub fn now_rfc3339() -> Result<String, CliError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    println!("{payload}");
    Ok(())
}
