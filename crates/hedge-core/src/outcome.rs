//! Classified results of a logical operation.
//!
//! Every race, chain step, provider fetch and sink write resolves to exactly
//! one [`Outcome`]. Failures carry a [`FailureKind`] from a closed set plus the
//! name of the stage that produced them, so callers can tell an outbound-call
//! timeout from a persistence timeout without comparing strings.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Result of a logical operation.
pub type Outcome<T> = Result<T, Failure>;

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The operation's own scope, or an ancestor's, elapsed before completion.
    Timeout,
    /// I/O or transport failure unrelated to timing.
    Transfer,
    /// A payload was retrieved but could not be interpreted.
    Decode,
    /// The call succeeded but yielded no usable data.
    EmptyResult,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transfer => "transfer",
            Self::Decode => "decode",
            Self::EmptyResult => "empty_result",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, optionally attributed to the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    stage: Option<String>,
    message: String,
}

impl Failure {
    pub fn timeout(stage: impl Into<String>) -> Self {
        let stage = stage.into();
        Self {
            kind: FailureKind::Timeout,
            message: format!("deadline elapsed during '{stage}'"),
            stage: Some(stage),
        }
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transfer, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, message)
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(FailureKind::EmptyResult, message)
    }

    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
        }
    }

    /// Attributes the failure to `stage` unless an inner stage already claimed it.
    pub fn at_stage(mut self, stage: impl Into<String>) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage.into());
        }
        self
    }

    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FailureKind::Timeout => "failure.timeout",
            FailureKind::Transfer => "failure.transfer",
            FailureKind::Decode => "failure.decode",
            FailureKind::EmptyResult => "failure.empty_result",
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.stage {
            Some(stage) => write!(f, "[{stage}] {} ({})", self.message, self.code()),
            None => write!(f, "{} ({})", self.message, self.code()),
        }
    }
}

impl std::error::Error for Failure {}
