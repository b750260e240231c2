//! Error taxonomy shared by every component.
//!
//! A [`ClassifiedError`] is built once at the failure site and never mutated
//! afterwards. It carries everything the boundary needs to decide how to
//! render it (status class, safe user message) and everything the
//! [`RetryExecutor`](crate::RetryExecutor) needs to decide whether another
//! attempt is allowed.
//!
//! This module performs no I/O and no logging; that is the boundary's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kind of failure, serialized as the wire code the boundary exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller supplied bad input
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,

    /// Referenced entity is absent
    #[serde(rename = "NOT_FOUND")]
    NotFound,

    /// Data source hiccup that may succeed on another attempt
    #[serde(rename = "TRANSIENT_BACKEND_ERROR")]
    TransientBackend,

    /// Programmer or defensive fault
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,

    /// The caller gave up before the work finished
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::TransientBackend => "TRANSIENT_BACKEND_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Cancelled => "CANCELLED",
        }
    }

    fn default_severity(&self) -> Severity {
        match self {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Cancelled => Severity::Low,
            ErrorKind::TransientBackend => Severity::Medium,
            ErrorKind::Internal => Severity::Critical,
        }
    }

    /// Internal errors are the only kind that defaults to non-operational.
    fn default_operational(&self) -> bool {
        !matches!(self, ErrorKind::Internal)
    }

    fn default_user_message(&self, message: &str) -> String {
        match self {
            ErrorKind::Validation => message.to_string(),
            ErrorKind::NotFound => "The requested resource was not found".to_string(),
            ErrorKind::TransientBackend => {
                "The service is temporarily unavailable, please try again".to_string()
            }
            ErrorKind::Internal => "An unexpected error occurred".to_string(),
            ErrorKind::Cancelled => "The request was cancelled".to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// An immutable, fully classified failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    severity: Severity,
    message: String,
    context: Option<serde_json::Value>,
    is_operational: bool,
    user_message: String,
    captured_at: DateTime<Utc>,
}

impl ClassifiedError {
    /// Start classifying a failure of the given kind.
    pub fn builder(kind: ErrorKind, message: impl Into<String>) -> ClassifiedErrorBuilder {
        ClassifiedErrorBuilder {
            kind,
            message: message.into(),
            severity: None,
            context: None,
            is_operational: None,
            user_message: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::builder(ErrorKind::Validation, message).build()
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::builder(ErrorKind::NotFound, message).build()
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::builder(ErrorKind::TransientBackend, message).build()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::builder(ErrorKind::Internal, message).build()
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::builder(ErrorKind::Cancelled, message).build()
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Internal diagnostic message. Never render this for non-operational errors.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&serde_json::Value> {
        self.context.as_ref()
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }

    /// Message that is always safe to show to an end user.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Whether another attempt of the failed operation is allowed.
    pub fn is_retryable(&self) -> bool {
        self.is_operational
            && matches!(self.kind, ErrorKind::TransientBackend | ErrorKind::Internal)
    }

    /// Client faults render as 4xx; everything else is a server fault.
    pub fn is_client_fault(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn http_status(&self) -> u16 {
        if self.is_client_fault() { 400 } else { 500 }
    }
}

/// Collects the optional parts of a [`ClassifiedError`] before it is raised.
#[derive(Debug)]
#[must_use]
pub struct ClassifiedErrorBuilder {
    kind: ErrorKind,
    message: String,
    severity: Option<Severity>,
    context: Option<serde_json::Value>,
    is_operational: Option<bool>,
    user_message: Option<String>,
}

impl ClassifiedErrorBuilder {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn operational(mut self, is_operational: bool) -> Self {
        self.is_operational = Some(is_operational);
        self
    }

    pub fn user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = Some(user_message.into());
        self
    }

    pub fn build(self) -> ClassifiedError {
        let kind = self.kind;
        let user_message = self
            .user_message
            .unwrap_or_else(|| kind.default_user_message(&self.message));
        ClassifiedError {
            kind,
            severity: self.severity.unwrap_or_else(|| kind.default_severity()),
            is_operational: self.is_operational.unwrap_or_else(|| kind.default_operational()),
            context: self.context,
            user_message,
            message: self.message,
            captured_at: Utc::now(),
        }
    }
}

/// Convenience type alias for results that fail with a [`ClassifiedError`]
pub type Result<T> = std::result::Result<T, ClassifiedError>;
