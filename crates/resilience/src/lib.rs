//! # Resilience Crate
//!
//! Error taxonomy and retry machinery that every I/O boundary funnels through.
//!
//! ## Components
//!
//! - **error**: [`ClassifiedError`] and its [`ErrorKind`] / [`Severity`] taxonomy
//! - **retry**: [`RetryExecutor`] driven by a [`RetryPolicy`] with fixed,
//!   linear or exponential backoff, plus the named presets
//! - **cancel**: [`CancellationToken`] so abandoned requests stop waiting
//!
//! Validation failures are raised before any retry wrapping, so they never
//! consume retry budget. Transient failures are absorbed inside the executor
//! and only escape once attempts are exhausted.

pub mod cancel;
pub mod error;
pub mod retry;

pub use cancel::{CancellationToken, DropGuard};
pub use error::{ClassifiedError, ClassifiedErrorBuilder, ErrorKind, Result, Severity};
pub use retry::{BackoffStrategy, RetryExecutor, RetryPolicy, RetryPolicySettings};
