//! Runtime API plumbing.

pub mod retry;

pub use retry::{RetryConfig, retry_runtime_call};
