//! Network utilities shared by Binder operations.

mod retry;

pub use retry::{retry_async, RetryPolicy};
