//! HTTP handlers: the dispatch fallback feeding the request router.

pub mod dispatch;
pub use dispatch::dispatch;
