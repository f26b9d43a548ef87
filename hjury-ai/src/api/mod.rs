//! HTTP API handlers for hjury-ai
//!
//! REST endpoints for jury sessions plus an SSE event stream.

pub mod auth;
pub mod health;
pub mod jury;
pub mod sse;

pub use auth::Owner;
pub use health::health_routes;
pub use jury::jury_routes;
pub use sse::jury_event_stream;
