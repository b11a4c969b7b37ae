// HTTP façade (C5) plus its ambient layer (C7): routing, wire types, and
// request-logging/CORS/timeout/body-limit middleware.

pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod types;

pub use server::ApiServer;
pub use types::{ApiError, ApiState, GetAllResponse, PollResponse, StartRequest, StartResponse};
