pub mod api;
pub mod client;
pub mod configuration;
pub mod error;
pub mod routing;
pub mod session;
pub mod telemetry;
pub mod token_store;
pub mod transport;
pub mod validators;

#[cfg(test)]
mod testing;

pub use client::{ApiClient, DEFAULT_LOGIN_ROUTE, REFRESH_PATH};
pub use error::{ApiError, ErrorCategory, NetworkError, RefreshError, RoutingError, StorageError, ValidationError};
pub use routing::RoutingClient;
pub use session::{Notification, NotificationLevel, SessionEvents, TracingSessionEvents};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
