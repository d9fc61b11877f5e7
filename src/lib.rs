pub mod config;
pub mod error;
pub mod relay;
pub mod routes;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use relay::{execute, Payload, PreparedRequest, RelayOutcome, RelayRequest};
pub use store::RecordStore;

/// Shared state handed to every request handler.
pub struct AppState {
    pub store: RecordStore,
}
