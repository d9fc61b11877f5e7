pub mod executor;
pub mod types;

pub use executor::{execute, REQUEST_TIMEOUT};
pub use types::{Payload, PreparedRequest, RelayOutcome, RelayRequest, SUPPORTED_METHODS};
