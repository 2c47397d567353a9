pub mod markers;
pub mod protocol;
pub mod request;
pub mod session;
pub mod suggestions;

pub use markers::*;
pub use protocol::*;
pub use request::*;
pub use session::*;
pub use suggestions::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("geocoder answered HTTP {status}")]
    Http { status: u16 },
    #[error("geocode request failed: {0}")]
    Transport(String),
    #[error("geocode response malformed: {0}")]
    Decode(String),
    #[error("marker could not be placed: {0}")]
    Marker(String),
}
