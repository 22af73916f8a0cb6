//! [`Backend`]-related implementations.

pub mod memory;
#[cfg(feature = "rest")]
pub mod rest;

use derive_more::{Display, Error as StdError};

#[cfg(feature = "rest")]
pub use self::rest::Rest;
pub use self::memory::Memory;

/// Backend operation.
pub use common::Handler as Backend;

/// [`Backend`] error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Data cannot be decoded.
    #[display("cannot decode data: {_0}")]
    Decode(serde_json::Error),

    /// HTTP request failed or was answered with an error status.
    #[cfg(feature = "rest")]
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// Total count of a page cannot be read out of the `Content-Range`
    /// header.
    #[cfg(feature = "rest")]
    #[display("malformed `Content-Range` header: `{_0}`")]
    MalformedContentRange(#[error(not(source))] String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

#[cfg(feature = "rest")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}
