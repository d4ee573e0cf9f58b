//! # Remote Result Shape
//!
//! Remote interfaces answer with single-key objects, `{"Ok": value}` or
//! `{"Err": error}`. [`RemoteResult`] reproduces that shape so it can be
//! decoded directly, and is converted into a plain `Result` (and from there
//! into a [`TrustedValue`]) at the port boundary. It is never passed further
//! inward.

use crate::errors::RemoteError;
use crate::trust::{ReadChannel, TrustedValue};
use serde::{Deserialize, Serialize};

/// Two-variant remote reply in its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteResult<T, E> {
    /// Success payload.
    Ok(T),
    /// Error payload defined by the remote interface.
    Err(E),
}

impl<T, E> RemoteResult<T, E> {
    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Err(err) => Err(err),
        }
    }

    /// Convert into a trusted value read from `channel`, mapping the remote
    /// error into a [`RemoteError`].
    pub fn into_trusted(self, channel: ReadChannel) -> Result<TrustedValue<T>, RemoteError>
    where
        E: Into<RemoteError>,
    {
        match self {
            Self::Ok(value) => Ok(TrustedValue::from_channel(value, channel)),
            Self::Err(err) => Err(err.into()),
        }
    }
}

impl<T, E> From<RemoteResult<T, E>> for Result<T, E> {
    fn from(result: RemoteResult<T, E>) -> Self {
        result.into_result()
    }
}
