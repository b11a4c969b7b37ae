// Error types shared across the store, registry, executor and HTTP layers.

use thiserror::Error;

use crate::executor::ExecutorError;

/// Top-level error for the service. Every fallible operation in the crate
/// returns this type (or a `From`-convertible subset of it).
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error during {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
