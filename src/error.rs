//! Error types for position decoding and variant lookup.

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Search-time inconsistencies (suspected hash collisions) are not errors:
/// the engine recovers from them internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The variant id does not name a known board configuration.
    #[error("unknown variant {0:?}")]
    UnknownVariant(String),
    /// A position code could not be parsed.
    #[error("malformed position code: {0}")]
    MalformedCode(String),
    /// An integer position key is outside the encodable range.
    #[error("malformed position key {0}")]
    MalformedKey(i64),
    /// A principal-variation index list could not be parsed or replayed.
    #[error("malformed principal variation: {0}")]
    MalformedPv(String),
}

pub type Result<T> = std::result::Result<T, Error>;
