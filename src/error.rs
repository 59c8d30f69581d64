//! Error taxonomy for the transformation pipeline.
//!
//! Every failure is returned to the immediate caller. The only silent paths are
//! the lossy best-effort fallbacks in [`crate::coerce`] and [`crate::assemble`],
//! which report through the configured log sink instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input matches none of the accepted shapes.
    #[error("databridge: unsupported input type: {0}")]
    UnsupportedInput(String),

    /// Draining a stream input failed.
    #[error("databridge: read error: {0}")]
    Read(#[source] std::io::Error),

    /// Canonical form could not be decoded into the destination, even after the
    /// numeric best-effort retry.
    #[error("databridge: failed to decode input into target: {0}")]
    DecodeFailed(#[source] serde_json::Error),

    /// Keys not claimed by the destination schema while strict mode is active.
    #[error("databridge: strict mode - unknown fields present: [{}]", .0.join(", "))]
    StrictViolation(Vec<String>),

    /// An intermediate value could not be serialized to canonical form.
    #[error("databridge: marshal failure: {0}")]
    Marshal(#[source] serde_json::Error),

    /// The destination is neither record-shaped nor a collection of records.
    #[error("databridge: invalid destination: {0}")]
    InvalidDestination(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_violation_lists_every_path() {
        let err = Error::StrictViolation(vec!["b".to_string(), "a.x".to_string()]);
        assert_eq!(
            err.to_string(),
            "databridge: strict mode - unknown fields present: [b, a.x]"
        );
    }

    #[test]
    fn read_error_keeps_its_cause() {
        let err = Error::Read(std::io::Error::other("boom"));
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "boom");
    }
}
