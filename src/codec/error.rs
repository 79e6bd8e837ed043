use thiserror::Error;

/// Failures produced while decoding bytes off the wire.
///
/// Every variant here is non-fatal to the *session*: a malformed frame aborts
/// the current HTTP request (see the router) but never panics and never
/// leaves a handler's mutation half-applied, because decoding always
/// completes (or fails) before any handler runs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unexpected end of packet data")]
    Truncated,
    #[error("invalid osu-string marker byte {0:#x}")]
    InvalidStringMarker(u8),
    #[error("string payload was not valid utf-8")]
    InvalidUtf8,
    #[error("packet body length {declared} does not match remaining bytes {actual}")]
    LengthMismatch { declared: u32, actual: usize },
}
