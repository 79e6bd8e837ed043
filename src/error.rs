//! The error taxonomy from §7: each variant names the failure class and
//! carries enough to decide the protocol-visible response, without ever
//! propagating a collaborator panic into the packet router's request loop.

use thiserror::Error;

use crate::chat::ChatError;
use crate::codec::CodecError;

/// Malformed login body or frame header. The session is never created.
#[derive(Debug, Error)]
pub enum ProtocolShapeError {
    #[error("login body did not have the expected three newline-separated sections")]
    MalformedHandshake,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Authentication/authorization denials during login, each already mapped
/// to a pre-formatted notification string (§4.7, §7).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found")]
    UnknownUser,
    #[error("incorrect password")]
    BadPassword,
    #[error("account is banned")]
    Banned,
    #[error("account is restricted")]
    Restricted,
    #[error("account verification window has expired")]
    FrozenExpired,
    #[error("bot accounts cannot log in from a game client")]
    BotAbuse,
    #[error("client version is not allowed")]
    CheatClient,
    #[error("multiple accounts detected")]
    MultiAccount,
    #[error("server is in maintenance mode")]
    Maintenance,
}

impl AuthError {
    /// The human-readable notification sent to the client before the
    /// login-failed/login-banned marker.
    pub fn notification(&self) -> &'static str {
        match self {
            AuthError::UnknownUser | AuthError::BadPassword => {
                "Incorrect username or password."
            }
            AuthError::Banned => "Your account has been banned.",
            AuthError::Restricted => "Your account is restricted.",
            AuthError::FrozenExpired => {
                "Your account verification window has expired and has been restricted."
            }
            AuthError::BotAbuse => "This account cannot be used to log in from a game client.",
            AuthError::CheatClient => "Your client version is not allowed to connect.",
            AuthError::MultiAccount => "Multiple accounts detected on this hardware.",
            AuthError::Maintenance => "The server is currently undergoing maintenance.",
        }
    }
}

/// A packet arrived for a token the registry no longer holds (§7, §8 S2).
#[derive(Debug, Error)]
#[error("session token is no longer registered")]
pub struct SessionGoneError;

/// DB or cache unavailability. Distinguishes the login path (where a DB
/// failure must surface) from everything else (where it is logged and the
/// offending mutation is skipped).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("collaborator request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("collaborator call timed out")]
    Timeout,
}

/// Host-only command from a non-host, a join with the wrong password, a
/// change-slot onto a non-open slot, and similar rejections that must never
/// mutate match state (§7).
#[derive(Debug, Error)]
pub enum MatchLogicError {
    #[error("match is full or the slot is not open")]
    SlotNotOpen,
    #[error("incorrect match password")]
    WrongPassword,
    #[error("only the match host may do this")]
    NotHost,
    #[error("match does not exist")]
    NoSuchMatch,
    #[error("target slot is not a valid transfer-host target")]
    InvalidHostTarget,
}

/// A session went over the spam threshold and was silenced (§4.4, §7).
#[derive(Debug, Error)]
#[error("session exceeded the chat spam threshold")]
pub struct SpamViolation;

/// The crate-wide error enum (§4.13): everything a packet handler can fail
/// with, collapsed to one type so the router has a single match to write
/// instead of threading five separate error types through every call site.
#[derive(Debug, Error)]
pub enum BanchoError {
    #[error(transparent)]
    ProtocolShape(#[from] ProtocolShapeError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    SessionGone(#[from] SessionGoneError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    MatchLogic(#[from] MatchLogicError),
    #[error(transparent)]
    Spam(#[from] SpamViolation),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Chat(#[from] ChatError),
}
