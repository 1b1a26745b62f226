//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, the engine and
//! decision providers so clients can bubble them up with one type.
use std::fmt;

use battle_core::{BattleError, EngineError, ErrorSeverity};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("runtime task join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error("{kind} decision provider failed: {message}")]
    Provider { kind: ProviderKind, message: String },

    #[error("{kind} decision provider not set")]
    ProviderNotSet { kind: ProviderKind },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("runtime requires oracles to be configured before building")]
    MissingOracles,
}

impl RuntimeError {
    pub fn provider(kind: ProviderKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }

    /// Severity of an engine error; runtime plumbing failures are internal.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Battle(err) => err.severity(),
            Self::Provider { .. } => ErrorSeverity::Recoverable,
            Self::ProviderNotSet { .. } | Self::InvalidConfig(_) | Self::MissingOracles => {
                ErrorSeverity::Validation
            }
            Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::WorkerJoin(_)
            | Self::Repository(_) => ErrorSeverity::Internal,
        }
    }

    /// True if the engine tore the engagement down.
    pub fn aborted_battle(&self) -> bool {
        matches!(self, Self::Battle(err) if err.severity().is_fatal())
    }
}

/// Which registered provider answers for a participant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Accepts every default answer.
    Default,
    /// Replays a queue of prepared answers.
    Scripted,
    /// A participant on the other side of some transport, keyed by slot.
    Remote(u32),
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Default => write!(f, "default"),
            ProviderKind::Scripted => write!(f, "scripted"),
            ProviderKind::Remote(slot) => write!(f, "remote#{}", slot),
        }
    }
}
