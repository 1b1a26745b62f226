//! Common error infrastructure for battle-core.
//!
//! Domain errors (`BattleError`, `OracleError`, `StateError`) live next to the
//! code that raises them; this module only carries the shared classification.

use crate::state::{BattleId, TerritoryId};

/// Severity level of an error, used to decide how the caller reacts.
///
/// - **Recoverable**: the same request may succeed later
/// - **Validation**: the request was malformed and must not be retried unchanged
/// - **Internal**: engine state is inconsistent; indicates a bug
/// - **Fatal**: the engagement cannot continue and is torn down
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error should abort the engagement it came from.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Where in the engine an error was raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub battle: Option<BattleId>,
    pub site: Option<TerritoryId>,
    /// Round the engagement was in when the error surfaced.
    pub round: Option<u32>,
}

impl ErrorContext {
    #[must_use]
    pub const fn for_battle(battle: BattleId, site: TerritoryId, round: u32) -> Self {
        Self {
            battle: Some(battle),
            site: Some(site),
            round: Some(round),
        }
    }
}

/// Uniform classification for every error type in the crate.
///
/// Implementors derive `thiserror::Error` for the message and report a stable
/// code for logs and tests.
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
