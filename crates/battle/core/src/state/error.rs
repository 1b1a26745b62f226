//! State access errors.

use crate::error::{EngineError, ErrorSeverity};

use super::{TerritoryId, UnitId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    #[error("territory {0} does not exist")]
    UnknownTerritory(TerritoryId),

    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error("unit {unit} is not in territory {territory}")]
    UnitNotInTerritory { unit: UnitId, territory: TerritoryId },
}

impl EngineError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownTerritory(_) | Self::UnknownUnit(_) => ErrorSeverity::Validation,
            Self::UnitNotInTerritory { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTerritory(_) => "STATE_UNKNOWN_TERRITORY",
            Self::UnknownUnit(_) => "STATE_UNKNOWN_UNIT",
            Self::UnitNotInTerritory { .. } => "STATE_UNIT_NOT_IN_TERRITORY",
        }
    }
}
