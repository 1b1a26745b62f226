//! Oracle access errors.

use crate::error::{EngineError, ErrorSeverity};
use crate::state::{TerritoryId, UnitTypeId};

/// Errors raised when static data behind an oracle is missing.
///
/// An engagement cannot resolve without unit attributes or rules, so a missing
/// oracle is fatal; an unknown reference is a malformed scenario.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("UnitOracle not available")]
    UnitsNotAvailable,

    #[error("MapOracle not available")]
    MapNotAvailable,

    #[error("ConfigOracle not available")]
    ConfigNotAvailable,

    #[error("RngOracle not available")]
    RngNotAvailable,

    #[error("unit type '{0}' is not defined")]
    UnknownUnitType(UnitTypeId),

    #[error("territory {0} is not on the map")]
    UnknownTerritory(TerritoryId),
}

impl EngineError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            UnitsNotAvailable | MapNotAvailable | ConfigNotAvailable | RngNotAvailable => {
                ErrorSeverity::Fatal
            }
            UnknownUnitType(_) | UnknownTerritory(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            UnitsNotAvailable => "ORACLE_UNITS_NOT_AVAILABLE",
            MapNotAvailable => "ORACLE_MAP_NOT_AVAILABLE",
            ConfigNotAvailable => "ORACLE_CONFIG_NOT_AVAILABLE",
            RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            UnknownUnitType(_) => "ORACLE_UNKNOWN_UNIT_TYPE",
            UnknownTerritory(_) => "ORACLE_UNKNOWN_TERRITORY",
        }
    }
}
