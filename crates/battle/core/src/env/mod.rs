//! Traits describing read-only data the engine consults.
//!
//! Oracles expose unit attribute tables, map adjacency, rule switches, and
//! dice. The [`Env`] aggregate bundles them so engagements reach everything
//! through one value without depending on concrete implementations.
mod config;
mod error;
mod map;
mod rng;
mod units;

pub use config::ConfigOracle;
pub use error::OracleError;
pub use map::MapOracle;
pub use rng::{DiceSeed, PcgRng, RngOracle};
pub use units::{UnitCapabilities, UnitOracle, UnitTypeDef};

/// Aggregates the oracles an engagement needs.
pub struct Env<'a, U, M, C, R>
where
    U: UnitOracle + ?Sized,
    M: MapOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    units: Option<&'a U>,
    map: Option<&'a M>,
    config: Option<&'a C>,
    rng: Option<&'a R>,
}

// Manual impls: a derive would demand `Clone` of the (unsized) oracle types.
impl<U, M, C, R> Clone for Env<'_, U, M, C, R>
where
    U: UnitOracle + ?Sized,
    M: MapOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<U, M, C, R> Copy for Env<'_, U, M, C, R>
where
    U: UnitOracle + ?Sized,
    M: MapOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

pub type BattleEnv<'a> =
    Env<'a, dyn UnitOracle + 'a, dyn MapOracle + 'a, dyn ConfigOracle + 'a, dyn RngOracle + 'a>;

impl<'a, U, M, C, R> Env<'a, U, M, C, R>
where
    U: UnitOracle + ?Sized,
    M: MapOracle + ?Sized,
    C: ConfigOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(
        units: Option<&'a U>,
        map: Option<&'a M>,
        config: Option<&'a C>,
        rng: Option<&'a R>,
    ) -> Self {
        Self {
            units,
            map,
            config,
            rng,
        }
    }

    pub fn with_all(units: &'a U, map: &'a M, config: &'a C, rng: &'a R) -> Self {
        Self::new(Some(units), Some(map), Some(config), Some(rng))
    }

    /// Returns the UnitOracle, or an error if not available.
    pub fn units(&self) -> Result<&'a U, OracleError> {
        self.units.ok_or(OracleError::UnitsNotAvailable)
    }

    /// Returns the MapOracle, or an error if not available.
    pub fn map(&self) -> Result<&'a M, OracleError> {
        self.map.ok_or(OracleError::MapNotAvailable)
    }

    /// Returns the ConfigOracle, or an error if not available.
    pub fn config(&self) -> Result<&'a C, OracleError> {
        self.config.ok_or(OracleError::ConfigNotAvailable)
    }

    /// Returns the RngOracle, or an error if not available.
    pub fn rng(&self) -> Result<&'a R, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }
}

impl<'a, U, M, C, R> Env<'a, U, M, C, R>
where
    U: UnitOracle + 'a,
    M: MapOracle + 'a,
    C: ConfigOracle + 'a,
    R: RngOracle + 'a,
{
    /// Erases the concrete oracle types.
    pub fn as_battle_env(&self) -> BattleEnv<'a> {
        let units: Option<&'a dyn UnitOracle> = self.units.map(|units| units as _);
        let map: Option<&'a dyn MapOracle> = self.map.map(|map| map as _);
        let config: Option<&'a dyn ConfigOracle> = self.config.map(|config| config as _);
        let rng: Option<&'a dyn RngOracle> = self.rng.map(|rng| rng as _);
        Env::new(units, map, config, rng)
    }
}
