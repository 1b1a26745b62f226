//! Unit type tables served through [`battle_core::UnitOracle`].
use std::collections::HashMap;

use battle_core::{UnitOracle, UnitTypeDef, UnitTypeId};

/// UnitOracle implementation backed by a map of definitions.
pub struct UnitOracleImpl {
    definitions: HashMap<UnitTypeId, UnitTypeDef>,
}

impl UnitOracleImpl {
    pub fn new(definitions: impl IntoIterator<Item = UnitTypeDef>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|def| (def.id.clone(), def))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl UnitOracle for UnitOracleImpl {
    fn definition(&self, unit_type: &UnitTypeId) -> Option<&UnitTypeDef> {
        self.definitions.get(unit_type)
    }

    fn definitions(&self) -> Vec<&UnitTypeDef> {
        let mut defs: Vec<_> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }
}
