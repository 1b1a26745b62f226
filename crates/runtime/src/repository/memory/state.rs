use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::repository::{BattleSnapshot, RepositoryError, Result, StateRepository};
use crate::types::Sequence;

/// Simple in-memory implementation backed by a `RwLock<BTreeMap<..>>`.
#[derive(Default)]
pub struct InMemoryStateRepo {
    snapshots: RwLock<BTreeMap<Sequence, BattleSnapshot>>,
}

impl InMemoryStateRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateRepository for InMemoryStateRepo {
    fn save(&self, sequence: Sequence, snapshot: &BattleSnapshot) -> Result<()> {
        let mut guard = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        guard.insert(sequence, snapshot.clone());
        Ok(())
    }

    fn load(&self, sequence: Sequence) -> Result<Option<BattleSnapshot>> {
        let guard = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(guard.get(&sequence).cloned())
    }

    fn exists(&self, sequence: Sequence) -> bool {
        self.snapshots
            .read()
            .map(|guard| guard.contains_key(&sequence))
            .unwrap_or(false)
    }

    fn delete(&self, sequence: Sequence) -> Result<()> {
        let mut guard = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        guard.remove(&sequence);
        Ok(())
    }

    fn list_sequences(&self) -> Result<Vec<Sequence>> {
        let guard = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(guard.keys().copied().collect())
    }
}
