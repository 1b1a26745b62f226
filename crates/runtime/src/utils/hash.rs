//! Hashing utilities for snapshots.

use sha2::{Digest, Sha256};

use crate::repository::{BattleSnapshot, RepositoryError};
use crate::types::StateHash;

/// Sha256 of the bincode encoding of `snapshot`, hex-encoded.
pub fn hash_snapshot(snapshot: &BattleSnapshot) -> Result<StateHash, RepositoryError> {
    let bytes = bincode::serialize(snapshot)
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

fn hash_bytes(bytes: &[u8]) -> StateHash {
    hex::encode(Sha256::digest(bytes))
}
