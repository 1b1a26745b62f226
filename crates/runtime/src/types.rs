//! Common type aliases used throughout the runtime.

/// Snapshot sequence number (monotonically increasing per session)
pub type Sequence = u64;

/// Session identifier for a simulation run
pub type SessionId = String;

/// Hex-encoded sha256 of a serialised snapshot
pub type StateHash = String;

/// Unix timestamp in seconds
pub type Timestamp = u64;
