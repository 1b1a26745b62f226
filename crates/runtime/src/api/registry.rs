//! Provider registry mapping participants to decision providers.
//!
//! ```text
//! ProviderRegistry
//! ├── providers: HashMap<ProviderKind, Provider>  (provider instances)
//! ├── player_mappings: HashMap<PlayerId, ProviderKind>  (player bindings)
//! └── default_kind: ProviderKind  (fallback)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::PlayerId;

use super::{DecisionProvider, DefaultDecisionProvider, ProviderKind, Result, RuntimeError};

/// Registry of decision providers with per-player bindings.
pub struct ProviderRegistry {
    /// Arc so a provider can be used outside the registry lock
    providers: HashMap<ProviderKind, Arc<dyn DecisionProvider>>,
    player_mappings: HashMap<PlayerId, ProviderKind>,
    default_kind: ProviderKind,
}

impl ProviderRegistry {
    /// Registry whose fallback accepts every default answer.
    pub fn new() -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            player_mappings: HashMap::new(),
            default_kind: ProviderKind::Default,
        };
        registry.register(ProviderKind::Default, DefaultDecisionProvider);
        registry
    }

    /// Register a provider, replacing any previous one of the same kind.
    pub fn register(&mut self, kind: ProviderKind, provider: impl DecisionProvider + 'static) {
        self.providers.insert(kind, Arc::new(provider));
    }

    /// Register a provider the caller keeps a handle to.
    pub fn register_shared(&mut self, kind: ProviderKind, provider: Arc<dyn DecisionProvider>) {
        self.providers.insert(kind, provider);
    }

    pub fn bind_player(&mut self, player: PlayerId, kind: ProviderKind) {
        self.player_mappings.insert(player, kind);
    }

    /// Reverts `player` to the default provider.
    pub fn unbind_player(&mut self, player: PlayerId) -> Option<ProviderKind> {
        self.player_mappings.remove(&player)
    }

    pub fn set_default(&mut self, kind: ProviderKind) {
        self.default_kind = kind;
    }

    pub fn default_kind(&self) -> ProviderKind {
        self.default_kind
    }

    pub fn get_player_kind(&self, player: PlayerId) -> ProviderKind {
        self.player_mappings
            .get(&player)
            .copied()
            .unwrap_or(self.default_kind)
    }

    /// Provider answering for `player`: its binding, else the default kind.
    pub fn get_for_player(&self, player: PlayerId) -> Result<Arc<dyn DecisionProvider>> {
        self.get(self.get_player_kind(player))
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn DecisionProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(RuntimeError::ProviderNotSet { kind })
    }

    pub fn has(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScriptedDecisionProvider;

    #[test]
    fn unbound_players_fall_back_to_defaults() {
        let mut registry = ProviderRegistry::new();
        registry.register(ProviderKind::Scripted, ScriptedDecisionProvider::default());
        registry.bind_player(PlayerId(2), ProviderKind::Scripted);

        assert_eq!(registry.get_player_kind(PlayerId(1)), ProviderKind::Default);
        assert_eq!(registry.get_player_kind(PlayerId(2)), ProviderKind::Scripted);
        assert!(registry.get_for_player(PlayerId(1)).is_ok());
        assert_eq!(registry.provider_count(), 2);

        assert_eq!(registry.unbind_player(PlayerId(2)), Some(ProviderKind::Scripted));
        assert_eq!(registry.get_player_kind(PlayerId(2)), ProviderKind::Default);
    }

    #[test]
    fn binding_to_an_unregistered_kind_is_reported() {
        let mut registry = ProviderRegistry::new();
        registry.bind_player(PlayerId(3), ProviderKind::Remote(7));

        assert!(matches!(
            registry.get_for_player(PlayerId(3)),
            Err(RuntimeError::ProviderNotSet {
                kind: ProviderKind::Remote(7)
            })
        ));
    }
}
