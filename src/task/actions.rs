//! Action Catalog
//!
//! Metadata for every action a task can count. The catalog is an injectable
//! value (no process-wide statics) so add-ons can register their own actions
//! on the instance they hand to the registry and validator.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Categories grouping actions by what kind of play they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCategory {
    /// Obtaining a creature (catch, hatch, fossil, starter...).
    Catch,
    /// Combat outcomes.
    Battle,
    /// Evolution and form changes.
    Evolution,
    Trade,
    /// Pokedex completion tracking.
    Pokedex,
    /// Battle gimmicks (mega evolution, terastallization, z-moves, dynamax).
    Gimmick,
    Other,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Catch => "catch",
            ActionCategory::Battle => "battle",
            ActionCategory::Evolution => "evolution",
            ActionCategory::Trade => "trade",
            ActionCategory::Pokedex => "pokedex",
            ActionCategory::Gimmick => "gimmick",
            ActionCategory::Other => "other",
        }
    }
}

/// Metadata describing one registrable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDefinition {
    pub id: String,
    /// Whether events for this action carry a creature whose identity
    /// filters (species, type, shiny...) are meaningful.
    pub requires_pokemon: bool,
    pub category: ActionCategory,
}

impl ActionDefinition {
    pub fn new(id: &str, requires_pokemon: bool, category: ActionCategory) -> Self {
        Self {
            id: id.to_string(),
            requires_pokemon,
            category,
        }
    }
}

/// Thread-safe lookup of action definitions.
pub struct ActionCatalog {
    actions: DashMap<String, ActionDefinition>,
}

impl ActionCatalog {
    /// An empty catalog. Most callers want [`ActionCatalog::with_builtins`].
    pub fn new() -> Self {
        Self {
            actions: DashMap::new(),
        }
    }

    /// A catalog pre-populated with every built-in action.
    pub fn with_builtins() -> Self {
        let catalog = Self::new();
        catalog.register_builtins();
        catalog
    }

    /// Register a new action. Returns false (and keeps the existing entry)
    /// if the id is already taken.
    pub fn register(&self, definition: ActionDefinition) -> bool {
        if self.actions.contains_key(&definition.id) {
            warn!(
                "Action '{}' is already registered, skipping duplicate registration",
                definition.id
            );
            return false;
        }
        debug!("Registered action: {}", definition.id);
        self.actions.insert(definition.id.clone(), definition);
        true
    }

    /// Register an action, replacing any existing entry with the same id.
    pub fn register_or_replace(&self, definition: ActionDefinition) {
        if self
            .actions
            .insert(definition.id.clone(), definition)
            .is_some()
        {
            debug!("Replaced action registration");
        }
    }

    pub fn get(&self, action_id: &str) -> Option<ActionDefinition> {
        self.actions.get(action_id).map(|entry| entry.value().clone())
    }

    pub fn is_registered(&self, action_id: &str) -> bool {
        self.actions.contains_key(action_id)
    }

    pub fn category_of(&self, action_id: &str) -> Option<ActionCategory> {
        self.actions.get(action_id).map(|entry| entry.category)
    }

    /// Whether `action_id` is registered with one of the given categories.
    pub fn in_category(&self, action_id: &str, categories: &[ActionCategory]) -> bool {
        self.category_of(action_id)
            .is_some_and(|category| categories.contains(&category))
    }

    /// Whether the action's events carry a meaningful creature identity.
    /// Unregistered actions are assumed to.
    pub fn requires_pokemon(&self, action_id: &str) -> bool {
        self.actions
            .get(action_id)
            .map(|entry| entry.requires_pokemon)
            .unwrap_or(true)
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.actions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn ids_in_category(&self, category: ActionCategory) -> Vec<String> {
        self.actions
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn register_builtins(&self) {
        use ActionCategory::*;

        let builtins: [(&str, bool, ActionCategory); 32] = [
            ("catch", true, Catch),
            ("obtain", true, Catch),
            ("select_starter", true, Catch),
            ("revive_fossil", true, Catch),
            ("reel", true, Catch),
            ("hatch_egg", true, Catch),
            ("defeat", true, Battle),
            // NPC and player battles never hand over a creature identity
            ("defeat_player", false, Battle),
            ("defeat_npc", false, Battle),
            ("kill", true, Battle),
            ("faint_pokemon", true, Battle),
            ("evolve", true, Evolution),
            ("evolve_into", true, Evolution),
            ("change_form", true, Evolution),
            ("trade_away", true, Trade),
            ("trade_for", true, Trade),
            ("scan", true, Pokedex),
            ("have_registered", true, Pokedex),
            ("register", true, Pokedex),
            ("mega_evolve", true, Gimmick),
            ("terastallize", true, Gimmick),
            ("use_z_move", true, Gimmick),
            ("dynamax", true, Gimmick),
            ("gigantamax", true, Gimmick),
            ("ultra_burst", true, Gimmick),
            ("level_up", true, Other),
            ("level_up_to", true, Other),
            ("release", true, Other),
            ("throw_ball", true, Other),
            ("send_out", true, Other),
            ("give_held_item", true, Other),
            ("heal", true, Other),
        ];

        for (id, requires_pokemon, category) in builtins {
            self.actions
                .insert(id.to_string(), ActionDefinition::new(id, requires_pokemon, category));
        }
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}
