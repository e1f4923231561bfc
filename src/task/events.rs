//! Quest Event Types
//!
//! The records the host event system hands over, one per creature
//! interaction. Attributes are pre-resolved by the host (species labels,
//! biome ids, ...) — this crate never touches game registries. Location
//! attributes are optional: a failed lookup on the host side simply makes
//! the corresponding filter reject the event.

use serde::{Deserialize, Serialize};

/// One creature-interaction event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PokemonEvent {
    /// Action identifier (e.g. "catch", "level_up_to").
    pub action: String,
    /// Action-specific payload: unit amount for counting actions, the
    /// reached level for "level_up_to", the prior dex knowledge indicator
    /// for "register".
    pub amount: i64,
    pub pokemon: EventPokemon,
    /// Dimension the actor is in, if the host could resolve it.
    pub dimension: Option<String>,
    /// Biome at the actor's position, if the host could resolve it.
    pub biome: Option<String>,
    /// World time in raw ticks; reduced to the 24000 cycle by the matcher.
    pub time_of_day: Option<i64>,
}

impl PokemonEvent {
    pub fn new(action: &str, pokemon: EventPokemon) -> Self {
        Self {
            action: action.to_string(),
            amount: 1,
            pokemon,
            dimension: None,
            biome: None,
            time_of_day: None,
        }
    }
}

/// The creature attached to an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPokemon {
    /// Namespaced species identifier (e.g. "cobblemon:pikachu").
    pub species: String,
    /// Elemental types, lowercased.
    pub types: Vec<String>,
    pub nature: String,
    /// "male", "female" or "genderless".
    pub gender: String,
    /// Declared form name, lowercased.
    pub form: String,
    /// Aspect tags (regional variants, palettes, "shiny", ...).
    pub aspects: Vec<String>,
    pub shiny: bool,
    pub level: i32,
    /// Region/generation label of the species, if known.
    pub region: Option<String>,
    /// Ball the creature was caught with, if any.
    pub caught_ball: Option<String>,
}

/// One owned-registry entry of a Pokedex snapshot, used by the
/// "have_registered" recount. Attributes are resolved by the host when the
/// snapshot is taken.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexEntry {
    /// Namespaced species identifier.
    pub species: String,
    /// Aspect tags recorded against the entry.
    pub aspects: Vec<String>,
    /// Whether the species has been caught (as opposed to merely seen).
    pub caught: bool,
    /// Region/generation label of the species, if known.
    pub region: Option<String>,
    /// Elemental types of the species.
    pub types: Vec<String>,
}
