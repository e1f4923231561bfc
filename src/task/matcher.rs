//! Event Matching
//!
//! Decides whether one event advances a task and by how much. Matching is a
//! short-circuit AND over every configured filter; a filter only
//! participates when its list/bound is non-default. A missing event
//! attribute (failed biome lookup, unknown caught ball) makes that filter
//! reject the event — matching never fails, an event either counts or it
//! silently does not.

use crate::task::events::{DexEntry, PokemonEvent};
use crate::task::model::{DAY_LENGTH, DEX_CAUGHT, DEX_SEEN, TaskModel};

/// How a matched event changes the progress counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Add to the running counter (the common case).
    Add(i64),
    /// Raise the counter to at most this value, never lower it.
    Watermark(i64),
    /// Write an absolute value (snapshot recounts).
    Set(i64),
}

/// Match one event against a task. Returns the progress update the event
/// earns, or None when any active filter rejects it.
pub fn apply(model: &TaskModel, event: &PokemonEvent) -> Option<ProgressUpdate> {
    if !model.accepts_action(&event.action) {
        return None;
    }

    let pokemon = &event.pokemon;

    if !model.regions.is_empty() {
        match &pokemon.region {
            Some(region) if model.regions.contains(region) => {}
            _ => return None,
        }
    }

    if !model.full_day_window() {
        let mut time_of_day = event.time_of_day?.rem_euclid(DAY_LENGTH);
        let actual_min = model.time_min;
        let mut actual_max = model.time_max;
        // A window with min > max wraps past midnight: shift both the
        // upper bound and early samples by one full cycle.
        if model.time_min > model.time_max {
            actual_max = model.time_max + DAY_LENGTH;
            if time_of_day < model.time_min {
                time_of_day += DAY_LENGTH;
            }
        }
        if time_of_day < actual_min || time_of_day >= actual_max {
            return None;
        }
    }

    if model.max_level != 0
        && (pokemon.level > model.max_level || pokemon.level < model.min_level)
    {
        return None;
    }

    if !model.poke_balls_used.is_empty() {
        match &pokemon.caught_ball {
            Some(ball) if model.poke_balls_used.contains(ball) => {}
            _ => return None,
        }
    }

    if !model.dimensions.is_empty() {
        match &event.dimension {
            Some(dimension) if model.dimensions.contains(dimension) => {}
            _ => return None,
        }
    }

    if !model.biomes.is_empty() {
        match &event.biome {
            Some(biome) if model.biomes.contains(biome) => {}
            _ => return None,
        }
    }

    if !model.genders.is_empty() && !model.genders.contains(&pokemon.gender.to_lowercase()) {
        return None;
    }

    // The declared form or any aspect tag may satisfy the form filter.
    if !model.forms.is_empty() {
        let form_matches = model.forms.contains(&pokemon.form.to_lowercase())
            || pokemon
                .aspects
                .iter()
                .any(|aspect| model.forms.contains(aspect));
        if !form_matches {
            return None;
        }
    }

    if !model.pokemon_types.is_empty()
        && !pokemon
            .types
            .iter()
            .any(|t| model.pokemon_types.contains(&t.to_lowercase()))
    {
        return None;
    }

    if !model.natures.is_empty() && !model.natures.contains(&pokemon.nature) {
        return None;
    }

    if model.shiny && !pokemon.shiny {
        return None;
    }

    if !model.pokemons.is_empty()
        && !model
            .pokemons
            .iter()
            .any(|entry| species_path(entry) == species_path(&pokemon.species))
    {
        return None;
    }

    Some(progress_update(model, &event.action, event.amount))
}

/// Delta semantics per action: level_up_to is a watermark, register toggles
/// the payload through the dex state machine, everything else counts.
fn progress_update(model: &TaskModel, action: &str, payload: i64) -> ProgressUpdate {
    if action == "level_up_to" {
        return ProgressUpdate::Watermark(payload);
    }
    if action == "register" {
        // The payload indicates the prior knowledge state; the toggle turns
        // it into a 0/1 step so only first-time transitions count.
        let toggled = match model.dex_progress.as_str() {
            DEX_SEEN => {
                if payload == 1 {
                    0
                } else {
                    1
                }
            }
            DEX_CAUGHT => {
                if payload != 0 {
                    0
                } else {
                    1
                }
            }
            _ => payload,
        };
        return ProgressUpdate::Add(toggled);
    }
    ProgressUpdate::Add(payload)
}

/// Creature-free variant for actions whose event is a plain token (e.g. an
/// NPC dialogue choice): the token must appear in the form list, or the
/// list must be empty.
pub fn apply_plain(
    model: &TaskModel,
    token: &str,
    action: &str,
    amount: i64,
) -> Option<ProgressUpdate> {
    let action_matches = model.actions.iter().any(|a| a == action);
    let token_matches = model.forms.is_empty() || model.forms.iter().any(|f| f == token);
    if action_matches && token_matches {
        Some(ProgressUpdate::Add(amount))
    } else {
        None
    }
}

/// Snapshot recount for "have_registered": counts owned dex entries passing
/// the task's filters. Not event-driven — callers run it against the full
/// current snapshot and write the result as an absolute value, so repeated
/// calls are idempotent.
pub fn recount_registered(model: &TaskModel, entries: &[DexEntry]) -> Option<ProgressUpdate> {
    if !model.actions.iter().any(|a| a == "have_registered") {
        return None;
    }

    let mut count = 0i64;
    for entry in entries {
        if !model.pokemons.is_empty() && !model.pokemons.contains(&entry.species) {
            continue;
        }
        if model.dex_progress == DEX_CAUGHT && !entry.caught {
            continue;
        }
        if model.shiny && !entry.aspects.iter().any(|aspect| aspect == "shiny") {
            continue;
        }
        if !model.genders.is_empty()
            && !entry.aspects.iter().any(|aspect| model.genders.contains(aspect))
        {
            continue;
        }
        if !model.forms.is_empty()
            && !entry.aspects.iter().any(|aspect| model.forms.contains(aspect))
        {
            continue;
        }
        if !model.regions.is_empty() {
            match &entry.region {
                Some(region) if model.regions.contains(region) => {}
                _ => continue,
            }
        }
        if !model.pokemon_types.is_empty()
            && !entry
                .types
                .iter()
                .any(|t| model.pokemon_types.contains(&t.to_lowercase()))
        {
            continue;
        }
        count += 1;
    }

    Some(ProgressUpdate::Set(count))
}

/// Species comparison ignores the namespace.
fn species_path(id: &str) -> &str {
    match id.rsplit_once(':') {
        Some((_, path)) => path,
        None => id,
    }
}
