//! Task Condition Model
//!
//! The immutable value object describing one quest task: which action(s) the
//! task counts, how many are needed, and the optional filters an event must
//! pass. Built through [`TaskModelBuilder`]; semantic checks live in the
//! validator, not here.

use serde::{Deserialize, Serialize};

/// Length of the in-game day cycle in ticks.
pub const DAY_LENGTH: i64 = 24000;

/// Placeholder token used by selection UIs to mean "no selection".
/// Never survives into a built model.
pub const CHOICE_ANY: &str = "choice_any";

/// Accepted `dex_progress` values.
pub const DEX_SEEN: &str = "seen";
pub const DEX_CAUGHT: &str = "caught";

/// Immutable condition model for a quest task.
///
/// Every list field is an OR-set: empty means unfiltered, non-empty means the
/// event must match one of the entries. Lists are deduplicated and free of
/// blank/placeholder tokens — the builder guarantees that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskModel {
    /// Action identifiers this task counts (e.g. "catch", "defeat").
    pub actions: Vec<String>,
    /// Target count, or target value for threshold-style actions.
    pub amount: i64,
    /// Whether only shiny creatures count. `false` places no constraint.
    pub shiny: bool,
    /// Species identifiers, namespaced (e.g. "cobblemon:pikachu").
    pub pokemons: Vec<String>,
    /// Elemental type names (e.g. "fire", "water").
    pub pokemon_types: Vec<String>,
    pub natures: Vec<String>,
    /// Region/generation labels (e.g. "gen1").
    pub regions: Vec<String>,
    pub genders: Vec<String>,
    /// Form/variant identifiers (e.g. "alolan"), matched against the
    /// declared form and every aspect tag.
    pub forms: Vec<String>,
    pub biomes: Vec<String>,
    pub dimensions: Vec<String>,
    /// Capture devices (poke balls) that count for catch-type actions.
    pub poke_balls_used: Vec<String>,
    /// Start of the time-of-day window, in ticks on the 24000 cycle.
    pub time_min: i64,
    /// End of the time-of-day window. `time_min > time_max` wraps around
    /// the cycle boundary.
    pub time_max: i64,
    /// Minimum creature level; 0 means unbounded.
    pub min_level: i32,
    /// Maximum creature level; 0 means unbounded (and disables the filter).
    pub max_level: i32,
    /// Pokedex knowledge state this task cares about: "seen" or "caught".
    pub dex_progress: String,
    pub tera_types: Vec<String>,
    pub mega_forms: Vec<String>,
    pub z_crystals: Vec<String>,
    pub dynamax_types: Vec<String>,
}

impl TaskModel {
    /// Create a builder seeded with defaults.
    pub fn builder() -> TaskModelBuilder {
        TaskModelBuilder::default()
    }

    /// Create a builder seeded with this model's values, for
    /// edit-then-rebuild workflows.
    pub fn to_builder(&self) -> TaskModelBuilder {
        TaskModelBuilder {
            actions: self.actions.clone(),
            amount: self.amount,
            shiny: self.shiny,
            pokemons: self.pokemons.clone(),
            pokemon_types: self.pokemon_types.clone(),
            natures: self.natures.clone(),
            regions: self.regions.clone(),
            genders: self.genders.clone(),
            forms: self.forms.clone(),
            biomes: self.biomes.clone(),
            dimensions: self.dimensions.clone(),
            poke_balls_used: self.poke_balls_used.clone(),
            time_min: self.time_min,
            time_max: self.time_max,
            min_level: self.min_level,
            max_level: self.max_level,
            dex_progress: self.dex_progress.clone(),
            tera_types: self.tera_types.clone(),
            mega_forms: self.mega_forms.clone(),
            z_crystals: self.z_crystals.clone(),
            dynamax_types: self.dynamax_types.clone(),
        }
    }

    /// Whether the task has an action filter matching `action`, honoring the
    /// obtain-equivalence set (an "obtain" task also counts catches,
    /// evolutions into, trades for, and fossil revivals).
    pub fn accepts_action(&self, action: &str) -> bool {
        const OBTAINING_METHODS: [&str; 5] =
            ["catch", "evolve-into", "trade_for", "obtain", "revive_fossil"];
        self.actions.iter().any(|a| a == action)
            || (self.actions.iter().any(|a| a == "obtain")
                && OBTAINING_METHODS.contains(&action))
    }

    /// Whether the time-of-day window is the full day (filter disabled).
    pub fn full_day_window(&self) -> bool {
        self.time_min == 0 && self.time_max == DAY_LENGTH
    }
}

/// Builder for [`TaskModel`].
///
/// `build()` sanitizes every list field (trim, drop empty and placeholder
/// tokens, dedup preserving first-seen order) and hands out an owned model,
/// so edits to the builder afterwards never alias into a built value.
#[derive(Debug, Clone)]
pub struct TaskModelBuilder {
    actions: Vec<String>,
    amount: i64,
    shiny: bool,
    pokemons: Vec<String>,
    pokemon_types: Vec<String>,
    natures: Vec<String>,
    regions: Vec<String>,
    genders: Vec<String>,
    forms: Vec<String>,
    biomes: Vec<String>,
    dimensions: Vec<String>,
    poke_balls_used: Vec<String>,
    time_min: i64,
    time_max: i64,
    min_level: i32,
    max_level: i32,
    dex_progress: String,
    tera_types: Vec<String>,
    mega_forms: Vec<String>,
    z_crystals: Vec<String>,
    dynamax_types: Vec<String>,
}

impl Default for TaskModelBuilder {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            amount: 1,
            shiny: false,
            pokemons: Vec::new(),
            pokemon_types: Vec::new(),
            natures: Vec::new(),
            regions: Vec::new(),
            genders: Vec::new(),
            forms: Vec::new(),
            biomes: Vec::new(),
            dimensions: Vec::new(),
            poke_balls_used: Vec::new(),
            time_min: 0,
            time_max: DAY_LENGTH,
            min_level: 0,
            max_level: 0,
            dex_progress: DEX_SEEN.to_string(),
            tera_types: Vec::new(),
            mega_forms: Vec::new(),
            z_crystals: Vec::new(),
            dynamax_types: Vec::new(),
        }
    }
}

macro_rules! list_setter {
    ($name:ident) => {
        pub fn $name<I, S>(mut self, values: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.$name = values.into_iter().map(Into::into).collect();
            self
        }
    };
}

impl TaskModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    list_setter!(actions);
    list_setter!(pokemons);
    list_setter!(pokemon_types);
    list_setter!(natures);
    list_setter!(regions);
    list_setter!(genders);
    list_setter!(forms);
    list_setter!(biomes);
    list_setter!(dimensions);
    list_setter!(poke_balls_used);
    list_setter!(tera_types);
    list_setter!(mega_forms);
    list_setter!(z_crystals);
    list_setter!(dynamax_types);

    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    pub fn shiny(mut self, shiny: bool) -> Self {
        self.shiny = shiny;
        self
    }

    pub fn time_min(mut self, time_min: i64) -> Self {
        self.time_min = time_min;
        self
    }

    pub fn time_max(mut self, time_max: i64) -> Self {
        self.time_max = time_max;
        self
    }

    pub fn min_level(mut self, min_level: i32) -> Self {
        self.min_level = min_level;
        self
    }

    pub fn max_level(mut self, max_level: i32) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn dex_progress(mut self, dex_progress: impl Into<String>) -> Self {
        self.dex_progress = dex_progress.into();
        self
    }

    /// Build the immutable model. List fields are sanitized here; numeric
    /// fields are taken as-is (the validator decides whether they make
    /// sense).
    pub fn build(self) -> TaskModel {
        TaskModel {
            actions: sanitize(self.actions),
            amount: self.amount,
            shiny: self.shiny,
            pokemons: sanitize(self.pokemons),
            pokemon_types: sanitize(self.pokemon_types),
            natures: sanitize(self.natures),
            regions: sanitize(self.regions),
            genders: sanitize(self.genders),
            forms: sanitize(self.forms),
            biomes: sanitize(self.biomes),
            dimensions: sanitize(self.dimensions),
            poke_balls_used: sanitize(self.poke_balls_used),
            time_min: self.time_min,
            time_max: self.time_max,
            min_level: self.min_level,
            max_level: self.max_level,
            dex_progress: self.dex_progress,
            tera_types: sanitize(self.tera_types),
            mega_forms: sanitize(self.mega_forms),
            z_crystals: sanitize(self.z_crystals),
            dynamax_types: sanitize(self.dynamax_types),
        }
    }
}

/// Trim entries, drop blanks and placeholder tokens, dedup preserving
/// first-seen order.
pub(crate) fn sanitize(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if value.is_empty() || value.contains(CHOICE_ANY) {
            continue;
        }
        if !out.iter().any(|existing| existing == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let model = TaskModel::builder().build();
        assert!(model.actions.is_empty());
        assert_eq!(model.amount, 1);
        assert!(!model.shiny);
        assert_eq!(model.time_min, 0);
        assert_eq!(model.time_max, DAY_LENGTH);
        assert_eq!(model.min_level, 0);
        assert_eq!(model.max_level, 0);
        assert_eq!(model.dex_progress, DEX_SEEN);
        assert!(model.full_day_window());
    }

    #[test]
    fn test_build_sanitizes_lists() {
        let model = TaskModel::builder()
            .actions(["catch", " catch ", "", "choice_any", "defeat"])
            .pokemons(["cobblemon:pikachu", "cobblemon:pikachu"])
            .build();
        assert_eq!(model.actions, vec!["catch", "defeat"]);
        assert_eq!(model.pokemons, vec!["cobblemon:pikachu"]);
    }

    #[test]
    fn test_sanitize_preserves_first_seen_order() {
        let out = sanitize(vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ]);
        assert_eq!(out, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_to_builder_round_trip() {
        let model = TaskModel::builder()
            .actions(["catch"])
            .amount(5)
            .shiny(true)
            .pokemons(["cobblemon:eevee"])
            .time_min(18000)
            .time_max(6000)
            .build();

        let rebuilt = model.to_builder().build();
        assert_eq!(model, rebuilt);

        let edited = model.to_builder().amount(10).build();
        assert_eq!(edited.amount, 10);
        assert_eq!(model.amount, 5);
    }

    #[test]
    fn test_accepts_action_obtain_equivalence() {
        let model = TaskModel::builder().actions(["obtain"]).build();
        assert!(model.accepts_action("catch"));
        assert!(model.accepts_action("evolve-into"));
        assert!(model.accepts_action("trade_for"));
        assert!(model.accepts_action("revive_fossil"));
        assert!(model.accepts_action("obtain"));
        assert!(!model.accepts_action("defeat"));

        let model = TaskModel::builder().actions(["catch"]).build();
        assert!(model.accepts_action("catch"));
        assert!(!model.accepts_action("obtain"));
    }
}
