//! Task Definition Structures
//!
//! These structures are deserialized from TOML task files. Defaults mirror
//! the model builder, so an operator only writes the fields they care about.

use serde::Deserialize;

use crate::task::model::{DAY_LENGTH, DEX_SEEN, TaskModel};

/// A task definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskFile {
    pub task: RawTask,
}

/// Raw task data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawTask {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default = "default_amount")]
    pub amount: i64,
    #[serde(default)]
    pub shiny: bool,
    #[serde(default)]
    pub pokemons: Vec<String>,
    #[serde(default)]
    pub pokemon_types: Vec<String>,
    #[serde(default)]
    pub natures: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
    #[serde(default)]
    pub forms: Vec<String>,
    #[serde(default)]
    pub biomes: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub poke_balls_used: Vec<String>,
    #[serde(default)]
    pub time_min: i64,
    #[serde(default = "default_time_max")]
    pub time_max: i64,
    #[serde(default)]
    pub min_level: i32,
    #[serde(default)]
    pub max_level: i32,
    #[serde(default = "default_dex_progress")]
    pub dex_progress: String,
    #[serde(default)]
    pub tera_types: Vec<String>,
    #[serde(default)]
    pub mega_forms: Vec<String>,
    #[serde(default)]
    pub z_crystals: Vec<String>,
    #[serde(default)]
    pub dynamax_types: Vec<String>,
}

fn default_amount() -> i64 {
    1
}

fn default_time_max() -> i64 {
    DAY_LENGTH
}

fn default_dex_progress() -> String {
    DEX_SEEN.to_string()
}

/// A task as held by the registry: its identifier plus the built model.
#[derive(Debug, Clone)]
pub struct StoredTask {
    pub id: String,
    pub model: TaskModel,
}

impl StoredTask {
    /// Build a task from raw TOML data.
    pub fn from_raw(raw: &RawTask) -> Result<Self, String> {
        if raw.id.trim().is_empty() {
            return Err("Task has no id".to_string());
        }

        let model = TaskModel::builder()
            .actions(raw.actions.clone())
            .amount(raw.amount)
            .shiny(raw.shiny)
            .pokemons(raw.pokemons.clone())
            .pokemon_types(raw.pokemon_types.clone())
            .natures(raw.natures.clone())
            .regions(raw.regions.clone())
            .genders(raw.genders.clone())
            .forms(raw.forms.clone())
            .biomes(raw.biomes.clone())
            .dimensions(raw.dimensions.clone())
            .poke_balls_used(raw.poke_balls_used.clone())
            .time_min(raw.time_min)
            .time_max(raw.time_max)
            .min_level(raw.min_level)
            .max_level(raw.max_level)
            .dex_progress(raw.dex_progress.clone())
            .tera_types(raw.tera_types.clone())
            .mega_forms(raw.mega_forms.clone())
            .z_crystals(raw.z_crystals.clone())
            .dynamax_types(raw.dynamax_types.clone())
            .build();

        Ok(Self {
            id: raw.id.clone(),
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_task() {
        let raw: RawTaskFile = toml::from_str(
            r#"
[task]
id = "catch_three"
actions = ["catch"]
amount = 3
"#,
        )
        .unwrap();

        let task = StoredTask::from_raw(&raw.task).unwrap();
        assert_eq!(task.id, "catch_three");
        assert_eq!(task.model.actions, vec!["catch"]);
        assert_eq!(task.model.amount, 3);
        assert_eq!(task.model.time_max, DAY_LENGTH);
        assert_eq!(task.model.dex_progress, DEX_SEEN);
    }

    #[test]
    fn test_parse_full_task() {
        let raw: RawTaskFile = toml::from_str(
            r#"
[task]
id = "night_shiny_hunt"
actions = ["catch"]
amount = 5
shiny = true
pokemons = ["cobblemon:pikachu", "cobblemon:eevee"]
time_min = 13000
time_max = 23000
biomes = ["minecraft:plains"]
poke_balls_used = ["cobblemon:ultra_ball"]
"#,
        )
        .unwrap();

        let task = StoredTask::from_raw(&raw.task).unwrap();
        assert!(task.model.shiny);
        assert_eq!(task.model.pokemons.len(), 2);
        assert_eq!(task.model.time_min, 13000);
    }

    #[test]
    fn test_blank_id_rejected() {
        let raw = RawTask {
            id: "  ".to_string(),
            actions: vec!["catch".to_string()],
            amount: 1,
            shiny: false,
            pokemons: vec![],
            pokemon_types: vec![],
            natures: vec![],
            regions: vec![],
            genders: vec![],
            forms: vec![],
            biomes: vec![],
            dimensions: vec![],
            poke_balls_used: vec![],
            time_min: 0,
            time_max: DAY_LENGTH,
            min_level: 0,
            max_level: 0,
            dex_progress: DEX_SEEN.to_string(),
            tera_types: vec![],
            mega_forms: vec![],
            z_crystals: vec![],
            dynamax_types: vec![],
        };
        assert!(StoredTask::from_raw(&raw).is_err());
    }
}
