//! Task Validation
//!
//! Pure semantic checks over a [`TaskModel`]. Errors block persistence;
//! warnings and infos are surfaced to the editor but never block. The
//! validator never fails: any structurally valid model produces a result.

use crate::task::actions::{ActionCatalog, ActionCategory};
use crate::task::model::{DAY_LENGTH, DEX_CAUGHT, DEX_SEEN, TaskModel};

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks saving the task.
    Error,
    /// Surfaced to the operator, does not block.
    Warning,
    /// Purely informational hint.
    Info,
}

/// One issue found while validating a model. Produced fresh on every call,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Model field the issue is anchored to.
    pub field: &'static str,
    /// Stable key the editor maps to display text.
    pub message_key: &'static str,
    pub severity: Severity,
    /// Formatting arguments for the message.
    pub args: Vec<String>,
}

/// Result of validating one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Info)
    }

    /// Combine two results, keeping all issues from both.
    pub fn merge(mut self, other: ValidationResult) -> ValidationResult {
        self.issues.extend(other.issues);
        self
    }

    fn push(&mut self, severity: Severity, field: &'static str, message_key: &'static str) {
        self.push_args(severity, field, message_key, Vec::new());
    }

    fn push_args(
        &mut self,
        severity: Severity,
        field: &'static str,
        message_key: &'static str,
        args: Vec<String>,
    ) {
        self.issues.push(ValidationIssue {
            field,
            message_key,
            severity,
            args,
        });
    }
}

/// Actions whose events change a creature's level.
const LEVEL_ACTIONS: [&str; 2] = ["level_up", "level_up_to"];

/// Actions where the capture device matters.
const POKEBALL_ACTIONS: [&str; 2] = ["catch", "reel"];

/// Dynamax-family gimmick actions share one filter list.
const DYNAMAX_ACTIONS: [&str; 3] = ["dynamax", "gigantamax", "ultra_burst"];

/// Above this the target looks like a typo rather than a quest.
const LARGE_AMOUNT_THRESHOLD: i64 = 10_000;

/// A species list this long combined with type filters is probably
/// over-constrained.
const LARGE_SPECIES_LIST_THRESHOLD: usize = 25;

/// Validates [`TaskModel`] instances against the rules the editor enforces.
pub struct TaskValidator;

impl TaskValidator {
    /// Validate a model. Pure: same model and catalog always produce the
    /// same result.
    pub fn validate(model: &TaskModel, catalog: &ActionCatalog) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::check_errors(model, &mut result);
        Self::check_warnings(model, catalog, &mut result);
        Self::check_infos(model, &mut result);
        result
    }

    fn check_errors(model: &TaskModel, result: &mut ValidationResult) {
        if model.actions.is_empty() {
            result.push(Severity::Error, "actions", "no_action_selected");
        }

        if model.amount < 1 {
            result.push_args(
                Severity::Error,
                "amount",
                "amount_below_minimum",
                vec![model.amount.to_string()],
            );
        }

        if model.time_min < 0 || model.time_min > DAY_LENGTH {
            result.push_args(
                Severity::Error,
                "time_min",
                "time_out_of_range",
                vec![model.time_min.to_string()],
            );
        }
        if model.time_max < 0 || model.time_max > DAY_LENGTH {
            result.push_args(
                Severity::Error,
                "time_max",
                "time_out_of_range",
                vec![model.time_max.to_string()],
            );
        }

        if model.min_level < 0 {
            result.push(Severity::Error, "min_level", "level_negative");
        }
        if model.max_level < 0 {
            result.push(Severity::Error, "max_level", "level_negative");
        }
        if model.max_level > 0 && model.min_level > model.max_level {
            result.push_args(
                Severity::Error,
                "min_level",
                "min_level_exceeds_max_level",
                vec![model.min_level.to_string(), model.max_level.to_string()],
            );
        }

        if model.dex_progress != DEX_SEEN && model.dex_progress != DEX_CAUGHT {
            result.push_args(
                Severity::Error,
                "dex_progress",
                "dex_progress_invalid",
                vec![model.dex_progress.clone()],
            );
        }

        if has_action(model, "mega_evolve") && model.mega_forms.is_empty() {
            result.push(
                Severity::Error,
                "mega_forms",
                "mega_evolve_requires_mega_forms",
            );
        }
        if has_action(model, "use_z_move") && model.z_crystals.is_empty() {
            result.push(
                Severity::Error,
                "z_crystals",
                "use_z_move_requires_z_crystals",
            );
        }
    }

    fn check_warnings(model: &TaskModel, catalog: &ActionCatalog, result: &mut ValidationResult) {
        let has_catch_battle_action = model.actions.iter().any(|action| {
            catalog.in_category(action, &[ActionCategory::Catch, ActionCategory::Battle])
        });
        let has_level_action = model
            .actions
            .iter()
            .any(|action| LEVEL_ACTIONS.contains(&action.as_str()));
        let has_dex_action = model
            .actions
            .iter()
            .any(|action| catalog.in_category(action, &[ActionCategory::Pokedex]));

        // Location and time filters only fire for catch/battle events.
        if !has_catch_battle_action && !model.actions.is_empty() {
            if !model.biomes.is_empty() {
                result.push(Severity::Warning, "biomes", "location_filter_unused");
            }
            if !model.dimensions.is_empty() {
                result.push(Severity::Warning, "dimensions", "location_filter_unused");
            }
            if !model.full_day_window() {
                result.push(Severity::Warning, "time_min", "time_filter_unused");
            }
        }

        if (model.min_level > 0 || model.max_level > 0) && !has_level_action {
            result.push(Severity::Warning, "min_level", "level_filter_unused");
        }

        if model.dex_progress != DEX_SEEN && !has_dex_action && !model.actions.is_empty() {
            result.push(Severity::Warning, "dex_progress", "dex_progress_unused");
        }

        // Gimmick filter lists without their gimmick action.
        let gimmick_lists: [(&'static str, &Vec<String>, &[&str]); 4] = [
            ("mega_forms", &model.mega_forms, &["mega_evolve"]),
            ("tera_types", &model.tera_types, &["terastallize"]),
            ("z_crystals", &model.z_crystals, &["use_z_move"]),
            ("dynamax_types", &model.dynamax_types, &DYNAMAX_ACTIONS),
        ];
        for (field, list, required_actions) in gimmick_lists {
            if !list.is_empty()
                && !model
                    .actions
                    .iter()
                    .any(|action| required_actions.contains(&action.as_str()))
            {
                result.push(Severity::Warning, field, "gimmick_filter_unused");
            }
        }

        // The inverse direction: a gimmick action with nothing to filter on.
        // mega_evolve/use_z_move are errors above; these two stay advisory.
        if has_action(model, "terastallize") && model.tera_types.is_empty() {
            result.push(
                Severity::Warning,
                "tera_types",
                "terastallize_without_tera_types",
            );
        }
        let has_dynamax_action = model
            .actions
            .iter()
            .any(|action| DYNAMAX_ACTIONS.contains(&action.as_str()));
        if has_dynamax_action && model.dynamax_types.is_empty() {
            result.push(
                Severity::Warning,
                "dynamax_types",
                "dynamax_without_dynamax_types",
            );
        }

        if !model.poke_balls_used.is_empty() && !model.actions.is_empty() {
            let has_pokeball_action = model
                .actions
                .iter()
                .any(|action| POKEBALL_ACTIONS.contains(&action.as_str()));
            if !has_pokeball_action {
                result.push(
                    Severity::Warning,
                    "poke_balls_used",
                    "pokeballs_ignored_for_action",
                );
            }
        }

        for action in &model.actions {
            if !catalog.is_registered(action) {
                result.push_args(
                    Severity::Warning,
                    "actions",
                    "unknown_action",
                    vec![action.clone()],
                );
                continue;
            }
            if !catalog.requires_pokemon(action) {
                Self::check_identity_filters(model, action, result);
            }
        }
    }

    /// Creature-identity filters are dead weight on actions whose events
    /// never carry a creature (e.g. defeating an NPC trainer).
    fn check_identity_filters(model: &TaskModel, action: &str, result: &mut ValidationResult) {
        let identity_filters: [(&'static str, bool); 6] = [
            ("pokemons", !model.pokemons.is_empty()),
            ("pokemon_types", !model.pokemon_types.is_empty()),
            ("shiny", model.shiny),
            ("natures", !model.natures.is_empty()),
            ("regions", !model.regions.is_empty()),
            ("genders", !model.genders.is_empty()),
        ];
        for (field, set) in identity_filters {
            if set {
                result.push_args(
                    Severity::Warning,
                    field,
                    "pokemon_filter_ignored",
                    vec![action.to_string()],
                );
            }
        }
    }

    fn check_infos(model: &TaskModel, result: &mut ValidationResult) {
        if model.amount > LARGE_AMOUNT_THRESHOLD {
            result.push_args(
                Severity::Info,
                "amount",
                "amount_unusually_large",
                vec![model.amount.to_string()],
            );
        }

        if model.pokemons.len() >= LARGE_SPECIES_LIST_THRESHOLD && !model.pokemon_types.is_empty() {
            result.push(
                Severity::Info,
                "pokemons",
                "large_species_type_combination",
            );
        }
    }
}

fn has_action(model: &TaskModel, action: &str) -> bool {
    model.actions.iter().any(|a| a == action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::TaskModel;

    fn catalog() -> ActionCatalog {
        ActionCatalog::with_builtins()
    }

    #[test]
    fn test_valid_model_has_no_issues() {
        let model = TaskModel::builder().actions(["catch"]).amount(3).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_actions_is_error() {
        let model = TaskModel::builder().build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.has_errors());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "no_action_selected")
        );
    }

    #[test]
    fn test_amount_below_minimum() {
        let model = TaskModel::builder().actions(["catch"]).amount(0).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "amount_below_minimum")
        );
    }

    #[test]
    fn test_time_out_of_range() {
        let model = TaskModel::builder()
            .actions(["catch"])
            .time_min(-5)
            .time_max(30000)
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_level_window_errors() {
        let model = TaskModel::builder()
            .actions(["level_up_to"])
            .min_level(50)
            .max_level(10)
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "min_level_exceeds_max_level")
        );

        // max_level == 0 means unbounded, so min > max is fine
        let model = TaskModel::builder()
            .actions(["level_up_to"])
            .min_level(50)
            .max_level(0)
            .build();
        assert!(TaskValidator::validate(&model, &catalog()).is_valid());
    }

    #[test]
    fn test_dex_progress_invalid() {
        let model = TaskModel::builder()
            .actions(["register"])
            .dex_progress("owned")
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "dex_progress_invalid")
        );
    }

    #[test]
    fn test_gimmick_cross_checks() {
        let model = TaskModel::builder().actions(["mega_evolve"]).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "mega_evolve_requires_mega_forms")
        );

        let model = TaskModel::builder().actions(["use_z_move"]).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .errors()
                .any(|issue| issue.message_key == "use_z_move_requires_z_crystals")
        );

        // warning-level inverses
        let model = TaskModel::builder().actions(["terastallize"]).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(
            result
                .warnings()
                .any(|issue| issue.message_key == "terastallize_without_tera_types")
        );

        let model = TaskModel::builder().actions(["gigantamax"]).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .warnings()
                .any(|issue| issue.message_key == "dynamax_without_dynamax_types")
        );
    }

    #[test]
    fn test_gimmick_filter_without_action() {
        let model = TaskModel::builder()
            .actions(["catch"])
            .mega_forms(["mega-x"])
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(
            result
                .warnings()
                .any(|issue| issue.field == "mega_forms"
                    && issue.message_key == "gimmick_filter_unused")
        );
    }

    #[test]
    fn test_location_filters_unused() {
        let model = TaskModel::builder()
            .actions(["evolve"])
            .biomes(["minecraft:plains"])
            .time_min(0)
            .time_max(12000)
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(
            result
                .warnings()
                .any(|issue| issue.field == "biomes")
        );
        assert!(
            result
                .warnings()
                .any(|issue| issue.field == "time_min")
        );

        // a catch action keeps those filters live
        let model = TaskModel::builder()
            .actions(["catch"])
            .biomes(["minecraft:plains"])
            .build();
        assert!(TaskValidator::validate(&model, &catalog()).issues.is_empty());
    }

    #[test]
    fn test_identity_filters_on_npc_battles() {
        let model = TaskModel::builder()
            .actions(["defeat_npc"])
            .pokemons(["cobblemon:pikachu"])
            .shiny(true)
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        let ignored: Vec<_> = result
            .warnings()
            .filter(|issue| issue.message_key == "pokemon_filter_ignored")
            .collect();
        assert_eq!(ignored.len(), 2);
        assert!(ignored.iter().all(|issue| issue.args == vec!["defeat_npc"]));
    }

    #[test]
    fn test_pokeballs_ignored_for_action() {
        let model = TaskModel::builder()
            .actions(["defeat"])
            .poke_balls_used(["cobblemon:ultra_ball"])
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .warnings()
                .any(|issue| issue.message_key == "pokeballs_ignored_for_action")
        );

        let model = TaskModel::builder()
            .actions(["reel"])
            .poke_balls_used(["cobblemon:lure_ball"])
            .build();
        assert!(!TaskValidator::validate(&model, &catalog()).has_warnings());
    }

    #[test]
    fn test_unknown_action_warns() {
        let model = TaskModel::builder().actions(["ride"]).build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(
            result
                .warnings()
                .any(|issue| issue.message_key == "unknown_action" && issue.args == vec!["ride"])
        );
    }

    #[test]
    fn test_info_heuristics() {
        let model = TaskModel::builder()
            .actions(["catch"])
            .amount(50_000)
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(result.is_valid());
        assert!(
            result
                .infos()
                .any(|issue| issue.message_key == "amount_unusually_large")
        );

        let species: Vec<String> = (0..30).map(|i| format!("cobblemon:species_{i}")).collect();
        let model = TaskModel::builder()
            .actions(["catch"])
            .pokemons(species)
            .pokemon_types(["fire"])
            .build();
        let result = TaskValidator::validate(&model, &catalog());
        assert!(
            result
                .infos()
                .any(|issue| issue.message_key == "large_species_type_combination")
        );
    }

    #[test]
    fn test_validation_is_deterministic() {
        let model = TaskModel::builder()
            .actions(["mega_evolve", "terastallize"])
            .amount(0)
            .build();
        let catalog = catalog();
        let first = TaskValidator::validate(&model, &catalog);
        let second = TaskValidator::validate(&model, &catalog);
        assert_eq!(first, second);
    }
}
