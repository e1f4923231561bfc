//! Task Registry
//!
//! Loads, caches, and manages quest task definitions from TOML files, and
//! drives the event pipeline: incoming events are matched against every
//! loaded task and matching updates are applied to the team progress store.
//! Supports hot-reloading during development.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::QuestsConfig;
use crate::task::actions::ActionCatalog;
use crate::task::definition::{RawTaskFile, StoredTask};
use crate::task::events::{DexEntry, PokemonEvent};
use crate::task::matcher;
use crate::task::progress::TeamProgressStore;
use crate::task::validation::TaskValidator;

/// Result of applying one event to one task.
#[derive(Debug, Clone)]
pub struct TaskEventResult {
    pub task_id: String,
    /// Progress after the update.
    pub progress: i64,
    /// The task's target amount.
    pub target: i64,
    /// Whether the task just completed.
    pub completed: bool,
}

/// Registry for all task definitions
pub struct TaskRegistry {
    /// Loaded task definitions
    tasks: RwLock<HashMap<String, Arc<StoredTask>>>,
    /// Action metadata used to validate loaded tasks
    catalog: Arc<ActionCatalog>,
    /// Base directory for task data
    data_dir: PathBuf,
}

impl TaskRegistry {
    pub fn new(data_dir: &Path, catalog: Arc<ActionCatalog>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            catalog,
            data_dir: data_dir.join("tasks"),
        }
    }

    /// Load all task definitions from the data directory, replacing the
    /// current set.
    pub async fn load_all(&self) -> Result<(), String> {
        info!("Loading tasks from {:?}", self.data_dir);

        if !self.data_dir.exists() {
            warn!("Task directory does not exist: {:?}", self.data_dir);
            return Ok(());
        }

        let mut paths = Vec::new();
        self.collect_task_files(&self.data_dir, &mut paths)?;

        let mut loaded = HashMap::new();
        for path in paths {
            match self.load_task_file(&path) {
                Ok(task) => {
                    if loaded.contains_key(&task.id) {
                        warn!("Duplicate task id '{}' in {:?}, overwriting", task.id, path);
                    }
                    loaded.insert(task.id.clone(), Arc::new(task));
                }
                Err(e) => warn!("Failed to load task {:?}: {}", path, e),
            }
        }

        info!("Loaded {} task definitions", loaded.len());
        *self.tasks.write().await = loaded;
        Ok(())
    }

    /// Recursively collect task TOML files from a directory.
    fn collect_task_files(&self, dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), String> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("Failed to read directory {:?}: {}", dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
            let path = entry.path();

            if path.is_dir() {
                self.collect_task_files(&path, paths)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }

        Ok(())
    }

    /// Load and validate a single task file. Validation errors reject the
    /// file the same way the editor refuses to save them.
    fn load_task_file(&self, path: &Path) -> Result<StoredTask, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

        let raw: RawTaskFile = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

        let task = StoredTask::from_raw(&raw.task)?;

        let result = TaskValidator::validate(&task.model, &self.catalog);
        if result.has_errors() {
            let keys: Vec<&str> = result.errors().map(|issue| issue.message_key).collect();
            return Err(format!("Task '{}' is invalid: {}", task.id, keys.join(", ")));
        }
        for issue in result.warnings() {
            warn!(
                "Task '{}': {} ({})",
                task.id, issue.message_key, issue.field
            );
        }

        info!("Loaded task: {}", task.id);
        Ok(task)
    }

    /// Get a task by ID
    pub async fn get(&self, task_id: &str) -> Option<Arc<StoredTask>> {
        let tasks = self.tasks.read().await;
        tasks.get(task_id).cloned()
    }

    /// Get all task IDs
    pub async fn all_ids(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        tasks.keys().cloned().collect()
    }

    /// Get count of loaded tasks
    pub async fn count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Match one creature-interaction event against every loaded task and
    /// apply the resulting progress updates for the team.
    pub async fn process_event(
        &self,
        store: &TeamProgressStore,
        config: &QuestsConfig,
        team_id: &str,
        event: &PokemonEvent,
    ) -> Vec<TaskEventResult> {
        if config.is_ignored(&event.pokemon.species) {
            return Vec::new();
        }

        let tasks = self.tasks.read().await;
        let mut results = Vec::new();

        for task in tasks.values() {
            if let Some(update) = matcher::apply(&task.model, event) {
                let (state, newly_completed) =
                    store.apply(team_id, &task.id, task.model.amount, update);
                results.push(TaskEventResult {
                    task_id: task.id.clone(),
                    progress: state.current,
                    target: task.model.amount,
                    completed: newly_completed,
                });
            }
        }

        results
    }

    /// Creature-free event path (plain token matched against the form
    /// list), e.g. an NPC dialogue choice.
    pub async fn process_form_event(
        &self,
        store: &TeamProgressStore,
        team_id: &str,
        token: &str,
        action: &str,
        amount: i64,
    ) -> Vec<TaskEventResult> {
        let tasks = self.tasks.read().await;
        let mut results = Vec::new();

        for task in tasks.values() {
            if let Some(update) = matcher::apply_plain(&task.model, token, action, amount) {
                let (state, newly_completed) =
                    store.apply(team_id, &task.id, task.model.amount, update);
                results.push(TaskEventResult {
                    task_id: task.id.clone(),
                    progress: state.current,
                    target: task.model.amount,
                    completed: newly_completed,
                });
            }
        }

        results
    }

    /// Snapshot path for "have_registered" tasks: recompute each task's
    /// count from the full dex snapshot and write it as an absolute value.
    pub async fn recount_registered(
        &self,
        store: &TeamProgressStore,
        team_id: &str,
        entries: &[DexEntry],
    ) -> Vec<TaskEventResult> {
        let tasks = self.tasks.read().await;
        let mut results = Vec::new();

        for task in tasks.values() {
            if store.is_completed(team_id, &task.id) {
                continue;
            }
            if let Some(update) = matcher::recount_registered(&task.model, entries) {
                let (state, newly_completed) =
                    store.apply(team_id, &task.id, task.model.amount, update);
                results.push(TaskEventResult {
                    task_id: task.id.clone(),
                    progress: state.current,
                    target: task.model.amount,
                    completed: newly_completed,
                });
            }
        }

        results
    }

    /// Start file watcher for hot-reload
    /// Returns a channel receiver that signals when reloads occur
    pub fn start_file_watcher(
        self: &Arc<Self>,
    ) -> Result<tokio::sync::mpsc::Receiver<HotReloadEvent>, String> {
        use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let registry = Arc::clone(self);
        let data_dir = self.data_dir.clone();
        let rt = tokio::runtime::Handle::current();

        // notify is sync, so the watcher lives on a blocking thread
        std::thread::spawn(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = match RecommendedWatcher::new(
                move |res: Result<notify::Event, notify::Error>| {
                    if let Ok(event) = res {
                        let _ = notify_tx.send(event);
                    }
                },
                Config::default().with_poll_interval(Duration::from_secs(1)),
            ) {
                Ok(w) => w,
                Err(e) => {
                    tracing::error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

            if data_dir.exists() {
                if let Err(e) = watcher.watch(&data_dir, RecursiveMode::Recursive) {
                    tracing::error!("Failed to watch task directory: {}", e);
                }
            }

            info!("Task hot-reload watcher started for {:?}", data_dir);

            loop {
                match notify_rx.recv() {
                    Ok(event) => {
                        use notify::EventKind;
                        match event.kind {
                            EventKind::Modify(_) | EventKind::Create(_) => {
                                for path in &event.paths {
                                    let extension = path
                                        .extension()
                                        .and_then(|e| e.to_str())
                                        .unwrap_or("");

                                    if extension == "toml" {
                                        info!("Detected change in {:?}, triggering reload", path);

                                        let reg = Arc::clone(&registry);
                                        let tx = tx.clone();
                                        let path_clone = path.clone();

                                        rt.spawn(async move {
                                            if let Err(e) = reg.load_all().await {
                                                tracing::error!("Hot-reload failed: {}", e);
                                                let _ =
                                                    tx.send(HotReloadEvent::Error(e)).await;
                                            } else {
                                                info!("Hot-reload completed successfully");
                                                let _ = tx
                                                    .send(HotReloadEvent::Reloaded(
                                                        path_clone
                                                            .to_string_lossy()
                                                            .to_string(),
                                                    ))
                                                    .await;
                                            }
                                        });
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    Err(_) => {
                        // Channel closed, exit
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// A file was reloaded successfully
    Reloaded(String),
    /// An error occurred during reload
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::events::EventPokemon;
    use tempfile::TempDir;

    fn write_task(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    async fn setup(contents: &[(&str, &str)]) -> (TempDir, TaskRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let task_dir = temp_dir.path().join("tasks");
        std::fs::create_dir_all(&task_dir).unwrap();
        for (name, content) in contents {
            write_task(&task_dir, name, content);
        }
        let registry = TaskRegistry::new(
            temp_dir.path(),
            Arc::new(ActionCatalog::with_builtins()),
        );
        registry.load_all().await.unwrap();
        (temp_dir, registry)
    }

    fn shiny_pikachu_event() -> PokemonEvent {
        let mut event = PokemonEvent::new(
            "catch",
            EventPokemon {
                species: "cobblemon:pikachu".to_string(),
                types: vec!["electric".to_string()],
                nature: "jolly".to_string(),
                gender: "female".to_string(),
                form: "normal".to_string(),
                aspects: vec!["shiny".to_string()],
                shiny: true,
                level: 12,
                region: Some("gen1".to_string()),
                caught_ball: Some("cobblemon:poke_ball".to_string()),
            },
        );
        event.amount = 1;
        event
    }

    const SHINY_TASK: &str = r#"
[task]
id = "shiny_pikachu"
actions = ["catch"]
amount = 3
shiny = true
pokemons = ["cobblemon:pikachu"]
"#;

    #[tokio::test]
    async fn test_load_task() {
        let (_tmp, registry) = setup(&[("shiny.toml", SHINY_TASK)]).await;
        let task = registry.get("shiny_pikachu").await;
        assert!(task.is_some());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_task_rejected() {
        let invalid = r#"
[task]
id = "broken"
actions = []
"#;
        let (_tmp, registry) = setup(&[("broken.toml", invalid)]).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_shiny_catch_scenario() {
        let (_tmp, registry) = setup(&[("shiny.toml", SHINY_TASK)]).await;
        let store = TeamProgressStore::new();
        let config = QuestsConfig::default();

        // three shiny catches complete the task
        for expected in 1..=3 {
            let results = registry
                .process_event(&store, &config, "team1", &shiny_pikachu_event())
                .await;
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].progress, expected);
            assert_eq!(results[0].completed, expected == 3);
        }
        assert!(store.is_completed("team1", "shiny_pikachu"));

        // a non-shiny catch never matched in the first place
        let store = TeamProgressStore::new();
        let mut event = shiny_pikachu_event();
        event.pokemon.shiny = false;
        event.pokemon.aspects = vec![];
        let results = registry
            .process_event(&store, &config, "team1", &event)
            .await;
        assert!(results.is_empty());
        assert_eq!(store.get("team1", "shiny_pikachu").current, 0);
    }

    #[tokio::test]
    async fn test_ignored_species_never_counts() {
        let (_tmp, registry) = setup(&[("shiny.toml", SHINY_TASK)]).await;
        let store = TeamProgressStore::new();
        let config = QuestsConfig {
            ignored_pokemon: vec!["cobblemon:pikachu".to_string()],
        };

        let results = registry
            .process_event(&store, &config, "team1", &shiny_pikachu_event())
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_form_event_path() {
        let dialogue_task = r#"
[task]
id = "answer_professor"
actions = ["talk_to_professor"]
amount = 1
forms = ["yes"]
"#;
        let (_tmp, registry) = setup(&[("dialogue.toml", dialogue_task)]).await;
        let store = TeamProgressStore::new();

        let results = registry
            .process_form_event(&store, "team1", "no", "talk_to_professor", 1)
            .await;
        assert!(results.is_empty());

        let results = registry
            .process_form_event(&store, "team1", "yes", "talk_to_professor", 1)
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].completed);
    }

    #[tokio::test]
    async fn test_recount_registered_path() {
        let dex_task = r#"
[task]
id = "dex_ten"
actions = ["have_registered"]
amount = 2
dex_progress = "caught"
"#;
        let (_tmp, registry) = setup(&[("dex.toml", dex_task)]).await;
        let store = TeamProgressStore::new();

        let entries = vec![
            DexEntry {
                species: "cobblemon:pikachu".to_string(),
                caught: true,
                ..Default::default()
            },
            DexEntry {
                species: "cobblemon:eevee".to_string(),
                caught: false,
                ..Default::default()
            },
        ];

        let results = registry.recount_registered(&store, "team1", &entries).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].progress, 1);
        assert!(!results[0].completed);

        // recounting the same snapshot is idempotent
        let results = registry.recount_registered(&store, "team1", &entries).await;
        assert_eq!(results[0].progress, 1);
    }

}
