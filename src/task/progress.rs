//! Team Progress Tracking
//!
//! Per-(team, task) progress counters. The store is the only mutable state
//! in the engine; every update is an atomic read-modify-write on the entry
//! for that key, so concurrent events for the same team and task never lose
//! updates, and different keys never contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::task::matcher::ProgressUpdate;

/// Progress of one team on one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub current: i64,
    pub completed: bool,
    /// When the task completed, if it has.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// In-memory progress store keyed by (team id, task id).
pub struct TeamProgressStore {
    entries: DashMap<(String, String), ProgressState>,
}

impl TeamProgressStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Apply an update against the counter for (team, task), clamping at
    /// `target`. Returns the resulting state and whether the task just
    /// completed. A completed entry latches: further updates are ignored.
    pub fn apply(
        &self,
        team_id: &str,
        task_id: &str,
        target: i64,
        update: ProgressUpdate,
    ) -> (ProgressState, bool) {
        let mut entry = self
            .entries
            .entry((team_id.to_string(), task_id.to_string()))
            .or_default();
        let state = entry.value_mut();

        if state.completed {
            return (state.clone(), false);
        }

        match update {
            ProgressUpdate::Add(amount) => {
                state.current = (state.current + amount).min(target);
            }
            ProgressUpdate::Watermark(value) => {
                state.current = state.current.max(value).min(target);
            }
            ProgressUpdate::Set(value) => {
                state.current = value.min(target);
            }
        }

        let newly_completed = target > 0 && state.current >= target;
        if newly_completed {
            state.completed = true;
            state.completed_at = Some(Utc::now());
        }
        (state.clone(), newly_completed)
    }

    /// Current state for (team, task); zero progress if never touched.
    pub fn get(&self, team_id: &str, task_id: &str) -> ProgressState {
        self.entries
            .get(&(team_id.to_string(), task_id.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn is_completed(&self, team_id: &str, task_id: &str) -> bool {
        self.get(team_id, task_id).completed
    }

    /// Overwrite the stored state, e.g. when hydrating from the database.
    pub fn set_state(&self, team_id: &str, task_id: &str, state: ProgressState) {
        self.entries
            .insert((team_id.to_string(), task_id.to_string()), state);
    }

    /// All tasks a team has progress on.
    pub fn team_snapshot(&self, team_id: &str) -> Vec<(String, ProgressState)> {
        self.entries
            .iter()
            .filter(|entry| entry.key().0 == team_id)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect()
    }

    /// Drop all progress rows for a deleted task.
    pub fn remove_task(&self, task_id: &str) {
        self.entries.retain(|key, _| key.1 != task_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TeamProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_counts_toward_target() {
        let store = TeamProgressStore::new();
        let (state, done) = store.apply("team1", "task1", 3, ProgressUpdate::Add(1));
        assert_eq!(state.current, 1);
        assert!(!done);

        store.apply("team1", "task1", 3, ProgressUpdate::Add(1));
        let (state, done) = store.apply("team1", "task1", 3, ProgressUpdate::Add(1));
        assert_eq!(state.current, 3);
        assert!(done);
        assert!(state.completed);
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn test_add_clamps_at_target() {
        let store = TeamProgressStore::new();
        let (state, done) = store.apply("t", "task", 5, ProgressUpdate::Add(10));
        assert_eq!(state.current, 5);
        assert!(done);
    }

    #[test]
    fn test_completed_entry_latches() {
        let store = TeamProgressStore::new();
        store.apply("t", "task", 1, ProgressUpdate::Add(1));
        let (state, done) = store.apply("t", "task", 1, ProgressUpdate::Add(1));
        assert!(!done);
        assert_eq!(state.current, 1);

        // even an absolute write cannot un-complete
        let (state, _) = store.apply("t", "task", 1, ProgressUpdate::Set(0));
        assert_eq!(state.current, 1);
        assert!(state.completed);
    }

    #[test]
    fn test_watermark_never_decreases() {
        let store = TeamProgressStore::new();
        for payload in [10, 5, 20, 15] {
            store.apply("t", "task", 50, ProgressUpdate::Watermark(payload));
        }
        assert_eq!(store.get("t", "task").current, 20);
    }

    #[test]
    fn test_watermark_completes_at_target() {
        let store = TeamProgressStore::new();
        let (state, done) = store.apply("t", "task", 20, ProgressUpdate::Watermark(35));
        assert_eq!(state.current, 20);
        assert!(done);
    }

    #[test]
    fn test_set_is_absolute() {
        let store = TeamProgressStore::new();
        store.apply("t", "task", 100, ProgressUpdate::Set(7));
        assert_eq!(store.get("t", "task").current, 7);
        store.apply("t", "task", 100, ProgressUpdate::Set(4));
        assert_eq!(store.get("t", "task").current, 4);
    }

    #[test]
    fn test_teams_are_independent() {
        let store = TeamProgressStore::new();
        store.apply("red", "task", 3, ProgressUpdate::Add(2));
        store.apply("blue", "task", 3, ProgressUpdate::Add(1));
        assert_eq!(store.get("red", "task").current, 2);
        assert_eq!(store.get("blue", "task").current, 1);
    }

    #[test]
    fn test_remove_task_drops_all_teams() {
        let store = TeamProgressStore::new();
        store.apply("red", "task", 3, ProgressUpdate::Add(1));
        store.apply("blue", "task", 3, ProgressUpdate::Add(1));
        store.apply("red", "other", 3, ProgressUpdate::Add(1));
        store.remove_task("task");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("red", "other").current, 1);
    }

    #[test]
    fn test_concurrent_adds_do_not_lose_updates() {
        use std::sync::Arc;

        let store = Arc::new(TeamProgressStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    store.apply("team", "task", 10_000, ProgressUpdate::Add(1));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get("team", "task").current, 800);
    }
}
