//! Quest Task System
//!
//! Condition model, validation, versioned persistence, and the
//! event-matching engine that turns creature-interaction events into team
//! progress.

pub mod actions;
pub mod codec;
pub mod definition;
pub mod events;
pub mod matcher;
pub mod model;
pub mod progress;
pub mod registry;
pub mod validation;

pub use actions::{ActionCatalog, ActionCategory, ActionDefinition};
pub use definition::{RawTask, RawTaskFile, StoredTask};
pub use events::{DexEntry, EventPokemon, PokemonEvent};
pub use matcher::ProgressUpdate;
pub use model::{TaskModel, TaskModelBuilder};
pub use progress::{ProgressState, TeamProgressStore};
pub use registry::{HotReloadEvent, TaskEventResult, TaskRegistry};
pub use validation::{Severity, TaskValidator, ValidationIssue, ValidationResult};
