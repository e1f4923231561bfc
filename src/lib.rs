//! Quest task engine for a creature-collection game server.
//!
//! An operator defines task completion criteria (action + target amount +
//! optional filters over event attributes) in TOML; the host event system
//! feeds creature-interaction events through [`task::TaskRegistry`], which
//! matches them against every loaded task and advances per-team progress in
//! a [`task::TeamProgressStore`]. Models persist through a versioned flat
//! record codec with transparent migration from older formats, and travel
//! between the coordinating process and workers over a positional wire
//! encoding.
//!
//! The crate owns no game registries and renders nothing: species, biomes
//! and the like arrive as pre-resolved strings on the events, and
//! validation results go back to whatever editor the host provides.

pub mod config;
pub mod db;
pub mod task;

pub use config::QuestsConfig;
pub use db::Database;
