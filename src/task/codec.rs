//! Versioned Task Codec
//!
//! Two encodings of a [`TaskModel`]:
//!
//! - A flat key/value record ([`TaskRecord`]) used for durable storage. Every
//!   record carries a `_format_version` marker; records without one are the
//!   oldest known format (v1) and are migrated transparently on decode.
//!   Decoding is total: an unparseable or missing field falls back to that
//!   field's default instead of failing.
//! - A positional MessagePack sequence for point-to-point transfer between
//!   the coordinating process and workers. No names, no version marker, both
//!   ends must run the same schema: never reorder [`WireTask`] fields
//!   without a protocol version bump.
//!
//! List-valued fields are carried as single comma-joined strings in both
//! encodings; reading splits, trims, drops empty/placeholder tokens and
//! dedups preserving first-seen order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::task::model::{DAY_LENGTH, DEX_SEEN, TaskModel, sanitize};

/// Current format version of the flat record encoding.
pub const FORMAT_VERSION: i64 = 2;

/// Record key carrying the format version.
pub const VERSION_KEY: &str = "_format_version";

/// Flat persistent representation of one task model.
pub type TaskRecord = Map<String, Value>;

/// Legacy v1 form identifiers written as bare region names, rewritten to
/// their adjectival form on migration.
const FORM_REPLACEMENTS: [(&str, &str); 4] = [
    ("alola", "alolan"),
    ("galar", "galarian"),
    ("paldea", "paldean"),
    ("hisui", "hisuian"),
];

// ===== Flat record encoding =====

/// Encode a model as a current-version flat record.
pub fn encode(model: &TaskModel) -> TaskRecord {
    let mut record = TaskRecord::new();
    record.insert(VERSION_KEY.to_string(), json!(FORMAT_VERSION));

    record.insert("actions".to_string(), json!(write_list(&model.actions)));
    record.insert("amount".to_string(), json!(model.amount));
    record.insert("shiny".to_string(), json!(model.shiny));
    record.insert("pokemons".to_string(), json!(write_list(&model.pokemons)));
    record.insert(
        "pokemon_types".to_string(),
        json!(write_list(&model.pokemon_types)),
    );
    record.insert("natures".to_string(), json!(write_list(&model.natures)));
    record.insert("regions".to_string(), json!(write_list(&model.regions)));
    record.insert("genders".to_string(), json!(write_list(&model.genders)));
    record.insert("forms".to_string(), json!(write_list(&model.forms)));
    record.insert("biomes".to_string(), json!(write_list(&model.biomes)));
    record.insert(
        "dimensions".to_string(),
        json!(write_list(&model.dimensions)),
    );
    record.insert(
        "poke_balls_used".to_string(),
        json!(write_list(&model.poke_balls_used)),
    );
    record.insert("time_min".to_string(), json!(model.time_min));
    record.insert("time_max".to_string(), json!(model.time_max));
    record.insert("min_level".to_string(), json!(model.min_level));
    record.insert("max_level".to_string(), json!(model.max_level));
    record.insert("dex_progress".to_string(), json!(model.dex_progress));
    record.insert(
        "tera_types".to_string(),
        json!(write_list(&model.tera_types)),
    );
    record.insert(
        "mega_forms".to_string(),
        json!(write_list(&model.mega_forms)),
    );
    record.insert(
        "z_crystals".to_string(),
        json!(write_list(&model.z_crystals)),
    );
    record.insert(
        "dynamax_types".to_string(),
        json!(write_list(&model.dynamax_types)),
    );

    record
}

/// Decode a record of any known version into a model. Migrates v1 records
/// first; never fails — malformed fields decode to their defaults.
pub fn decode(record: &TaskRecord) -> TaskModel {
    let record = migrate(record);

    TaskModel::builder()
        .actions(read_list(&get_str(&record, "actions", "")))
        .amount(get_i64(&record, "amount", 1))
        .shiny(get_bool(&record, "shiny"))
        .pokemons(read_list(&get_str(&record, "pokemons", "")))
        .pokemon_types(read_list(&get_str(&record, "pokemon_types", "")))
        .natures(read_list(&get_str(&record, "natures", "")))
        .regions(read_list(&get_str(&record, "regions", "")))
        .genders(read_list(&get_str(&record, "genders", "")))
        .forms(read_list(&get_str(&record, "forms", "")))
        .biomes(read_list(&get_str(&record, "biomes", "")))
        .dimensions(read_list(&get_str(&record, "dimensions", "")))
        .poke_balls_used(read_list(&get_str(&record, "poke_balls_used", "")))
        .time_min(get_i64(&record, "time_min", 0))
        .time_max(get_i64(&record, "time_max", DAY_LENGTH))
        .min_level(get_i64(&record, "min_level", 0) as i32)
        .max_level(get_i64(&record, "max_level", 0) as i32)
        .dex_progress(get_str(&record, "dex_progress", DEX_SEEN))
        .tera_types(read_list(&get_str(&record, "tera_types", "")))
        .mega_forms(read_list(&get_str(&record, "mega_forms", "")))
        .z_crystals(read_list(&get_str(&record, "z_crystals", "")))
        .dynamax_types(read_list(&get_str(&record, "dynamax_types", "")))
        .build()
}

/// Upgrade a record to the current format version. Already-current records
/// pass through unchanged, so migration is idempotent.
pub fn migrate(record: &TaskRecord) -> TaskRecord {
    if detect_version(record) >= FORMAT_VERSION {
        return record.clone();
    }
    migrate_v1(record)
}

/// A record without a version marker predates versioning entirely: v1.
fn detect_version(record: &TaskRecord) -> i64 {
    match record.get(VERSION_KEY) {
        Some(value) => value.as_i64().unwrap_or(1),
        None => 1,
    }
}

/// v1 used singular snake_case keys and a handful of even older aliases.
fn migrate_v1(record: &TaskRecord) -> TaskRecord {
    let mut out = TaskRecord::new();
    out.insert(VERSION_KEY.to_string(), json!(FORMAT_VERSION));

    out.insert(
        "actions".to_string(),
        json!(get_str(record, "action", "")),
    );

    // The "value" alias is honored only when the canonical amount is
    // absent or zero; a zero amount was never a valid task either way.
    let mut amount = get_i64(record, "amount", 0);
    if amount == 0 {
        amount = get_i64(record, "value", 0);
    }
    if amount == 0 {
        amount = 1;
    }
    out.insert("amount".to_string(), json!(amount));

    out.insert("shiny".to_string(), json!(get_bool(record, "shiny")));

    // Species list: "entity" alias applies only when "pokemon" is empty,
    // and bare-namespace placeholders ("minecraft:") are dropped.
    let mut pokemons = read_list(&get_str(record, "pokemon", ""));
    if pokemons.is_empty() {
        pokemons = read_list(&get_str(record, "entity", ""));
    }
    pokemons.retain(|entry| !entry.ends_with(':'));
    out.insert("pokemons".to_string(), json!(write_list(&pokemons)));

    out.insert(
        "pokemon_types".to_string(),
        json!(get_str(record, "pokemon_type", "")),
    );
    out.insert(
        "natures".to_string(),
        json!(get_str(record, "natures", "")),
    );
    out.insert(
        "regions".to_string(),
        json!(get_str(record, "region", "")),
    );
    out.insert(
        "genders".to_string(),
        json!(get_str(record, "gender", "")),
    );

    let forms: Vec<String> = read_list(&get_str(record, "form", ""))
        .into_iter()
        .map(|form| {
            FORM_REPLACEMENTS
                .iter()
                .find(|(old, _)| *old == form)
                .map(|(_, new)| new.to_string())
                .unwrap_or(form)
        })
        .collect();
    out.insert("forms".to_string(), json!(write_list(&forms)));

    out.insert(
        "biomes".to_string(),
        json!(get_str(record, "biome", "")),
    );
    out.insert(
        "dimensions".to_string(),
        json!(get_str(record, "dimension", "")),
    );
    out.insert(
        "poke_balls_used".to_string(),
        json!(get_str(record, "poke_ball_used", "")),
    );

    // Old editors wrote 0/0 for "no window"; that would be a zero-width
    // window, so it becomes the full day.
    let time_min = get_i64(record, "time_min", 0);
    let mut time_max = get_i64(record, "time_max", 0);
    if time_min == 0 && time_max == 0 {
        time_max = DAY_LENGTH;
    }
    out.insert("time_min".to_string(), json!(time_min));
    out.insert("time_max".to_string(), json!(time_max));

    out.insert(
        "min_level".to_string(),
        json!(get_i64(record, "min_level", 0)),
    );
    out.insert(
        "max_level".to_string(),
        json!(get_i64(record, "max_level", 0)),
    );

    let mut dex_progress = get_str(record, "dex_progress", "");
    if dex_progress.is_empty() {
        dex_progress = DEX_SEEN.to_string();
    }
    out.insert("dex_progress".to_string(), json!(dex_progress));

    out.insert(
        "tera_types".to_string(),
        json!(get_str(record, "tera_type", "")),
    );
    out.insert(
        "mega_forms".to_string(),
        json!(get_str(record, "mega_form", "")),
    );
    out.insert(
        "z_crystals".to_string(),
        json!(get_str(record, "z_crystal", "")),
    );
    out.insert(
        "dynamax_types".to_string(),
        json!(get_str(record, "dynamax_type", "")),
    );

    out
}

// ===== Wire encoding =====

/// Positional wire layout. Field order is the protocol; both ends must run
/// the same schema.
#[derive(Serialize, Deserialize)]
struct WireTask {
    amount: i64,
    shiny: bool,
    time_min: i64,
    time_max: i64,
    pokemons: String,
    actions: String,
    biomes: String,
    dimensions: String,
    forms: String,
    genders: String,
    poke_balls_used: String,
    pokemon_types: String,
    regions: String,
    natures: String,
    min_level: i32,
    max_level: i32,
    dex_progress: String,
    tera_types: String,
    mega_forms: String,
    z_crystals: String,
    dynamax_types: String,
}

/// Encode a model for point-to-point transfer.
pub fn encode_wire(model: &TaskModel) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    let wire = WireTask {
        amount: model.amount,
        shiny: model.shiny,
        time_min: model.time_min,
        time_max: model.time_max,
        pokemons: write_list(&model.pokemons),
        actions: write_list(&model.actions),
        biomes: write_list(&model.biomes),
        dimensions: write_list(&model.dimensions),
        forms: write_list(&model.forms),
        genders: write_list(&model.genders),
        poke_balls_used: write_list(&model.poke_balls_used),
        pokemon_types: write_list(&model.pokemon_types),
        regions: write_list(&model.regions),
        natures: write_list(&model.natures),
        min_level: model.min_level,
        max_level: model.max_level,
        dex_progress: model.dex_progress.clone(),
        tera_types: write_list(&model.tera_types),
        mega_forms: write_list(&model.mega_forms),
        z_crystals: write_list(&model.z_crystals),
        dynamax_types: write_list(&model.dynamax_types),
    };
    rmp_serde::to_vec(&wire)
}

/// Decode a model from the wire encoding.
pub fn decode_wire(bytes: &[u8]) -> Result<TaskModel, rmp_serde::decode::Error> {
    let wire: WireTask = rmp_serde::from_slice(bytes)?;
    Ok(TaskModel::builder()
        .amount(wire.amount)
        .shiny(wire.shiny)
        .time_min(wire.time_min)
        .time_max(wire.time_max)
        .pokemons(read_list(&wire.pokemons))
        .actions(read_list(&wire.actions))
        .biomes(read_list(&wire.biomes))
        .dimensions(read_list(&wire.dimensions))
        .forms(read_list(&wire.forms))
        .genders(read_list(&wire.genders))
        .poke_balls_used(read_list(&wire.poke_balls_used))
        .pokemon_types(read_list(&wire.pokemon_types))
        .regions(read_list(&wire.regions))
        .natures(read_list(&wire.natures))
        .min_level(wire.min_level)
        .max_level(wire.max_level)
        .dex_progress(wire.dex_progress)
        .tera_types(read_list(&wire.tera_types))
        .mega_forms(read_list(&wire.mega_forms))
        .z_crystals(read_list(&wire.z_crystals))
        .dynamax_types(read_list(&wire.dynamax_types))
        .build())
}

// ===== Helpers =====

/// Split a comma-joined list, dropping blanks, placeholder tokens and
/// duplicates while preserving first-seen order.
pub fn read_list(s: &str) -> Vec<String> {
    sanitize(s.split(',').map(str::to_string).collect())
}

/// Join a list for storage.
pub fn write_list(list: &[String]) -> String {
    list.join(",")
}

fn get_i64(record: &TaskRecord, key: &str, default: i64) -> i64 {
    match record.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        // tolerate stringly-typed numbers from hand-edited records
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn get_bool(record: &TaskRecord, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn get_str(record: &TaskRecord, key: &str, default: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}
