//! CSV city loader.
//!
//! # CSV format
//!
//! One row per edge.  Vertices are created by name in order of first
//! appearance.
//!
//! ```csv
//! from,to,weight,mode,reverse_weight
//! Market,Harbour,4,drive,
//! Market,Harbour,15,walk,
//! Harbour,Hill,6,drive,9
//! ```
//!
//! | Column           | Meaning                                          |
//! |------------------|--------------------------------------------------|
//! | `mode`           | `walk` or `drive`                                |
//! | `weight`         | cost from `from` to `to`                         |
//! | `reverse_weight` | optional cost from `to` to `from` (default: same) |
//!
//! The loader only reads topology; the caller supplies the configuration
//! and adds routes, buses and passengers after [`CityBuilder::build`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tn_graph::UndirectedEdge;

use crate::{CityBuilder, SimError, SimResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EdgeRecord {
    from:           String,
    to:             String,
    weight:         f64,
    mode:           String,
    #[serde(default)]
    reverse_weight: Option<f64>,
}

enum Mode {
    Walk,
    Drive,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a city's vertices and edges from a CSV file.
pub fn load_city_csv(path: &Path) -> SimResult<CityBuilder> {
    let file = std::fs::File::open(path)?;
    load_city_reader(file)
}

/// Like [`load_city_csv`] but accepts any `Read` source.
pub fn load_city_reader<R: Read>(reader: R) -> SimResult<CityBuilder> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut builder = CityBuilder::default();

    for (line, result) in csv_reader.deserialize::<EdgeRecord>().enumerate() {
        let row = result.map_err(|e| SimError::Parse(e.to_string()))?;
        let mode = parse_mode(&row.mode).ok_or_else(|| {
            SimError::Parse(format!("row {}: unknown mode {:?}", line + 1, row.mode))
        })?;
        let a = builder.vertex(&row.from);
        let b = builder.vertex(&row.to);
        let edge = match row.reverse_weight {
            Some(back) => UndirectedEdge::asymmetric(row.weight, back),
            None => UndirectedEdge::new(row.weight),
        };
        match mode {
            Mode::Walk => builder.add_walk_edge(a, b, edge),
            Mode::Drive => builder.add_drive_edge(a, b, edge),
        };
    }

    Ok(builder)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_mode(s: &str) -> Option<Mode> {
    match s.to_ascii_lowercase().as_str() {
        "walk" => Some(Mode::Walk),
        "drive" => Some(Mode::Drive),
        _ => None,
    }
}
