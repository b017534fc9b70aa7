//! Firing-table file format.
//!
//! A table is a JSON object keyed by cell x, then cell y, holding the
//! ascending launch angles (whole degrees) that reach the cell:
//!
//! ```json
//! { "-10": { "30": [170] }, "100": { "-20": [10, 40], "20": [50] } }
//! ```
//!
//! Keys are integer pixel coordinates aligned to the lookup grid. Each
//! world's table lives in `<world_id>.json` inside a table directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ballista_core::constants::TABLE_SWEEP_LAST_DEG;
use ballista_core::error::BallisticsError;
use ballista_core::grid::GRID_STEP;
use ballista_core::table::FiringTable;
use ballista_core::GridCell;

/// File extension of table files.
pub const TABLE_EXTENSION: &str = "json";

type RawTable = BTreeMap<String, BTreeMap<String, Vec<i64>>>;

/// Parse and validate a table from JSON text.
pub fn parse(json: &str) -> Result<FiringTable, BallisticsError> {
    let raw: RawTable = serde_json::from_str(json)
        .map_err(|e| BallisticsError::TableFormat(format!("not a table object: {e}")))?;

    let mut table = FiringTable::new();
    for (x_key, column) in &raw {
        let x = parse_coordinate(x_key)?;
        for (y_key, angles) in column {
            let y = parse_coordinate(y_key)?;
            let cell = GridCell::new(x, y);
            validate_angles(cell, angles)?;
            for &angle in angles {
                // Range checked above.
                table.insert(cell, angle as u16);
            }
        }
    }
    Ok(table)
}

/// Serialize a table in canonical order.
pub fn to_json(table: &FiringTable) -> Result<String, BallisticsError> {
    Ok(serde_json::to_string(table)?)
}

/// File name of a world's table. Rejects ids that are not a plain name.
pub fn file_name(world_id: &str) -> Result<String, BallisticsError> {
    let plain = !world_id.is_empty()
        && world_id != "."
        && world_id != ".."
        && !world_id.contains(['/', '\\', '\0']);
    if !plain {
        return Err(BallisticsError::TableLoad {
            world: world_id.to_string(),
            reason: "world id is not usable as a file name".into(),
        });
    }
    Ok(format!("{world_id}.{TABLE_EXTENSION}"))
}

/// Path of a world's table inside `dir`.
pub fn table_path(dir: &Path, world_id: &str) -> Result<PathBuf, BallisticsError> {
    Ok(dir.join(file_name(world_id)?))
}

/// Load and validate a table file.
pub fn load(path: &Path) -> Result<FiringTable, BallisticsError> {
    let json = std::fs::read_to_string(path)?;
    parse(&json)
}

/// Write a table file, creating the parent directory if needed.
pub fn write(table: &FiringTable, path: &Path) -> Result<(), BallisticsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_json(table)?)?;
    Ok(())
}

fn parse_coordinate(key: &str) -> Result<i32, BallisticsError> {
    let value: i32 = key
        .parse()
        .map_err(|_| BallisticsError::TableFormat(format!("key '{key}' is not an integer")))?;
    if value % GRID_STEP != 0 {
        return Err(BallisticsError::TableFormat(format!(
            "key {value} is not a multiple of {GRID_STEP}"
        )));
    }
    Ok(value)
}

fn validate_angles(cell: GridCell, angles: &[i64]) -> Result<(), BallisticsError> {
    if let Some(&bad) = angles
        .iter()
        .find(|&&a| !(0..=i64::from(TABLE_SWEEP_LAST_DEG)).contains(&a))
    {
        return Err(BallisticsError::TableFormat(format!(
            "angle {bad} at ({}, {}) is outside 0..={TABLE_SWEEP_LAST_DEG}",
            cell.x, cell.y
        )));
    }
    if angles.windows(2).any(|w| w[0] >= w[1]) {
        return Err(BallisticsError::TableFormat(format!(
            "angles at ({}, {}) are not strictly ascending",
            cell.x, cell.y
        )));
    }
    Ok(())
}
