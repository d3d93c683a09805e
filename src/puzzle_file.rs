//! Puzzle definitions as YAML: a mapping from tube name to its slots, opening slot first.
//!
//! ```yaml
//! # level 3
//! tube_1: [blue, blue, green, blue]
//! tube_2:
//!   - blue
//!   - green
//!   - green
//!   - green
//! tube_3: []
//! ```
//!
//! Tubes get ids 1, 2, ... in the order they are written. A plain list of tubes works too.
//! Empty slots are `null`, `~`, `.` or `None`, and `[]` stands for a tube with nothing in it.

use std::fmt;
use std::fs;
use std::path::Path;

use macroquad::prelude::{debug, warn};
use serde::Deserialize;
use serde_yaml::Value;

use crate::state::{PuzzleError, PuzzleState};

const EMPTY_MARKERS: [&str; 3] = ["", ".", "None"];

#[derive(Debug)]
pub enum PuzzleFileError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    /// The document is neither a mapping of tubes nor a list of tubes.
    NotATubeList,
    Tube { tube: String, err: serde_yaml::Error },
    Puzzle(PuzzleError),
}

impl fmt::Display for PuzzleFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleFileError::Io(err) => write!(f, "cannot read puzzle: {err}"),
            PuzzleFileError::Yaml(err) => write!(f, "malformed puzzle: {err}"),
            PuzzleFileError::NotATubeList => f.write_str("puzzle must be a mapping or list of tubes"),
            PuzzleFileError::Tube { tube, err } => write!(f, "tube {tube}: {err}"),
            PuzzleFileError::Puzzle(err) => write!(f, "invalid puzzle: {err}"),
        }
    }
}

impl std::error::Error for PuzzleFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PuzzleFileError::Io(err) => Some(err),
            PuzzleFileError::Yaml(err) | PuzzleFileError::Tube { err, .. } => Some(err),
            PuzzleFileError::Puzzle(err) => Some(err),
            PuzzleFileError::NotATubeList => None,
        }
    }
}

impl From<std::io::Error> for PuzzleFileError {
    fn from(err: std::io::Error) -> Self {
        PuzzleFileError::Io(err)
    }
}

impl From<serde_yaml::Error> for PuzzleFileError {
    fn from(err: serde_yaml::Error) -> Self {
        PuzzleFileError::Yaml(err)
    }
}

impl From<PuzzleError> for PuzzleFileError {
    fn from(err: PuzzleError) -> Self {
        PuzzleFileError::Puzzle(err)
    }
}

/// One filled slot. Unquoted numbers and booleans are color names too.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotName {
    Text(String),
    Number(serde_yaml::Number),
    Flag(bool),
}

impl SlotName {
    fn into_color_name(self) -> Option<String> {
        match self {
            SlotName::Text(name) if EMPTY_MARKERS.contains(&name.trim()) => None,
            SlotName::Text(name) => Some(name),
            SlotName::Number(number) => Some(number.to_string()),
            SlotName::Flag(flag) => Some(flag.to_string()),
        }
    }
}

type Row = Vec<Option<String>>;

/// `Ok(None)` marks an all-empty tube of unknown size.
fn read_row(tube: String, value: Value) -> Result<Option<Row>, PuzzleFileError> {
    let slots: Option<Vec<Option<SlotName>>> =
        serde_yaml::from_value(value).map_err(|err| PuzzleFileError::Tube { tube, err })?;
    Ok(slots.filter(|slots| !slots.is_empty()).map(|slots| {
        slots
            .into_iter()
            .map(|slot| slot.and_then(SlotName::into_color_name))
            .collect()
    }))
}

fn is_blank(text: &str) -> bool {
    text.lines().map(str::trim).all(|line| line.is_empty() || line.starts_with('#'))
}

pub fn parse_puzzle(text: &str) -> Result<PuzzleState, PuzzleFileError> {
    let document: Value = if is_blank(text) {
        Value::Null
    } else {
        serde_yaml::from_str(text)?
    };
    let rows: Vec<Option<Row>> = match document {
        Value::Null => Vec::new(),
        Value::Mapping(tubes) => tubes
            .into_iter()
            .enumerate()
            .map(|(index, (name, slots))| {
                let name = name.as_str().map_or_else(|| format!("#{}", index + 1), str::to_string);
                read_row(name, slots)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Sequence(tubes) => tubes
            .into_iter()
            .enumerate()
            .map(|(index, slots)| read_row(format!("#{}", index + 1), slots))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(PuzzleFileError::NotATubeList),
    };

    let slot_count = rows.iter().flatten().map(Vec::len).next().unwrap_or(0);
    if slot_count == 0 && !rows.is_empty() {
        warn!("Puzzle has only empty tubes, nothing fixes the slot count.");
    }
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|row| row.unwrap_or_else(|| vec![None; slot_count]))
        .collect();
    debug!("Parsed {} tubes of {} slots.", rows.len(), slot_count);
    Ok(PuzzleState::new(rows)?)
}

pub fn load_puzzle(path: impl AsRef<Path>) -> Result<PuzzleState, PuzzleFileError> {
    let path = path.as_ref();
    debug!("Loading puzzle from {}", path.display());
    let text = fs::read_to_string(path)?;
    parse_puzzle(&text)
}
