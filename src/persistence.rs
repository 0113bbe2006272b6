//! Saving and loading the generation history.
//!
//! The history is stored as one JSON document, an array of generations:
//!
//! ```json
//! [
//!   {
//!     "generation": 0,
//!     "grids": [
//!       {
//!         "blocks": [{ "type": 2, "origin": { "x": 0, "y": 0 } }, ...],
//!         "historyIdentifiers": [],
//!         "identifier": "TBBTTBBTTWWTTssTs..s",
//!         "generation": 0
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! Block types are the integer tags from `BlockType::tag`. A single unknown
//! tag fails the whole load.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DecodeError, StoreError};
use crate::grid::Grid;
use crate::pieces::{Block, BlockType};
use crate::solver::GridGeneration;

/// Default location of the history file.
pub const DEFAULT_HISTORY_FILE: &str = "klotski_history.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRecord {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(rename = "type")]
    pub kind: u8,
    pub origin: OriginRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRecord {
    pub blocks: Vec<BlockRecord>,
    pub history_identifiers: Vec<String>,
    pub identifier: String,
    pub generation: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub grids: Vec<GridRecord>,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        let (x, y) = block.origin;
        Self {
            kind: block.kind.tag(),
            origin: OriginRecord { x, y },
        }
    }
}

impl TryFrom<&BlockRecord> for Block {
    type Error = DecodeError;

    fn try_from(record: &BlockRecord) -> Result<Self, Self::Error> {
        let kind = BlockType::try_from(record.kind)?;
        Ok(Block::new(kind, (record.origin.x, record.origin.y)))
    }
}

impl From<&Grid> for GridRecord {
    fn from(grid: &Grid) -> Self {
        Self {
            blocks: grid.blocks().iter().map(BlockRecord::from).collect(),
            history_identifiers: grid.history().to_vec(),
            identifier: grid.identifier().to_string(),
            generation: grid.generation(),
        }
    }
}

impl TryFrom<GridRecord> for Grid {
    type Error = DecodeError;

    fn try_from(record: GridRecord) -> Result<Self, Self::Error> {
        let blocks = record
            .blocks
            .iter()
            .map(Block::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Grid::restore(
            blocks,
            record.history_identifiers,
            record.generation,
            record.identifier,
        ))
    }
}

/// Converts a history into its on-disk records.
pub fn encode_history(history: &[GridGeneration]) -> Vec<GenerationRecord> {
    history
        .iter()
        .map(|generation| GenerationRecord {
            generation: generation.generation,
            grids: generation.grids.iter().map(GridRecord::from).collect(),
        })
        .collect()
}

/// Rebuilds a history from its on-disk records.
pub fn decode_history(records: Vec<GenerationRecord>) -> Result<Vec<GridGeneration>, DecodeError> {
    records
        .into_iter()
        .map(|record| {
            let grids = record
                .grids
                .into_iter()
                .map(Grid::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GridGeneration {
                generation: record.generation,
                grids,
            })
        })
        .collect()
}

/// Writes a history as JSON.
pub fn write_history<W: Write>(writer: W, history: &[GridGeneration]) -> Result<(), StoreError> {
    serde_json::to_writer(writer, &encode_history(history))?;
    Ok(())
}

/// Reads a JSON history.
pub fn read_history<R: Read>(reader: R) -> Result<Vec<GridGeneration>, StoreError> {
    let records: Vec<GenerationRecord> = serde_json::from_reader(reader)?;
    Ok(decode_history(records)?)
}

/// Somewhere a generation history can be loaded from and saved to.
pub trait HistoryStore {
    /// Loads the stored history, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<GridGeneration>>, StoreError>;

    /// Replaces the stored history.
    fn save(&self, history: &[GridGeneration]) -> Result<(), StoreError>;
}

/// A history kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_FILE)
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<GridGeneration>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let history = read_history(BufReader::new(file))?;
        debug!(
            path = %self.path.display(),
            generations = history.len(),
            "loaded history"
        );
        Ok(Some(history))
    }

    fn save(&self, history: &[GridGeneration]) -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        write_history(&mut writer, history)?;
        writer.flush()?;
        debug!(
            path = %self.path.display(),
            generations = history.len(),
            "saved history"
        );
        Ok(())
    }
}
