//! JSONL (JSON Lines) storage.
//!
//! The match corpus and the card reference table are stored as JSONL, one
//! record per line. Lines that fail to parse are logged and skipped so one
//! bad record never blocks a build.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::{MatchId, MatchResult};
use crate::reference::{CardRecord, CardTable};

/// JSONL files under the corpus directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFile {
    Matches,
    Cards,
}

impl CorpusFile {
    /// Get the filename for this corpus file.
    pub fn filename(&self) -> &'static str {
        match self {
            CorpusFile::Matches => "matches.jsonl",
            CorpusFile::Cards => "cards.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a corpus file.
    pub fn for_corpus(config: &StorageConfig, file: CorpusFile) -> Self {
        Self::new(config.corpus_dir().join(file.filename()))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append multiple records to the file.
    pub fn append_batch(&self, records: &[T]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }

        writer.flush()?;
        info!("Appended {} records to {:?}", records.len(), self.path);

        Ok(records.len())
    }

}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a corpus file.
    pub fn for_corpus(config: &StorageConfig, file: CorpusFile) -> Self {
        Self::new(config.corpus_dir().join(file.filename()))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all records from the file. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        index + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

/// Read the match corpus.
pub fn load_matches(config: &StorageConfig) -> Result<Vec<MatchResult>, StorageError> {
    JsonlReader::for_corpus(config, CorpusFile::Matches).read_all()
}

/// Append matches to the corpus.
pub fn append_matches(
    config: &StorageConfig,
    matches: &[MatchResult],
) -> Result<usize, StorageError> {
    JsonlWriter::for_corpus(config, CorpusFile::Matches).append_batch(matches)
}

/// Import a JSONL file of matches into the corpus.
///
/// Matches whose id is already in the corpus, or repeated within the file,
/// are skipped. Returns the number appended.
pub fn import_matches(config: &StorageConfig, source: &Path) -> Result<usize, StorageError> {
    if !source.exists() {
        return Err(StorageError::PathNotFound(source.to_path_buf()));
    }

    let incoming: Vec<MatchResult> = JsonlReader::new(source.to_path_buf()).read_all()?;
    let mut seen: HashSet<MatchId> = load_matches(config)?.into_iter().map(|m| m.id).collect();
    let fresh: Vec<MatchResult> = incoming
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect();

    info!("Importing {} new matches from {:?}", fresh.len(), source);
    append_matches(config, &fresh)
}

/// Read the set to rotation-block mapping. A missing file means no blocks.
pub fn load_rotation(config: &StorageConfig) -> Result<HashMap<String, String>, StorageError> {
    let path = config.rotation_path();
    if !path.exists() {
        warn!("No rotation file at {:?}, every set is unblocked", path);
        return Ok(HashMap::new());
    }
    let contents = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load the card reference table and rotation blocks.
pub fn load_reference(config: &StorageConfig) -> Result<CardTable, StorageError> {
    let cards: Vec<CardRecord> = JsonlReader::for_corpus(config, CorpusFile::Cards).read_all()?;
    let rotation = load_rotation(config)?;
    info!(
        "Loaded {} reference cards and {} rotation entries",
        cards.len(),
        rotation.len()
    );
    Ok(CardTable::new(cards, rotation))
}
