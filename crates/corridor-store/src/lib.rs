//! Feature-pair records and their persistent store.
//!
//! The record boundary of the workspace: an ordered sequence of
//! [`FeaturePair`]s is pulled from a store once per run, and one
//! [`BenefitResult`] per pair is written back, keyed by id. The bundled
//! implementation is a JSON-lines file ([`JsonlStore`]); anything that can
//! hand out ordered pairs and accept row updates can implement
//! [`PairStore`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One unit of work: an identifier and two world-space endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturePair {
    pub id: String,
    pub ax: f64,
    pub ay: f64,
    pub bx: f64,
    pub by: f64,
}

/// The evaluation outcome persisted for one feature pair.
///
/// All three cost fields are `None` when the endpoints have no existing
/// route, persisted as JSON nulls ("no benefit computed").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenefitResult {
    pub id: String,
    pub existing: Option<f64>,
    pub improved: Option<f64>,
    pub benefit: Option<f64>,
}

/// The stored form of a result, without the redundant id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct StoredBenefit {
    existing: Option<f64>,
    improved: Option<f64>,
    benefit: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Record {
    #[serde(flatten)]
    pair: FeaturePair,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<StoredBenefit>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal errors opening or loading a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Non-fatal failure updating a single row; the batch continues.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("no feature pair with id {0:?}")]
    UnknownId(String),
    #[error("failed to persist update for {id:?}: {source}")]
    Write {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// PairStore
// ---------------------------------------------------------------------------

/// A source of ordered feature pairs that accepts per-row result updates.
pub trait PairStore {
    /// The pairs to process, ordered by first endpoint for cache
    /// locality, with any configured filter already applied.
    fn pairs(&self) -> Vec<FeaturePair>;

    /// Persist one result, keyed by `result.id`. All-or-nothing per row.
    fn update(&self, result: &BenefitResult) -> Result<(), RowError>;
}

type PairFilter = Box<dyn Fn(&FeaturePair) -> bool + Send + Sync>;

/// A [`PairStore`] backed by a JSON-lines file, one record per line.
///
/// Records are sorted by first endpoint (then id) at load time. Every
/// update rewrites the file through a temporary sibling and an atomic
/// rename, so a row update either lands completely or not at all.
pub struct JsonlStore {
    path: PathBuf,
    records: Mutex<Vec<Record>>,
    index: HashMap<String, usize>,
    filter: Option<PairFilter>,
}

impl std::fmt::Debug for JsonlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStore")
            .field("path", &self.path)
            .field("records", &self.records)
            .field("index", &self.index)
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .finish()
    }
}

impl JsonlStore {
    /// Load a store from `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut records: Vec<Record> = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                line: lineno + 1,
                source,
            })?;
            records.push(record);
        }

        // Order by first endpoint so consecutive pairs tend to share a
        // source cell.
        records.sort_by(|a, b| {
            a.pair
                .ax
                .total_cmp(&b.pair.ax)
                .then_with(|| a.pair.ay.total_cmp(&b.pair.ay))
                .then_with(|| a.pair.id.cmp(&b.pair.id))
        });

        // First occurrence wins for duplicate ids.
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.pair.id.clone()).or_insert(i);
        }

        debug!("loaded {} feature pairs from {}", records.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
            index,
            filter: None,
        })
    }

    /// Restrict `pairs()` to records matching `filter`. Updates remain
    /// accepted for every record in the file.
    pub fn with_filter(mut self, filter: impl Fn(&FeaturePair) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Stored result for `id`, if any. Mostly useful in tests.
    pub fn result(&self, id: &str) -> Option<BenefitResult> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let i = *self.index.get(id)?;
        let stored = records[i].result.as_ref()?;
        Some(BenefitResult {
            id: id.to_string(),
            existing: stored.existing,
            improved: stored.improved,
            benefit: stored.benefit,
        })
    }

    fn rewrite(&self, records: &[Record]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        for record in records {
            serde_json::to_writer(&mut tmp, record)?;
            tmp.write_all(b"\n")?;
        }
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PairStore for JsonlStore {
    fn pairs(&self) -> Vec<FeaturePair> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .map(|r| r.pair.clone())
            .filter(|p| self.filter.as_ref().is_none_or(|f| f(p)))
            .collect()
    }

    fn update(&self, result: &BenefitResult) -> Result<(), RowError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let Some(&i) = self.index.get(&result.id) else {
            return Err(RowError::UnknownId(result.id.clone()));
        };
        let previous = records[i].result.take();
        records[i].result = Some(StoredBenefit {
            existing: result.existing,
            improved: result.improved,
            benefit: result.benefit,
        });
        if let Err(source) = self.rewrite(&records) {
            // Roll the in-memory row back so memory matches the file.
            records[i].result = previous;
            return Err(RowError::Write {
                id: result.id.clone(),
                source,
            });
        }
        Ok(())
    }
}
