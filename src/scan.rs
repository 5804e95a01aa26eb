//! Scan orchestration: walk a path, hash every file, assemble a store.
//!
//! Per-file failures (unreadable, over the size limit) are logged and
//! skipped; the scan only fails as a whole when nothing could be hashed.
//! Files are hashed in parallel and records sorted by identifier, so the
//! serialized output is deterministic regardless of worker scheduling.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::ctph::CtphEngine;
use crate::extract;
use crate::db::{AlgorithmTag, Digest, HashDatabase, HashRecord, HashStore};
use crate::error::{Result, TbtError};
use crate::simhash::SimhashEngine;

/// Which engines a scan runs. `All` is the default and produces one
/// homogeneous database section per algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Ctph,
    Simhash,
}

impl Selection {
    fn wants_ctph(self) -> bool {
        matches!(self, Selection::All | Selection::Ctph)
    }

    fn wants_simhash(self) -> bool {
        matches!(self, Selection::All | Selection::Simhash)
    }
}

/// Digests computed for one file.
struct FileDigests {
    identifier: String,
    ctph: Option<String>,
    simhash: Option<crate::simhash::SimhashDigest>,
}

/// Walks a target path and assembles a [`HashStore`].
#[derive(Debug, Clone)]
pub struct ScanOrchestrator {
    cfg: EngineConfig,
    ctph: CtphEngine,
    simhash: SimhashEngine,
}

impl ScanOrchestrator {
    pub fn new(cfg: EngineConfig) -> Self {
        let ctph = CtphEngine::new(cfg.ctph.clone());
        let simhash = SimhashEngine::new(cfg.simhash.clone());
        Self { cfg, ctph, simhash }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Recursively hashes every regular file under `root` (or `root`
    /// itself if it is a file) with the selected engines.
    pub fn scan(&self, root: &Path, selection: Selection) -> Result<HashStore> {
        let files = self.candidate_files(root)?;
        if files.is_empty() {
            return Err(TbtError::EmptyScan {
                path: root.display().to_string(),
            });
        }
        debug!(root = %root.display(), candidates = files.len(), "scanning");

        let digests: Vec<FileDigests> = files
            .par_iter()
            .filter_map(|path| match self.hash_file(path, selection) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping file");
                    None
                }
            })
            .collect();

        if digests.is_empty() {
            return Err(TbtError::EmptyScan {
                path: root.display().to_string(),
            });
        }

        self.assemble(digests, selection)
    }

    /// Enumerates regular files under `root`, sorted for determinism.
    /// Walk errors below the root are per-file and non-fatal; a missing
    /// root is fatal.
    fn candidate_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        // Surface a missing or unreadable root as a plain I/O error
        fs::metadata(root)?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Reads one file (bounded by `max_file_size`) and runs the selected
    /// engines over its hashable bytes (section content for ELF inputs,
    /// the raw file otherwise).
    fn hash_file(&self, path: &Path, selection: Selection) -> Result<FileDigests> {
        let len = fs::metadata(path)?.len();
        if len > self.cfg.io.max_file_size {
            return Err(TbtError::Io(std::io::Error::other(format!(
                "{} bytes exceeds limit of {}",
                len, self.cfg.io.max_file_size
            ))));
        }
        let raw = fs::read(path)?;
        let data = extract::hashable_bytes(&raw);

        Ok(FileDigests {
            identifier: path.display().to_string(),
            ctph: selection.wants_ctph().then(|| self.ctph.hash(&data)),
            simhash: selection.wants_simhash().then(|| self.simhash.hash(&data)),
        })
    }

    /// Builds the store: one sorted, homogeneous section per engine.
    fn assemble(&self, digests: Vec<FileDigests>, selection: Selection) -> Result<HashStore> {
        let mut store = HashStore::new();

        if selection.wants_ctph() {
            let mut db = HashDatabase::new(AlgorithmTag::Ctph);
            for d in &digests {
                if let Some(sig) = &d.ctph {
                    db.push(HashRecord::new(&*d.identifier, Digest::Ctph(sig.clone())))?;
                }
            }
            db.sort_by_identifier();
            store.push_database(db);
        }

        if selection.wants_simhash() {
            let mut db = HashDatabase::new(AlgorithmTag::Simhash(self.simhash.width()));
            for d in digests {
                if let Some(vector) = d.simhash {
                    db.push(HashRecord::new(d.identifier, Digest::Simhash(vector)))?;
                }
            }
            db.sort_by_identifier();
            store.push_database(db);
        }

        Ok(store)
    }
}
