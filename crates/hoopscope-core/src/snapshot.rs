// Dataset snapshot and its tabular on-disk form.
//
// A snapshot is the single persisted artifact of a collection run. It is
// written as one CSV file, one row per record, with the run metadata repeated
// on every row. Writes go to a sibling temp file that is renamed over the
// target, so a concurrent reader sees either the previous file or the new
// one in full.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::record::{CanonicalRecord, Scope, Season, SourceKind};

// ---------------------------------------------------------------------------
// Snapshot value
// ---------------------------------------------------------------------------

/// Ordered records from one collection run. Every record came from `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSnapshot {
    pub collected_at: DateTime<Utc>,
    pub source: SourceKind,
    pub scope: Scope,
    pub season: Season,
    pub records: Vec<CanonicalRecord>,
}

impl DatasetSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that fall inside `scope`, in snapshot order.
    pub fn in_scope<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a CanonicalRecord> {
        self.records.iter().filter(move |r| scope.matches(r))
    }

    /// First record whose name contains `fragment`, case-insensitively.
    /// An exact (case-insensitive) name match wins over a substring match.
    pub fn find_player(&self, fragment: &str) -> Option<&CanonicalRecord> {
        let needle = fragment.trim();
        if needle.is_empty() {
            return None;
        }
        let lowered = needle.to_lowercase();
        self.records
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(needle))
            .or_else(|| {
                self.records
                    .iter()
                    .find(|r| r.name.to_lowercase().contains(&lowered))
            })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("refusing to persist an empty snapshot")]
    Empty,

    #[error("snapshot {path} mixes run metadata across rows (row {row})")]
    Inconsistent { path: PathBuf, row: usize },

    #[error("snapshot {path} has an unreadable scope `{scope}`")]
    BadScope { path: PathBuf, scope: String },
}

// ---------------------------------------------------------------------------
// CSV row shape (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    source: SourceKind,
    scope: String,
    collected_at: DateTime<Utc>,
    name: String,
    team: String,
    season: Season,
    age: Option<f64>,
    games_played: f64,
    minutes: f64,
    points: f64,
    rebounds: f64,
    defensive_rebounds: f64,
    assists: f64,
    steals: f64,
    blocks: f64,
    turnovers: f64,
    fouls: f64,
    fg_pct: Option<f64>,
    fg3_pct: Option<f64>,
    ft_pct: Option<f64>,
}

impl SnapshotRow {
    fn from_record(snapshot: &DatasetSnapshot, r: &CanonicalRecord) -> Self {
        Self {
            source: snapshot.source,
            scope: snapshot.scope.to_string(),
            collected_at: snapshot.collected_at,
            name: r.name.clone(),
            team: r.team.clone(),
            season: r.season.clone(),
            age: r.age,
            games_played: r.games_played,
            minutes: r.minutes,
            points: r.points,
            rebounds: r.rebounds,
            defensive_rebounds: r.defensive_rebounds,
            assists: r.assists,
            steals: r.steals,
            blocks: r.blocks,
            turnovers: r.turnovers,
            fouls: r.fouls,
            fg_pct: r.fg_pct,
            fg3_pct: r.fg3_pct,
            ft_pct: r.ft_pct,
        }
    }

    fn into_record(self) -> CanonicalRecord {
        CanonicalRecord {
            name: self.name,
            team: self.team,
            season: self.season,
            age: self.age,
            games_played: self.games_played,
            minutes: self.minutes,
            points: self.points,
            rebounds: self.rebounds,
            defensive_rebounds: self.defensive_rebounds,
            assists: self.assists,
            steals: self.steals,
            blocks: self.blocks,
            turnovers: self.turnovers,
            fouls: self.fouls,
            fg_pct: self.fg_pct,
            fg3_pct: self.fg3_pct,
            ft_pct: self.ft_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-backed snapshot persistence with atomic replace.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the on-disk snapshot with `snapshot`.
    pub fn write(&self, snapshot: &DatasetSnapshot) -> Result<(), SnapshotError> {
        if snapshot.is_empty() {
            return Err(SnapshotError::Empty);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(parent, e))?;
        }

        let tmp = self.tmp_path();
        let result = self.write_tmp(&tmp, snapshot).and_then(|()| {
            fs::rename(&tmp, &self.path).map_err(|e| self.io_err(&self.path, e))
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        debug!(
            path = %self.path.display(),
            records = snapshot.len(),
            "snapshot replaced"
        );
        Ok(())
    }

    /// Read the current snapshot. Returns `Ok(None)` if no snapshot file exists.
    pub fn read(&self) -> Result<Option<DatasetSnapshot>, SnapshotError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(&self.path, e)),
        };
        self.read_from(file)
    }

    fn read_from<R: Read>(&self, rdr: R) -> Result<Option<DatasetSnapshot>, SnapshotError> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut header: Option<(SourceKind, String, DateTime<Utc>)> = None;
        let mut records = Vec::new();

        for (idx, row) in reader.deserialize::<SnapshotRow>().enumerate() {
            let row = row.map_err(|e| SnapshotError::Csv {
                path: self.path.clone(),
                source: e,
            })?;
            match &header {
                None => header = Some((row.source, row.scope.clone(), row.collected_at)),
                Some((source, scope, at)) => {
                    if *source != row.source || *scope != row.scope || *at != row.collected_at {
                        return Err(SnapshotError::Inconsistent {
                            path: self.path.clone(),
                            row: idx + 1,
                        });
                    }
                }
            }
            records.push(row.into_record());
        }

        let Some((source, scope_str, collected_at)) = header else {
            return Ok(None);
        };
        let scope: Scope = scope_str.parse().map_err(|_| SnapshotError::BadScope {
            path: self.path.clone(),
            scope: scope_str.clone(),
        })?;
        let season = records[0].season.clone();

        Ok(Some(DatasetSnapshot {
            collected_at,
            source,
            scope,
            season,
            records,
        }))
    }

    fn write_tmp(&self, tmp: &Path, snapshot: &DatasetSnapshot) -> Result<(), SnapshotError> {
        let file = fs::File::create(tmp).map_err(|e| self.io_err(tmp, e))?;
        let mut writer = csv::Writer::from_writer(file);
        for record in &snapshot.records {
            writer
                .serialize(SnapshotRow::from_record(snapshot, record))
                .map_err(|e| SnapshotError::Csv {
                    path: tmp.to_path_buf(),
                    source: e,
                })?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| self.io_err(tmp, e.into_error()))?;
        file.sync_all().map_err(|e| self.io_err(tmp, e))
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.csv".to_string());
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!(".{file_name}.{}.{n}.tmp", std::process::id()))
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn season() -> Season {
        "2023-24".parse().unwrap()
    }

    fn record(name: &str, team: &str, pts: f64) -> CanonicalRecord {
        let mut r = CanonicalRecord::empty(name, team, season());
        r.points = pts;
        r.minutes = 33.3;
        r.fg_pct = Some(0.512);
        r
    }

    fn snapshot(records: Vec<CanonicalRecord>) -> DatasetSnapshot {
        DatasetSnapshot {
            collected_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            source: SourceKind::Secondary,
            scope: Scope::League,
            season: season(),
            records,
        }
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope.csv"));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn write_then_read_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data/snapshot.csv"));
        let mut with_missing = record("Jalen Green", "HOU", 19.6);
        with_missing.fg3_pct = None;
        with_missing.age = Some(22.0);
        let snap = snapshot(vec![record("Nikola Jokic", "DEN", 26.4), with_missing]);

        store.write(&snap).unwrap();
        let back = store.read().unwrap().expect("snapshot should exist");
        assert_eq!(back, snap);
    }

    #[test]
    fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.csv"));
        store
            .write(&snapshot(vec![record("A", "AAA", 1.0), record("B", "BBB", 2.0)]))
            .unwrap();
        store.write(&snapshot(vec![record("C", "CCC", 3.0)])).unwrap();

        let back = store.read().unwrap().unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.records[0].name, "C");
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.csv"));
        store.write(&snapshot(vec![record("A", "AAA", 1.0)])).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["snapshot.csv".to_string()]);
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.csv"));
        assert!(matches!(store.write(&snapshot(vec![])), Err(SnapshotError::Empty)));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn header_only_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        fs::write(&path, "source,scope,collected_at,name\n").unwrap();
        assert!(SnapshotStore::new(path).read().unwrap().is_none());
    }

    #[test]
    fn find_player_prefers_exact_match() {
        let snap = snapshot(vec![
            record("Jalen Williams", "OKC", 19.1),
            record("Jalen Green", "HOU", 19.6),
        ]);
        assert_eq!(snap.find_player("jalen green").unwrap().team, "HOU");
        assert_eq!(snap.find_player("jalen").unwrap().team, "OKC");
        assert!(snap.find_player("  ").is_none());
        assert!(snap.find_player("nobody").is_none());
    }
}
