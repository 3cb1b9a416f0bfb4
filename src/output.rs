//! Output writer.
//!
//! The full index goes to `full_solution.json`. Large indexes are also split
//! into `chunk_<n>.json` files plus `metadata.json`, so a consumer can fetch
//! slices independently. Files are written through a temporary sibling and
//! renamed into place; `metadata.json` is written last and removed first,
//! so a directory without it never passes for a complete index.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::error::{Result, SolveError};
use crate::record::{PublicRecord, SolutionIndex, SolutionRecord};

pub const FULL_INDEX_FILE: &str = "full_solution.json";
pub const METADATA_FILE: &str = "metadata.json";

pub fn chunk_file_name(n: usize) -> String {
    format!("chunk_{n}.json")
}

fn is_chunk_file(name: &str) -> bool {
    name.strip_prefix("chunk_")
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Describes a chunked index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub total_chunks: usize,
    pub total_items: usize,
    pub chunk_size: usize,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// Hex SHA-256 over the compact JSON of every public record, in key order.
    pub digest: String,
}

/// What a call to [`write_outputs`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub full_index: Option<PathBuf>,
    pub chunks: Option<ChunkMetadata>,
    pub sqlite_rows: Option<usize>,
}

/// Writes everything `config` asks for.
pub fn write_outputs(index: &SolutionIndex, config: &OutputConfig) -> Result<WriteSummary> {
    fs::create_dir_all(&config.dir).map_err(SolveError::io(&config.dir))?;
    let mut summary = WriteSummary::default();

    if config.full_index {
        let path = config.dir.join(FULL_INDEX_FILE);
        write_full(index, &path)?;
        summary.full_index = Some(path);
    }
    if config.wants_chunks(index.len()) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        summary.chunks = Some(write_chunks(index, &config.dir, config.chunk_size, &timestamp)?);
    } else {
        // Chunks from an earlier run would no longer match the full index.
        clear_chunked_output(&config.dir)?;
    }
    if let Some(db) = &config.sqlite {
        summary.sqlite_rows = Some(write_sqlite(index, db)?);
    }
    Ok(summary)
}

/// `{"<key>": record, ...}` over a slice whose first element has key `first_key`.
struct KeyedMap<'a, T> {
    first_key: u64,
    items: &'a [T],
}

impl<T: Serialize> Serialize for KeyedMap<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for (key, item) in (self.first_key..).zip(self.items) {
            map.serialize_entry(&key, item)?;
        }
        map.end()
    }
}

/// Writes the full index as one JSON document.
pub fn write_full(index: &SolutionIndex, path: &Path) -> Result<()> {
    let doc = KeyedMap {
        first_key: 0,
        items: &index.records,
    };
    write_atomically(path, |w| Ok(serde_json::to_writer_pretty(w, &doc)?))?;
    info!(event = "full_index_written", path = %path.display(), records = index.len());
    Ok(())
}

/// Splits the index into `chunk_size`-record chunks and writes them with
/// their metadata. Returns the metadata written.
pub fn write_chunks(
    index: &SolutionIndex,
    dir: &Path,
    chunk_size: usize,
    timestamp: &str,
) -> Result<ChunkMetadata> {
    if chunk_size == 0 {
        return Err(crate::config::ConfigError::Invalid("chunk_size must be positive".into()).into());
    }
    fs::create_dir_all(dir).map_err(SolveError::io(dir))?;
    clear_chunked_output(dir)?;

    let mut hasher = Sha256::new();
    let mut total_chunks = 0;
    for (n, slice) in index.records.chunks(chunk_size).enumerate() {
        let public: Vec<PublicRecord> = slice.iter().map(SolutionRecord::public).collect();
        for record in &public {
            hasher.update(serde_json::to_vec(record)?);
        }
        let doc = KeyedMap {
            first_key: (n * chunk_size) as u64,
            items: &public,
        };
        let path = dir.join(chunk_file_name(n));
        write_atomically(&path, |w| Ok(serde_json::to_writer(w, &doc)?))?;
        debug!(chunk = n, records = public.len(), "chunk written");
        total_chunks += 1;
    }

    let metadata = ChunkMetadata {
        total_chunks,
        total_items: index.len(),
        chunk_size,
        timestamp: timestamp.to_string(),
        digest: hex::encode(hasher.finalize()),
    };
    write_atomically(&dir.join(METADATA_FILE), |w| {
        Ok(serde_json::to_writer_pretty(w, &metadata)?)
    })?;
    info!(
        event = "chunks_written",
        chunks = metadata.total_chunks,
        records = metadata.total_items,
        chunk_size
    );
    Ok(metadata)
}

/// Removes the metadata file and every chunk left by an earlier run.
fn clear_chunked_output(dir: &Path) -> Result<()> {
    let metadata = dir.join(METADATA_FILE);
    if metadata.exists() {
        fs::remove_file(&metadata).map_err(SolveError::io(&metadata))?;
    }
    for entry in fs::read_dir(dir).map_err(SolveError::io(dir))? {
        let path = entry.map_err(SolveError::io(dir))?.path();
        let stale = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_chunk_file);
        if stale {
            fs::remove_file(&path).map_err(SolveError::io(&path))?;
        }
    }
    Ok(())
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> Result<()>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let file = fs::File::create(&tmp).map_err(SolveError::io(&tmp))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(SolveError::io(&tmp))?;
    drop(writer);
    fs::rename(&tmp, path).map_err(SolveError::io(path))
}

/// Checks a chunked index on disk against its metadata. Returns the metadata
/// when every chunk is present, keys are contiguous, counts and digest match,
/// and no quintet appears twice; otherwise [`SolveError::InvalidChunks`] with
/// the first problem found.
pub fn verify_chunks(dir: &Path) -> Result<ChunkMetadata> {
    check_chunks(dir).map_err(|reason| SolveError::InvalidChunks {
        dir: dir.to_path_buf(),
        reason,
    })
}

fn check_chunks(dir: &Path) -> std::result::Result<ChunkMetadata, String> {
    let read = |path: &Path| {
        fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))
    };
    let metadata: ChunkMetadata = serde_json::from_str(&read(&dir.join(METADATA_FILE))?)
        .map_err(|e| format!("{METADATA_FILE}: {e}"))?;
    if metadata.chunk_size == 0 {
        return Err("chunk_size is 0".into());
    }
    let expected_chunks = metadata.total_items.div_ceil(metadata.chunk_size);
    if metadata.total_chunks != expected_chunks {
        return Err(format!(
            "{} items in chunks of {} need {expected_chunks} chunks, metadata says {}",
            metadata.total_items, metadata.chunk_size, metadata.total_chunks
        ));
    }

    let on_disk = fs::read_dir(dir)
        .map_err(|e| format!("{}: {e}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_chunk_file))
        .count();
    if on_disk != metadata.total_chunks {
        return Err(format!(
            "{on_disk} chunk files on disk, metadata says {}",
            metadata.total_chunks
        ));
    }

    let mut hasher = Sha256::new();
    let mut seen = std::collections::HashSet::new();
    let mut next_key = 0u64;
    for n in 0..metadata.total_chunks {
        let name = chunk_file_name(n);
        let chunk: std::collections::BTreeMap<u64, PublicRecord> =
            serde_json::from_str(&read(&dir.join(&name))?).map_err(|e| format!("{name}: {e}"))?;
        let last = n + 1 == metadata.total_chunks;
        if chunk.is_empty() || chunk.len() > metadata.chunk_size {
            return Err(format!("{name} holds {} records", chunk.len()));
        }
        if !last && chunk.len() != metadata.chunk_size {
            return Err(format!("{name} is short: {} records", chunk.len()));
        }
        for (key, record) in &chunk {
            if *key != next_key {
                return Err(format!("{name}: expected key {next_key}, found {key}"));
            }
            next_key += 1;
            let quad = record.quad;
            if quad.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("key {key}: quad {quad:?} is not four distinct ascending cards"));
            }
            for &anchor in &record.anchors {
                if quad.contains(&anchor) {
                    return Err(format!("key {key}: anchor {anchor} is inside its quad"));
                }
                if !seen.insert(crate::dedup::canonical_quintet(&quad, anchor)) {
                    return Err(format!("key {key}: quintet with anchor {anchor} repeats"));
                }
            }
            hasher.update(serde_json::to_vec(record).map_err(|e| e.to_string())?);
        }
    }
    if next_key != metadata.total_items as u64 {
        return Err(format!(
            "chunks hold {next_key} records, metadata says {}",
            metadata.total_items
        ));
    }
    let digest = hex::encode(hasher.finalize());
    if digest != metadata.digest {
        return Err(format!("digest mismatch: computed {digest}"));
    }
    Ok(metadata)
}

/// Hex SHA-256 identifying a record's content.
pub fn record_hash(record: &SolutionRecord) -> String {
    let join = |ids: &[u32]| ids.iter().map(u32::to_string).collect::<Vec<_>>().join("|");
    let mut hasher = Sha256::new();
    hasher.update(record.category_pair.to_string().as_bytes());
    hasher.update(record.trait_pair.to_string().as_bytes());
    hasher.update(join(&record.quad).as_bytes());
    hasher.update(join(&record.anchors).as_bytes());
    hex::encode(hasher.finalize())
}

/// Replaces the `solutions` table of the database at `path` with the index.
pub fn write_sqlite(index: &SolutionIndex, path: &Path) -> Result<usize> {
    let mut conn = rusqlite::Connection::open(path)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.busy_timeout(std::time::Duration::from_millis(60_000))?;

    let tx = conn.transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS solutions (
            id INTEGER PRIMARY KEY,
            quad TEXT NOT NULL,
            anchors TEXT NOT NULL,
            category_pair TEXT NOT NULL,
            trait_pair TEXT NOT NULL,
            record_hash TEXT NOT NULL
        );
        DELETE FROM solutions;",
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO solutions (id, quad, anchors, category_pair, trait_pair, record_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (key, record) in index.iter() {
            stmt.execute((
                key as i64,
                serde_json::to_string(&record.quad)?,
                serde_json::to_string(&record.anchors)?,
                record.category_pair.to_string(),
                record.trait_pair.to_string(),
                record_hash(record),
            ))?;
        }
    }
    tx.commit()?;
    info!(event = "sqlite_written", path = %path.display(), rows = index.len());
    Ok(index.len())
}
