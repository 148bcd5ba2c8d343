//! SQLite vector index with brute-force cosine search
//!
//! Entries are append-only: there is no update or delete path, and the same
//! chunk ingested twice is stored twice.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{IndexEntry, Metadata};

/// Database file created inside the persistence directory
pub const INDEX_FILENAME: &str = "index.sqlite3";

const DIMENSIONS_KEY: &str = "dimensions";

/// On-disk vector index
pub struct VectorIndex {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl VectorIndex {
    /// Open (or create) the index stored under `persist_directory`
    pub fn open<P: AsRef<Path>>(persist_directory: P) -> Result<Self> {
        let dir = persist_directory.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::index(format!("Cannot create index directory {}: {}", dir.display(), e))
        })?;

        let path = dir.join(INDEX_FILENAME);
        let conn = Connection::open(&path)
            .map_err(|e| Error::index(format!("Failed to open {}: {}", path.display(), e)))?;

        let index = Self {
            conn: Mutex::new(conn),
            path,
        };

        index.migrate()?;
        Ok(index)
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        };
        index.migrate()?;
        Ok(index)
    }

    /// Run schema migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        // FULL sync: a committed upsert survives power loss
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=FULL;
        "#,
        )
        .map_err(|e| Error::index(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collection_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                vector BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )
        .map_err(|e| Error::index(format!("Failed to create schema: {}", e)))?;

        Ok(())
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimensionality recorded on first write, if any
    pub fn dimensions(&self) -> Result<Option<usize>> {
        let conn = self.conn.lock();
        read_dimensions(&conn)
    }

    /// Append entries in a single transaction
    pub fn upsert(&self, entries: &[IndexEntry]) -> Result<usize> {
        let Some(first) = entries.first() else {
            return Ok(0);
        };
        let dims = first.embedding.len();
        if dims == 0 {
            return Err(Error::index("Cannot index an empty embedding"));
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dims) {
            return Err(Error::index(format!(
                "Mixed embedding sizes in one write: {} and {}",
                dims,
                bad.embedding.len()
            )));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        match read_dimensions(&tx)? {
            Some(existing) if existing != dims => {
                return Err(Error::index(format!(
                    "Embedding has {} dimensions but the index holds {}-dimensional vectors",
                    dims, existing
                )));
            }
            Some(_) => {}
            None => {
                tx.execute(
                    "INSERT INTO collection_meta (key, value) VALUES (?1, ?2)",
                    params![DIMENSIONS_KEY, dims.to_string()],
                )?;
            }
        }

        let created_at = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO embeddings (id, content, metadata, vector, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.id.to_string(),
                    entry.content,
                    serde_json::to_string(&entry.metadata)?,
                    encode_vector(&entry.embedding),
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(entries.len())
    }

    /// Up to `top_k` entries nearest to `query` by cosine distance
    ///
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(IndexEntry, f32)>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        match read_dimensions(&conn)? {
            None => return Ok(Vec::new()),
            Some(dims) if dims != query.len() => {
                return Err(Error::index(format!(
                    "Query has {} dimensions but the index holds {}-dimensional vectors",
                    query.len(),
                    dims
                )));
            }
            Some(_) => {}
        }

        // Max-heap on (distance, seq): the worst kept candidate sits on top
        let mut nearest = BinaryHeap::with_capacity(top_k + 1);
        let mut stmt = conn.prepare("SELECT seq, vector FROM embeddings ORDER BY seq")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let seq: i64 = row.get(0)?;
            let vector = decode_vector(&row.get::<_, Vec<u8>>(1)?)?;
            nearest.push(Candidate {
                distance: cosine_distance(query, &vector),
                seq,
            });
            if nearest.len() > top_k {
                nearest.pop();
            }
        }

        let mut fetch = conn.prepare(
            "SELECT id, content, metadata, vector FROM embeddings WHERE seq = ?1",
        )?;
        nearest
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| -> Result<(IndexEntry, f32)> {
                let (id, content, metadata, vector) =
                    fetch.query_row(params![candidate.seq], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Vec<u8>>(3)?,
                        ))
                    })?;
                let entry = IndexEntry {
                    id: Uuid::parse_str(&id).map_err(|e| {
                        Error::index(format!("Corrupt entry id '{}': {}", id, e))
                    })?,
                    content,
                    metadata: serde_json::from_str::<Metadata>(&metadata).map_err(|e| {
                        Error::index(format!("Corrupt metadata for {}: {}", id, e))
                    })?,
                    embedding: decode_vector(&vector)?,
                };
                Ok((entry, candidate.distance))
            })
            .collect()
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// A scored row awaiting its full fetch, ordered by distance then insertion
struct Candidate {
    distance: f32,
    seq: i64,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

fn read_dimensions(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM collection_meta WHERE key = ?1",
            params![DIMENSIONS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| Error::index(format!("Corrupt dimension record '{}': {}", v, e)))
        })
        .transpose()
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::index(format!("Corrupt vector blob of {} bytes", bytes.len())));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// 1 - cosine similarity; zero vectors are treated as orthogonal
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn entry(text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: Uuid::new_v4(),
            content: text.to_string(),
            metadata: Segment::new("", "test.txt", 0).metadata,
            embedding,
        }
    }

    #[test]
    fn test_upsert_and_search() {
        let index = VectorIndex::in_memory().unwrap();
        let written = index
            .upsert(&[
                entry("east", vec![1.0, 0.0]),
                entry("north", vec![0.0, 1.0]),
                entry("north-east", vec![1.0, 1.0]),
            ])
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(index.len().unwrap(), 3);
        assert_eq!(index.dimensions().unwrap(), Some(2));

        let results = index.search(&[0.9, 0.1], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "east");
        assert_eq!(results[1].0.content, "north-east");
        assert!(results[0].1 <= results[1].1);
        assert_eq!(results[0].0.metadata["source"], "test.txt");
    }

    #[test]
    fn test_search_returns_fewer_than_k() {
        let index = VectorIndex::in_memory().unwrap();
        index.upsert(&[entry("only", vec![1.0, 0.0])]).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 4).unwrap().len(), 1);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::in_memory().unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 4).unwrap().is_empty());
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let index = VectorIndex::in_memory().unwrap();
        index.upsert(&[entry("same", vec![1.0, 0.0])]).unwrap();
        index.upsert(&[entry("same", vec![1.0, 0.0])]).unwrap();

        let results = index.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(e, _)| e.content == "same"));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::in_memory().unwrap();
        index
            .upsert(&[
                entry("first", vec![0.0, 1.0]),
                entry("second", vec![0.0, 2.0]),
                entry("third", vec![0.0, 3.0]),
            ])
            .unwrap();

        let results = index.search(&[0.0, 1.0], 3).unwrap();
        let order: Vec<&str> = results.iter().map(|(e, _)| e.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_k_over_many_rows() {
        let index = VectorIndex::in_memory().unwrap();
        let mut entries: Vec<IndexEntry> = (0..50)
            .map(|i| entry(&format!("tie-{}", i), vec![0.0, 1.0]))
            .collect();
        entries.push(entry("exact", vec![1.0, 0.0]));
        entries.push(entry("close", vec![1.0, 0.2]));
        index.upsert(&entries).unwrap();

        let results = index.search(&[1.0, 0.0], 4).unwrap();
        let order: Vec<&str> = results.iter().map(|(e, _)| e.content.as_str()).collect();
        assert_eq!(order, vec!["exact", "close", "tie-0", "tie-1"]);
        assert!(results.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(results[0].0.embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = VectorIndex::in_memory().unwrap();
        index.upsert(&[entry("a", vec![1.0, 0.0])]).unwrap();

        assert!(matches!(index.upsert(&[entry("b", vec![1.0, 0.0, 0.0])]), Err(Error::Index(_))));
        assert!(matches!(index.search(&[1.0], 4), Err(Error::Index(_))));
        assert!(matches!(
            index.upsert(&[entry("c", vec![1.0, 0.0]), entry("d", vec![1.0])]),
            Err(Error::Index(_))
        ));
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn test_entries_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let persist = dir.path().join("chroma_db");

        {
            let index = VectorIndex::open(&persist).unwrap();
            index.upsert(&[entry("kept", vec![0.5, 0.5])]).unwrap();
        }

        assert!(persist.join(INDEX_FILENAME).exists());
        let reopened = VectorIndex::open(&persist).unwrap();
        let results = reopened.search(&[0.5, 0.5], 4).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.content, "kept");
        assert_eq!(results[0].0.embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn test_corrupt_index_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILENAME), vec![0x42u8; 4096]).unwrap();
        assert!(matches!(VectorIndex::open(dir.path()), Err(Error::Index(_))));
    }

    #[test]
    fn test_inaccessible_directory_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(VectorIndex::open(file.join("nested")), Err(Error::Index(_))));
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
