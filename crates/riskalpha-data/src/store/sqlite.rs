//! SQLite-backed corpus store.

use super::CorpusStore;
use crate::document::Document;
use crate::error::{DataError, Result};
use crate::prices::{PricePoint, PriceSeries};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

const BENCHMARK_KEY: &str = "benchmark";

/// SQLite store for documents and price series.
#[derive(Debug)]
pub struct SqliteCorpus {
    conn: Connection,
}

/// Row counts of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of documents
    pub documents: usize,
    /// Number of distinct entities with price rows (benchmark included)
    pub entities: usize,
    /// Total number of price rows
    pub price_rows: usize,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", s, e)))
}

impl SqliteCorpus {
    /// Open (or create) a store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                entity TEXT NOT NULL,
                date TEXT NOT NULL,
                text TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_entity ON documents(entity)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS prices (
                entity TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL NOT NULL,
                ingested_at TEXT NOT NULL,
                PRIMARY KEY (entity, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert or replace a document.
    pub fn put_document(&self, doc: &Document) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (id, entity, date, text, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                doc.id,
                doc.entity,
                doc.date.to_string(),
                doc.raw_text,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Insert or replace many documents in one transaction.
    pub fn put_documents_batch(&self, docs: &[Document]) -> Result<()> {
        let ingested_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        for doc in docs {
            tx.execute(
                "INSERT OR REPLACE INTO documents (id, entity, date, text, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    doc.id,
                    doc.entity,
                    doc.date.to_string(),
                    doc.raw_text,
                    ingested_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a document by id.
    pub fn get_document(&self, id: &str) -> Result<Document> {
        let row = self
            .conn
            .query_row(
                "SELECT id, entity, date, text FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let (id, entity, date, text) =
            row.ok_or_else(|| DataError::DocumentNotFound(id.to_string()))?;
        Ok(Document::new(id, entity, parse_date(&date)?, text))
    }

    /// Store a price series, replacing rows on the same dates.
    pub fn put_prices(&self, series: &PriceSeries) -> Result<()> {
        let ingested_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        for point in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO prices (entity, date, close, ingested_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    series.entity(),
                    point.date.to_string(),
                    point.price,
                    ingested_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Record which stored series is the benchmark.
    pub fn set_benchmark(&self, entity: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![BENCHMARK_KEY, entity],
        )?;
        Ok(())
    }

    /// Benchmark symbol, if one has been recorded.
    pub fn benchmark_symbol(&self) -> Result<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![BENCHMARK_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn load_series(&self, entity: &str) -> Result<Option<PriceSeries>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, close FROM prices
             WHERE entity = ?1
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(params![entity], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (date, close) = row?;
            points.push(PricePoint::new(parse_date(&date)?, close));
        }

        if points.is_empty() {
            return Ok(None);
        }
        PriceSeries::new(entity, points).map(Some)
    }

    /// Remove an entity's documents and prices.
    pub fn clear_entity(&self, entity: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM documents WHERE entity = ?1", params![entity])?;
        self.conn
            .execute("DELETE FROM prices WHERE entity = ?1", params![entity])?;
        Ok(())
    }

    /// Clear all data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM documents", [])?;
        self.conn.execute("DELETE FROM prices", [])?;
        self.conn.execute("DELETE FROM meta", [])?;
        Ok(())
    }

    /// Row counts.
    pub fn stats(&self) -> Result<StoreStats> {
        let documents: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let entities: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT entity) FROM prices",
            [],
            |row| row.get(0),
        )?;
        let price_rows: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;

        Ok(StoreStats {
            documents: documents as usize,
            entities: entities as usize,
            price_rows: price_rows as usize,
        })
    }

    /// Copy another store's documents, entity prices and benchmark into this one.
    ///
    /// Entities whose prices cannot be read are skipped with a warning.
    pub fn import_from(&self, source: &dyn CorpusStore) -> Result<StoreStats> {
        let documents = source.documents()?;
        let benchmark = source.benchmark()?;

        self.put_documents_batch(&documents)?;
        self.put_prices(&benchmark)?;
        self.set_benchmark(benchmark.entity())?;

        let entities: BTreeSet<&str> = documents.iter().map(|d| d.entity.as_str()).collect();
        for entity in entities {
            match source.price_series(entity) {
                Ok(Some(series)) => self.put_prices(&series)?,
                Ok(None) => warn!(entity, "no price series to import"),
                Err(e) => warn!(entity, error = %e, "failed to read price series"),
            }
        }

        let stats = self.stats()?;
        info!(
            documents = stats.documents,
            entities = stats.entities,
            price_rows = stats.price_rows,
            "corpus imported"
        );
        Ok(stats)
    }
}

impl CorpusStore for SqliteCorpus {
    fn documents(&self) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, entity, date, text FROM documents ORDER BY id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, entity, date, text) = row?;
            documents.push(Document::new(id, entity, parse_date(&date)?, text));
        }
        Ok(documents)
    }

    fn price_series(&self, entity: &str) -> Result<Option<PriceSeries>> {
        self.load_series(entity)
    }

    fn benchmark(&self) -> Result<PriceSeries> {
        let symbol = self
            .benchmark_symbol()?
            .ok_or_else(|| DataError::CorpusLoad("no benchmark recorded in store".to_string()))?;
        self.load_series(&symbol)?.ok_or_else(|| {
            DataError::CorpusLoad(format!("no price rows for benchmark {}", symbol))
        })
    }
}
