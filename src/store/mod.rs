use std::str::FromStr;
use std::time::SystemTime;

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

pub const FEEDBACK_COLLECTION: &str = "feedback";
pub const WAITLIST_COLLECTION: &str = "waitlist";

const INSERT_DOCUMENT: &str =
    "INSERT INTO documents (id, collection, body, created_at) VALUES (?, ?, ?, ?)";
const SELECT_NEWEST_DOCUMENTS: &str = "SELECT id, collection, body, created_at FROM documents \
    WHERE collection = ? ORDER BY created_at DESC, rowid DESC LIMIT ?";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    pub collection: String,
    pub body: Value,
    pub created_at: i64,
}

/// Schema-less record store, every document is kept verbatim as JSON text.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    pool: SqlitePool,
}

/// 16 random bytes, URL safe base64 without padding
pub fn generate_id() -> String {
    let mut id = [0u8; 16];
    OsRng.fill_bytes(&mut id);
    Base64UrlUnpadded::encode_string(&id)
}

fn unix_now_millis() -> Result<i64> {
    Ok(SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_millis()
        .try_into()?)
}

impl DocumentStore {
    #[tracing::instrument(level = "info", skip(url))]
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .context("Invalid document store connection string")?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to the document store")?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to migrate the document store")?;
        Ok(Self { pool })
    }

    /// Stores `body` unmodified and returns its new identifier. Identical bodies are stored again.
    #[tracing::instrument(level = "info", skip(self, body))]
    pub async fn insert(&self, collection: &str, body: &Value) -> Result<String> {
        let id = generate_id();
        let created_at = unix_now_millis()?;
        sqlx::query(INSERT_DOCUMENT)
            .bind(&id)
            .bind(collection)
            .bind(serde_json::to_string(body)?)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Newest first
    #[allow(dead_code)] // only the admin CLI lists records
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn list(&self, collection: &str, limit: i64) -> Result<Vec<Record>> {
        let rows = sqlx::query(SELECT_NEWEST_DOCUMENTS)
            .bind(collection)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Record> {
                let body: String = row.try_get("body")?;
                Ok(Record {
                    id: row.try_get("id")?,
                    collection: row.try_get("collection")?,
                    body: serde_json::from_str(&body)?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
