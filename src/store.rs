//! Append-only persistence for sealed quotes.
//!
//! The session never reads a record back: it appends and keeps its own
//! in-memory copy for display.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::Quote;

pub const QUOTES_COLLECTION: &str = "quotes";

pub trait QuoteStore {
    /// Appends `quote` under `collection` and returns the key the store assigned.
    fn append(&mut self, collection: &str, quote: &Quote) -> Result<String, StoreError>;
}

impl<S: QuoteStore + ?Sized> QuoteStore for Box<S> {
    fn append(&mut self, collection: &str, quote: &Quote) -> Result<String, StoreError> {
        (**self).append(collection, quote)
    }
}

// ==========================================
// Firebase Realtime Database (REST)
// ==========================================

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

pub struct FirebaseStore {
    client: Client,
    database_url: String,
}

impl FirebaseStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // appends are never timed out
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            database_url: database_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.database_url, collection)
    }
}

/// Extracts the generated key from a push response body (`{"name": "-N..."}`).
pub fn parse_push_response(body: &str) -> Result<String, StoreError> {
    let response: PushResponse = serde_json::from_str(body)
        .map_err(|e| StoreError::InvalidResponse(format!("{e}: {body}")))?;
    if response.name.is_empty() {
        return Err(StoreError::InvalidResponse("empty key".to_string()));
    }
    Ok(response.name)
}

impl QuoteStore for FirebaseStore {
    fn append(&mut self, collection: &str, quote: &Quote) -> Result<String, StoreError> {
        let url = self.collection_url(collection);
        debug!(%url, "appending quote");

        let response = self.client.post(&url).json(quote).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "store rejected append");
            return Err(StoreError::Server { status: status.as_u16(), body });
        }

        let key = parse_push_response(&body)?;
        info!(%key, collection, "quote appended to firebase");
        Ok(key)
    }
}

// ==========================================
// Local JSON-lines store
// ==========================================

#[derive(Serialize)]
struct StoredRecord<'a> {
    key: &'a str,
    record: &'a Quote,
}

#[derive(Deserialize)]
struct StoredKey {
    key: String,
}

/// One `<collection>.jsonl` file per collection under `dir`. Lines are only
/// ever appended.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.jsonl"))
    }

    // Key format: Q20251214-01, index one past the highest used that day
    fn next_key(path: &Path, quote: &Quote) -> Result<String, StoreError> {
        let prefix = format!("Q{}", quote.issued_at.format("%Y%m%d"));
        let mut next_idx = 1;

        if path.exists() {
            let content = fs::read_to_string(path)?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let Ok(stored) = serde_json::from_str::<StoredKey>(line) else {
                    warn!(path = %path.display(), "skipping unreadable line");
                    continue;
                };
                let Some(rest) = stored.key.strip_prefix(&prefix) else {
                    continue;
                };
                let Some(num_part) = rest.strip_prefix('-') else {
                    continue;
                };
                if let Ok(idx) = num_part.parse::<u32>() {
                    if idx >= next_idx {
                        next_idx = idx + 1;
                    }
                }
            }
        }

        Ok(format!("{}-{:02}", prefix, next_idx))
    }
}

impl QuoteStore for LocalStore {
    fn append(&mut self, collection: &str, quote: &Quote) -> Result<String, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.collection_path(collection);
        let key = Self::next_key(&path, quote)?;

        let mut line = serde_json::to_string(&StoredRecord { key: &key, record: quote })?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;

        info!(%key, path = %path.display(), "quote appended");
        Ok(key)
    }
}
