//! Database initialization, table definitions and shared application state
//!
//! This module handles the setup of the embedded redb database and builds the
//! state handle that every request handler receives.

use std::sync::Arc;

use redb::{Database, TableDefinition};

use crate::config::Config;
use crate::generator::IdGenerator;
use crate::store::RedirectStore;

/// Table holding every short link
///
/// Key: short id as string
/// Value: JSON-serialized ShortLink as string
///
/// Example:
/// - Key: "aZ3k9QxP"
/// - Value: '{"short_id":"aZ3k9QxP","redirect_url":"https://example.com","visit_history":[]}'
pub const TABLE_SHORT_LINKS: TableDefinition<&str, &str> = TableDefinition::new("short_links_v1");

/// Application state shared across all request handlers
///
/// Built once at startup and dropped after the server has shut down, which
/// releases the database file.
#[derive(Clone)]
pub struct AppState {
    /// Redirect Store backed by the embedded database
    pub store: RedirectStore,

    /// Identifier Generator used by the shorten endpoint
    pub generator: IdGenerator,

    /// Base for composing shareable links (e.g., "http://localhost:8001")
    pub public_url: String,
}

impl AppState {
    /// Wraps an opened database according to `config`
    pub fn new(db: Database, config: &Config) -> Self {
        Self::with_parts(
            RedirectStore::new(Arc::new(db), config.store_timeout),
            IdGenerator::new(config.id_length),
            config.public_url.clone(),
        )
    }

    /// Assembles the state from an existing store and generator
    pub fn with_parts(
        store: RedirectStore,
        generator: IdGenerator,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator,
            public_url: public_url.into(),
        }
    }

    /// Public link for a short id
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.public_url, short_id)
    }
}

/// Creates or opens the database file and makes sure the table exists
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "short-url.db")
///
/// # Example
///
/// ```no_run
/// # use shortlink::database::init_db;
/// let db = init_db("short-url.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_SHORT_LINKS)?;
    }
    write_txn.commit()?;

    Ok(db)
}
