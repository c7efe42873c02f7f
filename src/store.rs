//! Redirect Store
//!
//! Durable mapping from short id to long URL plus the visit log. Every
//! operation is one redb transaction executed on the blocking pool and bounded
//! by a timeout.
//!
//! Atomicity of "look up and append a visit" comes from redb itself: write
//! transactions are serialized, so two concurrent resolutions of the same id
//! each see the other's appended record and none is lost.
//!
//! A caller that times out never leaves a write behind. The blocking side must
//! win the [`CommitGate`] before it commits, and a caller that gives up closes
//! the gate first. If the commit already holds the gate, the caller waits for
//! it instead of reporting a timeout.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};

use crate::database::TABLE_SHORT_LINKS;
use crate::error::{StoreError, StoreResult};
use crate::model::{ShortLink, VisitRecord};

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

/// Handshake between a waiting caller and its blocking transaction
#[derive(Clone, Default)]
struct CommitGate(Arc<AtomicU8>);

impl CommitGate {
    /// Claims the right to commit; false once the caller has given up
    fn enter_commit(&self) -> bool {
        self.0
            .compare_exchange(PENDING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Gives up on the transaction; false if its commit is already under way
    fn abandon(&self) -> bool {
        self.0
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Handle to the short link table, cheap to clone into every handler
#[derive(Clone)]
pub struct RedirectStore {
    db: Arc<Database>,
    timeout: Duration,
}

impl RedirectStore {
    /// Wraps an opened database; `timeout` bounds every operation
    pub fn new(db: Arc<Database>, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Inserts a new link with an empty visit log and returns its id
    ///
    /// Fails with [`StoreError::DuplicateKey`] if `short_id` is taken; the
    /// existing record is left untouched.
    pub async fn create(&self, short_id: &str, redirect_url: &str) -> StoreResult<String> {
        let link = ShortLink::new(short_id, redirect_url);
        self.run(move |db, gate| create_link(db, gate, link)).await
    }

    /// Looks up `short_id`, appends a visit stamped now, and returns the
    /// redirect target, all in one write transaction
    pub async fn resolve_and_record_visit(&self, short_id: &str) -> StoreResult<String> {
        let short_id = short_id.to_owned();
        self.run(move |db, gate| resolve_link(db, gate, &short_id)).await
    }

    /// Reads a link without touching its visit log
    pub async fn get(&self, short_id: &str) -> StoreResult<Option<ShortLink>> {
        let short_id = short_id.to_owned();
        self.run(move |db, _| read_link(db, &short_id)).await
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Database, &CommitGate) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let gate = CommitGate::default();
        let worker_gate = gate.clone();
        let mut task = tokio::task::spawn_blocking(move || op(&db, &worker_gate));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => flatten(joined),
            Err(_) if gate.abandon() => Err(StoreError::Timeout(self.timeout)),
            // Commit already under way, its outcome is the answer
            Err(_) => flatten(task.await),
        }
    }
}

fn flatten<T>(joined: Result<StoreResult<T>, tokio::task::JoinError>) -> StoreResult<T> {
    joined.unwrap_or_else(|join_err| Err(StoreError::Unavailable(join_err.to_string())))
}

/// Commits `write_txn` unless the caller has already given up on it
fn commit_unless_abandoned(write_txn: WriteTransaction, gate: &CommitGate) -> StoreResult<()> {
    if !gate.enter_commit() {
        write_txn.abort()?;
        return Err(StoreError::Abandoned);
    }

    write_txn.commit()?;
    Ok(())
}

fn create_link(db: &Database, gate: &CommitGate, link: ShortLink) -> StoreResult<String> {
    let record_json = serde_json::to_string(&link)?;

    let write_txn = db.begin_write()?;
    {
        let mut table = write_txn.open_table(TABLE_SHORT_LINKS)?;

        if table.get(link.short_id.as_str())?.is_some() {
            drop(table);
            write_txn.abort()?;
            return Err(StoreError::DuplicateKey(link.short_id));
        }

        table.insert(link.short_id.as_str(), record_json.as_str())?;
    }
    commit_unless_abandoned(write_txn, gate)?;

    Ok(link.short_id)
}

fn resolve_link(db: &Database, gate: &CommitGate, short_id: &str) -> StoreResult<String> {
    let write_txn = db.begin_write()?;
    let redirect_url = {
        let mut table = write_txn.open_table(TABLE_SHORT_LINKS)?;

        let stored = table.get(short_id)?.map(|guard| guard.value().to_string());
        let Some(stored) = stored else {
            drop(table);
            write_txn.abort()?;
            return Err(StoreError::NotFound(short_id.to_string()));
        };

        let mut link: ShortLink = serde_json::from_str(&stored)?;
        link.visit_history.push(VisitRecord::now());

        let record_json = serde_json::to_string(&link)?;
        table.insert(short_id, record_json.as_str())?;

        link.redirect_url
    };
    commit_unless_abandoned(write_txn, gate)?;

    Ok(redirect_url)
}

fn read_link(db: &Database, short_id: &str) -> StoreResult<Option<ShortLink>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_SHORT_LINKS)?;

    let link = match table.get(short_id)? {
        Some(guard) => Some(serde_json::from_str(guard.value())?),
        None => None,
    };

    Ok(link)
}
