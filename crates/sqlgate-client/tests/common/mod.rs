// crates/sqlgate-client/tests/common/mod.rs
// ============================================================================
// Module: Client Test Fixtures
// Description: Scripted in-memory driver and row builders for client tests.
// Purpose: Exercise gateway, registry, streaming, and entity behavior
//          without a physical database.
// Dependencies: sqlgate-client, sqlgate-core, async-trait, serde_json
// ============================================================================

//! ## Overview
//! The scripted driver replays queued replies in order and journals every
//! acquire, statement, and release so tests can assert connection pairing
//! and SQL shapes.

#![allow(
    dead_code,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only fixtures; not every helper is used by every test root."
)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;
use sqlgate_client::Clock;
use sqlgate_client::Connection;
use sqlgate_client::ConnectionPool;
use sqlgate_client::DriverError;
use sqlgate_client::ExecuteOutcome;
use sqlgate_client::Row;
use sqlgate_client::RowSource;
use sqlgate_core::Record;

// ============================================================================
// SECTION: Journal
// ============================================================================

/// One observable driver event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A connection was handed out.
    Acquired,
    /// A connection was returned.
    Released,
    /// A statement was dispatched with its bound parameters.
    Statement(String, Vec<Value>),
}

// ============================================================================
// SECTION: Scripted Replies
// ============================================================================

/// One queued driver reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Successful execute outcome.
    Outcome(ExecuteOutcome),
    /// Successful buffered result set.
    Rows(Vec<Row>),
    /// Streamed result set, optionally failing after N rows.
    Stream(Vec<Row>, Option<usize>),
    /// Driver-level failure.
    Fail(String),
}

/// Shared state behind the scripted pool.
#[derive(Debug, Default)]
struct Shared {
    /// Replies consumed in statement order.
    replies: Mutex<VecDeque<Reply>>,
    /// Journal of observable events.
    journal: Mutex<Vec<Event>>,
    /// Acquire failures to inject before handing out connections.
    acquire_failures: Mutex<u32>,
}

/// Scripted in-memory pool replaying queued replies.
#[derive(Debug, Default)]
pub struct ScriptedPool {
    /// Shared reply queue and journal.
    inner: Arc<Shared>,
}

impl ScriptedPool {
    /// Creates an empty pool; queue replies before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one reply.
    pub fn push(&self, reply: Reply) {
        self.inner.replies.lock().unwrap().push_back(reply);
    }

    /// Makes the next `count` acquisitions fail.
    pub fn fail_acquires(&self, count: u32) {
        *self.inner.acquire_failures.lock().unwrap() = count;
    }

    /// Returns the journaled events so far.
    #[must_use]
    pub fn journal(&self) -> Vec<Event> {
        self.inner.journal.lock().unwrap().clone()
    }

    /// Returns the dispatched statements so far.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|event| match event {
                Event::Statement(sql, _) => Some(sql),
                Event::Acquired | Event::Released => None,
            })
            .collect()
    }

    /// Counts journaled events matching the sample.
    #[must_use]
    pub fn count(&self, sample: &Event) -> usize {
        self.journal().iter().filter(|event| *event == sample).count()
    }
}

#[async_trait]
impl ConnectionPool for ScriptedPool {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DriverError> {
        {
            let mut failures = self.inner.acquire_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(DriverError::Connect("scripted acquire failure".to_string()));
            }
        }
        self.inner.journal.lock().unwrap().push(Event::Acquired);
        Ok(Box::new(ScriptedConnection { shared: Arc::clone(&self.inner) }))
    }
}

/// One scripted connection bound to the pool's reply queue.
#[derive(Debug)]
struct ScriptedConnection {
    /// Shared reply queue and journal.
    shared: Arc<Shared>,
}

impl ScriptedConnection {
    /// Records a statement and pops the next reply.
    fn next_reply(&self, sql: &str, params: &[Value]) -> Reply {
        self.shared
            .journal
            .lock()
            .unwrap()
            .push(Event::Statement(sql.to_string(), params.to_vec()));
        self.shared
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Fail("no scripted reply".to_string()))
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome, DriverError> {
        match self.next_reply(sql, params) {
            Reply::Outcome(outcome) => Ok(outcome),
            Reply::Fail(cause) => Err(DriverError::Execute(cause)),
            Reply::Rows(_) | Reply::Stream(..) => {
                Err(DriverError::Execute("scripted reply mismatch".to_string()))
            }
        }
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        match self.next_reply(sql, params) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Fail(cause) => Err(DriverError::Execute(cause)),
            Reply::Outcome(_) | Reply::Stream(..) => {
                Err(DriverError::Execute("scripted reply mismatch".to_string()))
            }
        }
    }

    async fn open_stream<'conn>(
        &'conn mut self,
        sql: &str,
        params: &[Value],
        _read_buffer_rows: usize,
    ) -> Result<Box<dyn RowSource + Send + 'conn>, DriverError> {
        match self.next_reply(sql, params) {
            Reply::Stream(rows, fail_after) => Ok(Box::new(ScriptedSource {
                rows: rows.into(),
                fail_after,
                delivered: 0,
            })),
            Reply::Fail(cause) => Err(DriverError::Stream(cause)),
            Reply::Outcome(_) | Reply::Rows(_) => {
                Err(DriverError::Stream("scripted reply mismatch".to_string()))
            }
        }
    }

    async fn release(self: Box<Self>) {
        self.shared.journal.lock().unwrap().push(Event::Released);
    }
}

/// Scripted row source yielding queued rows in order.
#[derive(Debug)]
struct ScriptedSource {
    /// Remaining rows.
    rows: VecDeque<Row>,
    /// Fail after this many rows were delivered.
    fail_after: Option<usize>,
    /// Rows delivered so far.
    delivered: usize,
}

#[async_trait]
impl RowSource for ScriptedSource {
    async fn next_row(&mut self) -> Result<Option<Row>, DriverError> {
        if self.fail_after == Some(self.delivered) {
            return Err(DriverError::Stream("scripted stream failure".to_string()));
        }
        match self.rows.pop_front() {
            Some(row) => {
                self.delivered += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}

// ============================================================================
// SECTION: Row Builders
// ============================================================================

/// Builds a row from column names and values.
#[must_use]
pub fn row(columns: &[&str], values: Vec<Value>) -> Row {
    let columns: Arc<[String]> = columns.iter().map(ToString::to_string).collect();
    Row::new(columns, values)
}

/// Builds one catalog row as returned by the schema query.
#[must_use]
pub fn catalog_row(
    table: &str,
    column: &str,
    column_type: &str,
    nullable: bool,
    char_max_length: Option<u64>,
    numeric_precision: Option<u64>,
    column_key: &str,
) -> Row {
    row(
        &[
            "table_name",
            "column_name",
            "column_type",
            "is_nullable",
            "character_maximum_length",
            "numeric_precision",
            "column_key",
            "column_default",
        ],
        vec![
            json!(table),
            json!(column),
            json!(column_type),
            json!(if nullable { "YES" } else { "NO" }),
            char_max_length.map_or(Value::Null, |len| json!(len)),
            numeric_precision.map_or(Value::Null, |len| json!(len)),
            json!(column_key),
            Value::Null,
        ],
    )
}

/// Builds the standard users-table catalog reply.
#[must_use]
pub fn users_catalog() -> Vec<Row> {
    vec![
        catalog_row("users", "id", "bigint(20)", false, None, Some(20), "PRI"),
        catalog_row("users", "name", "varchar(64)", false, Some(64), None, ""),
        catalog_row("users", "age", "int(11)", true, None, Some(11), ""),
        catalog_row("users", "active", "tinyint(3)", true, None, Some(3), ""),
        catalog_row("users", "created_at", "datetime", true, None, None, ""),
        catalog_row("users", "updated_at", "datetime", true, None, None, ""),
    ]
}

/// Builds a record from JSON pairs.
#[must_use]
pub fn record(pairs: Value) -> Record {
    match pairs {
        Value::Object(map) => map.into_iter().collect(),
        other => panic!("record fixture must be an object, got {other}"),
    }
}

// ============================================================================
// SECTION: Clock Fixture
// ============================================================================

/// Clock pinned to one stamp for deterministic save tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    /// Stamp returned on every read.
    pub stamp: String,
}

impl FixedClock {
    /// Creates a clock pinned to the provided stamp.
    #[must_use]
    pub fn new(stamp: &str) -> Self {
        Self { stamp: stamp.to_string() }
    }
}

impl Clock for FixedClock {
    fn now_stamp(&self) -> String {
        self.stamp.clone()
    }
}
