//! Executing compiled statements on pooled connections.
//!
//! [`Executor::execute`] borrows exactly one connection per statement from a
//! [`ConnectionSource`] and gives it back when the borrowed guard is dropped.
//! Dropping happens on every exit path: success, driver error, and the caller
//! dropping the returned future. A connection whose statement hit the query
//! timeout is [retired](Connection::retire) instead, since a cancel request may
//! still be in flight for it.

use crate::error::{PgError, PgResult};
use crate::statement::CompiledStatement;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, NoTls, Row};

/// Longest SQL prefix emitted in log events, in bytes.
const LOG_SQL_MAX_BYTES: usize = 200;

/// A single borrowed database connection.
pub trait Connection: Send + Sync {
    /// Row type produced by [`Connection::query`].
    type Row: Send;

    /// Run a parameterized statement and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = PgResult<Vec<Self::Row>>> + Send;

    /// Token for best-effort server-side cancellation, if supported.
    fn cancel_token(&self) -> Option<CancelToken> {
        None
    }

    /// Give the connection up so it is never handed out again.
    fn retire(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Something that lends out connections, typically a pool.
///
/// The returned connection is released when dropped.
pub trait ConnectionSource: Send + Sync {
    type Conn: Connection;

    fn acquire(&self) -> impl Future<Output = PgResult<Self::Conn>> + Send;
}

impl Connection for deadpool_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PgResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        client
            .query(sql, params)
            .await
            .map_err(PgError::from_db_error)
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        let client: &tokio_postgres::Client = self;
        Some(client.cancel_token())
    }

    // Detached from the pool; dropping the client closes the session.
    fn retire(self) {
        drop(deadpool_postgres::Client::take(self));
    }
}

impl ConnectionSource for deadpool_postgres::Pool {
    type Conn = deadpool_postgres::Client;

    async fn acquire(&self) -> PgResult<deadpool_postgres::Client> {
        self.get().await.map_err(PgError::from)
    }
}

/// Rows returned by a statement, in server order.
#[derive(Debug, Clone)]
pub struct ResultSet<R> {
    rows: Vec<R>,
}

impl<R> ResultSet<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&R> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R> IntoIterator for ResultSet<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a ResultSet<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Executor settings.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Deadline for a statement once it holds a connection. `None` disables it.
    pub query_timeout: Option<Duration>,
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

/// Runs compiled statements against a [`ConnectionSource`].
///
/// Cloning is cheap when the source is (a deadpool `Pool` is an `Arc`), and clones
/// can execute concurrently; concurrency is bounded by the source alone.
#[derive(Debug, Clone)]
pub struct Executor<S> {
    source: S,
    config: ExecutorConfig,
}

impl<S: ConnectionSource> Executor<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ExecutorConfig::default())
    }

    pub fn with_config(source: S, config: ExecutorConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `statement` on one borrowed connection.
    pub async fn execute(
        &self,
        statement: &CompiledStatement,
    ) -> PgResult<ResultSet<<S::Conn as Connection>::Row>> {
        let kind = statement.kind().as_str();
        tracing::debug!(
            target: "pgfacade.sql",
            kind,
            param_count = statement.params().len(),
            sql = %truncate_sql_bytes(statement.sql(), LOG_SQL_MAX_BYTES),
            "executing statement"
        );

        let start = Instant::now();
        let result = match self.source.acquire().await {
            Ok(conn) => match self.run(&conn, statement).await {
                Outcome::Done(result) => {
                    drop(conn);
                    result
                }
                Outcome::Expired(after) => {
                    if let Some(cancel_token) = conn.cancel_token() {
                        tokio::spawn(async move {
                            let _ = cancel_token.cancel_query(NoTls).await;
                        });
                    }
                    conn.retire();
                    tracing::debug!(
                        target: "pgfacade.pool",
                        kind,
                        "retired connection after statement timeout"
                    );
                    Err(PgError::timeout(after))
                }
            },
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed();

        match &result {
            Ok(rows) => tracing::debug!(
                target: "pgfacade.sql",
                kind,
                rows = rows.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "statement finished"
            ),
            Err(e) => tracing::warn!(
                target: "pgfacade.sql",
                kind,
                error_kind = ?e.kind(),
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "statement failed"
            ),
        }

        result.map(ResultSet::new)
    }

    async fn run(
        &self,
        conn: &S::Conn,
        statement: &CompiledStatement,
    ) -> Outcome<<S::Conn as Connection>::Row> {
        let params = statement.param_refs();
        let query = conn.query(statement.sql(), &params);

        match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, query).await {
                Ok(result) => Outcome::Done(result),
                Err(_) => Outcome::Expired(timeout),
            },
            None => Outcome::Done(query.await),
        }
    }
}

enum Outcome<R> {
    Done(PgResult<Vec<R>>),
    /// The local deadline passed; the server may still be running the statement.
    Expired(Duration),
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
