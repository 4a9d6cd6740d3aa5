//! The `Database` façade: one pool, typed `select`/`drop_table` helpers.

use crate::condition::Condition;
use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::PgResult;
use crate::executor::{Connection, ConnectionSource, Executor, ExecutorConfig, ResultSet};
use crate::ident::IntoIdent;
use crate::pool::create_pool;
use crate::statement::{CompiledStatement, DropTable, IntoColumns, build_select};
use deadpool_postgres::Pool;

type Rows<S> = ResultSet<<<S as ConnectionSource>::Conn as Connection>::Row>;

/// Entry point for building and running statements.
///
/// Statements are validated and compiled before a connection is borrowed, so
/// identifier and operator errors never cost a round-trip. Clones share the
/// same pool.
///
/// # Example
/// ```ignore
/// use pgfacade::{Condition, ConnectionConfig, Database};
///
/// let db = Database::connect(ConnectionConfig::from_env()?)?;
/// let rows = db
///     .select("accounts", ["account_name"], Some(Condition::ilike("account_name", "Chase%")?))
///     .await?;
/// db.close();
/// ```
#[derive(Debug, Clone)]
pub struct Database<S = Pool> {
    executor: Executor<S>,
}

impl Database<Pool> {
    /// Create the process-wide pool with default settings.
    pub fn connect(connection: ConnectionConfig) -> PgResult<Self> {
        Self::connect_with(connection, PoolConfig::default())
    }

    /// Create the process-wide pool with explicit settings.
    pub fn connect_with(connection: ConnectionConfig, pool: PoolConfig) -> PgResult<Self> {
        let query_timeout = pool.query_timeout;
        let pool = create_pool(&connection, &pool)?;
        Ok(Self::from_source(
            pool,
            ExecutorConfig {
                query_timeout,
            },
        ))
    }

    pub fn pool(&self) -> &Pool {
        self.executor.source()
    }

    /// Close the pool for every clone of this `Database`.
    ///
    /// Call once at shutdown. Later statements fail with `ConnectionUnavailable`.
    pub fn close(&self) {
        let pool = self.pool();
        if !pool.is_closed() {
            pool.close();
            tracing::info!(target: "pgfacade.pool", "connection pool closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool().is_closed()
    }
}

impl<S: ConnectionSource> Database<S> {
    /// Wrap an existing connection source.
    pub fn from_source(source: S, config: ExecutorConfig) -> Self {
        Self {
            executor: Executor::with_config(source, config),
        }
    }

    pub fn executor(&self) -> &Executor<S> {
        &self.executor
    }

    /// `SELECT <columns> FROM <table> [WHERE <condition>]`.
    ///
    /// `columns` accepts `"*"`, a column name, or a list of names.
    pub async fn select<T, C>(
        &self,
        table: T,
        columns: C,
        condition: Option<Condition>,
    ) -> PgResult<Rows<S>>
    where
        T: IntoIdent,
        C: IntoColumns,
    {
        let statement = build_select(table, columns, condition)?;
        self.executor.execute(&statement).await
    }

    /// `DROP TABLE <table>`.
    pub async fn drop_table<T: IntoIdent>(&self, table: T) -> PgResult<Rows<S>> {
        let statement = DropTable::single(table)?.compile();
        self.executor.execute(&statement).await
    }

    /// `DROP TABLE a, b, ...` as one atomic statement.
    pub async fn drop_tables<I, T>(&self, tables: I) -> PgResult<Rows<S>>
    where
        I: IntoIterator<Item = T>,
        T: IntoIdent,
    {
        let statement = DropTable::new(tables)?.compile();
        self.executor.execute(&statement).await
    }

    /// Run any statement compiled by this crate's builders.
    pub async fn execute(&self, statement: &CompiledStatement) -> PgResult<Rows<S>> {
        self.executor.execute(statement).await
    }
}
