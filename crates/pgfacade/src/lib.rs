//! # pgfacade
//!
//! A small typed layer over `tokio-postgres` and `deadpool-postgres` for
//! building and running `SELECT` and `DROP TABLE` statements.
//!
//! ## Features
//!
//! - **Validated identifiers**: table and column names must match `[A-Za-z_][A-Za-z0-9_]*`
//! - **Typed conditions**: a closed operator set, checked for arity at construction
//! - **Parameterized SQL**: values are always bound as `$n`, never spliced into text
//! - **Scoped connections**: one pooled connection per statement, released on every path
//! - **Classified errors**: driver failures mapped to a small taxonomy, cause preserved
//!
//! ## Example
//!
//! ```ignore
//! use pgfacade::{Condition, ConnectionConfig, Database};
//!
//! let db = Database::connect(ConnectionConfig::from_env()?)?;
//!
//! // SELECT account_name FROM accounts WHERE account_name ILIKE $1;
//! let rows = db
//!     .select(
//!         "accounts",
//!         ["account_name"],
//!         Some(Condition::ilike("account_name", "Chase Bank")?),
//!     )
//!     .await?;
//!
//! // SELECT * FROM users WHERE id IS NOT NULL;
//! let users = db.select("users", "*", Some(Condition::is_not_null("id")?)).await?;
//!
//! // DROP TABLE scratch_a, scratch_b;
//! db.drop_tables(["scratch_a", "scratch_b"]).await?;
//!
//! db.close();
//! ```

pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod ident;
pub mod param;
pub mod pool;
pub mod statement;

pub use condition::{Condition, Operator};
pub use config::{ConnectionConfig, Credentials, DatabaseFile, PoolConfig};
pub use database::Database;
pub use error::{ErrorKind, PgError, PgResult, classify_sqlstate};
pub use executor::{Connection, ConnectionSource, Executor, ExecutorConfig, ResultSet};
pub use ident::{Ident, IntoIdent};
pub use param::{Param, ParamList};
pub use pool::create_pool;
pub use statement::{
    Columns, CompiledStatement, DropTable, IntoColumns, Select, StatementKind, build_drop,
    build_select,
};

// Re-export the driver crates so callers can name row and pool types.
pub use deadpool_postgres;
pub use tokio_postgres;
