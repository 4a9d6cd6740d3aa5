//! Statement builders for `SELECT` and `DROP TABLE`.
//!
//! Builders validate every identifier up front and compile into a
//! [`CompiledStatement`]: SQL text with `$n` placeholders and the ordered
//! parameters that bind them.
//!
//! # Example
//! ```ignore
//! use pgfacade::{Condition, build_select};
//!
//! let stmt = build_select(
//!     "accounts",
//!     ["account_name"],
//!     Some(Condition::ilike("account_name", "Chase Bank")?),
//! )?;
//! assert_eq!(stmt.sql(), "SELECT account_name FROM accounts WHERE account_name ILIKE $1;");
//! assert_eq!(stmt.params().len(), 1);
//! # Ok::<(), pgfacade::PgError>(())
//! ```

use crate::condition::Condition;
use crate::error::{PgError, PgResult};
use crate::ident::{Ident, IntoIdent};
use crate::param::ParamList;
use std::fmt;
use tokio_postgres::types::ToSql;

/// Column projection of a `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// `*`
    All,
    /// An explicit, non-empty column list.
    List(Vec<Ident>),
}

impl Columns {
    /// Validate a list of column names.
    ///
    /// A list holding only `"*"` means all columns. `"*"` mixed with names, or an
    /// empty list, is rejected.
    pub fn from_names<I, S>(names: I) -> PgResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        match names.as_slice() {
            [] => Err(PgError::invalid_identifier("column list cannot be empty")),
            ["*"] => Ok(Columns::All),
            _ => names
                .iter()
                .map(|name| match *name {
                    "*" => Err(PgError::invalid_identifier(
                        "'*' cannot be combined with named columns",
                    )),
                    other => Ident::parse(other),
                })
                .collect::<PgResult<Vec<_>>>()
                .map(Columns::List),
        }
    }

    fn write_sql(&self, out: &mut String) {
        match self {
            Columns::All => out.push('*'),
            Columns::List(cols) => {
                for (i, col) in cols.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    col.write_sql(out);
                }
            }
        }
    }
}

/// Convert an input into validated [`Columns`].
pub trait IntoColumns {
    fn into_columns(self) -> PgResult<Columns>;
}

impl IntoColumns for Columns {
    fn into_columns(self) -> PgResult<Columns> {
        match self {
            Columns::List(cols) if cols.is_empty() => {
                Err(PgError::invalid_identifier("column list cannot be empty"))
            }
            other => Ok(other),
        }
    }
}

impl IntoColumns for &str {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names([self])
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names([self])
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names(self)
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names(self)
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names(self)
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::from_names(self)
    }
}

impl IntoColumns for Vec<Ident> {
    fn into_columns(self) -> PgResult<Columns> {
        Columns::List(self).into_columns()
    }
}

/// What a compiled statement does; used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Drop,
}

impl StatementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Drop => "DROP",
        }
    }
}

/// SQL text with placeholders plus its ordered parameters. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    kind: StatementKind,
    sql: String,
    params: ParamList,
}

impl CompiledStatement {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    /// Parameters in the form `tokio_postgres` expects.
    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.as_refs()
    }

    pub fn into_parts(self) -> (String, ParamList) {
        (self.sql, self.params)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A `SELECT <columns> FROM <table> [WHERE <condition>]` statement.
#[derive(Debug, Clone)]
pub struct Select {
    table: Ident,
    columns: Columns,
    condition: Option<Condition>,
}

impl Select {
    /// Validate the table and columns of a new `SELECT`.
    pub fn new<T, C>(table: T, columns: C) -> PgResult<Self>
    where
        T: IntoIdent,
        C: IntoColumns,
    {
        Ok(Self {
            table: table.into_ident()?,
            columns: columns.into_columns()?,
            condition: None,
        })
    }

    /// Add a filter; repeated calls are ANDed together.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Compile to `SELECT ...;` with placeholders numbered from `$1`.
    pub fn compile(&self) -> CompiledStatement {
        let mut sql = String::with_capacity(64);
        let mut params = ParamList::new();
        self.write_sql(&mut sql, &mut params);
        sql.push(';');
        CompiledStatement {
            kind: StatementKind::Select,
            sql,
            params,
        }
    }

    /// Write the statement without a terminator, so it can be nested as a subquery.
    pub(crate) fn write_sql(&self, out: &mut String, params: &mut ParamList) {
        out.push_str("SELECT ");
        self.columns.write_sql(out);
        out.push_str(" FROM ");
        self.table.write_sql(out);
        if let Some(condition) = &self.condition {
            out.push_str(" WHERE ");
            condition.write_sql(out, params);
        }
    }
}

/// Build and compile a `SELECT` in one step.
///
/// `columns` accepts `"*"`, a single column name, a list of names, or [`Columns`].
pub fn build_select<T, C>(
    table: T,
    columns: C,
    condition: Option<Condition>,
) -> PgResult<CompiledStatement>
where
    T: IntoIdent,
    C: IntoColumns,
{
    let mut select = Select::new(table, columns)?;
    if let Some(condition) = condition {
        select = select.filter(condition);
    }
    Ok(select.compile())
}

/// A `DROP TABLE` statement over one or more tables.
///
/// Several tables compile into a single `DROP TABLE a, b;`, which PostgreSQL
/// applies atomically: either every table is dropped or none is.
#[derive(Debug, Clone)]
pub struct DropTable {
    tables: Vec<Ident>,
    if_exists: bool,
    cascade: bool,
}

impl DropTable {
    /// Validate the table list. Empty lists and duplicates are rejected.
    pub fn new<I, T>(tables: I) -> PgResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: IntoIdent,
    {
        let mut idents: Vec<Ident> = Vec::new();
        for table in tables {
            let ident = table.into_ident()?;
            if idents.contains(&ident) {
                return Err(PgError::invalid_identifier(format!(
                    "table '{ident}' listed more than once"
                )));
            }
            idents.push(ident);
        }
        if idents.is_empty() {
            return Err(PgError::invalid_identifier("no table to drop"));
        }
        Ok(Self {
            tables: idents,
            if_exists: false,
            cascade: false,
        })
    }

    /// Drop a single table.
    pub fn single<T: IntoIdent>(table: T) -> PgResult<Self> {
        Self::new([table])
    }

    /// Do not fail when a table is missing (`IF EXISTS`).
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Also drop dependent objects (`CASCADE`).
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn tables(&self) -> &[Ident] {
        &self.tables
    }

    pub fn compile(&self) -> CompiledStatement {
        let mut sql = String::from("DROP TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            table.write_sql(&mut sql);
        }
        if self.cascade {
            sql.push_str(" CASCADE");
        }
        sql.push(';');
        CompiledStatement {
            kind: StatementKind::Drop,
            sql,
            params: ParamList::new(),
        }
    }
}

/// Build and compile a `DROP TABLE` over `tables` in one step.
pub fn build_drop<I, T>(tables: I) -> PgResult<CompiledStatement>
where
    I: IntoIterator<Item = T>,
    T: IntoIdent,
{
    Ok(DropTable::new(tables)?.compile())
}

#[cfg(test)]
mod tests;
