//! Typed filter predicates for `WHERE` clauses.
//!
//! A [`Condition`] is a tree of comparisons, null checks and boolean combinators.
//! Compiling it yields SQL with `$n` placeholders numbered left to right in tree
//! order, plus the matching [`ParamList`]. Values never appear in the SQL text.
//!
//! # Example
//! ```ignore
//! use pgfacade::Condition;
//!
//! let cond = Condition::ilike("account_name", "Chase%")?
//!     .and(Condition::is_not_null("account_user")?)
//!     .or(Condition::between("balance", 100i64, 500i64)?);
//!
//! let (sql, params) = cond.compile();
//! assert_eq!(
//!     sql,
//!     "(account_name ILIKE $1 AND account_user IS NOT NULL) OR balance BETWEEN $2 AND $3"
//! );
//! assert_eq!(params.len(), 3);
//! # Ok::<(), pgfacade::PgError>(())
//! ```

use crate::error::{PgError, PgResult};
use crate::ident::{Ident, IntoIdent};
use crate::param::{Param, ParamList};
use crate::statement::Select;
use std::fmt;
use tokio_postgres::types::ToSql;

/// The closed set of operators a condition may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `column = $n`
    Eq,
    /// `column LIKE $n`
    Like,
    /// `column ILIKE $n`
    ILike,
    /// `column BETWEEN $n AND $m`
    Between,
    /// `column IS NULL`
    IsNull,
    /// `column IS NOT NULL`
    IsNotNull,
    /// `EXISTS (subquery)`
    Exists,
    /// `column = ANY($n)` with an array value
    Any,
    /// `column = ALL($n)` with an array value
    All,
}

impl Operator {
    /// SQL keyword(s) for this operator.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Exists => "EXISTS",
            Operator::Any => "ANY",
            Operator::All => "ALL",
        }
    }

    /// Number of bound values a column comparison with this operator takes.
    ///
    /// `None` for [`Operator::Exists`], which takes a subquery instead of a column.
    pub const fn arity(self) -> Option<usize> {
        match self {
            Operator::IsNull | Operator::IsNotNull => Some(0),
            Operator::Eq | Operator::Like | Operator::ILike | Operator::Any | Operator::All => {
                Some(1)
            }
            Operator::Between => Some(2),
            Operator::Exists => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Single-value comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Like,
    ILike,
    Any,
    All,
}

#[derive(Debug, Clone)]
enum Node {
    Compare {
        column: Ident,
        op: CompareOp,
        value: Param,
    },
    Between {
        column: Ident,
        low: Param,
        high: Param,
    },
    IsNull(Ident),
    IsNotNull(Ident),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Exists(Box<Select>),
}

/// A typed predicate tree.
///
/// Constructors validate identifiers and operator arity, so a built `Condition`
/// always compiles.
#[derive(Debug, Clone)]
pub struct Condition(Node);

impl Condition {
    /// Create a column condition from an operator and its bound values.
    ///
    /// Fails with `InvalidOperator` when `values.len()` does not match
    /// [`Operator::arity`] (e.g. `IS NULL` given a value, `BETWEEN` given one), or when
    /// `operator` is [`Operator::Exists`] (use [`Condition::exists`]).
    pub fn new<I: IntoIdent>(column: I, operator: Operator, values: Vec<Param>) -> PgResult<Self> {
        let column = column.into_ident()?;

        let node = match (operator, values.as_slice()) {
            (Operator::IsNull, []) => Node::IsNull(column),
            (Operator::IsNotNull, []) => Node::IsNotNull(column),
            (Operator::Between, [low, high]) => Node::Between {
                column,
                low: low.clone(),
                high: high.clone(),
            },
            (Operator::Eq, [v]) => Node::compare(column, CompareOp::Eq, v.clone()),
            (Operator::Like, [v]) => Node::compare(column, CompareOp::Like, v.clone()),
            (Operator::ILike, [v]) => Node::compare(column, CompareOp::ILike, v.clone()),
            (Operator::Any, [v]) => Node::compare(column, CompareOp::Any, v.clone()),
            (Operator::All, [v]) => Node::compare(column, CompareOp::All, v.clone()),
            (Operator::Exists, _) => {
                return Err(PgError::invalid_operator(
                    "EXISTS takes a subquery, not a column comparison",
                ));
            }
            (op, got) => {
                return Err(PgError::invalid_operator(format!(
                    "{op} expects {} value(s), got {}",
                    op.arity().unwrap_or_default(),
                    got.len()
                )));
            }
        };
        Ok(Condition(node))
    }

    // ==================== Convenience constructors ====================

    /// Create an equality condition: column = value
    pub fn eq<I, T>(column: I, value: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::compare(column.into_ident()?, CompareOp::Eq, Param::new(value))))
    }

    /// Create a LIKE condition: column LIKE pattern
    pub fn like<I, T>(column: I, pattern: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::compare(column.into_ident()?, CompareOp::Like, Param::new(pattern))))
    }

    /// Create a case-insensitive ILIKE condition: column ILIKE pattern
    pub fn ilike<I, T>(column: I, pattern: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::compare(column.into_ident()?, CompareOp::ILike, Param::new(pattern))))
    }

    /// Create a BETWEEN condition: column BETWEEN low AND high
    pub fn between<I, T>(column: I, low: T, high: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::Between {
            column: column.into_ident()?,
            low: Param::new(low),
            high: Param::new(high),
        }))
    }

    /// Create an IS NULL condition: column IS NULL
    pub fn is_null<I: IntoIdent>(column: I) -> PgResult<Self> {
        Ok(Condition(Node::IsNull(column.into_ident()?)))
    }

    /// Create an IS NOT NULL condition: column IS NOT NULL
    pub fn is_not_null<I: IntoIdent>(column: I) -> PgResult<Self> {
        Ok(Condition(Node::IsNotNull(column.into_ident()?)))
    }

    /// Create an ANY condition: column = ANY($n), where `array` binds to a PostgreSQL array.
    pub fn any<I, T>(column: I, array: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::compare(column.into_ident()?, CompareOp::Any, Param::new(array))))
    }

    /// Create an ALL condition: column = ALL($n), where `array` binds to a PostgreSQL array.
    pub fn all<I, T>(column: I, array: T) -> PgResult<Self>
    where
        I: IntoIdent,
        T: ToSql + Send + Sync + 'static,
    {
        Ok(Condition(Node::compare(column.into_ident()?, CompareOp::All, Param::new(array))))
    }

    /// Create an EXISTS condition over a subquery.
    ///
    /// The subquery's placeholders continue the numbering of the enclosing statement.
    pub fn exists(subquery: Select) -> Self {
        Condition(Node::Exists(Box::new(subquery)))
    }

    // ==================== Combinators ====================

    /// `self AND other`
    pub fn and(self, other: Condition) -> Self {
        Condition(Node::And(Box::new(self), Box::new(other)))
    }

    /// `self OR other`
    pub fn or(self, other: Condition) -> Self {
        Condition(Node::Or(Box::new(self), Box::new(other)))
    }

    /// `NOT (condition)`
    pub fn not(condition: Condition) -> Self {
        Condition(Node::Not(Box::new(condition)))
    }

    // ==================== Compilation ====================

    /// Compile into a SQL fragment and its parameters, numbering from `$1`.
    pub fn compile(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = self.compile_into(&mut params);
        (sql, params)
    }

    /// Compile into a SQL fragment, appending parameters to `params`.
    ///
    /// Placeholders continue from `params.len() + 1`.
    pub fn compile_into(&self, params: &mut ParamList) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, params);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String, params: &mut ParamList) {
        match &self.0 {
            Node::Compare { column, op, value } => {
                column.write_sql(out);
                let idx = params.push(value.clone());
                match op {
                    CompareOp::Eq => out.push_str(&format!(" = ${idx}")),
                    CompareOp::Like => out.push_str(&format!(" LIKE ${idx}")),
                    CompareOp::ILike => out.push_str(&format!(" ILIKE ${idx}")),
                    CompareOp::Any => out.push_str(&format!(" = ANY(${idx})")),
                    CompareOp::All => out.push_str(&format!(" = ALL(${idx})")),
                }
            }
            Node::Between { column, low, high } => {
                column.write_sql(out);
                let p1 = params.push(low.clone());
                let p2 = params.push(high.clone());
                out.push_str(&format!(" BETWEEN ${p1} AND ${p2}"));
            }
            Node::IsNull(column) => {
                column.write_sql(out);
                out.push_str(" IS NULL");
            }
            Node::IsNotNull(column) => {
                column.write_sql(out);
                out.push_str(" IS NOT NULL");
            }
            Node::And(left, right) => {
                left.write_operand(out, params, Node::is_or);
                out.push_str(" AND ");
                right.write_operand(out, params, Node::is_or);
            }
            Node::Or(left, right) => {
                left.write_operand(out, params, Node::is_and);
                out.push_str(" OR ");
                right.write_operand(out, params, Node::is_and);
            }
            Node::Not(inner) => {
                out.push_str("NOT (");
                inner.write_sql(out, params);
                out.push(')');
            }
            Node::Exists(subquery) => {
                out.push_str("EXISTS (");
                subquery.write_sql(out, params);
                out.push(')');
            }
        }
    }

    /// Write a child of AND/OR, parenthesized when it is the other connective.
    fn write_operand(&self, out: &mut String, params: &mut ParamList, wrap: fn(&Node) -> bool) {
        if wrap(&self.0) {
            out.push('(');
            self.write_sql(out, params);
            out.push(')');
        } else {
            self.write_sql(out, params);
        }
    }
}

impl Node {
    fn compare(column: Ident, op: CompareOp, value: Param) -> Self {
        Node::Compare { column, op, value }
    }

    fn is_and(&self) -> bool {
        matches!(self, Node::And(..))
    }

    fn is_or(&self) -> bool {
        matches!(self, Node::Or(..))
    }
}

impl std::ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::not(self)
    }
}
