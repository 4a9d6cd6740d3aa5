//! Validated SQL identifiers.
//!
//! [`Ident`] is the only way a table or column name reaches generated SQL text.
//! Every dot-separated part must match `[A-Za-z_][A-Za-z0-9_]*` and fit in
//! 63 bytes (PostgreSQL silently truncates longer names).
//!
//! Names are case-sensitive. A part is written bare when PostgreSQL would read it
//! back unchanged (lowercase and not a keyword); anything else, such as `user`,
//! `order` or `AccountName`, is double-quoted. The allow-list never admits `"`,
//! so quoting needs no escaping.
//!
//! # Example
//! ```ignore
//! use pgfacade::Ident;
//!
//! let t = Ident::parse("public.accounts")?;
//! assert_eq!(t.to_sql(), "public.accounts");
//! assert_eq!(Ident::parse("AccountName")?.to_sql(), r#""AccountName""#);
//! assert!(Ident::parse("accounts; DROP TABLE users").is_err());
//! # Ok::<(), pgfacade::PgError>(())
//! ```

use crate::error::{PgError, PgResult};
use std::fmt;

/// Longest identifier PostgreSQL keeps without truncation (`NAMEDATALEN - 1`).
pub const MAX_IDENT_LEN: usize = 63;

/// A SQL identifier (table or column name), optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse and validate an identifier such as `accounts` or `public.accounts`.
    pub fn parse(s: &str) -> PgResult<Self> {
        if s.is_empty() {
            return Err(PgError::invalid_identifier("identifier cannot be empty"));
        }

        let parts = s
            .split('.')
            .map(|part| validate_part(s, part).map(str::to_string))
            .collect::<PgResult<Vec<_>>>()?;

        Ok(Self { parts })
    }

    /// Whether `s` would be accepted by [`Ident::parse`].
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// The dot-separated parts, outermost first.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The last part (the bare table or column name).
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if needs_quotes(part) {
                out.push('"');
                out.push_str(part);
                out.push('"');
            } else {
                out.push_str(part);
            }
        }
    }
}

/// Keywords that cannot appear bare as a table or column name in every position
/// (PostgreSQL's reserved, type/function-name and column-name categories).
const KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "bigint", "binary", "bit", "boolean", "both", "case", "cast",
    "char", "character", "check", "coalesce", "collate", "collation", "column",
    "concurrently", "constraint", "create", "cross", "current_catalog", "current_date",
    "current_role", "current_schema", "current_time", "current_timestamp", "current_user",
    "dec", "decimal", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "exists", "extract", "false", "fetch", "float", "for", "foreign", "freeze",
    "from", "full", "grant", "greatest", "group", "grouping", "having", "ilike", "in",
    "initially", "inner", "inout", "int", "integer", "intersect", "interval", "into", "is",
    "isnull", "join", "json", "json_array", "json_arrayagg", "json_exists", "json_object",
    "json_objectagg", "json_query", "json_scalar", "json_serialize", "json_table",
    "json_value", "lateral", "leading", "least", "left", "like", "limit", "localtime",
    "localtimestamp", "merge_action", "national", "natural", "nchar", "none", "normalize",
    "not", "notnull", "null", "nullif", "numeric", "offset", "on", "only", "or", "order",
    "out", "outer", "overlaps", "overlay", "placing", "position", "precision", "primary",
    "real", "references", "returning", "right", "row", "select", "session_user", "setof",
    "similar", "smallint", "some", "substring", "symmetric", "system_user", "table",
    "tablesample", "then", "time", "timestamp", "to", "trailing", "treat", "trim", "true",
    "union", "unique", "user", "using", "values", "varchar", "variadic", "verbose", "when",
    "where", "window", "with", "xmlattributes", "xmlconcat", "xmlelement", "xmlexists",
    "xmlforest", "xmlnamespaces", "xmlparse", "xmlpi", "xmlroot", "xmlserialize", "xmltable",
];

fn needs_quotes(part: &str) -> bool {
    part.bytes().any(|b| b.is_ascii_uppercase()) || KEYWORDS.contains(&part)
}

fn validate_part<'a>(whole: &str, part: &'a str) -> PgResult<&'a str> {
    if part.is_empty() {
        return Err(PgError::invalid_identifier(format!(
            "empty segment in identifier '{whole}'"
        )));
    }
    if part.len() > MAX_IDENT_LEN {
        return Err(PgError::invalid_identifier(format!(
            "identifier segment '{part}' exceeds {MAX_IDENT_LEN} bytes"
        )));
    }

    let mut chars = part.chars();
    if let Some(first) = chars.next()
        && !(first == '_' || first.is_ascii_alphabetic())
    {
        return Err(PgError::invalid_identifier(format!(
            "invalid start character '{first}' in identifier '{whole}'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
        return Err(PgError::invalid_identifier(format!(
            "invalid character '{bad}' in identifier '{whole}'"
        )));
    }
    Ok(part)
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl std::str::FromStr for Ident {
    type Err = PgError;

    fn from_str(s: &str) -> PgResult<Self> {
        Self::parse(s)
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> PgResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> PgResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> PgResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> PgResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> PgResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> PgResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("accounts").unwrap();
        assert_eq!(ident.to_sql(), "accounts");
        assert_eq!(ident.name(), "accounts");
    }

    #[test]
    fn ident_schema_qualified() {
        let ident = Ident::parse("public.accounts").unwrap();
        assert_eq!(ident.to_sql(), "public.accounts");
        assert_eq!(ident.parts(), ["public", "accounts"]);
        assert_eq!(ident.name(), "accounts");
    }

    #[test]
    fn keywords_and_mixed_case_are_quoted() {
        assert_eq!(Ident::parse("user").unwrap().to_sql(), r#""user""#);
        assert_eq!(Ident::parse("order").unwrap().to_sql(), r#""order""#);
        assert_eq!(Ident::parse("AccountName").unwrap().to_sql(), r#""AccountName""#);
        assert_eq!(
            Ident::parse("Sales.order").unwrap().to_sql(),
            r#""Sales"."order""#
        );
        assert_eq!(Ident::parse("user_id").unwrap().to_sql(), "user_id");
        assert_eq!(Ident::parse("name").unwrap().to_sql(), "name");
    }

    #[test]
    fn keyword_case_variants_stay_distinct() {
        // `USER` and `user` name different objects once quoted.
        assert_eq!(Ident::parse("USER").unwrap().to_sql(), r#""USER""#);
        assert_ne!(Ident::parse("USER").unwrap(), Ident::parse("user").unwrap());
    }

    #[test]
    fn ident_underscores_and_digits() {
        for name in ["_", "_private", "account_name", "t1", "A_B_9"] {
            assert!(Ident::is_valid(name), "{name} should be valid");
        }
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
    }

    #[test]
    fn ident_rejects_start_digit() {
        assert!(Ident::parse("1table").is_err());
    }

    #[test]
    fn ident_rejects_space() {
        assert!(Ident::parse("my table").is_err());
    }

    #[test]
    fn ident_rejects_dollar_and_quotes() {
        assert!(Ident::parse("my_var$1").is_err());
        assert!(Ident::parse(r#""CamelCase""#).is_err());
    }

    #[test]
    fn ident_rejects_double_dot() {
        assert!(Ident::parse("schema..table").is_err());
    }

    #[test]
    fn ident_rejects_trailing_dot() {
        assert!(Ident::parse("schema.").is_err());
    }

    #[test]
    fn ident_rejects_non_ascii_letters() {
        assert!(Ident::parse("compté").is_err());
    }

    #[test]
    fn ident_length_limit() {
        let ok = "a".repeat(MAX_IDENT_LEN);
        let too_long = "a".repeat(MAX_IDENT_LEN + 1);
        assert!(Ident::is_valid(&ok));
        assert!(!Ident::is_valid(&too_long));
    }

    #[test]
    fn every_disallowed_ascii_char_is_rejected() {
        for b in 0u8..=127 {
            let c = b as char;
            if c == '_' || c == '.' || c.is_ascii_alphanumeric() {
                continue;
            }
            let name = format!("col{c}x");
            let err = Ident::parse(&name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidIdentifier, "{name:?}");
        }
    }

    #[test]
    fn injection_attempt_is_rejected() {
        let err = Ident::parse("accounts; DROP TABLE users").unwrap_err();
        assert!(err.is_validation());
    }
}
