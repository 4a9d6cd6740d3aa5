//! Tests for the statement builders.

use super::*;
use crate::condition::Operator;
use crate::error::ErrorKind;
use crate::param::Param;

#[test]
fn select_all_without_condition() {
    let stmt = build_select("accounts", "*", None).unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM accounts;");
    assert!(stmt.params().is_empty());
    assert_eq!(stmt.kind(), StatementKind::Select);
}

#[test]
fn select_ilike_binds_value() {
    let stmt = build_select(
        "accounts",
        ["account_name"],
        Some(Condition::ilike("account_name", "Chase Bank").unwrap()),
    )
    .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT account_name FROM accounts WHERE account_name ILIKE $1;"
    );
    let params: Vec<String> = stmt.params().iter().map(|p| format!("{p:?}")).collect();
    assert_eq!(params, [r#"Param("Chase Bank")"#]);
}

#[test]
fn select_multiple_columns() {
    let stmt = build_select(
        "accounts",
        vec!["account_name", "account_user", "account_password"],
        Some(Condition::eq("account_id", 4i32).unwrap()),
    )
    .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT account_name, account_user, account_password FROM accounts WHERE account_id = $1;"
    );
    assert_eq!(stmt.param_refs().len(), 1);
}

#[test]
fn select_star_list_means_all_columns() {
    let stmt = build_select(
        "accounts",
        ["*"],
        Some(Condition::is_not_null("id").unwrap()),
    )
    .unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM accounts WHERE id IS NOT NULL;");
    assert!(stmt.params().is_empty());
}

#[test]
fn select_single_column_name() {
    let stmt = build_select("users", "username", None).unwrap();
    assert_eq!(stmt.sql(), "SELECT username FROM users;");
}

#[test]
fn select_schema_qualified_table() {
    let stmt = build_select("public.users", Columns::All, None).unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM public.users;");
}

#[test]
fn select_rejects_empty_columns() {
    let empty: Vec<&str> = Vec::new();
    let err = build_select("accounts", empty, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let err = build_select("accounts", Columns::List(Vec::new()), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
}

#[test]
fn select_rejects_star_mixed_with_names() {
    let err = build_select("accounts", ["*", "id"], None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);
}

#[test]
fn select_rejects_bad_identifiers() {
    assert!(build_select("accounts; --", "*", None).is_err());
    assert!(build_select("accounts", ["id, password"], None).is_err());
    assert!(build_select("accounts", "id FROM users", None).is_err());
}

#[test]
fn filter_calls_are_anded() {
    let stmt = Select::new("users", ["username", "password"])
        .unwrap()
        .filter(Condition::is_not_null("id").unwrap())
        .filter(Condition::between("age", 18i32, 65i32).unwrap())
        .compile();
    assert_eq!(
        stmt.sql(),
        "SELECT username, password FROM users WHERE id IS NOT NULL AND age BETWEEN $1 AND $2;"
    );
    assert_eq!(stmt.params().len(), 2);
}

#[test]
fn compiling_twice_is_deterministic() {
    let select = Select::new("accounts", "*")
        .unwrap()
        .filter(Condition::new("name", Operator::Like, vec![Param::new("A%")]).unwrap());
    let a = select.compile();
    let b = select.compile();
    assert_eq!(a.sql(), b.sql());
    assert_eq!(a.params().len(), b.params().len());
}

#[test]
fn nested_exists_numbers_after_outer_params() {
    let orders = Select::new("orders", ["id"])
        .unwrap()
        .filter(Condition::eq("total", 100i64).unwrap());
    let stmt = Select::new("customers", "*")
        .unwrap()
        .filter(Condition::eq("country", "NO").unwrap())
        .filter(Condition::exists(orders))
        .filter(Condition::ilike("name", "a%").unwrap())
        .compile();
    assert_eq!(
        stmt.sql(),
        "SELECT * FROM customers WHERE country = $1 AND EXISTS (SELECT id FROM orders WHERE total = $2) AND name ILIKE $3;"
    );
    assert_eq!(stmt.params().len(), 3);
}

#[test]
fn drop_single_table() {
    let stmt = build_drop(["accounts"]).unwrap();
    assert_eq!(stmt.sql(), "DROP TABLE accounts;");
    assert_eq!(stmt.kind(), StatementKind::Drop);
    assert!(stmt.params().is_empty());
}

#[test]
fn drop_multiple_tables_is_one_statement() {
    let stmt = build_drop(vec!["accounts", "users"]).unwrap();
    assert_eq!(stmt.sql(), "DROP TABLE accounts, users;");
}

#[test]
fn drop_options() {
    let stmt = DropTable::single("audit.events")
        .unwrap()
        .if_exists()
        .cascade()
        .compile();
    assert_eq!(stmt.sql(), "DROP TABLE IF EXISTS audit.events CASCADE;");
}

#[test]
fn drop_rejects_empty_and_duplicates() {
    let none: Vec<&str> = Vec::new();
    assert_eq!(
        build_drop(none).unwrap_err().kind(),
        ErrorKind::InvalidIdentifier
    );
    assert_eq!(
        build_drop(["users", "users"]).unwrap_err().kind(),
        ErrorKind::InvalidIdentifier
    );
}

#[test]
fn drop_rejects_injection() {
    assert!(build_drop(["users; DROP DATABASE prod"]).is_err());
}

#[test]
fn display_shows_sql_only() {
    let stmt = build_select(
        "accounts",
        "*",
        Some(Condition::eq("secret", "hunter2").unwrap()),
    )
    .unwrap();
    let shown = stmt.to_string();
    assert_eq!(shown, "SELECT * FROM accounts WHERE secret = $1;");
    assert!(!shown.contains("hunter2"));
}

#[test]
fn json_values_bind_as_parameters() {
    let stmt = build_select(
        "accounts",
        ["id"],
        Some(Condition::eq("metadata", serde_json::json!({"tier": "gold"})).unwrap()),
    )
    .unwrap();
    assert_eq!(stmt.sql(), "SELECT id FROM accounts WHERE metadata = $1;");
    assert_eq!(stmt.params().len(), 1);
    assert!(!stmt.sql().contains("gold"));
}

#[test]
fn keyword_and_mixed_case_names_are_quoted() {
    let stmt = build_select("order", ["user", "AccountName"], None).unwrap();
    assert_eq!(stmt.sql(), r#"SELECT "user", "AccountName" FROM "order";"#);

    let stmt = build_select(
        "accounts",
        "*",
        Some(Condition::eq("user", "alice").unwrap()),
    )
    .unwrap();
    assert_eq!(stmt.sql(), r#"SELECT * FROM accounts WHERE "user" = $1;"#);

    let stmt = build_drop(["Archive", "order"]).unwrap();
    assert_eq!(stmt.sql(), r#"DROP TABLE "Archive", "order";"#);
}
