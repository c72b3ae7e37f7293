mod common;

use common::{count_rows, create_users_without_key, id_class, open, user_class, users_table, User};
use seekrepo_core::{
    Changed, ExpectedRows, IndexedTable, RepoError, RepositorySupport, RowOperation, SqlConnection,
    TransactionMode,
};

/// `users` as a view whose inserts are swallowed by an INSTEAD OF trigger.
fn create_users_view_ignoring_inserts(conn: &SqlConnection) {
    conn.execute_batch(
        "CREATE TABLE users_store (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            nickname TEXT
        );
        CREATE VIEW users AS SELECT id, name, age, nickname FROM users_store;
        CREATE TRIGGER users_insert INSTEAD OF INSERT ON users BEGIN SELECT 1; END;",
    )
    .unwrap();
}

fn seed_shared_key(conn: &SqlConnection) {
    conn.execute_batch(
        "INSERT INTO users (id, name, age) VALUES (1, 'Ann', 30);
         INSERT INTO users (id, name, age) VALUES (1, 'Ann', 30);
         INSERT INTO users (id, name, age) VALUES (2, 'Bob', 41);",
    )
    .unwrap();
}

#[test]
fn update_touching_two_rows_is_an_invariant_violation() {
    let conn = open();
    create_users_without_key(&conn);
    seed_shared_key(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let changed = Changed::from_to(User::new("Ann", 30), User::new("Ann", 31));
    let err = repo.put_if_exists(&users, &1, &changed).unwrap_err();

    match err {
        RepoError::UnexpectedRowCount {
            table,
            sql,
            operation,
            expected,
            actual,
        } => {
            assert_eq!(table, "users");
            assert_eq!(sql, "UPDATE users SET age = ? WHERE id = ?");
            assert_eq!(operation, RowOperation::Update);
            assert_eq!(expected, ExpectedRows::AtMost(1));
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn delete_touching_two_rows_is_an_invariant_violation() {
    let conn = open();
    create_users_without_key(&conn);
    seed_shared_key(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let err = repo.remove(&users, &1).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UnexpectedRowCount {
            operation: RowOperation::Delete,
            actual: 2,
            ..
        }
    ));
    assert_eq!(err.sql(), Some("DELETE FROM users WHERE id = ?"));

    // The single-row key is unaffected by the contract.
    assert!(repo.remove(&users, &2).unwrap());
}

#[test]
fn rolled_back_transaction_undoes_a_violating_delete() {
    let conn = open();
    create_users_without_key(&conn);
    seed_shared_key(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let result = repo.transaction(TransactionMode::Immediate, |repo| repo.remove(&users, &1));

    assert!(matches!(
        result,
        Err(RepoError::UnexpectedRowCount { actual: 2, .. })
    ));
    assert!(!conn.in_transaction());
    assert_eq!(count_rows(&conn, "users"), 3);
}

#[test]
fn manual_rollback_after_violation_restores_rows() {
    let conn = open();
    create_users_without_key(&conn);
    seed_shared_key(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    repo.begin_transaction().unwrap();
    let changed = Changed::from_to(User::new("Ann", 30), User::new("Zed", 30));
    assert!(repo.put_if_exists(&users, &1, &changed).is_err());
    repo.rollback_transaction_if_not_committed().unwrap();

    let names: Vec<String> = conn
        .connection()
        .prepare("SELECT name FROM users WHERE id = 1")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, ["Ann", "Ann"]);
}

#[test]
fn undecodable_generated_key_is_a_store_failure() {
    let conn = open();
    create_users_without_key(&conn);
    conn.execute_batch(
        "CREATE TABLE mirrored (id INTEGER, name TEXT NOT NULL, age INTEGER NOT NULL, nickname TEXT);",
    )
    .unwrap();
    let users = IndexedTable::new("mirrored", id_class(), user_class()).unwrap();
    let repo = RepositorySupport::new(&conn);

    // `id` is never assigned, so the returned key column is NULL and cannot
    // decode as i64.
    let err = repo
        .put_new_entry_with_generated_key(&users, &User::new("Ann", 30))
        .unwrap_err();
    assert!(matches!(err, RepoError::Store { .. }));
    assert_eq!(
        err.sql(),
        Some("INSERT INTO mirrored (name, age, nickname) VALUES (?, ?, ?)")
    );
}

#[test]
fn insert_writing_no_row_is_an_invariant_violation() {
    let conn = open();
    create_users_view_ignoring_inserts(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let err = repo
        .put_new_entry(&users, &1, &User::new("Ann", 30))
        .unwrap_err();
    match err {
        RepoError::UnexpectedRowCount {
            ref table,
            operation,
            expected,
            actual,
            ..
        } => {
            assert_eq!(table, "users");
            assert_eq!(operation, RowOperation::Insert);
            assert_eq!(expected, ExpectedRows::Exactly(1));
            assert_eq!(actual, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.sql(),
        Some("INSERT INTO users (id, name, age, nickname) VALUES (?, ?, ?, ?)")
    );
    assert_eq!(count_rows(&conn, "users_store"), 0);
}

#[test]
fn generated_key_insert_writing_no_row_reports_the_insert_count() {
    let conn = open();
    create_users_view_ignoring_inserts(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let result = repo.put_new_entry_with_generated_key(&users, &User::new("Ann", 30));
    assert!(matches!(
        result,
        Err(RepoError::UnexpectedRowCount {
            operation: RowOperation::Insert,
            expected: ExpectedRows::Exactly(1),
            actual: 0,
            ..
        })
    ));
    assert_eq!(count_rows(&conn, "users_store"), 0);
}
