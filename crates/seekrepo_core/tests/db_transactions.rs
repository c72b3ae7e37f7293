mod common;

use common::{count_rows, create_users, open, users_table, User};
use seekrepo_core::{
    open_db, ConnectionOptions, DbError, RepoError, RepositorySupport, TransactionMode,
};
use std::time::Duration;

#[test]
fn file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.sqlite3");
    let users = users_table();

    let id: i64 = {
        let conn = open_db(&path, &ConnectionOptions::default()).unwrap();
        create_users(&conn);
        RepositorySupport::new(&conn)
            .put_new_entry_with_generated_key(&users, &User::new("Ann", 30))
            .unwrap()
    };

    let conn = open_db(&path, &ConnectionOptions::default()).unwrap();
    let loaded = RepositorySupport::new(&conn).get(&users, &id).unwrap();
    assert_eq!(loaded, Some(User::new("Ann", 30)));
}

#[test]
fn open_applies_connection_options() {
    let dir = tempfile::tempdir().unwrap();
    let options = ConnectionOptions {
        busy_timeout: Duration::from_millis(250),
        foreign_keys: false,
    };
    let conn = open_db(dir.path().join("opts.sqlite3"), &options).unwrap();

    let foreign_keys: i64 = conn
        .connection()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    let busy_timeout: i64 = conn
        .connection()
        .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 0);
    assert_eq!(busy_timeout, 250);
}

#[test]
fn open_fails_for_unreachable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("db.sqlite3");
    let result = open_db(path, &ConnectionOptions::default());
    assert!(matches!(result, Err(DbError::Sqlite(_))));
}

#[test]
fn commit_keeps_and_rollback_discards_writes() {
    let conn = open();
    create_users(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    repo.begin_transaction().unwrap();
    repo.put_new_entry(&users, &1, &User::new("Ann", 30))
        .unwrap();
    repo.commit_transaction().unwrap();

    repo.begin_transaction_with(TransactionMode::Exclusive)
        .unwrap();
    repo.put_new_entry(&users, &2, &User::new("Bob", 41))
        .unwrap();
    repo.rollback_transaction().unwrap();

    assert_eq!(count_rows(&conn, "users"), 1);
    assert!(repo.get(&users, &2).unwrap().is_none());
}

#[test]
fn transaction_control_is_checked_against_connection_state() {
    let conn = open();
    let repo = RepositorySupport::new(&conn);

    assert!(matches!(
        repo.commit_transaction(),
        Err(RepoError::Db(DbError::NoActiveTransaction))
    ));
    assert!(matches!(
        repo.rollback_transaction(),
        Err(RepoError::Db(DbError::NoActiveTransaction))
    ));
    repo.rollback_transaction_if_not_committed().unwrap();

    repo.begin_transaction().unwrap();
    assert!(matches!(
        repo.begin_transaction(),
        Err(RepoError::Db(DbError::TransactionAlreadyActive))
    ));
    repo.rollback_transaction_if_not_committed().unwrap();
    assert!(!conn.in_transaction());
}

#[test]
fn scoped_transaction_commits_on_ok_and_rolls_back_on_err() {
    let conn = open();
    create_users(&conn);
    let users = users_table();
    let repo = RepositorySupport::new(&conn);

    let id = repo
        .transaction(TransactionMode::Deferred, |repo| {
            repo.put_new_entry_with_generated_key::<i64, _, _>(&users, &User::new("Ann", 30))
        })
        .unwrap();

    let result: Result<(), RepoError> = repo.transaction(TransactionMode::Immediate, |repo| {
        repo.put(&users, &id, User::new("Ann", 99))?;
        repo.put_new_entry(&users, &id, &User::new("Dup", 1))
    });

    assert!(matches!(result, Err(RepoError::Store { .. })));
    assert!(!conn.in_transaction());
    assert_eq!(repo.get(&users, &id).unwrap(), Some(User::new("Ann", 30)));
}

#[test]
fn failed_commit_rolls_back_and_frees_the_connection() {
    let conn = open();
    conn.execute_batch(
        "CREATE TABLE parent (id INTEGER PRIMARY KEY);
        CREATE TABLE child (
            id INTEGER PRIMARY KEY,
            pid INTEGER NOT NULL REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
        );",
    )
    .unwrap();
    let repo = RepositorySupport::new(&conn);

    let result: Result<(), RepoError> = repo.transaction(TransactionMode::Deferred, |repo| {
        repo.connection()
            .execute_batch("INSERT INTO child (pid) VALUES (42);")?;
        Ok(())
    });

    assert!(matches!(result, Err(RepoError::Db(DbError::Sqlite(_)))));
    assert!(!conn.in_transaction());
    assert_eq!(count_rows(&conn, "child"), 0);

    repo.begin_transaction_with(TransactionMode::Immediate)
        .unwrap();
    assert!(conn.in_transaction());
    repo.rollback_transaction().unwrap();
    assert!(!conn.in_transaction());
}
