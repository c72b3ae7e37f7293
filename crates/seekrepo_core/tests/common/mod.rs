#![allow(dead_code)]

use seekrepo_core::{
    open_db_in_memory, Column, ConnectionOptions, IndexedTable, SqlConnection, StorableClass,
};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub age: i64,
    pub nickname: Option<String>,
}

impl User {
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            name: name.to_string(),
            age,
            nickname: None,
        }
    }
}

pub fn open() -> SqlConnection {
    open_db_in_memory(&ConnectionOptions::default()).unwrap()
}

pub fn id_class() -> StorableClass<i64> {
    let id: Column<i64> = Column::new("id");
    StorableClass::builder()
        .component(id, |id: &i64| *id)
        .build(move |row| id.read(row))
        .unwrap()
}

pub fn user_class() -> StorableClass<User> {
    let name: Column<String> = Column::new("name");
    let age: Column<i64> = Column::new("age");
    let nickname: Column<Option<String>> = Column::new("nickname");
    StorableClass::builder()
        .component(name, |user: &User| user.name.clone())
        .component(age, |user: &User| user.age)
        .component(nickname, |user: &User| user.nickname.clone())
        .build(move |row| {
            Ok(User {
                name: name.read(row)?,
                age: age.read(row)?,
                nickname: nickname.read(row)?,
            })
        })
        .unwrap()
}

pub fn users_table() -> IndexedTable<i64, User> {
    IndexedTable::new("users", id_class(), user_class()).unwrap()
}

/// `users` with a primary key, plus an audit table recording which columns
/// each UPDATE assigned.
pub fn create_users(conn: &SqlConnection) {
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            nickname TEXT
        );
        CREATE TABLE assigned_columns (name TEXT NOT NULL);
        CREATE TRIGGER users_name_assigned AFTER UPDATE OF name ON users
            BEGIN INSERT INTO assigned_columns VALUES ('name'); END;
        CREATE TRIGGER users_age_assigned AFTER UPDATE OF age ON users
            BEGIN INSERT INTO assigned_columns VALUES ('age'); END;
        CREATE TRIGGER users_nickname_assigned AFTER UPDATE OF nickname ON users
            BEGIN INSERT INTO assigned_columns VALUES ('nickname'); END;",
    )
    .unwrap();
}

/// Same shape as `users` but without any uniqueness on `id`.
pub fn create_users_without_key(conn: &SqlConnection) {
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER NOT NULL,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            nickname TEXT
        );",
    )
    .unwrap();
}

/// Columns assigned by UPDATEs so far, sorted by name: triggers on one
/// statement do not fire in declaration order.
pub fn assigned_columns(conn: &SqlConnection) -> Vec<String> {
    let mut stmt = conn
        .connection()
        .prepare("SELECT name FROM assigned_columns ORDER BY name")
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.collect::<Result<Vec<String>, _>>().unwrap()
}

pub fn count_rows(conn: &SqlConnection, table: &str) -> i64 {
    conn.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
