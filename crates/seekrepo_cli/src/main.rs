//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one insert/get/put/remove round trip against a real SQLite store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `seekrepo_cli [DB_PATH]` (in-memory when omitted).
//! Logs go to `<temp dir>/seekrepo`.

use seekrepo_core::{
    default_log_level, init_logging, open_db, open_db_in_memory, Column, ConnectionOptions,
    IndexedTable, LoggingConfig, RepositorySupport, SqlConnection, StorableClass,
};
use std::error::Error;
use std::process::ExitCode;

#[derive(Debug, Clone, PartialEq)]
struct User {
    name: String,
    age: i64,
}

fn users_table() -> Result<IndexedTable<i64, User>, Box<dyn Error>> {
    let id: Column<i64> = Column::new("id");
    let name: Column<String> = Column::new("name");
    let age: Column<i64> = Column::new("age");
    let key = StorableClass::builder()
        .component(id, |id: &i64| *id)
        .build(move |row| id.read(row))?;
    let value = StorableClass::builder()
        .component(name, |user: &User| user.name.clone())
        .component(age, |user: &User| user.age)
        .build(move |row| {
            Ok(User {
                name: name.read(row)?,
                age: age.read(row)?,
            })
        })?;
    Ok(IndexedTable::new("users", key, value)?)
}

fn open(path: Option<String>) -> Result<SqlConnection, Box<dyn Error>> {
    let options = ConnectionOptions::default();
    let conn = match path {
        Some(path) => open_db(path, &options)?,
        None => open_db_in_memory(&options)?,
    };
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL
        );",
    )?;
    Ok(conn)
}

fn run(path: Option<String>) -> Result<(), Box<dyn Error>> {
    let log_dir = std::env::temp_dir().join("seekrepo");
    init_logging(&LoggingConfig::new(default_log_level(), &log_dir))?;
    println!("logging dir={}", log_dir.display());

    let conn = open(path)?;
    let users = users_table()?;
    let repo = RepositorySupport::new(&conn);

    let ann = User {
        name: "Ann".to_string(),
        age: 30,
    };
    let id: i64 = repo.put_new_entry_with_generated_key(&users, &ann)?;
    println!("insert id={id}");

    let loaded = repo.get(&users, &id)?;
    println!("get found={}", loaded.is_some());

    let older = User { age: 31, ..ann };
    let written = repo.put(&users, &id, older)?;
    let age = repo.get(&users, &id)?.map(|user| user.age);
    println!("put written={written} age={age:?}");

    println!("remove first={}", repo.remove(&users, &id)?);
    println!("remove second={}", repo.remove(&users, &id)?);
    println!("seekrepo_core version={}", seekrepo_core::core_version());
    Ok(())
}

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("seekrepo_cli failed: {err}");
            ExitCode::FAILURE
        }
    }
}
