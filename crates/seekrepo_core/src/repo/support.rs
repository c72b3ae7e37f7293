//! Generic get/put/remove/list over table configurations.
//!
//! # Responsibility
//! - Render exactly one statement per call from descriptors.
//! - Bind values in the order the SQL text was emitted.
//! - Enforce the row-count contract of keyed writes.
//!
//! # Invariants
//! - A key identifies at most one row; an UPDATE or DELETE touching more
//!   than one row is reported as `UnexpectedRowCount`.
//! - Configuration errors are raised before any statement is prepared.
//! - Statements and cursors are released on every exit path (RAII).
//! - No locking and no retries: isolation comes from the caller's
//!   transaction.

use super::config::{
    AutogeneratedKeyConfiguration, DirectoryConfiguration, IndexedConfiguration, Keyless,
    ReadableConfiguration, RepositoryIndex,
};
use crate::db::{SqlConnection, TransactionMode};
use crate::error::{ConfigError, ExpectedRows, RepoError, RepoResult, RowOperation};
use crate::model::changed::Changed;
use crate::model::storable::StorableClass;
use crate::query::builder::{BuiltStatement, SqlBuilder};
use crate::query::slicing::SlicingQuery;
use log::{debug, error, warn};
use rusqlite::{Rows, Statement};

/// Repository façade over one borrowed connection.
pub struct RepositorySupport<'conn> {
    conn: &'conn SqlConnection,
}

impl<'conn> RepositorySupport<'conn> {
    pub fn new(conn: &'conn SqlConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &'conn SqlConnection {
        self.conn
    }

    /// Loads the value stored under `key`.
    ///
    /// Returns `Ok(None)` when no row matches. At most one row may match;
    /// only the first one is decoded.
    pub fn get<K, V, C>(&self, config: &C, key: &K) -> RepoResult<Option<V>>
    where
        C: IndexedConfiguration<K, V> + ?Sized,
    {
        let table = config.table_name();
        let mut builder = SqlBuilder::new();
        builder.append("SELECT * FROM ").append(table);
        append_key_predicates(&mut builder, config.key_class(), key, " WHERE ");
        let built = builder.finish();

        let value = self.query(table, &built, |rows| match rows.next()? {
            Some(row) => config.value_class().create_instance(row).map(Some),
            None => Ok(None),
        })?;

        debug!(
            "event=repo_get module=repo status=ok table={} found={}",
            table,
            value.is_some()
        );
        Ok(value)
    }

    /// Inserts `key` and `value` as one new row.
    ///
    /// # Errors
    /// - `UnexpectedRowCount` unless exactly one row was inserted.
    pub fn put_new_entry<K, V, C>(&self, config: &C, key: &K, value: &V) -> RepoResult<()>
    where
        C: IndexedConfiguration<K, V> + ?Sized,
    {
        let table = config.table_name();
        let key_class = config.key_class();
        let value_class = config.value_class();
        let mut builder = SqlBuilder::new();
        builder
            .append("INSERT INTO ")
            .append(table)
            .append(" (")
            .append_joined(
                ", ",
                key_class.column_names().chain(value_class.column_names()),
            )
            .append(") VALUES (")
            .append_bound_tuple_elements(", ", "?", key_class.iter(), key);
        if !key_class.is_empty() && !value_class.is_empty() {
            builder.append(", ");
        }
        builder
            .append_bound_tuple_elements(", ", "?", value_class.iter(), value)
            .append(")");
        let built = builder.finish();

        let inserted = self.execute(table, &built, |sql| {
            self.conn.prepare_statement_without_generated_keys(sql)
        })?;
        check_row_count(
            table,
            built.sql(),
            RowOperation::Insert,
            ExpectedRows::Exactly(1),
            inserted,
        )?;

        debug!("event=repo_insert module=repo status=ok table={table}");
        Ok(())
    }

    /// Inserts `value` and returns the key the store generated for it.
    ///
    /// # Errors
    /// - `UnexpectedRowCount` unless exactly one row was inserted and
    ///   exactly one generated-key row came back.
    pub fn put_new_entry_with_generated_key<K, V, C>(
        &self,
        config: &C,
        value: &V,
    ) -> RepoResult<K>
    where
        C: AutogeneratedKeyConfiguration<K, V> + ?Sized,
    {
        let table = config.table_name();
        let value_class = config.value_class();
        let key_class = config.generated_key_class();
        let mut builder = SqlBuilder::new();
        builder
            .append("INSERT INTO ")
            .append(table)
            .append(" (")
            .append_joined_tuple_elements(", ", "{0}", value_class.iter())
            .append(") VALUES (")
            .append_bound_tuple_elements(", ", "?", value_class.iter(), value)
            .append(")");
        let built = builder.finish();
        let key_columns: Vec<&str> = key_class.column_names().collect();

        let generated_keys = self.query_with(
            table,
            &built,
            |sql| self.conn.prepare_statement_with_generated_keys(sql, &key_columns),
            |rows| {
                let mut keys = Vec::new();
                while let Some(row) = rows.next()? {
                    keys.push(key_class.create_instance(row));
                }
                Ok(keys)
            },
        )?;

        let key = generated_key(table, built.sql(), self.conn.last_changes(), generated_keys)?;
        debug!("event=repo_insert_generated module=repo status=ok table={table}");
        Ok(key)
    }

    /// Writes only the value columns that differ between old and new.
    ///
    /// Returns `Ok(false)` without touching the store when nothing differs,
    /// and `Ok(false)` when no row matches `key`.
    ///
    /// # Errors
    /// - `UnexpectedRowCount` when more than one row matched `key`. The
    ///   UPDATE has already run at that point; roll back the caller's
    ///   transaction to undo it.
    pub fn put_if_exists<K, V, C>(
        &self,
        config: &C,
        key: &K,
        changed: &Changed<V>,
    ) -> RepoResult<bool>
    where
        C: IndexedConfiguration<K, V> + ?Sized,
    {
        let table = config.table_name();
        let assignments = changed.changed_components(config.value_class());
        if assignments.is_empty() {
            debug!("event=repo_update module=repo status=skipped table={table} reason=unchanged");
            return Ok(false);
        }

        let mut builder = SqlBuilder::new();
        builder
            .append("UPDATE ")
            .append(table)
            .append(" SET ")
            .append_bound_tuple_elements(
                ", ",
                "{0} = ?",
                assignments.iter().copied(),
                changed.new_value(),
            );
        append_key_predicates(&mut builder, config.key_class(), key, " WHERE ");
        let built = builder.finish();

        let updated = self.execute(table, &built, |sql| self.conn.prepare_statement(sql))?;
        check_row_count(
            table,
            built.sql(),
            RowOperation::Update,
            ExpectedRows::AtMost(1),
            updated,
        )?;

        debug!(
            "event=repo_update module=repo status=ok table={} columns={} updated={}",
            table,
            assignments.len(),
            updated
        );
        Ok(updated == 1)
    }

    /// Upsert: updates the changed columns when `key` exists, inserts
    /// otherwise. Returns `true` when a row was written.
    ///
    /// This is a read followed by a separate write, with no lock taken here.
    /// Concurrent writers to the same key outside a caller-held transaction
    /// can lose updates, and two concurrent inserts of an absent key race:
    /// one of them fails on the store's uniqueness constraint.
    pub fn put<K, V, C>(&self, config: &C, key: &K, value: V) -> RepoResult<bool>
    where
        C: IndexedConfiguration<K, V> + ?Sized,
    {
        match self.get(config, key)? {
            Some(old) => self.put_if_exists(config, key, &Changed::from_to(old, value)),
            None => {
                self.put_new_entry(config, key, &value)?;
                Ok(true)
            }
        }
    }

    /// Deletes the row stored under `key`. Returns whether a row was removed.
    ///
    /// # Errors
    /// - `UnexpectedRowCount` when more than one row matched `key`. The
    ///   DELETE has already run at that point; roll back the caller's
    ///   transaction to undo it.
    pub fn remove<K, C>(&self, config: &C, key: &K) -> RepoResult<bool>
    where
        C: RepositoryIndex<K> + ?Sized,
    {
        let table = config.table_name();
        let mut builder = SqlBuilder::new();
        builder.append("DELETE FROM ").append(table);
        append_key_predicates(&mut builder, config.key_class(), key, " WHERE ");
        let built = builder.finish();

        let removed = self.execute(table, &built, |sql| self.conn.prepare_statement(sql))?;
        check_row_count(
            table,
            built.sql(),
            RowOperation::Delete,
            ExpectedRows::AtMost(1),
            removed,
        )?;

        debug!("event=repo_remove module=repo status=ok table={table} removed={removed}");
        Ok(removed == 1)
    }

    /// Lists one page of entries stored under `key`.
    ///
    /// Renders `SELECT * FROM t [WHERE key... [AND keyset]] [ORDER BY ...]
    /// [LIMIT ?]` and binds key values, then boundary projections, then the
    /// limit. The page is reversed after fetch when the query asks for it.
    ///
    /// # Errors
    /// - `Config` when a boundary or order is requested with an empty
    ///   ordering class, or the limit is zero.
    pub fn entry_list<K, V, O, C>(
        &self,
        config: &C,
        key: &K,
        slicing: &SlicingQuery<O>,
    ) -> RepoResult<Vec<V>>
    where
        C: DirectoryConfiguration<K, V, O> + ?Sized,
    {
        let table = config.table_name();
        let key_class = config.key_class();
        let ordering = config.ordering_class();
        validate_slicing(slicing, ordering).map_err(|source| config_failure(table, source))?;

        let mut builder = SqlBuilder::new();
        builder.append("SELECT * FROM ").append(table);
        if slicing.has_conditions() || !key_class.is_empty() {
            builder.append(" WHERE ");
        }
        builder.append_bound_tuple_elements(" AND ", "{0} = ?", key_class.iter(), key);
        if let Some(boundary) = slicing.boundary() {
            if !key_class.is_empty() {
                builder.append(" AND ");
            }
            builder
                .append_keyset_condition(boundary, ordering)
                .map_err(|source| config_failure(table, source))?;
        }
        builder
            .append_order_by(slicing.order(), ordering)
            .map_err(|source| config_failure(table, source))?;
        if let Some(limit) = slicing.limit() {
            builder.append_bound_value(" LIMIT ?", i64::from(limit));
        }
        let built = builder.finish();

        let mut entries = self.query(table, &built, |rows| {
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(config.entry_class().create_instance(row)?);
            }
            Ok(entries)
        })?;
        if slicing.needs_reverse() {
            entries.reverse();
        }

        debug!(
            "event=repo_list module=repo status=ok table={} rows={} reversed={}",
            table,
            entries.len(),
            slicing.needs_reverse()
        );
        Ok(entries)
    }

    /// Lists one page of a keyless table.
    pub fn reader_entry_list<V, O, C>(
        &self,
        config: &C,
        slicing: &SlicingQuery<O>,
    ) -> RepoResult<Vec<V>>
    where
        C: ReadableConfiguration<V, O> + ?Sized,
    {
        self.entry_list(&Keyless::new(config), &(), slicing)
    }

    pub fn begin_transaction(&self) -> RepoResult<()> {
        Ok(self.conn.begin_transaction()?)
    }

    pub fn begin_transaction_with(&self, mode: TransactionMode) -> RepoResult<()> {
        Ok(self.conn.begin_transaction_with(mode)?)
    }

    pub fn commit_transaction(&self) -> RepoResult<()> {
        Ok(self.conn.commit_transaction()?)
    }

    pub fn rollback_transaction(&self) -> RepoResult<()> {
        Ok(self.conn.rollback_transaction()?)
    }

    pub fn rollback_transaction_if_not_committed(&self) -> RepoResult<()> {
        Ok(self.conn.rollback_transaction_if_not_committed()?)
    }

    /// Runs `f` in a transaction; commits on `Ok`, rolls back on `Err`.
    pub fn transaction<T>(
        &self,
        mode: TransactionMode,
        f: impl FnOnce(&Self) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.conn.with_transaction(mode, |_| f(self))
    }

    fn query<R>(
        &self,
        table: &str,
        built: &BuiltStatement<'_>,
        read: impl FnOnce(&mut Rows<'_>) -> rusqlite::Result<R>,
    ) -> RepoResult<R> {
        self.query_with(table, built, |sql| self.conn.prepare_statement(sql), read)
    }

    fn query_with<R>(
        &self,
        table: &str,
        built: &BuiltStatement<'_>,
        prepare: impl FnOnce(&str) -> rusqlite::Result<Statement<'conn>>,
        read: impl FnOnce(&mut Rows<'_>) -> rusqlite::Result<R>,
    ) -> RepoResult<R> {
        let run = || -> rusqlite::Result<R> {
            let mut stmt = prepare(built.sql())?;
            built.bind_all(&mut stmt)?;
            let mut rows = stmt.raw_query();
            read(&mut rows)
        };
        run().map_err(|source| store_failure(table, built.sql(), source))
    }

    fn execute(
        &self,
        table: &str,
        built: &BuiltStatement<'_>,
        prepare: impl FnOnce(&str) -> rusqlite::Result<Statement<'conn>>,
    ) -> RepoResult<usize> {
        let run = || -> rusqlite::Result<usize> {
            let mut stmt = prepare(built.sql())?;
            built.bind_all(&mut stmt)?;
            stmt.raw_execute()
        };
        run().map_err(|source| store_failure(table, built.sql(), source))
    }
}

fn append_key_predicates<'a, K>(
    builder: &mut SqlBuilder<'a>,
    key_class: &'a StorableClass<K>,
    key: &'a K,
    prefix: &str,
) {
    if !key_class.is_empty() {
        builder
            .append(prefix)
            .append_bound_tuple_elements(" AND ", "{0} = ?", key_class.iter(), key);
    }
}

/// Row counts are checked before any generated key is decoded.
fn generated_key<K>(
    table: &str,
    sql: &str,
    inserted: usize,
    mut generated_keys: Vec<rusqlite::Result<K>>,
) -> RepoResult<K> {
    check_row_count(
        table,
        sql,
        RowOperation::Insert,
        ExpectedRows::Exactly(1),
        inserted,
    )?;
    let returned = generated_keys.len();
    match (generated_keys.pop(), returned) {
        (Some(Ok(key)), 1) => Ok(key),
        (Some(Err(source)), 1) => Err(store_failure(table, sql, source)),
        _ => Err(row_count_violation(
            table,
            sql,
            RowOperation::GeneratedKey,
            ExpectedRows::Exactly(1),
            returned,
        )),
    }
}

fn validate_slicing<O>(
    slicing: &SlicingQuery<O>,
    ordering: &StorableClass<O>,
) -> Result<(), ConfigError> {
    if slicing.limit() == Some(0) {
        return Err(ConfigError::ZeroLimit);
    }
    if ordering.is_empty() {
        if slicing.has_conditions() {
            return Err(ConfigError::EmptyOrdering { clause: "WHERE" });
        }
        if slicing.is_ordered() {
            return Err(ConfigError::EmptyOrdering { clause: "ORDER BY" });
        }
    }
    Ok(())
}

fn check_row_count(
    table: &str,
    sql: &str,
    operation: RowOperation,
    expected: ExpectedRows,
    actual: usize,
) -> RepoResult<()> {
    if expected.admits(actual) {
        Ok(())
    } else {
        Err(row_count_violation(table, sql, operation, expected, actual))
    }
}

fn row_count_violation(
    table: &str,
    sql: &str,
    operation: RowOperation,
    expected: ExpectedRows,
    actual: usize,
) -> RepoError {
    warn!(
        "event=repo_row_count module=repo status=error table={} operation={:?} expected={:?} actual={}",
        table, operation, expected, actual
    );
    RepoError::UnexpectedRowCount {
        table: table.to_string(),
        sql: sql.to_string(),
        operation,
        expected,
        actual,
    }
}

fn store_failure(table: &str, sql: &str, source: rusqlite::Error) -> RepoError {
    error!(
        "event=repo_query module=repo status=error table={} error_code=store_failure error={}",
        table, source
    );
    RepoError::Store {
        table: table.to_string(),
        sql: sql.to_string(),
        source,
    }
}

fn config_failure(table: &str, source: ConfigError) -> RepoError {
    warn!(
        "event=repo_config module=repo status=error table={} error={}",
        table, source
    );
    RepoError::Config {
        table: table.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::generated_key;
    use crate::error::{ExpectedRows, RepoError, RowOperation};
    use rusqlite::types::Type;

    const SQL: &str = "INSERT INTO users (name) VALUES (?) RETURNING id";

    fn undecodable() -> rusqlite::Error {
        rusqlite::Error::InvalidColumnType(0, "id".to_string(), Type::Null)
    }

    #[test]
    fn no_inserted_row_wins_over_an_undecodable_key() {
        let result = generated_key::<i64>("users", SQL, 0, vec![Err(undecodable())]);
        assert!(matches!(
            result,
            Err(RepoError::UnexpectedRowCount {
                operation: RowOperation::Insert,
                expected: ExpectedRows::Exactly(1),
                actual: 0,
                ..
            })
        ));
    }

    #[test]
    fn missing_or_extra_key_rows_are_row_count_violations() {
        let missing = generated_key::<i64>("users", SQL, 1, Vec::new());
        assert!(matches!(
            missing,
            Err(RepoError::UnexpectedRowCount {
                operation: RowOperation::GeneratedKey,
                expected: ExpectedRows::Exactly(1),
                actual: 0,
                ..
            })
        ));

        let extra = generated_key::<i64>("users", SQL, 1, vec![Ok(1), Ok(2)]);
        assert!(matches!(
            extra,
            Err(RepoError::UnexpectedRowCount {
                operation: RowOperation::GeneratedKey,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn single_key_row_is_decoded_once_the_insert_is_confirmed() {
        let key = generated_key::<i64>("users", SQL, 1, vec![Ok(7)]);
        assert!(matches!(key, Ok(7)));

        let result = generated_key::<i64>("users", SQL, 1, vec![Err(undecodable())]);
        let err = result.unwrap_err();
        assert!(matches!(err, RepoError::Store { ref table, .. } if table == "users"));
        assert_eq!(err.sql(), Some(SQL));
    }
}
