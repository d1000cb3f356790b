use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::error::{Error, Result};
use crate::models::{CandidateUser, LicenseTally};
use crate::taxonomy::LicenseBucket;

pub struct Storage {
    conn: Connection,
}

/// Counter state of one `locations` row, read back for reporting and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRow {
    pub developers: u64,
    counts: HashMap<LicenseBucket, u64>,
}

impl LocationRow {
    pub fn count(&self, bucket: LicenseBucket) -> u64 {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init_db()?;
        Ok(storage)
    }

    fn init_db(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                login TEXT UNIQUE NOT NULL,
                city TEXT,
                state TEXT,
                country_code TEXT,
                deleted INTEGER NOT NULL DEFAULT 0,
                fake INTEGER NOT NULL DEFAULT 0,
                type TEXT NOT NULL DEFAULT 'USR'
            );

            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                country TEXT NOT NULL,
                license_other INTEGER NOT NULL DEFAULT 0,
                license_wtfpl INTEGER NOT NULL DEFAULT 0,
                license_lgpl30 INTEGER NOT NULL DEFAULT 0,
                license_bsd3 INTEGER NOT NULL DEFAULT 0,
                license_unlicense INTEGER NOT NULL DEFAULT 0,
                license_lgpl21 INTEGER NOT NULL DEFAULT 0,
                license_apache20 INTEGER NOT NULL DEFAULT 0,
                license_bsd2 INTEGER NOT NULL DEFAULT 0,
                license_epl10 INTEGER NOT NULL DEFAULT 0,
                license_agpl30 INTEGER NOT NULL DEFAULT 0,
                license_mit INTEGER NOT NULL DEFAULT 0,
                license_gpl20 INTEGER NOT NULL DEFAULT 0,
                license_mpl20 INTEGER NOT NULL DEFAULT 0,
                license_gpl30 INTEGER NOT NULL DEFAULT 0,
                developers INTEGER NOT NULL DEFAULT 0,
                UNIQUE(city, state, country)
            );

            CREATE INDEX IF NOT EXISTS idx_locations_triple ON locations(city, state, country);
            "#,
        )?;

        Ok(())
    }

    /// Reads one batch of eligible candidates: existing, real, user-type
    /// accounts with a fully specified location.
    pub fn candidate_users(&self, limit: usize) -> Result<Vec<CandidateUser>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT login, city, state, country_code FROM users
            WHERE city IS NOT NULL AND city <> ''
              AND state IS NOT NULL AND state <> ''
              AND country_code IS NOT NULL AND country_code <> ''
              AND deleted = 0 AND fake = 0 AND type = 'USR'
            LIMIT ?1
            "#,
        )?;

        let users = stmt.query_map(params![limit as i64], |row| {
            Ok(CandidateUser {
                login: row.get(0)?,
                city: row.get(1)?,
                state: row.get(2)?,
                country: row.get(3)?,
            })
        })?;

        users
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Applies a completed tally to the user's location row: every bucket
    /// with a non-zero count is incremented by that count and `developers`
    /// by one, all-or-nothing.
    ///
    /// An all-zero tally opens no transaction and leaves `developers`
    /// untouched, so a user with no qualifying repositories does not count
    /// toward the row. Applying the same tally again adds again; increments
    /// are linear, not idempotent.
    pub fn apply_tally(&mut self, user: &CandidateUser, tally: &LicenseTally) -> Result<()> {
        let increments: Vec<(LicenseBucket, u32)> = tally.nonzero().collect();
        if increments.is_empty() {
            tracing::debug!("Empty tally for {}, nothing to apply", user.login);
            return Ok(());
        }

        // Column identifiers come from the closed bucket list; counts and
        // the location triple are bound parameters.
        let mut assignments: Vec<String> = increments
            .iter()
            .map(|(bucket, _)| format!("{col} = {col} + ?", col = bucket.column()))
            .collect();
        assignments.push("developers = developers + 1".to_string());

        let sql = format!(
            "UPDATE locations SET {} WHERE city = ? AND state = ? AND country = ?",
            assignments.join(", ")
        );

        let mut bound: Vec<Value> = increments
            .iter()
            .map(|&(_, count)| Value::from(count as i64))
            .collect();
        bound.push(Value::from(user.city.clone()));
        bound.push(Value::from(user.state.clone()));
        bound.push(Value::from(user.country.clone()));

        let tx = self.conn.transaction()?;
        let affected = tx.execute(&sql, params_from_iter(bound))?;
        if affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(Error::LocationNotFound {
                city: user.city.clone(),
                state: user.state.clone(),
                country: user.country.clone(),
            });
        }
        tx.commit()?;

        Ok(())
    }

    /// Inserts a candidate row. Location rows and candidates are normally
    /// seeded by an external loader; this is the shared entry point for
    /// seeders and tests.
    pub fn insert_candidate(&self, user: &CandidateUser) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (login, city, state, country_code) VALUES (?1, ?2, ?3, ?4)",
            params![user.login, user.city, user.state, user.country],
        )?;
        Ok(())
    }

    /// Inserts a location row with all counters at zero.
    pub fn insert_location(&self, city: &str, state: &str, country: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO locations (city, state, country) VALUES (?1, ?2, ?3)",
            params![city, state, country],
        )?;
        Ok(())
    }

    pub fn location_row(
        &self,
        city: &str,
        state: &str,
        country: &str,
    ) -> Result<Option<LocationRow>> {
        let columns: Vec<&str> = LicenseBucket::ALL.iter().map(|b| b.column()).collect();
        let sql = format!(
            "SELECT {}, developers FROM locations WHERE city = ?1 AND state = ?2 AND country = ?3",
            columns.join(", ")
        );

        let result = self.conn.query_row(&sql, params![city, state, country], |row| {
            let mut counts = HashMap::new();
            for (idx, bucket) in LicenseBucket::ALL.iter().enumerate() {
                counts.insert(*bucket, row.get::<_, i64>(idx)? as u64);
            }
            let developers: i64 = row.get(LicenseBucket::ALL.len())?;
            Ok(LocationRow {
                developers: developers as u64,
                counts,
            })
        });

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
