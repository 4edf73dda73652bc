//! Concord Storage Layer
//!
//! Implements the `DataSource` and `ResultSink` traits using SQLite.
//!
//! # Architecture
//!
//! - `couple_profile`: one row per respondent
//! - `question_response`: raw answers, typed into `RawValue` on read
//! - `question_category`: category catalog, used to build a `CategoryMap`
//! - `couple_verdict`: latest verdict per couple (upsert)
//!
//! # Examples
//!
//! ```
//! use concord_store::SqliteStore;
//! use concord_domain::{AccessId, QuestionKey, Respondent, RespondentProfile};
//! use concord_domain::traits::DataSource;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! let id = AccessId::from("couple-1");
//! store.insert_profile(&id, "male", &RespondentProfile::default()).unwrap();
//! store.insert_answer(&id, "female", QuestionKey::new(1, 1, None), "Agree").unwrap();
//!
//! let record = store.get_couple_record(&id).unwrap().unwrap();
//! assert!(record.primary.is_some());
//! assert_eq!(record.answers[0].respondent, Respondent::Secondary);
//! ```

#![warn(missing_docs)]

use concord_domain::traits::{DataSource, ResultSink};
use concord_domain::{
    AccessId, Category, CategoryEntry, CategoryMap, CoupleRecord, QuestionKey, RawAnswer,
    RawValue, Respondent, RespondentProfile, Verdict,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Verdict could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// SQLite-backed data source and result sink
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

/// A stored verdict with its bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVerdict {
    /// Couple the verdict belongs to
    pub access_id: AccessId,
    /// The verdict itself
    pub verdict: Verdict,
    /// Unix seconds of the last write
    pub updated_at: u64,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Insert or replace one respondent's profile
    ///
    /// `respondent` is stored as given; it is interpreted with
    /// [`Respondent::from_label`] when read back.
    pub fn insert_profile(
        &self,
        access_id: &AccessId,
        respondent: &str,
        profile: &RespondentProfile,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO couple_profile (access_id, respondent, name, sex, age, civil_status,
                years_living_together, past_children, children, education, income)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(access_id, respondent) DO UPDATE SET
                name = excluded.name, sex = excluded.sex, age = excluded.age,
                civil_status = excluded.civil_status,
                years_living_together = excluded.years_living_together,
                past_children = excluded.past_children, children = excluded.children,
                education = excluded.education, income = excluded.income",
            params![
                access_id.as_str(),
                respondent,
                &profile.name,
                &profile.sex,
                profile.age,
                &profile.civil_status,
                profile.years_living_together,
                profile.past_children,
                profile.children,
                &profile.education,
                &profile.income,
            ],
        )?;
        Ok(())
    }

    /// Append one answer
    ///
    /// The value is stored as text; integer-looking text is read back as a
    /// numeric code.
    pub fn insert_answer(
        &self,
        access_id: &AccessId,
        respondent: &str,
        key: QuestionKey,
        response: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO question_response
                (access_id, respondent, category_id, question_id, sub_question_id, response)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                access_id.as_str(),
                respondent,
                key.category_id,
                key.question_id,
                key.sub_question_id,
                response,
            ],
        )?;
        Ok(())
    }

    /// Store a whole couple record, replacing any answers already held
    ///
    /// Returns the number of answers written. The import runs in one
    /// transaction; on error the couple's stored rows are left untouched.
    pub fn import_record(&self, record: &CoupleRecord) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let id = &record.access_id;
        if let Some(profile) = &record.primary {
            self.insert_profile(id, Respondent::Primary.as_str(), profile)?;
        }
        if let Some(profile) = &record.secondary {
            self.insert_profile(id, Respondent::Secondary.as_str(), profile)?;
        }

        self.conn.execute(
            "DELETE FROM question_response WHERE access_id = ?1",
            params![id.as_str()],
        )?;
        for answer in &record.answers {
            let response = match &answer.value {
                RawValue::Numeric(v) => v.to_string(),
                RawValue::Textual(text) => text.clone(),
            };
            self.insert_answer(id, answer.respondent.as_str(), answer.key, &response)?;
        }
        tx.commit()?;

        debug!(access_id = %id, answers = record.answers.len(), "Imported couple record");
        Ok(record.answers.len())
    }

    /// Insert or rename a catalog category
    pub fn insert_category(&self, category_id: u32, name: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO question_category (category_id, category_name) VALUES (?1, ?2)
             ON CONFLICT(category_id) DO UPDATE SET category_name = excluded.category_name",
            params![category_id, name],
        )?;
        Ok(())
    }

    /// Build a category map from the catalog
    ///
    /// Catalog names are matched with [`Category::from_label`]; names outside
    /// the four counseling domains are skipped with a warning. Returns `None`
    /// when the catalog is empty.
    pub fn load_category_map(&self, version: &str) -> Result<Option<CategoryMap>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category_id, category_name FROM question_category ORDER BY category_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut entries = Vec::new();
        for (category_id, name) in rows {
            match Category::from_label(&name) {
                Some(category) => entries.push(CategoryEntry {
                    category_id,
                    category,
                }),
                None => warn!(category_id, name = %name, "Catalog category has no counseling domain"),
            }
        }

        Ok(Some(CategoryMap {
            version: version.to_string(),
            entries,
        }))
    }

    /// All access ids with a profile or an answer, sorted
    pub fn list_access_ids(&self) -> Result<Vec<AccessId>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT access_id FROM couple_profile
             UNION
             SELECT access_id FROM question_response
             ORDER BY 1",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(AccessId::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// List couples that have no stored verdict yet
    pub fn pending_access_ids(&self) -> Result<Vec<AccessId>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT access_id FROM (
                 SELECT access_id FROM couple_profile
                 UNION
                 SELECT access_id FROM question_response
             )
             WHERE access_id NOT IN (SELECT access_id FROM couple_verdict)
             ORDER BY 1",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(AccessId::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Fetch the stored verdict for a couple
    pub fn get_verdict(&self, access_id: &AccessId) -> Result<Option<StoredVerdict>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT verdict_json, updated_at FROM couple_verdict WHERE access_id = ?1",
                params![access_id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match row {
            Some((json, updated_at)) => Ok(Some(StoredVerdict {
                access_id: access_id.clone(),
                verdict: serde_json::from_str(&json)?,
                updated_at: updated_at as u64,
            })),
            None => Ok(None),
        }
    }

    /// Number of stored verdicts
    pub fn verdict_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM couple_verdict", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn load_profiles(
        &self,
        access_id: &AccessId,
    ) -> Result<Vec<(Respondent, RespondentProfile)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT respondent, name, sex, age, civil_status, years_living_together,
                    past_children, children, education, income
             FROM couple_profile WHERE access_id = ?1 ORDER BY respondent",
        )?;
        let profiles = stmt
            .query_map(params![access_id.as_str()], |row| {
                let label: String = row.get(0)?;
                Ok((
                    Respondent::from_label(&label),
                    RespondentProfile {
                        name: row.get(1)?,
                        sex: row.get(2)?,
                        age: row.get(3)?,
                        civil_status: row.get(4)?,
                        years_living_together: row.get(5)?,
                        past_children: row.get(6)?,
                        children: row.get(7)?,
                        education: row.get(8)?,
                        income: row.get(9)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn load_answers(&self, access_id: &AccessId) -> Result<Vec<RawAnswer>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT respondent, category_id, question_id, sub_question_id, response
             FROM question_response WHERE access_id = ?1
             ORDER BY category_id ASC, question_id ASC, sub_question_id ASC, id ASC",
        )?;
        let answers = stmt
            .query_map(params![access_id.as_str()], |row| {
                let label: String = row.get(0)?;
                let response: String = row.get(4)?;
                Ok(RawAnswer {
                    respondent: Respondent::from_label(&label),
                    key: QuestionKey::new(row.get(1)?, row.get(2)?, row.get(3)?),
                    value: RawValue::parse(&response),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(answers)
    }
}

impl DataSource for SqliteStore {
    type Error = StoreError;

    fn get_couple_record(&self, access_id: &AccessId) -> Result<Option<CoupleRecord>, Self::Error> {
        let profiles = self.load_profiles(access_id)?;
        let answers = self.load_answers(access_id)?;

        if profiles.is_empty() && answers.is_empty() {
            return Ok(None);
        }

        let mut record = CoupleRecord::new(access_id.clone());
        for (respondent, profile) in profiles {
            let slot = match respondent {
                Respondent::Primary => &mut record.primary,
                Respondent::Secondary => &mut record.secondary,
            };
            if slot.is_some() {
                warn!(
                    access_id = %access_id,
                    respondent = %respondent,
                    "Multiple profiles map to one respondent, keeping the first"
                );
                continue;
            }
            *slot = Some(profile);
        }
        record.answers = answers;

        debug!(
            access_id = %access_id,
            answers = record.answers.len(),
            "Loaded couple record"
        );
        Ok(Some(record))
    }
}

impl ResultSink for SqliteStore {
    type Error = StoreError;

    fn persist(&self, access_id: &AccessId, verdict: &Verdict) -> Result<(), Self::Error> {
        let json = serde_json::to_string(verdict)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.conn.execute(
            "INSERT INTO couple_verdict (access_id, risk_level, confidence, verdict_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(access_id) DO UPDATE SET
             risk_level = excluded.risk_level, confidence = excluded.confidence,
             verdict_json = excluded.verdict_json, updated_at = excluded.updated_at",
            params![
                access_id.as_str(),
                verdict.risk_level.as_str(),
                verdict.confidence,
                json,
                now as i64,
            ],
        )?;
        Ok(())
    }
}
