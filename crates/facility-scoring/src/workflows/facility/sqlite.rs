use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use super::domain::FacilityCode;
use super::payload::SubmissionPayload;
use super::repository::{
    FacilityFilter, NewSubmission, StoreError, SubmissionId, SubmissionRecord, SubmissionStore,
    UpsertOutcome,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    facility_code TEXT,
    submitter_id TEXT NOT NULL CHECK (length(trim(submitter_id)) > 0),
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    reference_link TEXT,
    total_score REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    answer_payload TEXT
);
CREATE INDEX IF NOT EXISTS idx_submissions_facility_code ON submissions (facility_code);
";

const COLUMNS: &str = "id, facility_code, submitter_id, latitude, longitude, reference_link, \
                       total_score, created_at, answer_payload";

/// SQLite-backed store. Every operation opens its own connection so readers
/// in WAL mode never wait on a writer's open transaction; writers serialize on
/// `BEGIN IMMEDIATE`.
#[derive(Debug, Clone)]
pub struct SqliteSubmissionStore {
    path: PathBuf,
}

impl SqliteSubmissionStore {
    /// Open (creating if needed) the database file and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.connect()?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %store.path.display(), journal_mode = %mode, "submission schema ready");

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

/// Run `operation` inside a transaction; it rolls back on drop unless committed.
fn execute_in_transaction<F, T>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    operation: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&Transaction) -> Result<T, StoreError>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    let result = operation(&tx)?;
    tx.commit()?;
    Ok(result)
}

impl SubmissionStore for SqliteSubmissionStore {
    fn upsert(&self, submission: NewSubmission) -> Result<UpsertOutcome, StoreError> {
        let payload = submission
            .answer_payload
            .as_ref()
            .map(SubmissionPayload::to_json)
            .transpose()?;
        let now = format_timestamp(Utc::now());
        let code = submission.facility_code.as_ref().map(FacilityCode::as_str);

        let mut conn = self.connect()?;
        execute_in_transaction(&mut conn, TransactionBehavior::Immediate, |tx| {
            let existing: Option<i64> = match code {
                Some(code) => tx
                    .query_row(
                        "SELECT id FROM submissions
                         WHERE TRIM(facility_code) = ?1
                         ORDER BY julianday(created_at) DESC, created_at DESC, id DESC
                         LIMIT 1",
                        params![code],
                        |row| row.get(0),
                    )
                    .optional()?,
                None => None,
            };

            match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE submissions
                         SET facility_code = ?1, submitter_id = ?2, latitude = ?3,
                             longitude = ?4, reference_link = ?5, total_score = ?6,
                             created_at = ?7, answer_payload = ?8
                         WHERE id = ?9",
                        params![
                            code,
                            submission.submitter_id,
                            submission.latitude,
                            submission.longitude,
                            submission.reference_link,
                            submission.total_score,
                            now,
                            payload,
                            id,
                        ],
                    )?;
                    Ok(UpsertOutcome {
                        id: SubmissionId(id),
                        was_update: true,
                    })
                }
                None => {
                    tx.execute(
                        "INSERT INTO submissions (facility_code, submitter_id, latitude,
                             longitude, reference_link, total_score, created_at, answer_payload)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            code,
                            submission.submitter_id,
                            submission.latitude,
                            submission.longitude,
                            submission.reference_link,
                            submission.total_score,
                            now,
                            payload,
                        ],
                    )?;
                    Ok(UpsertOutcome {
                        id: SubmissionId(tx.last_insert_rowid()),
                        was_update: false,
                    })
                }
            }
        })
    }

    fn list_latest_per_facility(
        &self,
        filter: &FacilityFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let conn = self.connect()?;
        // julianday() stops at milliseconds; the raw text orders microsecond ties.
        // Uncoded rows partition on their id alone, outside the code namespace.
        let sql = format!(
            "WITH normalized AS (
                 SELECT {COLUMNS}, NULLIF(TRIM(facility_code), '') AS code_key
                 FROM submissions
             ),
             ranked AS (
                 SELECT {COLUMNS},
                        ROW_NUMBER() OVER (
                            PARTITION BY code_key, CASE WHEN code_key IS NULL THEN id END
                            ORDER BY julianday(created_at) DESC, created_at DESC, id DESC
                        ) AS rn
                 FROM normalized
             )
             SELECT {COLUMNS} FROM ranked
             WHERE rn = 1
             ORDER BY julianday(created_at) DESC, created_at DESC, id DESC"
        );

        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map([], RawRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let record = row?.into_record()?;
            if filter.matches(record.facility_code.as_ref()) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn facility_codes(&self) -> Result<Vec<FacilityCode>, StoreError> {
        let conn = self.connect()?;
        let mut statement = conn.prepare(
            "SELECT DISTINCT TRIM(facility_code) AS code FROM submissions
             WHERE facility_code IS NOT NULL AND TRIM(facility_code) <> ''
             ORDER BY code",
        )?;
        let codes = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes
            .iter()
            .filter_map(|code| FacilityCode::parse(code))
            .collect())
    }

    fn get(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, StoreError> {
        let conn = self.connect()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM submissions WHERE id = ?1"),
                params![id.0],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }
}

/// Column values as read, before timestamp and payload decoding.
struct RawRow {
    id: i64,
    facility_code: Option<String>,
    submitter_id: String,
    latitude: f64,
    longitude: f64,
    reference_link: Option<String>,
    total_score: f64,
    created_at: String,
    answer_payload: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            facility_code: row.get(1)?,
            submitter_id: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            reference_link: row.get(5)?,
            total_score: row.get(6)?,
            created_at: row.get(7)?,
            answer_payload: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<SubmissionRecord, StoreError> {
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| StoreError::Corrupt {
            id: self.id,
            reason: format!("unrecognized created_at '{}'", self.created_at),
        })?;

        let answer_payload = match self.answer_payload.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match SubmissionPayload::from_json(raw) {
                Ok(payload) => Some(payload),
                Err(err) => {
                    warn!(id = self.id, error = %err, "ignoring unreadable submission payload");
                    None
                }
            },
        };

        Ok(SubmissionRecord {
            id: SubmissionId(self.id),
            facility_code: FacilityCode::from_optional(self.facility_code.as_deref()),
            submitter_id: self.submitter_id,
            latitude: self.latitude,
            longitude: self.longitude,
            reference_link: self.reference_link,
            total_score: self.total_score,
            created_at,
            answer_payload,
        })
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` layout used by older rows.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
