use std::sync::Arc;

use chrono::Utc;
use sqlx::{Pool, Postgres};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::models::student::{StudentFields, StudentModel};

const COLUMNS: &str =
    "id, full_name, school_id, program, digital_card_link, created_at, updated_at";

/// Access to the `scanned_students` collection.
///
/// Postgres in deployments; the in-memory backend mirrors its constraints
/// (unique `school_id`, newest-first listing) for local runs and tests.
#[derive(Clone, Debug)]
pub struct StudentRepository {
    backend: Backend,
}

#[derive(Clone, Debug)]
enum Backend {
    Postgres(Pool<Postgres>),
    Memory(Arc<RwLock<Vec<StudentModel>>>),
}

fn log_query_error(e: sqlx::Error) -> sqlx::Error {
    tracing::error!("Failed to execute query: {:?}", e);
    e
}

fn duplicate_school_id() -> anyhow::Error {
    anyhow::anyhow!(
        "duplicate key value violates unique constraint \"scanned_students_school_id_key\""
    )
}

impl StudentRepository {
    pub fn new(pg_pool: Pool<Postgres>) -> Self {
        Self {
            backend: Backend::Postgres(pg_pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    /// Insert, or overwrite the row holding the same `school_id`.
    /// `id` and `created_at` of an overwritten row are kept.
    #[instrument(name = "Upserting student", skip(self, record, card_link), fields(school_id = %record.school_id))]
    pub async fn upsert(
        &self,
        record: &StudentFields,
        card_link: &str,
    ) -> anyhow::Result<StudentModel> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!(
                    "INSERT INTO scanned_students (id, full_name, school_id, program, digital_card_link)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (school_id) DO UPDATE SET
                         full_name = EXCLUDED.full_name,
                         program = EXCLUDED.program,
                         digital_card_link = EXCLUDED.digital_card_link,
                         updated_at = now()
                     RETURNING {COLUMNS}"
                );
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&record.full_name)
                    .bind(record.school_id.as_str())
                    .bind(&record.program)
                    .bind(card_link)
                    .fetch_one(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => {
                let mut rows = rows.write().await;
                let now = Utc::now();
                if let Some(existing) = rows
                    .iter_mut()
                    .find(|s| s.school_id == record.school_id.as_str())
                {
                    existing.full_name = record.full_name.clone();
                    existing.program = record.program.clone();
                    existing.digital_card_link = card_link.to_string();
                    existing.updated_at = now;
                    return Ok(existing.clone());
                }
                let student = new_row(record, card_link);
                rows.push(student.clone());
                Ok(student)
            }
        }
    }

    /// Plain insert; a taken `school_id` is an error, not a merge.
    #[instrument(name = "Inserting student", skip(self, record, card_link), fields(school_id = %record.school_id))]
    pub async fn insert(
        &self,
        record: &StudentFields,
        card_link: &str,
    ) -> anyhow::Result<StudentModel> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!(
                    "INSERT INTO scanned_students (id, full_name, school_id, program, digital_card_link)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING {COLUMNS}"
                );
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&record.full_name)
                    .bind(record.school_id.as_str())
                    .bind(&record.program)
                    .bind(card_link)
                    .fetch_one(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => {
                let mut rows = rows.write().await;
                if rows.iter().any(|s| s.school_id == record.school_id.as_str()) {
                    return Err(duplicate_school_id());
                }
                let student = new_row(record, card_link);
                rows.push(student.clone());
                Ok(student)
            }
        }
    }

    /// Newest first.
    #[instrument(name = "Listing students", skip(self))]
    pub async fn list(&self, limit: u64, offset: u64) -> anyhow::Result<Vec<StudentModel>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM scanned_students
                     ORDER BY created_at DESC
                     LIMIT $1 OFFSET $2"
                );
                let rows = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(i64::try_from(limit)?)
                    .bind(i64::try_from(offset)?)
                    .fetch_all(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(rows)
            }
            Backend::Memory(rows) => {
                let rows = rows.read().await;
                // Inserts are appended, so walking backwards is newest first
                // even when timestamps tie.
                let mut sorted: Vec<&StudentModel> = rows.iter().rev().collect();
                sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(sorted
                    .into_iter()
                    .skip(usize::try_from(offset)?)
                    .take(usize::try_from(limit)?)
                    .cloned()
                    .collect())
            }
        }
    }

    pub async fn count(&self) -> anyhow::Result<u64> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scanned_students")
                    .fetch_one(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(u64::try_from(count)?)
            }
            Backend::Memory(rows) => Ok(rows.read().await.len() as u64),
        }
    }

    #[instrument(name = "Fetching student by school id", skip(self))]
    pub async fn find_by_school_id(&self, school_id: &str) -> anyhow::Result<Option<StudentModel>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!("SELECT {COLUMNS} FROM scanned_students WHERE school_id = $1");
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(school_id)
                    .fetch_optional(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => Ok(rows
                .read()
                .await
                .iter()
                .find(|s| s.school_id == school_id)
                .cloned()),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<StudentModel>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!("SELECT {COLUMNS} FROM scanned_students WHERE id = $1");
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => Ok(rows.read().await.iter().find(|s| s.id == id).cloned()),
        }
    }

    /// Edits the three operator-facing fields; the stored card link is left as is.
    #[instrument(name = "Updating student", skip(self, record))]
    pub async fn update(
        &self,
        id: Uuid,
        record: &StudentFields,
    ) -> anyhow::Result<Option<StudentModel>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!(
                    "UPDATE scanned_students
                     SET full_name = $2, school_id = $3, program = $4, updated_at = now()
                     WHERE id = $1
                     RETURNING {COLUMNS}"
                );
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(id)
                    .bind(&record.full_name)
                    .bind(record.school_id.as_str())
                    .bind(&record.program)
                    .fetch_optional(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => {
                let mut rows = rows.write().await;
                if rows
                    .iter()
                    .any(|s| s.id != id && s.school_id == record.school_id.as_str())
                {
                    return Err(duplicate_school_id());
                }
                let Some(existing) = rows.iter_mut().find(|s| s.id == id) else {
                    return Ok(None);
                };
                existing.full_name = record.full_name.clone();
                existing.school_id = record.school_id.to_string();
                existing.program = record.program.clone();
                existing.updated_at = Utc::now();
                Ok(Some(existing.clone()))
            }
        }
    }

    /// Returns the removed row, if there was one.
    #[instrument(name = "Deleting student", skip(self))]
    pub async fn delete(&self, id: Uuid) -> anyhow::Result<Option<StudentModel>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let sql = format!("DELETE FROM scanned_students WHERE id = $1 RETURNING {COLUMNS}");
                let row = sqlx::query_as::<_, StudentModel>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .map_err(log_query_error)?;
                Ok(row)
            }
            Backend::Memory(rows) => {
                let mut rows = rows.write().await;
                let position = rows.iter().position(|s| s.id == id);
                Ok(position.map(|i| rows.remove(i)))
            }
        }
    }
}

fn new_row(record: &StudentFields, card_link: &str) -> StudentModel {
    let now = Utc::now();
    StudentModel {
        id: Uuid::new_v4(),
        full_name: record.full_name.clone(),
        school_id: record.school_id.to_string(),
        program: record.program.clone(),
        digital_card_link: card_link.to_string(),
        created_at: now,
        updated_at: now,
    }
}
