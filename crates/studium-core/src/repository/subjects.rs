use crate::codec::{decode_date, encode_date};
use crate::error::CoreError;
use crate::models::{NewSubjectData, Subject, SubjectKind, SubjectType, UpdateSubjectData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// `subjects` row as stored: dates are `YYYYMMDD` integers.
#[derive(Debug, FromRow)]
struct SubjectRow {
    id: Uuid,
    name: String,
    note: Option<String>,
    color: String,
    start_date: i64,
    end_date: i64,
    active: bool,
    kind: SubjectKind,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubjectRow {
    fn into_model(self) -> Result<Subject, CoreError> {
        Ok(Subject {
            id: self.id,
            name: self.name,
            note: self.note,
            color: self.color,
            start_date: decode_date(self.start_date)?,
            end_date: decode_date(self.end_date)?,
            active: self.active,
            kind: self.kind,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl super::SubjectRepository for SqliteRepository {
    async fn add_subject_type(
        &self,
        name: String,
        note: Option<String>,
    ) -> Result<SubjectType, CoreError> {
        let subject_type = SubjectType {
            id: Uuid::now_v7(),
            name,
            note,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO subject_types (id, name, note, created_at) VALUES ($1, $2, $3, $4)")
            .bind(subject_type.id)
            .bind(&subject_type.name)
            .bind(&subject_type.note)
            .bind(subject_type.created_at)
            .execute(self.pool())
            .await?;

        Ok(subject_type)
    }

    async fn find_subject_types(&self) -> Result<Vec<SubjectType>, CoreError> {
        let types = sqlx::query_as("SELECT * FROM subject_types ORDER BY name ASC")
            .fetch_all(self.pool())
            .await?;
        Ok(types)
    }

    async fn find_subject_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SubjectType>, CoreError> {
        let subject_type = sqlx::query_as("SELECT * FROM subject_types WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(subject_type)
    }

    async fn add_subject(&self, data: NewSubjectData) -> Result<Subject, CoreError> {
        if data.start_date > data.end_date {
            return Err(CoreError::InvalidDateRange {
                start: data.start_date,
                end: data.end_date,
            });
        }

        let subject = Subject {
            id: Uuid::now_v7(),
            name: data.name,
            note: data.note,
            color: data.color,
            start_date: data.start_date,
            end_date: data.end_date,
            active: true,
            kind: data.kind,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO subjects (id, name, note, color, start_date, end_date, active, kind, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(subject.id)
        .bind(&subject.name)
        .bind(&subject.note)
        .bind(&subject.color)
        .bind(encode_date(subject.start_date))
        .bind(encode_date(subject.end_date))
        .bind(subject.active)
        .bind(&subject.kind)
        .bind(subject.created_at)
        .bind(subject.updated_at)
        .execute(self.pool())
        .await?;

        Ok(subject)
    }

    async fn find_subject_by_id(&self, id: Uuid) -> Result<Option<Subject>, CoreError> {
        let row: Option<SubjectRow> = sqlx::query_as("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(SubjectRow::into_model).transpose()
    }

    async fn find_subject_by_name(&self, name: &str) -> Result<Option<Subject>, CoreError> {
        let row: Option<SubjectRow> = sqlx::query_as("SELECT * FROM subjects WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        row.map(SubjectRow::into_model).transpose()
    }

    async fn find_subjects(&self, active_only: bool) -> Result<Vec<Subject>, CoreError> {
        let rows: Vec<SubjectRow> = if active_only {
            sqlx::query_as("SELECT * FROM subjects WHERE active = 1 ORDER BY name ASC")
                .fetch_all(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT * FROM subjects ORDER BY name ASC")
                .fetch_all(self.pool())
                .await?
        };
        rows.into_iter().map(SubjectRow::into_model).collect()
    }

    async fn update_subject(
        &self,
        id: Uuid,
        data: UpdateSubjectData,
    ) -> Result<Subject, CoreError> {
        let mut tx = self.pool().begin().await?;

        let row: Option<SubjectRow> = sqlx::query_as("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = row
            .map(SubjectRow::into_model)
            .transpose()?
            .ok_or_else(|| CoreError::NotFound(format!("Subject with id {} not found", id)))?;

        let subject = Subject {
            id: current.id,
            name: data.name.unwrap_or(current.name),
            note: data.note.unwrap_or(current.note),
            color: data.color.unwrap_or(current.color),
            start_date: data.start_date.unwrap_or(current.start_date),
            end_date: data.end_date.unwrap_or(current.end_date),
            active: data.active.unwrap_or(current.active),
            kind: data.kind.unwrap_or(current.kind),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        if subject.start_date > subject.end_date {
            return Err(CoreError::InvalidDateRange {
                start: subject.start_date,
                end: subject.end_date,
            });
        }

        sqlx::query(
            r#"UPDATE subjects
            SET name = $1, note = $2, color = $3, start_date = $4, end_date = $5, active = $6, kind = $7, updated_at = $8
            WHERE id = $9"#,
        )
        .bind(&subject.name)
        .bind(&subject.note)
        .bind(&subject.color)
        .bind(encode_date(subject.start_date))
        .bind(encode_date(subject.end_date))
        .bind(subject.active)
        .bind(&subject.kind)
        .bind(subject.updated_at)
        .bind(subject.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(subject)
    }

    async fn archive_subject(&self, id: Uuid) -> Result<Subject, CoreError> {
        self.update_subject(
            id,
            UpdateSubjectData {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    async fn delete_subject(&self, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let series_refs: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM schedule_series WHERE subject_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if series_refs > 0 {
            return Err(CoreError::InvalidInput(format!(
                "Subject {} is still referenced by {} schedule series",
                id, series_refs
            )));
        }

        let unit_refs: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM work_units WHERE subject_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if unit_refs > 0 {
            return Err(CoreError::InvalidInput(format!(
                "Subject {} is still referenced by {} work units",
                id, unit_refs
            )));
        }

        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Subject with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn seed_defaults(&self) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        // Short tag plus readable label, matching the shipped planner
        let default_types = [
            ("V", "Lecture"),
            ("U", "Exercise"),
            ("C", "Coffee"),
            ("F", "Free Work"),
        ];
        for (name, note) in default_types {
            sqlx::query(
                r#"INSERT INTO subject_types (id, name, note, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (name) DO NOTHING"#,
            )
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(note)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        // The catch-all self-study subject, effectively unbounded in time
        sqlx::query(
            r#"INSERT INTO subjects (id, name, note, color, start_date, end_date, active, kind, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (name) DO NOTHING"#,
        )
        .bind(Uuid::now_v7())
        .bind("Study")
        .bind("Study")
        .bind("64,224,208,150")
        .bind(20000101_i64)
        .bind(30001231_i64)
        .bind(true)
        .bind(SubjectKind::Study)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("seeded default subject catalog");
        Ok(())
    }
}
