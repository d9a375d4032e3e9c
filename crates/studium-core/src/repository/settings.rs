use crate::error::CoreError;
use crate::models::Setting;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::SettingsRepository for SqliteRepository {
    async fn put_setting(
        &self,
        name: &str,
        scope: i64,
        value: &str,
        note: Option<String>,
    ) -> Result<Setting, CoreError> {
        // Upsert on (name, scope); an existing row keeps its id and created_at
        sqlx::query(
            r#"INSERT INTO settings (id, name, note, scope, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name, scope) DO UPDATE
            SET value = excluded.value, note = excluded.note, updated_at = excluded.updated_at"#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(&note)
        .bind(scope)
        .bind(value)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let setting = sqlx::query_as("SELECT * FROM settings WHERE name = $1 AND scope = $2")
            .bind(name)
            .bind(scope)
            .fetch_one(self.pool())
            .await?;
        Ok(setting)
    }

    async fn get_setting(&self, name: &str, scope: i64) -> Result<Option<Setting>, CoreError> {
        let setting = sqlx::query_as("SELECT * FROM settings WHERE name = $1 AND scope = $2")
            .bind(name)
            .bind(scope)
            .fetch_optional(self.pool())
            .await?;
        Ok(setting)
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, CoreError> {
        let settings = sqlx::query_as("SELECT * FROM settings ORDER BY scope ASC, name ASC")
            .fetch_all(self.pool())
            .await?;
        Ok(settings)
    }

    async fn delete_setting(&self, name: &str, scope: i64) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM settings WHERE name = $1 AND scope = $2")
            .bind(name)
            .bind(scope)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Setting {} in scope {} not found",
                name, scope
            )));
        }
        Ok(())
    }
}
