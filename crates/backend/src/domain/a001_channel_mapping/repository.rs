use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_channel_mapping::aggregate::MappingSettings;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::data::db::get_connection;

/// Ключ документа настроек в app_settings
pub const MAPPING_SETTINGS_KEY: &str = "erp_mapping_settings";

/// Хранилище настроек сопоставлений: только чтение/запись, без логики
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Пустые настройки, если ещё ничего не сохранено
    async fn load(&self) -> anyhow::Result<MappingSettings>;

    async fn save(&self, settings: &MappingSettings) -> anyhow::Result<()>;
}

/// Настройки в sqlite, одной JSON-строкой
pub struct SqliteSettingsStore;

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn load(&self) -> anyhow::Result<MappingSettings> {
        let conn = get_connection()?;

        let row = conn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT settings_json FROM app_settings WHERE setting_key = ?",
                vec![MAPPING_SETTINGS_KEY.into()],
            ))
            .await?;

        match row {
            Some(row) => {
                let settings_json: String = row.try_get("", "settings_json")?;
                let settings = serde_json::from_str(&settings_json).map_err(|e| {
                    anyhow::anyhow!("Failed to parse stored mapping settings: {}", e)
                })?;
                Ok(settings)
            }
            None => Ok(MappingSettings::default()),
        }
    }

    async fn save(&self, settings: &MappingSettings) -> anyhow::Result<()> {
        let conn = get_connection()?;
        let settings_json = serde_json::to_string(settings)?;
        let updated_at = Utc::now().to_rfc3339();

        let query = r#"
            INSERT INTO app_settings (setting_key, settings_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(setting_key) DO UPDATE SET
                settings_json = excluded.settings_json,
                updated_at = excluded.updated_at
        "#;

        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            query,
            vec![
                MAPPING_SETTINGS_KEY.into(),
                settings_json.into(),
                updated_at.into(),
            ],
        ))
        .await?;

        tracing::info!(
            "Saved mapping settings: {} channels, {} delivery mappings",
            settings.channel_payment_mapping.len(),
            settings.delivery_mappings.len()
        );
        Ok(())
    }
}
