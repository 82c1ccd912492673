use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Таблицы, которые должны существовать до старта сервера
const BOOTSTRAP_TABLES: &[(&str, &str)] = &[
    (
        "app_settings",
        r#"
        CREATE TABLE app_settings (
            setting_key TEXT PRIMARY KEY NOT NULL,
            settings_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "a002_sales_order",
        r#"
        CREATE TABLE a002_sales_order (
            id INTEGER PRIMARY KEY NOT NULL,
            order_number TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            payment_method INTEGER,
            shipping_method TEXT,
            status_id INTEGER,
            order_date TEXT,
            total_amount REAL,
            items_json TEXT NOT NULL DEFAULT 'null',
            raw_json TEXT NOT NULL DEFAULT 'null',
            erp_doc_id TEXT,
            erp_export_date TEXT,
            erp_sale_export_date TEXT,
            erp_cash_in_date TEXT,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    ensure_tables(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

async fn ensure_tables(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (table, create_sql) in BOOTSTRAP_TABLES {
        let exists = conn
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?;",
                vec![(*table).into()],
            ))
            .await?;

        if exists.is_empty() {
            tracing::info!("Creating {} table", table);
            conn.execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                create_sql.to_string(),
            ))
            .await?;
        }
    }

    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "CREATE INDEX IF NOT EXISTS idx_a002_sales_order_number ON a002_sales_order (order_number);"
            .to_string(),
    ))
    .await?;

    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}
