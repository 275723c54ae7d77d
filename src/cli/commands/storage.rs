use anyhow::Context;
use serde_json::json;

use crate::app::open_storage;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StorageBackend};
use crate::database::seed::seed_demo_data;

pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.database.backend == StorageBackend::Memory {
        anyhow::bail!("DATABASE_BACKEND=memory has no tables to migrate");
    }
    open_storage(config).await?;
    output_success(output_format, "Database tables are up to date", None)
}

pub async fn seed(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let storage = open_storage(config).await?;
    let seeded = seed_demo_data(&*storage.access, &*storage.credentials, config.security.bcrypt_cost)
        .await
        .context("could not seed demo data")?;

    let message = if seeded {
        "Demo data loaded"
    } else {
        "Clients already exist; demo data left untouched"
    };
    output_success(output_format, message, Some(json!({ "seeded": seeded })))
}
