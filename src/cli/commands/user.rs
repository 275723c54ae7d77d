use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::app::open_storage;
use crate::auth::credentials::hash_password;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a login with one or more roles")]
    Add {
        #[arg(help = "Login name")]
        username: String,

        #[arg(long, short, help = "Plain-text password, stored as a bcrypt hash")]
        password: String,

        #[arg(long = "role", short, help = "Role to attach (repeatable)")]
        roles: Vec<String>,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add { username, password, roles } => {
            if username.trim().is_empty() || password.is_empty() {
                anyhow::bail!("username and password must not be empty");
            }

            let storage = open_storage(config).await?;
            let password_hash = hash_password(&password, config.security.bcrypt_cost)
                .context("could not hash password")?;
            let user = storage
                .credentials
                .insert_user(username.trim(), &password_hash, &roles)
                .await?;

            output_success(
                output_format,
                &format!("Created user '{}' with roles {:?}", user.username, user.roles),
                Some(json!({ "user": user })),
            )
        }
    }
}
