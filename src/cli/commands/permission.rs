use clap::Subcommand;
use serde_json::json;
use std::collections::BTreeSet;

use crate::app::open_storage;
use crate::cli::utils::{flags, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::PermissionGrant;
use crate::services::AccessService;
use crate::types::AccessMode;

#[derive(Subcommand)]
pub enum PermissionCommands {
    #[command(about = "Set the read/write flags of a role on a resource")]
    Grant {
        #[arg(help = "Role name, created if missing")]
        role: String,

        #[arg(help = "Resource name, e.g. ClientsViewSet")]
        resource: String,

        #[arg(long, help = "Allow reads")]
        read: bool,

        #[arg(long, help = "Allow writes")]
        write: bool,
    },

    #[command(about = "Evaluate whether any of the given roles may access a resource")]
    Check {
        #[arg(help = "Resource name")]
        resource: String,

        #[arg(help = "Access mode: read or write")]
        mode: AccessMode,

        #[arg(long = "role", short, required = true, help = "Role to evaluate (repeatable)")]
        roles: Vec<String>,
    },

    #[command(about = "List permission rows")]
    List {
        #[arg(long, help = "Only rows granting this mode (read or write)")]
        mode: Option<AccessMode>,
    },
}

pub async fn handle(cmd: PermissionCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let storage = open_storage(config).await?;
    let service = AccessService::new(storage.access, config.reports.high_value_threshold);

    match cmd {
        PermissionCommands::Grant { role, resource, read, write } => {
            let permission = service
                .grant_permission(PermissionGrant {
                    role_name: role,
                    resource_name: resource,
                    can_read: read,
                    can_write: write,
                })
                .await?;

            output_success(
                output_format,
                &format!(
                    "{} on {}: {}",
                    permission.role_name,
                    permission.resource_name,
                    flags(permission.can_read, permission.can_write)
                ),
                Some(json!({ "permission": permission })),
            )
        }
        PermissionCommands::Check { resource, mode, roles } => {
            let roles: BTreeSet<String> = roles.into_iter().collect();
            let allowed = service.authorize(&roles, &resource, mode).await?;

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "resource": resource,
                            "mode": mode,
                            "roles": roles,
                            "allowed": allowed
                        }))?
                    );
                }
                OutputFormat::Text => {
                    let verdict = if allowed { "allowed" } else { "denied" };
                    println!("{} {} for roles {:?}: {}", mode, resource, roles, verdict);
                }
            }
            Ok(())
        }
        PermissionCommands::List { mode } => {
            let permissions = service.list_permissions(mode).await?;

            if permissions.is_empty() {
                return output_empty_collection(output_format, "permissions", "No permissions configured");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "permissions": permissions }))?);
                }
                OutputFormat::Text => {
                    println!("{:<25} {:<25} {}", "ROLE", "RESOURCE", "FLAGS");
                    println!("{}", "-".repeat(56));
                    for p in &permissions {
                        println!("{:<25} {:<25} {}", p.role_name, p.resource_name, flags(p.can_read, p.can_write));
                    }
                }
            }
            Ok(())
        }
    }
}
