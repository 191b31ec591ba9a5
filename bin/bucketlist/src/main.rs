//! # Bucketlist Binary
//!
//! The entry point that assembles the services on top of the backend
//! selected at compile time and runs a single command.

mod cli;
mod telemetry;

use std::sync::Arc;

use anyhow::{bail, Context};
use bl_core::models::{ModerationRecord, UserId};
use bl_core::moderation::{AppealPolicy, ModerationService};
use bl_core::traits::{ModerationRepo, SocialGraph, SocialGraphAdmin};
use bl_core::visibility::VisibilityService;
use bl_core::AppError;
use chrono::Utc;
use clap::Parser;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::cli::{Cli, Command};

// Feature-gated imports: the backend is chosen at compile time
#[cfg(feature = "db-sqlite")]
use bl_db_sqlite::SqliteBackend;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("bucketlist needs a backend feature, e.g. `db-sqlite`");

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Settings, then logging as configured
    let settings = configs::load_from(cli.config.as_deref()).context("loading settings")?;
    telemetry::init(&settings.log);

    // 2. Backend
    let backend = Arc::new(
        SqliteBackend::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await
        .context("opening database")?,
    );

    // 3. Services
    let visibility = VisibilityService::new(backend.clone());
    let moderation = ModerationService::new(
        backend.clone(),
        AppealPolicy {
            min_len: settings.appeal.min_len,
            max_len: settings.appeal.max_len,
        },
    );
    info!(backend = "sqlite", "services ready");

    match cli.command {
        Command::Register { privacy } => {
            let id = UserId::new();
            backend.ensure_user(id, privacy).await?;
            print_json(&json!({ "id": id, "privacy": privacy }))
        }
        Command::SetPrivacy { user, privacy } => {
            backend.set_privacy_default(user, privacy).await?;
            print_json(&json!({ "id": user, "privacy": privacy }))
        }
        Command::Follow { follower, followee } => {
            let state = backend.follow(follower, followee).await?;
            print_json(&json!({ "follower": follower, "followee": followee, "state": state }))
        }
        Command::Accept { follower, followee } => {
            backend.accept_follow(follower, followee).await?;
            print_json(&json!({ "follower": follower, "followee": followee, "state": "accepted" }))
        }
        Command::Unfollow { follower, followee } => {
            backend.unfollow(follower, followee).await?;
            print_json(&json!({ "follower": follower, "followee": followee, "state": null }))
        }
        Command::Relationship { viewer, owner } => {
            let relationship = backend.get_relationship(viewer, owner).await?;
            print_json(&json!({ "viewer": viewer, "owner": owner, "relationship": relationship }))
        }
        Command::CanView { viewer, owner } => {
            let allowed = visibility.can_view(&viewer, owner).await;
            print_json(&json!({ "viewer": viewer, "owner": owner, "can_view": allowed }))
        }
        Command::Profile { viewer, owner } => {
            print_json(&visibility.profile_view(&viewer, owner).await)
        }
        Command::Banner { user, expand } => {
            let mut banner = moderation.banner(user, Utc::now()).await;
            if expand {
                banner.toggle_expanded();
            }
            print_json(&banner)
        }
        Command::Appeal {
            user,
            action,
            message,
        } => {
            // The guard needs the record's current appeal status.
            let warnings = backend.get_warnings(user).await?;
            let suspension = backend.get_active_suspension(user).await?;
            let record: &dyn ModerationRecord = match (
                warnings.iter().find(|w| w.id == action),
                suspension.as_ref().filter(|s| s.id == action),
            ) {
                (Some(warning), _) => warning,
                (None, Some(suspension)) => suspension,
                (None, None) => bail!(AppError::NotFound(
                    "Moderation action".into(),
                    action.to_string()
                )),
            };

            match moderation.submit_appeal(user, record, &message).await {
                Ok(()) => print_json(&json!({ "action": action, "submitted": true })),
                // Shown to the user as a message, not a failure.
                Err(e) if e.is_user_facing() => {
                    info!(%user, %action, reason = %e, "appeal not submitted");
                    print_json(
                        &json!({ "action": action, "submitted": false, "message": e.to_string() }),
                    )
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
