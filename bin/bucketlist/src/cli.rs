use std::path::PathBuf;

use bl_core::models::{ActionId, PrivacyLevel, UserId, Viewer};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bucketlist", version, about = "Visibility and moderation checks for Bucketlist accounts")]
pub struct Cli {
    /// Settings file to use instead of ./bucketlist.toml
    #[arg(long, global = true, env = "BUCKETLIST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and print its id
    Register {
        #[arg(long, default_value = "public")]
        privacy: PrivacyLevel,
    },
    /// Change an account's default audience
    SetPrivacy {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        privacy: PrivacyLevel,
    },
    /// Request to follow an account
    Follow {
        #[arg(long)]
        follower: UserId,
        #[arg(long)]
        followee: UserId,
    },
    /// Accept a pending follow request
    Accept {
        #[arg(long)]
        follower: UserId,
        #[arg(long)]
        followee: UserId,
    },
    Unfollow {
        #[arg(long)]
        follower: UserId,
        #[arg(long)]
        followee: UserId,
    },
    /// Show the relationship of one account toward another
    Relationship {
        #[arg(long)]
        viewer: UserId,
        #[arg(long)]
        owner: UserId,
    },
    /// Decide whether a viewer may see an owner's content
    CanView {
        /// Account id, or `anon`
        #[arg(long)]
        viewer: Viewer,
        #[arg(long)]
        owner: UserId,
    },
    /// Decide what a viewer sees on an owner's profile page
    Profile {
        /// Account id, or `anon`
        #[arg(long)]
        viewer: Viewer,
        #[arg(long)]
        owner: UserId,
    },
    /// Print the moderation banner state for an account
    Banner {
        #[arg(long)]
        user: UserId,
        /// Expand the warning list when there are several
        #[arg(long)]
        expand: bool,
    },
    /// Appeal a warning or suspension
    Appeal {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        action: ActionId,
        #[arg(long)]
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_anonymous_viewer_parses() {
        let owner = UserId::new();
        let cli = Cli::try_parse_from([
            "bucketlist",
            "can-view",
            "--viewer",
            "anon",
            "--owner",
            &owner.to_string(),
        ])
        .unwrap();
        match cli.command {
            Command::CanView { viewer, owner: parsed } => {
                assert_eq!(viewer, Viewer::Anonymous);
                assert_eq!(parsed, owner);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_privacy_is_rejected() {
        assert!(Cli::try_parse_from(["bucketlist", "register", "--privacy", "secret"]).is_err());
    }
}
