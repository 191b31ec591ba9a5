//! # Core Traits (Ports)
//!
//! Any backend adapter must implement these traits to be used by the
//! services. Transport, authentication and storage format stay on the
//! adapter's side of the line.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ActionId, FollowState, PrivacyLevel, Relationship, Suspension, UserId, Warning};

/// Read side of the follow graph.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Relationship of `viewer` toward `owner`, read from the viewer's side.
    async fn get_relationship(&self, viewer: UserId, owner: UserId) -> Result<Relationship>;

    async fn get_privacy_default(&self, owner: UserId) -> Result<PrivacyLevel>;
}

/// Mutations on the follow graph and account settings.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SocialGraphAdmin: Send + Sync {
    /// Creates the account if missing; leaves an existing one untouched.
    async fn ensure_user(&self, user: UserId, privacy: PrivacyLevel) -> Result<()>;

    /// Issues a follow. Public owners accept immediately, everyone else
    /// leaves the edge pending. Returns the stored edge state.
    async fn follow(&self, follower: UserId, followee: UserId) -> Result<FollowState>;

    async fn accept_follow(&self, follower: UserId, followee: UserId) -> Result<()>;

    /// Deletes the edge in whatever state it is in.
    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<()>;

    async fn set_privacy_default(&self, owner: UserId, privacy: PrivacyLevel) -> Result<()>;
}

/// Moderation contract. Records are created by moderators elsewhere; the
/// only mutation a user performs is an appeal.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ModerationRepo: Send + Sync {
    /// Warnings for the account, oldest first.
    async fn get_warnings(&self, user: UserId) -> Result<Vec<Warning>>;

    async fn get_active_suspension(&self, user: UserId) -> Result<Option<Suspension>>;

    /// Authoritative on duplicates: must reply `AppError::DuplicateAppeal`
    /// when the action already carries an appeal.
    async fn submit_appeal(&self, user: UserId, action: ActionId, message: &str) -> Result<()>;
}
