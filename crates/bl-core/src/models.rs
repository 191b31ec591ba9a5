//! # Domain Models
//!
//! Accounts, follow relationships and moderation records as the client
//! sees them. Identifiers are UUID v7 so records sort by creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Opaque account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| AppError::ValidationError(format!("invalid user id {s:?}: {e}")))
    }
}

/// Identifies a single moderation action (a warning or a suspension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ActionId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| AppError::ValidationError(format!("invalid action id {s:?}: {e}")))
    }
}

/// The party attempting to see content.
///
/// Always passed explicitly into decision functions; nothing in this crate
/// reads the current session from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Viewer {
    Anonymous,
    Account(UserId),
}

impl Viewer {
    pub fn id(&self) -> Option<UserId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Account(id) => Some(*id),
        }
    }

    /// True when this viewer is the given account.
    pub fn is(&self, user: UserId) -> bool {
        self.id() == Some(user)
    }
}

impl FromStr for Viewer {
    type Err = AppError;

    /// Accepts `anon` / `anonymous` or an account id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anon" | "anonymous" => Ok(Viewer::Anonymous),
            other => other.parse().map(Viewer::Account),
        }
    }
}

/// An account's default audience for its posts and profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Public,
    Friends,
    Private,
}

impl PrivacyLevel {
    /// Stable string identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Friends => "friends",
            PrivacyLevel::Private => "private",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PrivacyLevel::Public),
            "friends" => Ok(PrivacyLevel::Friends),
            "private" => Ok(PrivacyLevel::Private),
            "" => Err(AppError::ValidationError("empty privacy level".into())),
            other => Err(AppError::ValidationError(format!("unknown privacy level: {other}"))),
        }
    }
}

/// State of one directed follow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowState {
    /// Requested, waiting for the followee to accept.
    Pending,
    Accepted,
}

impl FollowState {
    pub const fn as_str(self) -> &'static str {
        match self {
            FollowState::Pending => "pending",
            FollowState::Accepted => "accepted",
        }
    }
}

impl FromStr for FollowState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(FollowState::Pending),
            "accepted" => Ok(FollowState::Accepted),
            other => Err(AppError::ValidationError(format!("unknown follow state: {other}"))),
        }
    }
}

/// How the viewer stands toward a content owner, always read from the
/// viewer's side. Exactly one state holds for any pair of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// No follow edge that matters in either direction.
    None,
    /// The viewer asked to follow the owner; not yet accepted.
    Pending,
    /// The viewer follows the owner; the owner does not follow back.
    Following,
    /// The owner follows, or asked to follow, the viewer; the viewer has no
    /// follow edge toward the owner.
    Requested,
    /// Accepted follows in both directions.
    Friends,
}

impl Relationship {
    /// Derives the viewer-side state from the two directed edges:
    /// `outgoing` is viewer → owner, `incoming` is owner → viewer.
    pub fn from_edges(outgoing: Option<FollowState>, incoming: Option<FollowState>) -> Self {
        use FollowState::{Accepted, Pending};
        match (outgoing, incoming) {
            (Some(Accepted), Some(Accepted)) => Relationship::Friends,
            (Some(Accepted), _) => Relationship::Following,
            (Some(Pending), _) => Relationship::Pending,
            (None, Some(_)) => Relationship::Requested,
            (None, None) => Relationship::None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Relationship::None => "none",
            Relationship::Pending => "pending",
            Relationship::Following => "following",
            Relationship::Requested => "requested",
            Relationship::Friends => "friends",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Relationship::None),
            "pending" => Ok(Relationship::Pending),
            "following" => Ok(Relationship::Following),
            "requested" => Ok(Relationship::Requested),
            "friends" => Ok(Relationship::Friends),
            other => Err(AppError::ValidationError(format!("unknown relationship: {other}"))),
        }
    }
}

/// Review status of a submitted appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            AppealStatus::Pending => "pending",
            AppealStatus::Approved => "approved",
            AppealStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for AppealStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(AppealStatus::Pending),
            "approved" => Ok(AppealStatus::Approved),
            "rejected" => Ok(AppealStatus::Rejected),
            other => Err(AppError::ValidationError(format!("unknown appeal status: {other}"))),
        }
    }
}

/// A user's request to reconsider a moderation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub status: AppealStatus,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

/// A moderator warning issued against an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub id: ActionId,
    pub user_id: UserId,
    pub reason: String,
    pub moderator_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub appeal: Option<Appeal>,
}

/// A time-boxed or permanent restriction on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub id: ActionId,
    pub user_id: UserId,
    pub reason: String,
    pub moderator_id: UserId,
    pub issued_at: DateTime<Utc>,
    /// Absent for permanent suspensions.
    pub end_date: Option<DateTime<Utc>>,
    pub is_permanent: bool,
    pub appeal: Option<Appeal>,
}

/// Common view over warnings and suspensions for the appeal flow.
pub trait ModerationRecord {
    fn action_id(&self) -> ActionId;
    fn appeal(&self) -> Option<&Appeal>;

    fn has_appeal(&self) -> bool {
        self.appeal().is_some()
    }

    fn appeal_status(&self) -> Option<AppealStatus> {
        self.appeal().map(|a| a.status)
    }
}

impl ModerationRecord for Warning {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn appeal(&self) -> Option<&Appeal> {
        self.appeal.as_ref()
    }
}

impl ModerationRecord for Suspension {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn appeal(&self) -> Option<&Appeal> {
        self.appeal.as_ref()
    }
}
