//! # Moderation Status
//!
//! Projects a user's warnings and current suspension into the single state
//! the warning banner renders, and guards the one mutation a user can make:
//! appealing a moderation action.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{Appeal, AppealStatus, ModerationRecord, Suspension, UserId, Warning};
use crate::traits::ModerationRepo;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Appeal annotation shown next to each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppealState {
    None,
    Pending,
    Approved,
    Rejected,
}

impl From<Option<&Appeal>> for AppealState {
    fn from(appeal: Option<&Appeal>) -> Self {
        match appeal.map(|a| a.status) {
            None => AppealState::None,
            Some(AppealStatus::Pending) => AppealState::Pending,
            Some(AppealStatus::Approved) => AppealState::Approved,
            Some(AppealStatus::Rejected) => AppealState::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedWarning {
    pub warning: Warning,
    pub appeal: AppealState,
}

impl From<Warning> for AnnotatedWarning {
    fn from(warning: Warning) -> Self {
        let appeal = AppealState::from(warning.appeal.as_ref());
        Self { warning, appeal }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSuspension {
    pub suspension: Suspension,
    pub appeal: AppealState,
}

/// What the warning banner renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BannerState {
    NoIssues,
    SingleWarning(AnnotatedWarning),
    MultipleWarnings {
        warnings: Vec<AnnotatedWarning>,
        expanded: bool,
    },
    Suspended {
        suspension: AnnotatedSuspension,
        is_permanent: bool,
        /// `None` for permanent suspensions.
        days_remaining: Option<i64>,
    },
}

impl BannerState {
    /// Whether the banner renders anything at all.
    pub fn is_visible(&self) -> bool {
        !matches!(self, BannerState::NoIssues)
    }

    /// Expands or collapses the warning list. No-op for other states.
    pub fn toggle_expanded(&mut self) {
        if let BannerState::MultipleWarnings { expanded, .. } = self {
            *expanded = !*expanded;
        }
    }
}

/// A suspension is active when permanent, or when its end date is still
/// strictly in the future.
pub fn is_active(suspension: &Suspension, now: DateTime<Utc>) -> bool {
    suspension.is_permanent || suspension.end_date.is_some_and(|end| end > now)
}

/// Whole days left until `end`, rounded up. Never negative.
pub fn days_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Builds the banner state from a snapshot of moderation records.
///
/// An active suspension outranks any number of warnings. An expired one
/// is ignored and the warnings decide.
pub fn project(
    warnings: Vec<Warning>,
    suspension: Option<Suspension>,
    now: DateTime<Utc>,
) -> BannerState {
    if let Some(suspension) = suspension.filter(|s| is_active(s, now)) {
        let is_permanent = suspension.is_permanent;
        let days_remaining = match (is_permanent, suspension.end_date) {
            (false, Some(end)) => Some(days_remaining(end, now)),
            _ => None,
        };
        let appeal = AppealState::from(suspension.appeal.as_ref());
        return BannerState::Suspended {
            suspension: AnnotatedSuspension { suspension, appeal },
            is_permanent,
            days_remaining,
        };
    }

    let mut warnings: Vec<AnnotatedWarning> = warnings.into_iter().map(Into::into).collect();
    match warnings.len() {
        0 => BannerState::NoIssues,
        1 => BannerState::SingleWarning(warnings.remove(0)),
        _ => BannerState::MultipleWarnings {
            warnings,
            expanded: false,
        },
    }
}

/// Local check run before any appeal reaches the backend. The backend
/// still has the final word on duplicates.
pub fn ensure_appealable(record: &dyn ModerationRecord) -> Result<()> {
    if record.has_appeal() {
        return Err(AppError::DuplicateAppeal(record.action_id()));
    }
    Ok(())
}

/// Length bounds for appeal messages, counted in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppealPolicy {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for AppealPolicy {
    fn default() -> Self {
        Self {
            min_len: 10,
            max_len: 1000,
        }
    }
}

impl AppealPolicy {
    /// Returns the trimmed message if it fits the bounds.
    pub fn validate<'a>(&self, message: &'a str) -> Result<&'a str> {
        let trimmed = message.trim();
        let len = trimmed.chars().count();
        if len < self.min_len {
            return Err(AppError::ValidationError(format!(
                "appeal message must be at least {} characters",
                self.min_len
            )));
        }
        if len > self.max_len {
            return Err(AppError::ValidationError(format!(
                "appeal message must be at most {} characters",
                self.max_len
            )));
        }
        Ok(trimmed)
    }
}

/// Loads banner state and submits appeals through the moderation port.
#[derive(Clone)]
pub struct ModerationService {
    repo: Arc<dyn ModerationRepo>,
    policy: AppealPolicy,
}

impl ModerationService {
    pub fn new(repo: Arc<dyn ModerationRepo>, policy: AppealPolicy) -> Self {
        Self { repo, policy }
    }

    /// Fetches a fresh snapshot and projects it. Any fetch failure yields
    /// `NoIssues` so the banner renders nothing instead of blocking the page.
    pub async fn banner(&self, user: UserId, now: DateTime<Utc>) -> BannerState {
        let (warnings, suspension) = tokio::join!(
            self.repo.get_warnings(user),
            self.repo.get_active_suspension(user)
        );

        match (warnings, suspension) {
            (Ok(warnings), Ok(suspension)) => project(warnings, suspension, now),
            (Err(e), _) | (_, Err(e)) => {
                warn!(%user, error = %e, "moderation lookup failed, hiding banner");
                BannerState::NoIssues
            }
        }
    }

    /// Appeals `record`. Duplicates and invalid messages are rejected
    /// without calling the backend.
    pub async fn submit_appeal(
        &self,
        user: UserId,
        record: &dyn ModerationRecord,
        message: &str,
    ) -> Result<()> {
        ensure_appealable(record)?;
        let message = self.policy.validate(message)?;
        let action = record.action_id();

        match self.repo.submit_appeal(user, action, message).await {
            Ok(()) => {
                info!(%user, %action, "appeal submitted");
                Ok(())
            }
            Err(e) if e.is_user_facing() => Err(e),
            Err(AppError::NotFound(kind, id)) => Err(AppError::NotFound(kind, id)),
            Err(e) => {
                warn!(%user, %action, error = %e, "appeal submission failed");
                Err(AppError::Internal(e.to_string()))
            }
        }
    }
}
