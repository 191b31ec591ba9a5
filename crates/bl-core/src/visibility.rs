//! # Visibility
//!
//! The single rule deciding whether a viewer may see content (a post, an
//! activity, a whole profile) belonging to an owner. Every surface that
//! renders another user's content goes through [`can_view`], either
//! directly or via [`VisibilityService`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{PrivacyLevel, Relationship, UserId, Viewer};
use crate::traits::SocialGraph;

/// Outcome of the external relationship lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipLookup {
    /// Not fetched because the decision did not depend on it.
    NotRequested,
    Resolved(Relationship),
    /// The backend could not answer; treated as deny. Only meaningful for
    /// `friends` owners, since no other privacy level consults the relationship.
    Failed,
}

impl From<Result<Relationship>> for RelationshipLookup {
    fn from(res: Result<Relationship>) -> Self {
        match res {
            Ok(rel) => RelationshipLookup::Resolved(rel),
            Err(_) => RelationshipLookup::Failed,
        }
    }
}

/// Decides whether `viewer` may see content owned by `owner`.
///
/// Precedence: the owner always sees their own content, then `public`
/// allows, `private` denies, and `friends` allows only a resolved
/// `Friends` relationship.
pub fn can_view(
    viewer: &Viewer,
    owner: UserId,
    privacy: PrivacyLevel,
    relationship: RelationshipLookup,
) -> bool {
    if viewer.is(owner) {
        return true;
    }
    match privacy {
        PrivacyLevel::Public => true,
        PrivacyLevel::Private => false,
        PrivacyLevel::Friends => {
            matches!(relationship, RelationshipLookup::Resolved(Relationship::Friends))
        }
    }
}

/// Whether [`can_view`] needs a relationship lookup for this input.
pub fn needs_relationship(viewer: &Viewer, owner: UserId, privacy: PrivacyLevel) -> bool {
    privacy == PrivacyLevel::Friends && viewer.id().is_some_and(|id| id != owner)
}

/// Anything rendered on behalf of an account.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

/// What a profile screen is allowed to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum ProfileAccess {
    Full,
    /// Render a placeholder. `privacy` is absent when it could not be
    /// looked up.
    Restricted { privacy: Option<PrivacyLevel> },
}

/// Resolves visibility against the social graph port.
///
/// Backend failures never escape: every error degrades to deny.
#[derive(Clone)]
pub struct VisibilityService {
    graph: Arc<dyn SocialGraph>,
}

impl VisibilityService {
    pub fn new(graph: Arc<dyn SocialGraph>) -> Self {
        Self { graph }
    }

    pub async fn can_view(&self, viewer: &Viewer, owner: UserId) -> bool {
        self.resolve(viewer, owner).await.0
    }

    /// Decides access for a full profile page.
    pub async fn profile_view(&self, viewer: &Viewer, owner: UserId) -> ProfileAccess {
        match self.resolve(viewer, owner).await {
            (true, _) => ProfileAccess::Full,
            (false, privacy) => ProfileAccess::Restricted { privacy },
        }
    }

    /// Keeps the items the viewer may see, in their original order.
    ///
    /// Each distinct owner is resolved once per call.
    pub async fn filter_visible<T: Owned>(&self, viewer: &Viewer, items: Vec<T>) -> Vec<T> {
        let mut decisions: HashMap<UserId, bool> = HashMap::new();
        let mut visible = Vec::with_capacity(items.len());

        for item in items {
            let owner = item.owner_id();
            let allowed = match decisions.get(&owner) {
                Some(allowed) => *allowed,
                None => {
                    let allowed = self.resolve(viewer, owner).await.0;
                    decisions.insert(owner, allowed);
                    allowed
                }
            };
            if allowed {
                visible.push(item);
            }
        }

        visible
    }

    async fn resolve(&self, viewer: &Viewer, owner: UserId) -> (bool, Option<PrivacyLevel>) {
        // 1. Owners skip every lookup
        if viewer.is(owner) {
            return (true, None);
        }

        // 2. Privacy setting; unknown privacy is never treated as public
        let privacy = match self.graph.get_privacy_default(owner).await {
            Ok(privacy) => privacy,
            Err(e) => {
                warn!(%owner, error = %e, "privacy lookup failed, denying");
                return (false, None);
            }
        };

        // 3. Relationship, only when the rule depends on it
        let relationship: RelationshipLookup = match viewer.id() {
            Some(viewer_id) if needs_relationship(viewer, owner, privacy) => self
                .graph
                .get_relationship(viewer_id, owner)
                .await
                .inspect_err(|e| {
                    warn!(viewer = %viewer_id, %owner, error = %e, "relationship lookup failed, denying")
                })
                .into(),
            _ => RelationshipLookup::NotRequested,
        };

        let allowed = can_view(viewer, owner, privacy, relationship);
        debug!(?viewer, %owner, %privacy, ?relationship, allowed, "visibility resolved");
        (allowed, Some(privacy))
    }
}
