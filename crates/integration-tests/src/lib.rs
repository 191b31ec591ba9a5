//! Shared fixtures for the cross-crate tests under `tests/`.

use std::sync::Arc;

use bl_core::models::{PrivacyLevel, UserId};
use bl_core::moderation::{AppealPolicy, ModerationService};
use bl_core::traits::SocialGraphAdmin;
use bl_core::visibility::VisibilityService;
use bl_db_sqlite::SqliteBackend;

/// A fresh in-memory backend with both services wired to it.
pub struct Harness {
    pub backend: Arc<SqliteBackend>,
    pub visibility: VisibilityService,
    pub moderation: ModerationService,
}

impl Harness {
    pub async fn new() -> Self {
        let backend = Arc::new(
            SqliteBackend::new("sqlite::memory:")
                .await
                .expect("in-memory sqlite"),
        );
        Self {
            visibility: VisibilityService::new(backend.clone()),
            moderation: ModerationService::new(backend.clone(), AppealPolicy::default()),
            backend,
        }
    }

    pub async fn user(&self, privacy: PrivacyLevel) -> UserId {
        let id = UserId::new();
        self.backend
            .ensure_user(id, privacy)
            .await
            .expect("create user");
        id
    }

    /// Follows in both directions and accepts both edges.
    pub async fn befriend(&self, a: UserId, b: UserId) {
        for (follower, followee) in [(a, b), (b, a)] {
            self.backend.follow(follower, followee).await.expect("follow");
            self.backend
                .accept_follow(follower, followee)
                .await
                .expect("accept");
        }
    }
}
