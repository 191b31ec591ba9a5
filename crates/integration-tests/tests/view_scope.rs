use bl_core::models::{PrivacyLevel, UserId, Viewer};
use bl_core::moderation::BannerState;
use bl_core::scope::ViewScope;
use chrono::Utc;
use integration_tests::Harness;
use tokio::sync::oneshot;

#[tokio::test]
async fn mounted_screen_receives_concurrent_fetches() {
    let h = Harness::new().await;
    let owner = h.user(PrivacyLevel::Public).await;
    let scope = ViewScope::new();

    // Profile and banner fetches have no ordering between them.
    let (profile, banner) = tokio::join!(
        scope.run(h.visibility.can_view(&Viewer::Anonymous, owner)),
        scope.run(h.moderation.banner(owner, Utc::now())),
    );

    assert_eq!(profile, Some(true));
    assert_eq!(banner, Some(BannerState::NoIssues));
}

#[tokio::test]
async fn unmounting_discards_an_in_flight_fetch() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    h.backend.issue_warning(member, UserId::new(), "spam").await.unwrap();

    let scope = ViewScope::new();
    let (release, gate) = oneshot::channel::<()>();

    let task = tokio::spawn({
        let scope = scope.clone();
        let moderation = h.moderation.clone();
        async move {
            scope
                .run(async move {
                    let _ = gate.await;
                    moderation.banner(member, Utc::now()).await
                })
                .await
        }
    });

    scope.unmount();
    // The fetch may already be gone; either way nothing is delivered.
    let _ = release.send(());

    assert_eq!(task.await.unwrap(), None);
}
