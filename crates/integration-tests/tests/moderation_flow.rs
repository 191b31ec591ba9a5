use std::sync::Arc;

use bl_core::error::AppError;
use bl_core::models::{AppealStatus, PrivacyLevel, UserId};
use bl_core::moderation::{AppealPolicy, AppealState, BannerState, ModerationService};
use bl_core::traits::{MockModerationRepo, ModerationRepo};
use chrono::{Duration, Utc};
use integration_tests::Harness;

#[tokio::test]
async fn clean_account_has_no_banner() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;

    assert_eq!(h.moderation.banner(member, Utc::now()).await, BannerState::NoIssues);
}

#[tokio::test]
async fn warnings_then_suspension_then_expiry() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    let moderator = UserId::new();

    h.backend.issue_warning(member, moderator, "off-topic").await.unwrap();
    assert!(matches!(
        h.moderation.banner(member, Utc::now()).await,
        BannerState::SingleWarning(_)
    ));

    h.backend.issue_warning(member, moderator, "spam").await.unwrap();
    assert!(matches!(
        h.moderation.banner(member, Utc::now()).await,
        BannerState::MultipleWarnings { expanded: false, .. }
    ));

    let ends = Utc::now() + Duration::days(3);
    h.backend
        .issue_suspension(member, moderator, "repeat spam", Some(ends), false)
        .await
        .unwrap();
    match h.moderation.banner(member, Utc::now()).await {
        BannerState::Suspended { is_permanent, days_remaining, .. } => {
            assert!(!is_permanent);
            assert_eq!(days_remaining, Some(3));
        }
        other => panic!("expected Suspended, got {other:?}"),
    }

    // Seen from after the end date the suspension no longer counts.
    let later = ends + Duration::hours(1);
    let suspension = h.backend.get_active_suspension(member).await.unwrap();
    let warnings = h.backend.get_warnings(member).await.unwrap();
    assert!(matches!(
        bl_core::moderation::project(warnings, suspension, later),
        BannerState::MultipleWarnings { .. }
    ));
}

#[tokio::test]
async fn appeal_goes_through_once() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    let action = h
        .backend
        .issue_suspension(member, UserId::new(), "ban evasion", None, true)
        .await
        .unwrap();

    let suspension = h.backend.get_active_suspension(member).await.unwrap().unwrap();
    h.moderation
        .submit_appeal(member, &suspension, "This was my sibling's account.")
        .await
        .unwrap();

    // The refreshed record carries the pending appeal
    let suspension = h.backend.get_active_suspension(member).await.unwrap().unwrap();
    assert_eq!(suspension.appeal.as_ref().map(|a| a.status), Some(AppealStatus::Pending));
    match h.moderation.banner(member, Utc::now()).await {
        BannerState::Suspended { suspension, .. } => {
            assert_eq!(suspension.appeal, AppealState::Pending);
        }
        other => panic!("expected Suspended, got {other:?}"),
    }

    // Guarded locally with the fresh record
    let err = h
        .moderation
        .submit_appeal(member, &suspension, "Please, it really was my sibling.")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateAppeal(id) if id == action));
}

#[tokio::test]
async fn stale_record_is_still_rejected_by_the_backend() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    h.backend.issue_warning(member, UserId::new(), "spam").await.unwrap();

    let stale = h.backend.get_warnings(member).await.unwrap().remove(0);
    h.moderation
        .submit_appeal(member, &stale, "It was a link to my own blog.")
        .await
        .unwrap();

    // Same stale snapshot: the local guard passes, the backend refuses.
    let err = h
        .moderation
        .submit_appeal(member, &stale, "It was a link to my own blog!!")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateAppeal(_)));
    assert!(err.is_user_facing());
}

#[tokio::test]
async fn short_appeal_is_rejected_before_reaching_the_backend() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    h.backend.issue_warning(member, UserId::new(), "spam").await.unwrap();
    let warning = h.backend.get_warnings(member).await.unwrap().remove(0);

    let err = h.moderation.submit_appeal(member, &warning, "no").await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert!(h.backend.get_warnings(member).await.unwrap()[0].appeal.is_none());
}

#[tokio::test]
async fn suspension_fetch_failure_hides_the_banner() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    h.backend.issue_warning(member, UserId::new(), "spam").await.unwrap();
    let warnings = h.backend.get_warnings(member).await.unwrap();

    let mut repo = MockModerationRepo::new();
    repo.expect_get_warnings()
        .returning(move |_| Ok(warnings.clone()));
    repo.expect_get_active_suspension()
        .returning(|_| Err(AppError::Lookup("timed out".into())));

    let service = ModerationService::new(Arc::new(repo), AppealPolicy::default());
    assert_eq!(service.banner(member, Utc::now()).await, BannerState::NoIssues);
}

#[tokio::test]
async fn permanent_suspension_is_not_masked_by_a_later_timed_one() {
    let h = Harness::new().await;
    let member = h.user(PrivacyLevel::Public).await;
    let moderator = UserId::new();

    h.backend
        .issue_suspension(member, moderator, "ban evasion", None, true)
        .await
        .unwrap();
    h.backend
        .issue_suspension(member, moderator, "spam", Some(Utc::now() + Duration::days(3)), false)
        .await
        .unwrap();

    match h.moderation.banner(member, Utc::now()).await {
        BannerState::Suspended { is_permanent, days_remaining, .. } => {
            assert!(is_permanent);
            assert_eq!(days_remaining, None);
        }
        other => panic!("expected Suspended, got {other:?}"),
    }
}
