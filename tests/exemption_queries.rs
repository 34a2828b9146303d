//! Integration tests for the enabled-scoped exemption predicate and the
//! exception listing directions.

use whitelist_engine::{Database, EntityKind, ExceptionKind, WhitelistService};

async fn service() -> WhitelistService {
    let db = Database::new(":memory:").await.expect("db setup failed");
    WhitelistService::new(db)
}

#[tokio::test]
async fn test_vip_flow_enable_disable_reenable() {
    let svc = service().await;

    svc.create_group("vip").await.unwrap();
    svc.add_members("vip", EntityKind::User, &[111]).await.unwrap();
    svc.add_exceptions("vip", ExceptionKind::Command, &["play"])
        .await
        .unwrap();

    assert!(
        svc.is_exempted_anywhere_enabled("play", ExceptionKind::Command, 111, EntityKind::User)
            .await
            .unwrap()
    );

    svc.set_group_enabled("vip", false).await.unwrap();
    assert!(
        !svc.is_exempted_anywhere_enabled("play", ExceptionKind::Command, 111, EntityKind::User)
            .await
            .unwrap()
    );

    svc.set_group_enabled("vip", true).await.unwrap();
    assert!(
        svc.is_exempted_anywhere_enabled("play", ExceptionKind::Command, 111, EntityKind::User)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_plain_checks_ignore_enabled_flag() {
    let svc = service().await;

    svc.create_group("vip").await.unwrap();
    svc.add_members("vip", EntityKind::User, &[111]).await.unwrap();
    svc.add_exceptions("vip", ExceptionKind::Command, &["play"])
        .await
        .unwrap();
    svc.set_group_enabled("vip", false).await.unwrap();

    // Only the aggregate predicate is enabled-scoped
    assert!(svc.is_member(111, EntityKind::User, "vip").await.unwrap());
    assert!(
        svc.is_exempted("play", ExceptionKind::Command, "vip")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_any_enabled_group_suffices() {
    let svc = service().await;

    for name in ["off", "on"] {
        svc.create_group(name).await.unwrap();
        svc.add_members(name, EntityKind::User, &[7]).await.unwrap();
        svc.add_exceptions(name, ExceptionKind::Module, &["music"])
            .await
            .unwrap();
    }
    svc.set_group_enabled("off", false).await.unwrap();

    assert!(
        svc.is_exempted_anywhere_enabled("music", ExceptionKind::Module, 7, EntityKind::User)
            .await
            .unwrap()
    );

    svc.set_group_enabled("on", false).await.unwrap();
    assert!(
        !svc.is_exempted_anywhere_enabled("music", ExceptionKind::Module, 7, EntityKind::User)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_exceptions_for_member_spans_enabled_groups_only() {
    let svc = service().await;

    svc.create_group("a").await.unwrap();
    svc.create_group("b").await.unwrap();
    for name in ["a", "b"] {
        svc.add_members(name, EntityKind::User, &[5]).await.unwrap();
    }
    svc.add_exceptions("a", ExceptionKind::Command, &["play", "skip"])
        .await
        .unwrap();
    svc.add_exceptions("b", ExceptionKind::Command, &["play", "queue"])
        .await
        .unwrap();
    svc.set_group_enabled("b", false).await.unwrap();

    let listing = svc
        .list_exceptions_for_member(ExceptionKind::Command, 5, EntityKind::User, 0)
        .await
        .unwrap()
        .unwrap();
    // "queue" only reachable through the disabled group; "play" deduped
    assert_eq!(listing.entries, vec!["play", "skip"]);
    assert_eq!(listing.total, 2);
}

#[tokio::test]
async fn test_groups_for_exception_and_exempting_listing() {
    let svc = service().await;

    svc.create_group("alpha").await.unwrap();
    svc.create_group("beta").await.unwrap();
    svc.add_exceptions("alpha", ExceptionKind::Command, &["play"])
        .await
        .unwrap();
    svc.add_exceptions("beta", ExceptionKind::Command, &["play"])
        .await
        .unwrap();
    svc.add_members("beta", EntityKind::User, &[42]).await.unwrap();
    svc.set_group_enabled("beta", false).await.unwrap();

    let listing = svc
        .list_groups_for_exception("PLAY", ExceptionKind::Command, 0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.entries, vec!["✅ alpha", "❌ beta"]);

    // Exempting listing ignores the enabled flag but requires both relations
    let listing = svc
        .list_groups_exempting("play", ExceptionKind::Command, 42, EntityKind::User, 0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.entries, vec!["❌ beta"]);

    // Unknown exception record is no-results
    assert!(
        svc.list_groups_for_exception("nope", ExceptionKind::Command, 0)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_purge_exception_revokes_everywhere() {
    let svc = service().await;

    svc.create_group("vip").await.unwrap();
    svc.add_members("vip", EntityKind::User, &[1]).await.unwrap();
    svc.add_exceptions("vip", ExceptionKind::Command, &["play"])
        .await
        .unwrap();

    assert!(svc.purge_exception(ExceptionKind::Command, "Play").await.unwrap());
    assert!(
        !svc.is_exempted_anywhere_enabled("play", ExceptionKind::Command, 1, EntityKind::User)
            .await
            .unwrap()
    );
}
