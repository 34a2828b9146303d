//! Integration tests for the listing contract: fixed page size,
//! past-the-end clamping, case-insensitive ordering, no-results.

use whitelist_engine::{Database, EntityKind, RawRenderer, WhitelistService};

async fn service() -> WhitelistService {
    let db = Database::new(":memory:").await.expect("db setup failed");
    WhitelistService::new(db)
}

#[tokio::test]
async fn test_pages_are_fixed_size_and_sorted() {
    let svc = service().await;
    // 12 groups with mixed casing; NOCASE order is g01..g12
    for i in 1..=12 {
        let name = if i % 2 == 0 {
            format!("G{i:02}")
        } else {
            format!("g{i:02}")
        };
        svc.create_group(&name).await.unwrap();
    }

    let page0 = svc.list_groups(0).await.unwrap().unwrap();
    assert_eq!(page0.total, 12);
    assert_eq!(page0.entries.len(), 5);
    assert!(page0.entries[0].ends_with("g01"));
    assert!(page0.entries[4].ends_with("g05"));

    let page2 = svc.list_groups(2).await.unwrap().unwrap();
    assert_eq!(page2.entries.len(), 2);
    assert!(page2.entries[0].ends_with("g11"));
}

#[tokio::test]
async fn test_page_past_the_end_returns_last_page() {
    let svc = service().await;
    for i in 1..=12 {
        svc.create_group(&format!("g{i:02}")).await.unwrap();
    }

    let last = svc.list_groups(2).await.unwrap().unwrap();
    let way_past = svc.list_groups(500).await.unwrap().unwrap();
    assert_eq!(way_past.entries, last.entries);
    assert_eq!(way_past.total, last.total);
}

#[tokio::test]
async fn test_exact_boundary_page_clamps() {
    let svc = service().await;
    // Exactly one full page
    for i in 1..=5 {
        svc.create_group(&format!("g{i}")).await.unwrap();
    }

    // Page 1 would skip exactly total entries; it must clamp back
    let page1 = svc.list_groups(1).await.unwrap().unwrap();
    let page0 = svc.list_groups(0).await.unwrap().unwrap();
    assert_eq!(page1.entries, page0.entries);
}

#[tokio::test]
async fn test_zero_total_is_no_results() {
    let svc = service().await;

    assert!(svc.list_groups(0).await.unwrap().is_none());

    svc.create_group("vip").await.unwrap();
    // Group exists but holds nothing of this kind
    assert!(
        svc.list_group_members("vip", EntityKind::Role, 0, &RawRenderer)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_member_listing_pages_by_id() {
    let svc = service().await;
    svc.create_group("vip").await.unwrap();
    let ids: Vec<u64> = (1..=7).map(|i| i * 100).collect();
    svc.add_members("vip", EntityKind::User, &ids).await.unwrap();

    let page0 = svc
        .list_group_members("vip", EntityKind::User, 0, &RawRenderer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(page0.total, 7);
    assert_eq!(page0.entries, vec!["100", "200", "300", "400", "500"]);

    let page1 = svc
        .list_group_members("vip", EntityKind::User, 1, &RawRenderer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(page1.entries, vec!["600", "700"]);

    // Clamp applies to this direction too
    let past = svc
        .list_group_members("vip", EntityKind::User, 9, &RawRenderer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(past.entries, page1.entries);
}

#[tokio::test]
async fn test_groups_for_member_direction() {
    let svc = service().await;
    for name in ["zeta", "Alpha", "mid"] {
        svc.create_group(name).await.unwrap();
        svc.add_members(name, EntityKind::User, &[9]).await.unwrap();
    }
    svc.create_group("empty").await.unwrap();

    let listing = svc
        .list_groups_for_member(9, EntityKind::User, 0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listing.total, 3);
    assert_eq!(listing.entries, vec!["✅ Alpha", "✅ mid", "✅ zeta"]);

    assert!(
        svc.list_groups_for_member(10, EntityKind::User, 0)
            .await
            .unwrap()
            .is_none()
    );
}
