//! Membership store integration tests

mod common;

use crate::common::fixtures;
use crate::common::TestHarness;
use packtrack_core::common::KennelId;
use packtrack_core::domains::kennels::activities::{
    add_membership, approve_membership, create_kennel, leave_kennel, register_user,
    remove_membership, request_membership, set_legacy_longevity,
};
use packtrack_core::domains::kennels::{CreateKennel, Kennel};
use test_context::test_context;
use tokio_test::assert_ok;

#[test_context(TestHarness)]
#[tokio::test]
async fn founder_becomes_approved_admin(ctx: &TestHarness) {
    let deps = ctx.deps();
    let founder = fixtures::user(deps, "founder").await.unwrap();
    let name = fixtures::unique("Hash House");

    let founded = assert_ok!(
        create_kennel(
            founder.id,
            CreateKennel::builder().name(name.clone()).acronym("HHH").build(),
            deps,
        )
        .await
    );
    assert!(founded.membership.is_admin);
    assert!(founded.membership.is_approved);
    assert!(founded.kennel.is_active);

    let mut conn = ctx.db_pool.acquire().await.unwrap();
    assert_eq!(Kennel::admin_count(founded.kennel.id, &mut *conn).await.unwrap(), 1);
    let admins = Kennel::admins(founded.kennel.id, &mut *conn).await.unwrap();
    assert_eq!(admins[0].user_id, founder.id);

    let err = create_kennel(
        founder.id,
        CreateKennel::builder().name(name).acronym("HHH").build(),
        deps,
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_usernames_conflict(ctx: &TestHarness) {
    let deps = ctx.deps();
    let name = fixtures::unique("hasher");

    register_user(&name, deps).await.unwrap();
    assert!(register_user(&name, deps).await.unwrap_err().is_conflict());
    assert!(register_user("   ", deps).await.unwrap_err().is_validation());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_membership_conflicts(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();

    let err = add_membership(hasher.user.id, kennel.id(), true, false, deps)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let err = add_membership(hasher.user.id, KennelId::new(), true, false, deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn requests_wait_for_an_admin(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let outsider = fixtures::user(deps, "outsider").await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();

    let pending = request_membership(outsider.id, kennel.id(), deps).await.unwrap();
    assert!(!pending.is_approved);
    assert!(!pending.is_admin);

    let err = approve_membership(hasher.user.id, pending.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let approved = approve_membership(kennel.admin(0).user.id, pending.id, deps)
        .await
        .unwrap();
    assert!(approved.is_approved);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approval_is_idempotent_and_needs_a_live_request(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let first = fixtures::user(deps, "first").await.unwrap();
    let second = fixtures::user(deps, "second").await.unwrap();

    let pending = request_membership(first.id, kennel.id(), deps).await.unwrap();
    let approved = assert_ok!(approve_membership(admin, pending.id, deps).await);
    let again = assert_ok!(approve_membership(admin, pending.id, deps).await);
    assert_eq!(approved.id, again.id);
    assert!(again.is_approved);

    let withdrawn = request_membership(second.id, kennel.id(), deps).await.unwrap();
    remove_membership(withdrawn.id, deps).await.unwrap();
    let err = approve_membership(admin, withdrawn.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn last_admin_cannot_leave(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let founder = kennel.admin(0);

    let err = leave_kennel(founder.user.id, kennel.id(), deps)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(fixtures::membership(deps, founder).await.unwrap().is_some());

    // Once someone else is admin the founder may go
    fixtures::member(deps, kennel.id(), true).await.unwrap();
    assert_ok!(leave_kennel(founder.user.id, kennel.id(), deps).await);
    assert!(fixtures::membership(deps, founder).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn removing_a_plain_member_skips_recheck(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();

    let report = remove_membership(hasher.membership.id, deps).await.unwrap();
    assert!(report.is_empty());
    assert!(fixtures::membership(deps, &hasher).await.unwrap().is_none());

    let err = remove_membership(hasher.membership.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn legacy_longevity_is_admin_only(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();
    let admin = kennel.admin(0).user.id;

    let err = set_legacy_longevity(hasher.user.id, hasher.user.id, kennel.id(), 99, 0, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let err = set_legacy_longevity(admin, hasher.user.id, kennel.id(), 3, 5, deps)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    set_legacy_longevity(admin, hasher.user.id, kennel.id(), 10, 1, deps)
        .await
        .unwrap();
    let updated = set_legacy_longevity(admin, hasher.user.id, kennel.id(), 12, 2, deps)
        .await
        .unwrap();
    assert_eq!((updated.count, updated.hares), (12, 2));
}
