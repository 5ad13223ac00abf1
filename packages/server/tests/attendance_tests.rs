//! Attendance claim and assignment integration tests

mod common;

use crate::common::fixtures;
use crate::common::TestHarness;
use packtrack_core::domains::events::activities::{
    assign_attendee, claim_attendance, claims_for_event, delete_attendance, longevity_summary,
    record_attendance, set_attendance_hare, withdraw_claim,
};
use packtrack_core::domains::events::models::{Attendee, Longevity, LongevityRecord};
use test_context::test_context;
use tokio_test::{assert_err, assert_ok};

#[test_context(TestHarness)]
#[tokio::test]
async fn assigning_a_claimed_name_clears_the_claims(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let event = fixtures::event(deps, &kennel).await.unwrap();
    let bob = fixtures::user(deps, "bob").await.unwrap();
    let impostor = fixtures::user(deps, "impostor").await.unwrap();

    let recorded = record_attendance(
        admin,
        event.id,
        Attendee::Unclaimed("Just Bob".to_string()),
        false,
        deps,
    )
    .await
    .unwrap();
    let attend_id = recorded.attend.id;

    let claim = assert_ok!(claim_attendance(bob.id, attend_id, deps).await);
    assert_eq!(claim.claimant_id, bob.id);
    claim_attendance(impostor.id, attend_id, deps).await.unwrap();
    let err = assert_err!(claim_attendance(bob.id, attend_id, deps).await);
    assert!(err.is_conflict());

    let claims = claims_for_event(admin, event.id, deps).await.unwrap();
    assert_eq!(claims.len(), 2);
    let err = claims_for_event(bob.id, event.id, deps).await.unwrap_err();
    assert!(err.is_permission_denied());

    let err = assign_attendee(bob.id, attend_id, bob.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let attend = assign_attendee(admin, attend_id, bob.id, deps).await.unwrap();
    assert_eq!(attend.user_id, Some(bob.id));
    assert_eq!(attend.unclaimed_name, None);
    assert!(claims_for_event(admin, event.id, deps)
        .await
        .unwrap()
        .is_empty());

    let err = claim_attendance(impostor.id, attend_id, deps)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let err = assign_attendee(admin, attend_id, impostor.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // The host's record now counts for Bob
    let summary = longevity_summary(bob.id, bob.id, deps).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].tally.kennel_id, kennel.id());
    assert_eq!(summary[0].tally.runs, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn assigning_someone_already_at_the_event_conflicts(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let event = fixtures::event(deps, &kennel).await.unwrap();
    let hasher = fixtures::user(deps, "hasher").await.unwrap();

    record_attendance(admin, event.id, Attendee::User(hasher.id), false, deps)
        .await
        .unwrap();
    let unclaimed = record_attendance(
        admin,
        event.id,
        Attendee::Unclaimed("Twin".to_string()),
        false,
        deps,
    )
    .await
    .unwrap();
    claim_attendance(hasher.id, unclaimed.attend.id, deps)
        .await
        .unwrap();

    let err = assign_attendee(admin, unclaimed.attend.id, hasher.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    // Rolled back with the failed assignment
    assert_eq!(claims_for_event(admin, event.id, deps).await.unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn only_the_claimant_withdraws_a_claim(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let event = fixtures::event(deps, &kennel).await.unwrap();
    let claimant = fixtures::user(deps, "claimant").await.unwrap();

    let recorded = record_attendance(
        admin,
        event.id,
        Attendee::Unclaimed("Someone".to_string()),
        false,
        deps,
    )
    .await
    .unwrap();
    let claim = claim_attendance(claimant.id, recorded.attend.id, deps)
        .await
        .unwrap();

    let err = withdraw_claim(admin, claim.id, deps).await.unwrap_err();
    assert!(err.is_permission_denied());

    assert_ok!(withdraw_claim(claimant.id, claim.id, deps).await);
    assert!(claims_for_event(admin, event.id, deps)
        .await
        .unwrap()
        .is_empty());
    let err = withdraw_claim(claimant.id, claim.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deleting_attendance_depends_on_who_owns_it(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let event = fixtures::event(deps, &kennel).await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();
    let hasher_id = hasher.user.id;

    let claimed = record_attendance(admin, event.id, Attendee::User(hasher_id), false, deps)
        .await
        .unwrap();
    let unclaimed = record_attendance(
        admin,
        event.id,
        Attendee::Unclaimed("Walk-in".to_string()),
        false,
        deps,
    )
    .await
    .unwrap();

    // A claimed attendance belongs to its runner
    let err = delete_attendance(admin, claimed.attend.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    // An unclaimed one belongs to the host
    let err = delete_attendance(hasher_id, unclaimed.attend.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    assert_ok!(delete_attendance(hasher_id, claimed.attend.id, deps).await);
    assert_ok!(delete_attendance(admin, unclaimed.attend.id, deps).await);

    let mut conn = ctx.db_pool.acquire().await.unwrap();
    let credit = Longevity::find(event.id, kennel.id(), &mut *conn)
        .await
        .unwrap()
        .expect("host credited");
    assert!(LongevityRecord::find_by_longevity(credit.id, &mut *conn)
        .await
        .unwrap()
        .is_empty());

    let err = delete_attendance(admin, unclaimed.attend.id, deps)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn host_admins_set_the_hare_flag(ctx: &TestHarness) {
    let deps = ctx.deps();
    let kennel = fixtures::kennel_with_admins(deps, 1).await.unwrap();
    let admin = kennel.admin(0).user.id;
    let event = fixtures::event(deps, &kennel).await.unwrap();
    let hasher = fixtures::member(deps, kennel.id(), false).await.unwrap();

    let recorded = record_attendance(admin, event.id, Attendee::User(hasher.user.id), false, deps)
        .await
        .unwrap();

    let err = set_attendance_hare(hasher.user.id, recorded.attend.id, true, deps)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let attend = set_attendance_hare(admin, recorded.attend.id, true, deps)
        .await
        .unwrap();
    assert!(attend.is_hare);

    let summary = longevity_summary(hasher.user.id, hasher.user.id, deps)
        .await
        .unwrap();
    assert_eq!((summary[0].tally.runs, summary[0].tally.hares), (1, 1));
}
