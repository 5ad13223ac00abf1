//! Test fixtures for creating test data.
//!
//! Fixtures go through the activities where one exists, so test data obeys
//! the same rules as production data. Names carry a random suffix because
//! every test in a binary shares one database.

use anyhow::Result;
use chrono::NaiveDate;
use packtrack_core::common::{ConsensusId, KennelId};
use packtrack_core::domains::consensus::{Consensus, ConsensusVote};
use packtrack_core::domains::events::activities::create_event;
use packtrack_core::domains::events::Event;
use packtrack_core::domains::kennels::activities::{add_membership, create_kennel, register_user};
use packtrack_core::domains::kennels::{CreateKennel, Kennel, Membership, User};
use packtrack_core::kernel::ServerDeps;
use uuid::Uuid;

/// A user and their membership in the kennel under test
#[derive(Debug, Clone)]
pub struct Member {
    pub user: User,
    pub membership: Membership,
}

/// A kennel whose `admins[0]` founded it
#[derive(Debug, Clone)]
pub struct TestKennel {
    pub kennel: Kennel,
    pub admins: Vec<Member>,
}

impl TestKennel {
    pub fn id(&self) -> KennelId {
        self.kennel.id
    }

    pub fn admin(&self, index: usize) -> &Member {
        &self.admins[index]
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn user(deps: &ServerDeps, prefix: &str) -> Result<User> {
    Ok(register_user(&unique(prefix), deps).await?)
}

/// Create a kennel with `admin_count` approved admins.
pub async fn kennel_with_admins(deps: &ServerDeps, admin_count: usize) -> Result<TestKennel> {
    let founder = user(deps, "founder").await?;
    let input = CreateKennel::builder()
        .name(unique("Kennel"))
        .acronym("TKH3")
        .city(Some("Testville".to_string()))
        .build();
    let founded = create_kennel(founder.id, input, deps).await?;

    let mut admins = vec![Member {
        user: founder,
        membership: founded.membership,
    }];
    for _ in 1..admin_count {
        admins.push(member(deps, founded.kennel.id, true).await?);
    }

    Ok(TestKennel {
        kennel: founded.kennel,
        admins,
    })
}

/// Add a fresh approved member, optionally an admin.
pub async fn member(deps: &ServerDeps, kennel_id: KennelId, is_admin: bool) -> Result<Member> {
    let user = user(deps, if is_admin { "admin" } else { "hasher" }).await?;
    let membership = add_membership(user.id, kennel_id, true, is_admin, deps).await?;
    Ok(Member { user, membership })
}

pub async fn event(deps: &ServerDeps, host: &TestKennel) -> Result<Event> {
    let date = NaiveDate::from_ymd_opt(2024, 6, 21).expect("valid date");
    let hosted = create_event(host.admin(0).user.id, &unique("Full Moon Run"), date, host.id(), deps)
        .await?;
    Ok(hosted.event)
}

pub async fn membership(deps: &ServerDeps, member: &Member) -> Result<Option<Membership>> {
    let mut conn = deps.db_pool.acquire().await?;
    Ok(Membership::find_by_id(member.membership.id, &mut *conn).await?)
}

pub async fn consensus(deps: &ServerDeps, id: ConsensusId) -> Result<Option<Consensus>> {
    let mut conn = deps.db_pool.acquire().await?;
    Ok(Consensus::find_by_id(id, &mut *conn).await?)
}

pub async fn ballots(deps: &ServerDeps, id: ConsensusId) -> Result<Vec<ConsensusVote>> {
    let mut conn = deps.db_pool.acquire().await?;
    Ok(ConsensusVote::find_by_consensus(id, &mut *conn).await?)
}

/// Flip admin rights without going through the engine, as an out-of-band
/// change would.
pub async fn set_admin_directly(deps: &ServerDeps, member: &Member, is_admin: bool) -> Result<()> {
    let mut conn = deps.db_pool.acquire().await?;
    Membership::set_admin(member.membership.id, is_admin, &mut *conn).await?;
    Ok(())
}
