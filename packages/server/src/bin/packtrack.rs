//! Operator CLI for PackTrack
//!
//! Every command prints one JSON document on stdout; logs go to stderr.
//! Identity is passed explicitly as a user id.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use packtrack_core::common::{
    AttendClaimId, AttendId, ConsensusId, EventId, KennelId, LongevityRecordId, MembershipId,
    UserId,
};
use packtrack_core::config::Config;
use packtrack_core::domains::consensus::activities as consensus;
use packtrack_core::domains::consensus::{ConsensusAction, ConsensusTarget};
use packtrack_core::domains::events::activities as events;
use packtrack_core::domains::events::Attendee;
use packtrack_core::domains::kennels::activities as kennels;
use packtrack_core::domains::kennels::CreateKennel;
use packtrack_core::kernel::ServerDeps;

#[derive(Parser)]
#[command(name = "packtrack")]
#[command(about = "Kennel membership, longevity and admin consensus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Choice {
    Yes,
    No,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Register a user
    RegisterUser { username: String },

    /// Create a kennel with the founder as its first admin
    CreateKennel {
        #[arg(long)]
        founder: UserId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        acronym: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        about: Option<String>,
    },

    /// Request membership of a kennel
    Join {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        kennel: KennelId,
    },

    /// Approve a pending membership
    Approve {
        #[arg(long)]
        approver: UserId,
        #[arg(long)]
        membership: MembershipId,
    },

    /// Leave a kennel
    Leave {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        kennel: KennelId,
    },

    /// Create an event hosted by a kennel
    CreateEvent {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        host: KennelId,
    },

    /// Record attendance at an event
    Attend {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        event: EventId,
        #[arg(long, conflicts_with = "unclaimed", required_unless_present = "unclaimed")]
        user: Option<UserId>,
        #[arg(long)]
        unclaimed: Option<String>,
        #[arg(long)]
        hare: bool,
    },

    /// Claim an attendance recorded under a name
    Claim {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        attend: AttendId,
    },

    /// Withdraw your claim
    Unclaim {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        claim: AttendClaimId,
    },

    /// Open claims on an event's attendance
    Claims {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        event: EventId,
    },

    /// Assign an unclaimed attendance to a user
    Assign {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        attend: AttendId,
        #[arg(long)]
        user: UserId,
    },

    /// Mark whether an attendee hared
    Hare {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        attend: AttendId,
        #[arg(value_enum)]
        choice: Choice,
    },

    /// Delete an attendance
    Unattend {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        attend: AttendId,
    },

    /// Set pre-system runs and hares for a member
    Legacy {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        kennel: KennelId,
        #[arg(long)]
        count: i32,
        #[arg(long, default_value_t = 0)]
        hares: i32,
    },

    /// Choose whether one attendance counts toward its kennel
    Count {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        record: LongevityRecordId,
        #[arg(long, value_enum)]
        counted: Choice,
    },

    /// Open a consensus
    Propose {
        #[arg(long)]
        initiator: UserId,
        #[arg(long)]
        kennel: KennelId,
        /// kick, grant_admin, revoke_admin, add_longevity, remove_longevity
        #[arg(long)]
        action: ConsensusAction,
        #[arg(long, conflicts_with = "event", required_unless_present = "event")]
        membership: Option<MembershipId>,
        #[arg(long)]
        event: Option<EventId>,
    },

    /// Cast a ballot
    Vote {
        #[arg(long)]
        consensus: ConsensusId,
        #[arg(long)]
        voter: UserId,
        #[arg(value_enum)]
        choice: Choice,
    },

    /// Withdraw a consensus you opened
    Withdraw {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        consensus: ConsensusId,
    },

    /// Open consensus items in kennels you administer
    Open {
        #[arg(long)]
        user: UserId,
    },

    /// Description and vote split of a consensus
    Split {
        #[arg(long)]
        requester: UserId,
        #[arg(long)]
        consensus: ConsensusId,
    },

    /// Your ballots across kennels
    Ballots {
        #[arg(long)]
        user: UserId,
    },

    /// A member's longevity in a kennel
    Tally {
        #[arg(long)]
        requester: UserId,
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        kennel: KennelId,
    },

    /// A member's longevity across kennels
    Summary {
        #[arg(long)]
        requester: UserId,
        #[arg(long)]
        user: UserId,
    },
}

impl Choice {
    fn as_bool(self) -> bool {
        matches!(self, Self::Yes)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,packtrack_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let deps = ServerDeps::connect(&config).await?;

    match cli.command {
        Commands::Migrate => {
            sqlx::migrate!("./migrations")
                .run(&deps.db_pool)
                .await
                .context("Failed to run migrations")?;
            output(&json!({ "success": true }))
        }
        Commands::RegisterUser { username } => {
            output(&kennels::register_user(&username, &deps).await?)
        }
        Commands::CreateKennel {
            founder,
            name,
            acronym,
            city,
            about,
        } => {
            let input = CreateKennel::builder()
                .name(name)
                .acronym(acronym)
                .city(city)
                .about(about)
                .build();
            output(&kennels::create_kennel(founder, input, &deps).await?)
        }
        Commands::Join { user, kennel } => {
            output(&kennels::request_membership(user, kennel, &deps).await?)
        }
        Commands::Approve {
            approver,
            membership,
        } => output(&kennels::approve_membership(approver, membership, &deps).await?),
        Commands::Leave { user, kennel } => {
            output(&kennels::leave_kennel(user, kennel, &deps).await?)
        }
        Commands::CreateEvent {
            actor,
            name,
            date,
            host,
        } => output(&events::create_event(actor, &name, date, host, &deps).await?),
        Commands::Attend {
            actor,
            event,
            user,
            unclaimed,
            hare,
        } => {
            let attendee = match (user, unclaimed) {
                (Some(user), _) => Attendee::User(user),
                (None, Some(name)) => Attendee::Unclaimed(name),
                (None, None) => anyhow::bail!("either --user or --unclaimed is required"),
            };
            output(&events::record_attendance(actor, event, attendee, hare, &deps).await?)
        }
        Commands::Claim { user, attend } => {
            output(&events::claim_attendance(user, attend, &deps).await?)
        }
        Commands::Unclaim { user, claim } => {
            output(&events::withdraw_claim(user, claim, &deps).await?)
        }
        Commands::Claims { actor, event } => {
            output(&events::claims_for_event(actor, event, &deps).await?)
        }
        Commands::Assign {
            actor,
            attend,
            user,
        } => output(&events::assign_attendee(actor, attend, user, &deps).await?),
        Commands::Hare {
            actor,
            attend,
            choice,
        } => output(&events::set_attendance_hare(actor, attend, choice.as_bool(), &deps).await?),
        Commands::Unattend { actor, attend } => {
            output(&events::delete_attendance(actor, attend, &deps).await?)
        }
        Commands::Legacy {
            actor,
            user,
            kennel,
            count,
            hares,
        } => output(&kennels::set_legacy_longevity(actor, user, kennel, count, hares, &deps).await?),
        Commands::Count {
            actor,
            record,
            counted,
        } => output(&events::set_record_counted(actor, record, counted.as_bool(), &deps).await?),
        Commands::Propose {
            initiator,
            kennel,
            action,
            membership,
            event,
        } => {
            let target = match (membership, event) {
                (Some(membership), _) => ConsensusTarget::Membership(membership),
                (None, Some(event)) => ConsensusTarget::Event(event),
                (None, None) => anyhow::bail!("either --membership or --event is required"),
            };
            output(&consensus::create_consensus(initiator, kennel, action, target, &deps).await?)
        }
        Commands::Vote {
            consensus: consensus_id,
            voter,
            choice,
        } => output(&consensus::cast_vote(consensus_id, voter, choice.as_bool(), &deps).await?),
        Commands::Withdraw {
            actor,
            consensus: consensus_id,
        } => output(&consensus::withdraw_consensus(consensus_id, actor, &deps).await?),
        Commands::Open { user } => output(&consensus::list_open_for_admin(user, &deps).await?),
        Commands::Split {
            requester,
            consensus: consensus_id,
        } => {
            let summary = consensus::consensus_summary(consensus_id, requester, &deps).await?;
            let readable = format!("{} ({})", summary.description, summary.split.readable());
            output(&json!({ "summary": summary, "readable": readable }))
        }
        Commands::Ballots { user } => {
            output(&consensus::list_ballots_for_voter(user, &deps).await?)
        }
        Commands::Tally {
            requester,
            user,
            kennel,
        } => output(&events::longevity_tally(requester, user, kennel, &deps).await?),
        Commands::Summary { requester, user } => {
            output(&events::longevity_summary(requester, user, &deps).await?)
        }
    }
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
