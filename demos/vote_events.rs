//! Example: Vote events over a loopback "transport"
//!
//! Declares a vote event group, registers it with a dispatch table, and feeds
//! encoded messages back through `dispatch_incoming` as a network peer would.
//!
//! Run with: `cargo run --example vote_events`

#![allow(clippy::uninlined_format_args)]

use eventwire::config::EventwireConfig;
use eventwire::prelude::*;
use eventwire::utils::init_logging;

eventwire::wire_enum! {
    pub enum KickReason: u8 {
        None = 0,
        Cheating = 1,
        Idle = 2,
        Spamming = 3,
    }
}

eventwire::wire_enum! {
    pub enum VoteResult: u8 {
        Passed = 0,
        Failed = 1,
        NotEnoughVotes = 2,
    }
}

eventwire::event_group! {
    /// Everything the vote menu reacts to.
    pub enum VoteEvent {
        BeginMapVote { maps: Vec<String> },
        BeginKickVote { player: String, reason: KickReason },
        EndVote { message: String, result: VoteResult },
        ClearVoting { messages: Vec<String> },
    }
}

fn describe_reason(reason: KickReason) -> &'static str {
    match reason {
        KickReason::Cheating => "Cheating",
        KickReason::Idle => "Idle",
        KickReason::Spamming => "Spamming",
        KickReason::None => "No Reason Given",
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = EventwireConfig::from_toml(
        r#"
[dispatch.groups]
VoteEvent = 3

[logging]
app_name = "vote-demo"
log_level = "debug"
json_format = false
"#,
    )?;
    init_logging(&config.logging);

    let mut builder = DispatchTableBuilder::with_config(&config)?;
    builder.register_configured::<VoteEvent>()?;
    let table = builder.build();

    table.subscribe::<BeginMapVote, _>(|vote| {
        println!("What map next?");
        for (index, map) in vote.maps.iter().enumerate() {
            println!("  [{}] {}", index + 1, map);
        }
        Ok(())
    })?;
    table.subscribe::<BeginKickVote, _>(|vote| {
        println!("Kick {}? ({})", vote.player, describe_reason(vote.reason));
        Ok(())
    })?;
    table.subscribe::<EndVote, _>(|end| {
        let mark = if end.result == VoteResult::Passed { "✔" } else { "✘" };
        println!("{} {}", mark, end.message);
        Ok(())
    })?;
    table.subscribe_group::<VoteEvent, _>(|event| {
        println!("   (kind {})", event.kind());
        Ok(())
    })?;

    let outgoing = [
        VoteEvent::from(BeginMapVote {
            maps: vec!["de_dust2".into(), "de_inferno".into(), "cs_office".into()],
        }),
        VoteEvent::from(BeginKickVote {
            player: "Bob".into(),
            reason: KickReason::Idle,
        }),
        VoteEvent::from(EndVote {
            message: "Bob was kicked".into(),
            result: VoteResult::Passed,
        }),
        VoteEvent::from(ClearVoting { messages: vec![] }),
    ];

    let mut wire = [0u8; 256];
    for event in &outgoing {
        let (group, written) = table.encode(event, &mut wire)?;
        println!("-> group {} | {} bytes | {:02x?}", group, written, &wire[..written]);
        table.dispatch_incoming(group, &wire[..written])?;
    }

    // A stale peer sending a kind this build does not know about.
    if let Err(err) = table.dispatch_incoming(3, &[42]) {
        println!("dropped: {}", err);
    }

    table.metrics().log_metrics();
    println!("{:#?}", table.metrics().snapshot());
    Ok(())
}
