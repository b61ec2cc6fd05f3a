use std::time::Duration;

use clap::Parser;
use livechat::overlay::ResolveOutcome;
use livechat::roster::sample_roster;
use livechat::store::MessageId;
use livechat::{ChatConfig, ConfigError, EngineEvent, Message, MessageKind, SessionError, SessionEvent, spawn_session};
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("session failed: {0}")]
    Session(#[from] SessionError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "livechat", about = "Simulated live-stream chat")]
struct Cli {
    /// Starting audience size.
    #[arg(long, env = "CHAT_VIEWERS", default_value_t = 250)]
    viewers: u64,

    /// How long to run, in seconds.
    #[arg(long, default_value_t = 60)]
    seconds: u64,

    /// Seed for a reproducible run.
    #[arg(long, env = "CHAT_SEED")]
    seed: Option<u64>,

    /// Let the audience wander up and down once per second.
    #[arg(long)]
    drift: bool,

    /// Open a poll and a prediction at startup and settle them before exit.
    #[arg(long)]
    overlays: bool,

    /// Print messages and events as JSON lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ChatConfig::from_env()?;
    run(&cli, config).await
}

async fn run(cli: &Cli, config: ChatConfig) -> Result<(), CliError> {
    let users = sample_roster();
    let streamer = users[0].id;
    let mut session = spawn_session(config, users.clone(), Some(streamer), cli.viewers, cli.seed);
    info!(viewers = cli.viewers, seconds = cli.seconds, "demo started");

    let mut prediction = None;
    if cli.overlays {
        let options = vec!["Yes".to_string(), "No".to_string()];
        if let Some(poll_id) = session.start_poll("Play another round?", options.clone()).await? {
            for (i, user) in users.iter().enumerate().skip(1) {
                session.vote_poll(poll_id, user.id, i % 2).await?;
            }
        }
        prediction = session.start_prediction("Will we win this one?", options, streamer).await?;
        if let Some(prediction_id) = prediction {
            for (i, user) in users.iter().enumerate().skip(1) {
                session.predict(prediction_id, user.id, i % 2, 100 * i as u64).await?;
            }
        }
    }

    let mut frames = session.subscribe();
    let mut last_printed: MessageId = 0;
    let mut viewers = cli.viewers;
    let mut rng = rand::rng();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let deadline = tokio::time::sleep(Duration::from_secs(cli.seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    warn!("session stopped early");
                    break;
                }
                let messages = frames.borrow_and_update().messages.clone();
                for message in unseen(&messages, last_printed) {
                    print_message(message, cli.json)?;
                    last_printed = message.id;
                }
            }
            Some(event) = session.next_event() => print_event(&event, cli.json)?,
            _ = ticker.tick() => {
                if cli.drift {
                    viewers = drift(viewers, &mut rng);
                    session.set_viewer_count(viewers).await?;
                }
            }
        }
    }

    if let Some(prediction_id) = prediction {
        session.lock_prediction(prediction_id, streamer).await?;
        if let ResolveOutcome::Resolved { payouts, .. } = session.resolve_prediction(prediction_id, streamer, 0).await? {
            info!(winners = payouts.len(), "prediction settled");
        }
        while let Some(event) = session.next_event_within(Duration::from_millis(50)).await {
            print_event(&event, cli.json)?;
        }
    }

    session.shutdown().await?;
    Ok(())
}

/// Messages newer than `after`, oldest first.
fn unseen(messages: &[Message], after: MessageId) -> impl Iterator<Item = &Message> {
    messages.iter().filter(move |m| m.id > after)
}

/// Random walk of up to 5% per step, with a rare raid-sized jump.
fn drift(viewers: u64, rng: &mut impl Rng) -> u64 {
    let factor = if rng.random_bool(0.01) { rng.random_range(1.5..3.0) } else { rng.random_range(0.95..1.05) };
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let next = (viewers.max(1) as f64 * factor).round() as u64;
    next.max(1)
}

fn print_message(message: &Message, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string(message)?);
        return Ok(());
    }
    let mut line = match message.kind {
        MessageKind::System => format!("* {}", message.text),
        MessageKind::Milestone | MessageKind::Hype => format!("{}: {} !", message.sender_name, message.text),
        MessageKind::Chat | MessageKind::SubscriberThanks => format!("{}: {}", message.sender_name, message.text),
    };
    if let Some(donation) = message.donation {
        line.push_str(&format!(" [${}]", donation.amount));
    }
    if let Some(gift) = message.gift {
        line.push_str(&format!(" [{} gifted subs]", gift.count));
    }
    if message.highlighted {
        line = format!(">> {line}");
    }
    println!("{line}");
    Ok(())
}

fn print_event(event: &SessionEvent, json: bool) -> Result<(), CliError> {
    match event {
        // Scroll commands are for render surfaces.
        SessionEvent::Engine(EngineEvent::Scroll { .. }) => {}
        _ if json => println!("{}", serde_json::to_string(event)?),
        SessionEvent::Engine(EngineEvent::PollLocked { .. }) => println!("-- poll locked"),
        SessionEvent::Engine(EngineEvent::PollClosed { winner, .. }) => println!("-- poll closed, winner: {winner:?}"),
        SessionEvent::Engine(EngineEvent::PredictionLocked { .. }) => println!("-- prediction locked"),
        SessionEvent::Engine(EngineEvent::PredictionResolved { winner, .. }) => {
            println!("-- prediction resolved, winner: {winner}");
        }
        SessionEvent::Engine(EngineEvent::PointsAwarded { payout, .. }) => {
            println!("-- {} points to {}", payout.points, payout.viewer);
        }
        SessionEvent::Stopped { messages } => println!("-- session stopped with {messages} messages"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
