//! Venue server binary
//!
//! Hosts the matching engine behind the order-entry TCP channel and the
//! multicast depth feed. All state is transient: the process starts with
//! an empty book and forgets everything at exit.

use anyhow::Context;
use clap::Parser;
use market_data::publisher::{self, Publisher};
use order_entry::venue::{self, AdminCommand, Venue, VenueEvent};
use order_entry::{config, server};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use types::clock;

/// Run a single-instrument exchange venue
#[derive(Parser, Debug)]
#[command(name = "venue")]
struct Args {
    /// Path to the JSON configuration file
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // the depth feed: packets queue here, a sender task drains them
    let (feed_tx, feed_rx) = mpsc::unbounded_channel();
    let mut venue = Venue::new(Publisher::new(feed_tx, clock::now_nanos));
    for account in &config.accounts {
        venue
            .register_account(account.username, account.password)
            .with_context(|| format!("registering account {}", account.username))?;
    }
    info!(accounts = config.accounts.len(), "account registry loaded");

    let feed_socket = publisher::bind_sender(config.feed.ttl)
        .await
        .context("binding the feed socket")?;
    let group = SocketAddrV4::new(config.feed.group, config.feed.port);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port))
        .await
        .with_context(|| format!("binding order-entry port {}", config.port))?;
    info!(
        port = config.port,
        feed_group = %config.feed.group,
        feed_port = config.feed.port,
        "venue listening"
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let _ = events_tx.send(VenueEvent::Admin(AdminCommand::StartSession));

    let engine = tokio::spawn(venue::run(venue, events_rx));
    let feed = tokio::spawn(publisher::run_sender(feed_socket, group, feed_rx));

    let accept = server::run(listener, events_tx.clone());
    tokio::select! {
        result = accept => {
            if let Err(err) = result {
                error!(%err, "accept loop failed");
                return Err(err.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    // close the trading day, then let the engine and feed drain
    let _ = events_tx.send(VenueEvent::Admin(AdminCommand::EndSession));
    drop(events_tx);
    let _ = engine.await;
    let _ = feed.await;
    Ok(())
}
