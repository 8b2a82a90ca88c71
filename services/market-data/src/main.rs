//! Feed watcher: joins the multicast group and tails the depth stream,
//! logging top-of-book changes from the rebuilt mirror.

use anyhow::Context;
use clap::Parser;
use market_data::depth::DepthSnapshot;
use market_data::messages::{FeedMessage, PACKET_LEN};
use market_data::subscriber::{self, Subscriber};
use std::net::Ipv4Addr;
use tracing::{info, warn};

/// Tail a venue's depth-of-book multicast feed
#[derive(Parser, Debug)]
#[command(name = "watch")]
struct Args {
    /// Multicast group address to join
    #[arg(long, default_value = "239.0.0.1")]
    group: Ipv4Addr,

    /// Multicast port to listen on
    #[arg(long, default_value_t = 9001)]
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let socket = subscriber::join(args.group, args.port)
        .await
        .with_context(|| format!("joining {}:{}", args.group, args.port))?;
    info!(group = %args.group, port = args.port, "listening for depth messages");

    let mut subscriber = Subscriber::new();
    let mut buffer = [0u8; PACKET_LEN];
    loop {
        let (received, from) = socket.recv_from(&mut buffer).await?;
        if received != PACKET_LEN {
            warn!(received, %from, "undersized feed datagram dropped");
            continue;
        }
        subscriber.handle_packet(&buffer);
        report(&subscriber, &buffer);
    }
}

fn report(subscriber: &Subscriber, packet: &[u8; PACKET_LEN]) {
    let Ok(frame) = FeedMessage::decode(packet) else {
        return;
    };
    let book = subscriber.book();
    let kind = frame.message.kind() as char;
    let top = DepthSnapshot::capture(book, 1);
    info!(
        sequence = frame.sequence,
        %kind,
        best_buy = book.best_buy(),
        best_sell = book.best_sell(),
        volume_buy = book.volume_buy(),
        volume_sell = book.volume_sell(),
        spread = top.spread(),
        session_active = subscriber.is_session_active(),
        "book update"
    );
}
