//! TCP accept loop and per-connection pumps
//!
//! Each accepted socket gets a reader task and a writer task. The reader
//! pulls exact 40-byte frames and forwards them to the venue task; a
//! partial frame or transport error ends the connection. The writer
//! drains the session's outbound queue; when the venue drops the queue
//! (protocol violation or shutdown) the writer flushes what is buffered
//! and closes the socket.

use crate::messages::{Frame, FRAME_LEN};
use crate::venue::{SessionId, VenueEvent};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Accept connections forever, binding each new session to the venue.
pub async fn run(
    listener: TcpListener,
    events: mpsc::UnboundedSender<VenueEvent>,
) -> io::Result<()> {
    let mut next_session = 1u64;
    loop {
        let (stream, peer) = listener.accept().await?;
        let session = SessionId(next_session);
        next_session += 1;
        info!(session = session.0, %peer, "connection accepted");

        let (frames_tx, frames_rx) = mpsc::unbounded_channel::<Frame>();
        if events
            .send(VenueEvent::Connected {
                session,
                tx: frames_tx,
            })
            .is_err()
        {
            // the venue is shutting down
            return Ok(());
        }

        let (read_half, write_half) = stream.into_split();
        tokio::spawn(read_pump(read_half, session, events.clone()));
        tokio::spawn(write_pump(write_half, session, frames_rx));
    }
}

/// Read exact frames from the peer and forward them to the venue.
async fn read_pump(
    mut read_half: OwnedReadHalf,
    session: SessionId,
    events: mpsc::UnboundedSender<VenueEvent>,
) {
    let mut frame = [0u8; FRAME_LEN];
    loop {
        match read_half.read_exact(&mut frame).await {
            Ok(_) => {
                if events
                    .send(VenueEvent::Frame { session, frame })
                    .is_err()
                {
                    return;
                }
            }
            Err(err) => {
                if err.kind() == io::ErrorKind::UnexpectedEof {
                    debug!(session = session.0, "peer closed the connection");
                } else {
                    warn!(session = session.0, %err, "read failed; dropping connection");
                }
                let _ = events.send(VenueEvent::Disconnected { session });
                return;
            }
        }
    }
}

/// Drain queued frames onto the socket in enqueue order.
async fn write_pump(
    mut write_half: OwnedWriteHalf,
    session: SessionId,
    mut frames: mpsc::UnboundedReceiver<Frame>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(err) = write_half.write_all(&frame).await {
            warn!(session = session.0, %err, "write failed; dropping connection");
            return;
        }
    }
    // the venue closed this session; signal the peer we are done
    let _ = write_half.shutdown().await;
    debug!(session = session.0, "writer drained and closed");
}
