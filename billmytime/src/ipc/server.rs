//! Unix domain socket server for phone bridges
//!
//! Every connected bridge receives every outbound payload and may push
//! menus at any time. Results are reported to the event loop as [`Event`]s.

use crate::app::Event;
use anyhow::{Context, Result};
use billmytime_proto::{decode_line, write_payload, Payload};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

pub fn bind(path: &Path) -> Result<UnixListener> {
    // Remove old socket if it exists
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind phone bridge socket at {:?}", path))?;
    info!("Phone bridge socket listening on {:?}", path);
    Ok(listener)
}

pub async fn serve(
    listener: UnixListener,
    outbox: broadcast::Sender<Payload>,
    events: mpsc::UnboundedSender<Event>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let outbox = outbox.subscribe();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_bridge(stream, outbox, events).await {
                        error!("Error handling phone bridge: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_bridge(
    stream: UnixStream,
    outbox: broadcast::Receiver<Payload>,
    events: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    info!("Phone bridge connected");
    let (reader, writer) = stream.into_split();
    // Writes run on their own task so a slow bridge never holds up its menus.
    let mut outbound = tokio::spawn(forward_outbound(outbox, writer, events.clone()));

    let result = tokio::select! {
        result = forward_inbound(BufReader::new(reader), events) => result,
        _ = &mut outbound => Ok(()),
    };
    outbound.abort();

    info!("Phone bridge disconnected");
    result
}

/// Turns each line from the bridge into an `Inbound` or `Dropped` event
/// until the bridge hangs up.
async fn forward_inbound<R>(reader: R, events: mpsc::UnboundedSender<Event>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match decode_line(&line) {
            Ok(payload) => Event::Inbound(payload),
            Err(e) => Event::Dropped(e.to_string()),
        };
        if events.send(event).is_err() {
            break;
        }
    }
    Ok(())
}

/// Writes every outbound payload to one bridge, reporting `Sent` or
/// `SendFailed` for each. Stops at the first failed write.
async fn forward_outbound<W>(
    mut outbox: broadcast::Receiver<Payload>,
    mut writer: W,
    events: mpsc::UnboundedSender<Event>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        match outbox.recv().await {
            Ok(payload) => {
                if let Err(e) = write_payload(&mut writer, &payload).await {
                    let _ = events.send(Event::SendFailed(e.to_string()));
                    break;
                }
                let _ = events.send(Event::Sent);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Phone bridge fell behind");
                let _ = events.send(Event::SendFailed(format!(
                    "{} messages skipped for a slow bridge",
                    skipped
                )));
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billmytime_proto::{connect, read_payload, OutboundRequest, Pair, SubmitLayout};
    use std::path::PathBuf;
    use tokio::io::AsyncWriteExt;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("billmytime-{}-{}.sock", std::process::id(), name))
    }

    #[tokio::test]
    async fn bridge_pushes_menu_and_receives_requests() {
        let path = socket_path("roundtrip");
        let listener = bind(&path).unwrap();
        let (outbox, _) = broadcast::channel(8);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        tokio::spawn(serve(listener, outbox.clone(), events_tx));

        let stream = connect(&path).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(b"[[0,\"t\"],[5,\"Design\"],[9,\"Build\"]]\n")
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            Event::Inbound(payload) => assert_eq!(payload.len(), 3),
            other => panic!("Expected inbound menu, got {:?}", other),
        }

        let request = OutboundRequest::SelectTask { index: 1 }.to_payload(SubmitLayout::Legacy);
        outbox.send(request.clone()).unwrap();

        let mut reader = BufReader::new(reader);
        assert_eq!(read_payload(&mut reader).await.unwrap(), Some(request));
        assert_eq!(events.recv().await.unwrap(), Event::Sent);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn undecodable_lines_are_reported_as_dropped() {
        let path = socket_path("dropped");
        let listener = bind(&path).unwrap();
        let (outbox, _) = broadcast::channel(8);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        tokio::spawn(serve(listener, outbox, events_tx));

        let mut stream = connect(&path).await.unwrap();
        stream.write_all(b"\nnot json\n[[0,\"c\"]]\n").await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), Event::Dropped(_)));
        assert!(matches!(events.recv().await.unwrap(), Event::Inbound(_)));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn lagging_bridge_reports_skipped_messages() {
        let (outbox, rx) = broadcast::channel(1);
        for index in 0..3 {
            outbox
                .send(OutboundRequest::SelectTask { index }.to_payload(SubmitLayout::Legacy))
                .unwrap();
        }
        drop(outbox);
        let (bridge_end, watch_end) = tokio::io::duplex(1024);
        let (events_tx, mut events) = mpsc::unbounded_channel();

        forward_outbound(rx, watch_end, events_tx).await;

        match events.recv().await.unwrap() {
            Event::SendFailed(reason) => assert!(reason.contains("2 messages skipped")),
            other => panic!("Expected send failure, got {:?}", other),
        }
        assert_eq!(events.recv().await.unwrap(), Event::Sent);
        let mut reader = BufReader::new(bridge_end);
        let payload = read_payload(&mut reader).await.unwrap().unwrap();
        assert_eq!(payload.to_string(), r#"0="selTask" 1=2"#);
    }

    #[tokio::test]
    async fn write_to_vanished_bridge_is_a_send_failure() {
        let (outbox, rx) = broadcast::channel(4);
        let (bridge_end, watch_end) = tokio::io::duplex(1024);
        drop(bridge_end);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        outbox
            .send(OutboundRequest::GetClients { page: 1 }.to_payload(SubmitLayout::Legacy))
            .unwrap();

        forward_outbound(rx, watch_end, events_tx).await;

        assert!(matches!(events.recv().await.unwrap(), Event::SendFailed(_)));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn inbound_keeps_flowing_while_writes_are_blocked() {
        let path = socket_path("blocked");
        let listener = bind(&path).unwrap();
        let (outbox, _) = broadcast::channel(64);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        tokio::spawn(serve(listener, outbox.clone(), events_tx));

        // The bridge never reads, so outbound writes eventually block.
        let mut stream = connect(&path).await.unwrap();
        stream.write_all(b"[[0,\"c\"],[1,\"Acme\"]]\n").await.unwrap();
        assert!(matches!(events.recv().await.unwrap(), Event::Inbound(_)));

        let big = Payload::from_pairs(vec![Pair(0, "x".repeat(64 * 1024).into())]);
        for _ in 0..32 {
            let _ = outbox.send(big.clone());
        }

        stream.write_all(b"[[0,\"t\"],[1,\"Design\"]]\n").await.unwrap();
        loop {
            match events.recv().await.unwrap() {
                Event::Inbound(payload) => {
                    assert_eq!(payload.len(), 2);
                    break;
                }
                Event::Sent | Event::SendFailed(_) => {}
                other => panic!("Unexpected event {:?}", other),
            }
        }

        let _ = std::fs::remove_file(&path);
    }
}
