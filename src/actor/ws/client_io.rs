use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tungstenite::protocol::Message;
use tungstenite::{HandshakeError, WebSocket};
use url::Url;

use super::Outbound;
use crate::actor::messages::EventSink;
use crate::actor::transport::TransportError;

/// Sleep between polls when the socket has nothing to read
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Socket thread entry: dial, report the outcome, then serve the channel.
pub(super) fn run_channel(
    target: Url,
    timeout: Duration,
    outbound: Receiver<Outbound>,
    events: EventSink,
) {
    let mut ws = match dial(&target, timeout) {
        Ok(ws) => ws,
        Err(e) => {
            events.open_failed(describe(&e));
            return;
        }
    };

    crate::debug!("ws"; "handshake complete: {}", target);
    if !events.opened() {
        let _ = ws.close(None);
        let _ = ws.flush();
        return;
    }
    socket_loop(ws, outbound, events);
}

/// Resolve, connect and handshake, each step bounded by `timeout`.
/// The returned socket is non-blocking.
fn dial(target: &Url, timeout: Duration) -> Result<WebSocket<TcpStream>, TransportError> {
    let url = target.as_str();
    let addrs = target
        .socket_addrs(|| Some(80))
        .map_err(|e| TransportError::Connect(url.into(), e))?;
    let stream = connect_any(&addrs, timeout).map_err(|e| match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout(url.into()),
        _ => TransportError::Connect(url.into(), e),
    })?;

    let bound = |stream: &TcpStream, limit: Option<Duration>| {
        stream
            .set_read_timeout(limit)
            .and_then(|()| stream.set_write_timeout(limit))
    };
    bound(&stream, Some(timeout)).map_err(|e| TransportError::Connect(url.into(), e))?;

    let (ws, _response) = tungstenite::client(url, stream).map_err(|e| match e {
        // Read/write timeouts surface as an interrupted handshake
        HandshakeError::Interrupted(_) => TransportError::Timeout(url.into()),
        HandshakeError::Failure(tungstenite::Error::Io(e))
            if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
        {
            TransportError::Timeout(url.into())
        }
        HandshakeError::Failure(e) => TransportError::Handshake(e.to_string()),
    })?;

    bound(ws.get_ref(), None)
        .and_then(|()| ws.get_ref().set_nonblocking(true))
        .map_err(|e| TransportError::Connect(url.into(), e))?;
    Ok(ws)
}

/// Connect to the first address that accepts within `timeout`.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let mut last = io::Error::new(ErrorKind::NotFound, "host resolved to no addresses");
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last = e,
        }
    }
    Err(last)
}

/// Error text including its io cause.
fn describe(error: &TransportError) -> String {
    match std::error::Error::source(error) {
        Some(source) => format!("{error}: {source}"),
        None => error.to_string(),
    }
}

/// Socket thread: flush queued frames, poll for inbound ones, report
/// everything through `events`. Exits when the channel closes, fails, or
/// the session stops listening.
fn socket_loop(
    mut ws: WebSocket<TcpStream>,
    outbound: Receiver<Outbound>,
    events: EventSink,
) {
    loop {
        if !drain_outbound(&mut ws, &outbound, &events) {
            return;
        }

        // Non-blocking read
        match ws.read() {
            Ok(Message::Text(text)) => {
                if !events.message(text.as_str().to_owned()) {
                    let _ = ws.close(None);
                    return;
                }
            }
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .map(|f| f.reason.as_str().to_owned())
                    .filter(|r| !r.is_empty());
                crate::debug!("ws"; "server closed channel {}", events.generation());
                // Send the queued close reply
                let _ = ws.flush();
                events.closed(reason);
                return;
            }
            // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                events.closed(None);
                return;
            }
            Err(e) => {
                events.error(e.to_string());
                return;
            }
        }
    }
}

/// Send everything queued by the session. Returns false when the loop
/// should stop.
fn drain_outbound(
    ws: &mut WebSocket<TcpStream>,
    outbound: &Receiver<Outbound>,
    events: &EventSink,
) -> bool {
    loop {
        match outbound.try_recv() {
            Ok(Outbound::Text(text)) => {
                if let Err(e) = write(ws, Message::Text(text.into())) {
                    events.error(e.to_string());
                    return false;
                }
            }
            Ok(Outbound::Close) => {
                let _ = ws.close(None);
                let _ = ws.flush();
                return false;
            }
            Err(TryRecvError::Empty) => return true,
            // Session dropped its handle without closing
            Err(TryRecvError::Disconnected) => {
                let _ = ws.close(None);
                let _ = ws.flush();
                return false;
            }
        }
    }
}

/// Write a frame. `WouldBlock` leaves the frame buffered; the next read
/// flushes it.
fn write(ws: &mut WebSocket<TcpStream>, message: Message) -> tungstenite::Result<()> {
    match ws.send(message) {
        Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => Ok(()),
        other => other,
    }
}
