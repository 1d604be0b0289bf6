//! Session Actor
//!
//! Owns the connection lifecycle, the dispatcher and the document. All
//! state changes happen on the session loop, one event at a time.
//!
//! ```text
//!              Opened + hello             close / error
//! Connecting ----------------> Open ----------------------------> Closed
//!     |                         ^                                   |
//!     | OpenFailed / hello fail |  reconnect Opened (full reload)   | every interval
//!     +-------------------------|-----------------------------------+
//!                               +---------------- try_reconnect <---+
//! ```
//!
//! Opening never blocks the loop: the connector starts an attempt and its
//! outcome arrives as an `Opened` or `OpenFailed` event. A channel is never
//! resumed: every reconnect opens a new channel with a new generation
//! number, and the document is reloaded once it is open.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::messages::{EventSink, SessionEvent};
use super::transport::{Channel, Connector, TransportError};
use crate::config::ClientConfig;
use crate::document::Document;
use crate::logger::{status_error, status_success, status_warning};
use crate::reload::{ApplyReport, ClientMessage, Dispatch, Dispatcher};
use crate::{debug, log};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

pub struct Session<C: Connector, D: Document> {
    url: String,
    interval: Duration,
    connector: C,
    document: D,
    dispatcher: Dispatcher,
    state: ConnectionState,
    channel: Option<C::Channel>,
    /// Generation of the newest channel; older events are stale
    generation: u64,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    /// Reconnect schedule, armed on entering Closed
    reconnect: Option<Interval>,
    /// The attempt in flight replaces a lost channel (reload once open)
    reconnecting: bool,
}

impl<C: Connector, D: Document> Session<C, D> {
    /// Create a session and start the initial connection attempt.
    ///
    /// Returns while the attempt is in flight. A failed attempt is not an
    /// error: the session enters `Closed` and keeps retrying once `run`
    /// drives it. Must be called inside a tokio runtime with time enabled.
    pub fn connect(config: &ClientConfig, connector: C, document: D) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut session = Self {
            url: config.socket_url(),
            interval: config.reconnect_interval(),
            connector,
            document,
            dispatcher: Dispatcher::default(),
            state: ConnectionState::Connecting,
            channel: None,
            generation: 0,
            events_tx,
            events_rx,
            reconnect: None,
            reconnecting: false,
        };

        log!("ws"; "connecting to {}", session.url);
        session.begin_open(false);
        session
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages received on the current channel.
    pub fn received(&self) -> u64 {
        self.dispatcher.received()
    }

    pub fn has_reconnect_timer(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Handle for injecting events (used for shutdown).
    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Drive the session until shutdown, then hand the document back.
    pub async fn run(mut self) -> D {
        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    // The session holds a sender, so the queue never closes
                    let Some(event) = event else { break };
                    if self.handle_event(event).is_break() {
                        break;
                    }
                }
                () = next_tick(&mut self.reconnect) => self.try_reconnect(),
            }
        }
        self.document
    }

    /// Apply one event. Returns `Break` on shutdown.
    pub fn handle_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
        if let Some(generation) = event.generation()
            && generation != self.generation
        {
            debug!("ws"; "ignoring event from stale channel {}", generation);
            return ControlFlow::Continue(());
        }

        match event {
            SessionEvent::Opened { .. } => {
                if self.state == ConnectionState::Connecting {
                    self.on_opened();
                }
            }
            SessionEvent::OpenFailed { error, .. } => {
                if self.state == ConnectionState::Connecting {
                    self.open_failed(&error);
                }
            }
            SessionEvent::Message { text, .. } => {
                if self.state == ConnectionState::Open {
                    self.on_message(&text);
                }
            }
            SessionEvent::Closed { reason, .. } => {
                if self.state == ConnectionState::Open {
                    match reason {
                        Some(reason) => log!("ws"; "connection closed: {}", reason),
                        None => log!("ws"; "connection closed"),
                    }
                }
                self.enter_closed();
            }
            SessionEvent::Error { error, .. } => {
                log!("error"; "connection error: {}", error);
                self.enter_closed();
            }
            SessionEvent::Shutdown => {
                if let Some(mut channel) = self.channel.take() {
                    channel.close();
                }
                self.reconnect = None;
                self.state = ConnectionState::Closed;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Timer tick: start a reconnect attempt when Closed. An attempt still
    /// in flight is left alone and the schedule keeps running.
    pub fn try_reconnect(&mut self) {
        match self.state {
            ConnectionState::Closed => self.begin_open(true),
            ConnectionState::Connecting => {
                debug!("ws"; "attempt {} still in flight", self.generation);
            }
            ConnectionState::Open => self.reconnect = None,
        }
    }

    /// Start an attempt on a fresh generation. Events of earlier channels
    /// become stale.
    fn begin_open(&mut self, reconnecting: bool) {
        self.state = ConnectionState::Connecting;
        self.reconnecting = reconnecting;
        self.generation += 1;
        let events = EventSink::new(self.generation, self.events_tx.clone());

        match self.connector.open(&self.url, events) {
            Ok(channel) => {
                if let Some(mut previous) = self.channel.replace(channel) {
                    previous.close();
                }
            }
            Err(e) => self.open_failed(&e.to_string()),
        }
    }

    fn open_failed(&mut self, error: &str) {
        if self.reconnecting {
            debug!("ws"; "reconnect to {} failed: {}", self.url, error);
        } else {
            log!("error"; "connection to {} failed: {}", self.url, error);
        }
        self.enter_closed();
    }

    /// The attempt in flight opened. A reconnect reloads the document and
    /// starts a fresh dispatcher before greeting.
    fn on_opened(&mut self) {
        self.reconnect = None;
        if self.reconnecting {
            log!("ws"; "reconnected, reloading page");
            self.document.reload();
            self.dispatcher.reset();
        }
        self.establish();
    }

    /// `Connecting -> Open`: greet the server on the new channel. A failed
    /// greeting closes the channel and schedules a retry.
    fn establish(&mut self) {
        let sent = match self.channel.as_mut() {
            Some(channel) => channel.send_text(ClientMessage::Hello.to_json()),
            None => Err(TransportError::Closed),
        };
        if let Err(e) = sent {
            log!("error"; "failed to greet server: {}", e);
            self.enter_closed();
            return;
        }

        self.state = ConnectionState::Open;
        status_success(&format!("connected to {}", self.url));
    }

    /// Enter `Closed` and arm the reconnect timer unless one is running.
    fn enter_closed(&mut self) {
        self.state = ConnectionState::Closed;
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        if self.reconnect.is_none() {
            let mut timer = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.reconnect = Some(timer);
            debug!("ws"; "retrying every {:?}", self.interval);
        }
    }

    fn on_message(&mut self, text: &str) {
        match self.dispatcher.on_message(text, &mut self.document) {
            Ok(Dispatch::Dropped) => debug!("ws"; "dropped first message of session"),
            Ok(Dispatch::Hello) => {}
            Ok(Dispatch::Changes(report)) => report_changes(&report),
            Err(e) => status_error("failed to handle message", &e.to_string()),
        }
    }
}

/// Create and connect a session only when autostart is enabled.
pub fn autostart<C: Connector, D: Document>(
    config: &ClientConfig,
    connector: C,
    document: D,
) -> Option<Session<C, D>> {
    config
        .autostart
        .then(|| Session::connect(config, connector, document))
}

fn report_changes(report: &ApplyReport) {
    if report.reload.is_some() {
        status_warning(&report.summary());
    } else if report.is_noop() {
        debug!("reload"; "{}", report.summary());
    } else {
        status_success(&report.summary());
    }
}

/// Next reconnect tick, or never when no timer is armed.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
