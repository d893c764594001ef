use crate::app::{App, Effect, Event};
use crate::tick::TickService;
use billmytime_proto::{OutboundRequest, Payload};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

/// Runs the app against the host services: the minute tick source and the
/// outbound queue read by every connected phone bridge.
pub struct Session {
    pub app: App,
    ticks: TickService,
    outbox: broadcast::Sender<Payload>,
}

impl Session {
    pub fn new(app: App, outbox: broadcast::Sender<Payload>) -> Self {
        Self {
            app,
            ticks: TickService::new(),
            outbox,
        }
    }

    /// Handles one event and everything it causes. `Break` means exit.
    pub fn dispatch(&mut self, event: Event, now: i64) -> ControlFlow<()> {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in self.app.handle(event, now) {
                match effect {
                    Effect::Ticks(command) => self.ticks.apply(command, now),
                    Effect::Send(request) => {
                        if let Some(failure) = self.send(request) {
                            pending.push_back(failure);
                        }
                    }
                    Effect::Exit => return ControlFlow::Break(()),
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Queues a request for every connected bridge. Returns the
    /// `SendFailed` event to handle when nobody is listening.
    fn send(&self, request: OutboundRequest) -> Option<Event> {
        let payload = request.to_payload(self.app.config.protocol.submit_layout);
        debug!("Sending {}", payload);
        self.outbox
            .send(payload)
            .err()
            .map(|_| Event::SendFailed("no phone bridge connected".to_string()))
    }

    pub fn poll_tick(&mut self, now: i64) -> ControlFlow<()> {
        match self.ticks.poll(now) {
            Some(tick) => self.dispatch(Event::Tick(tick), now),
            None => ControlFlow::Continue(()),
        }
    }

    /// Handles every transport event queued so far without blocking.
    pub fn drain(&mut self, events: &mut mpsc::UnboundedReceiver<Event>, now: i64) -> ControlFlow<()> {
        while let Ok(event) = events.try_recv() {
            self.dispatch(event, now)?;
        }
        ControlFlow::Continue(())
    }
}
