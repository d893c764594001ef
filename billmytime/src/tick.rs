//! Minute tick source
//!
//! Fires once each time the wall-clock minute advances while subscribed.
//! The event loop polls it with the current epoch seconds.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCommand {
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Default)]
pub struct TickService {
    last_minute: Option<i64>,
}

impl TickService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, command: TickCommand, now: i64) {
        match command {
            TickCommand::Subscribe => self.subscribe(now),
            TickCommand::Unsubscribe => self.unsubscribe(),
        }
    }

    /// Re-subscribing while subscribed restarts from the current minute.
    pub fn subscribe(&mut self, now: i64) {
        self.last_minute = Some(now.div_euclid(60));
    }

    pub fn unsubscribe(&mut self) {
        self.last_minute = None;
    }

    /// Returns `Some(now)` when a tick is due.
    pub fn poll(&mut self, now: i64) -> Option<i64> {
        let last = self.last_minute.as_mut()?;
        let minute = now.div_euclid(60);
        if minute > *last {
            *last = minute;
            Some(now)
        } else {
            None
        }
    }
}
