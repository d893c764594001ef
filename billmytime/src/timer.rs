use crate::tick::TickCommand;

/// Elapsed-time timer.
///
/// `elapsed` is recomputed from `start_epoch` on every tick rather than
/// accumulated, so missed ticks never cause drift. Stopping does not shift
/// `start_epoch`; starting again without a reset keeps counting from the
/// original start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerEngine {
    running: bool,
    start_epoch: i64,
    elapsed: i64,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start_epoch(&self) -> i64 {
        self.start_epoch
    }

    pub fn elapsed(&self) -> i64 {
        self.elapsed
    }

    pub fn start(&mut self, now: i64) -> TickCommand {
        self.running = true;
        if self.start_epoch == 0 {
            self.start_epoch = now;
        }
        TickCommand::Subscribe
    }

    pub fn stop(&mut self) -> TickCommand {
        self.running = false;
        TickCommand::Unsubscribe
    }

    pub fn toggle(&mut self, now: i64) -> TickCommand {
        if self.running {
            self.stop()
        } else {
            self.start(now)
        }
    }

    /// Stops a running timer, otherwise clears it. `None` means the timer
    /// was cleared and the display needs refreshing.
    pub fn cancel_or_reset(&mut self) -> Option<TickCommand> {
        if self.running {
            // Stop only for now; a confirmation prompt belongs here eventually.
            Some(self.stop())
        } else {
            self.elapsed = 0;
            self.start_epoch = 0;
            None
        }
    }

    /// Returns true when the display needs refreshing.
    pub fn on_tick(&mut self, now: i64) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed = now - self.start_epoch;
        true
    }

    pub fn display(&self) -> String {
        format_display(self.elapsed)
    }
}

/// `"HHh MMm"`. Hours are not wrapped, seconds are not shown.
pub fn format_display(elapsed: i64) -> String {
    let hours = elapsed / 3600;
    let minutes = (elapsed / 60) % 60;
    format!("{:02}h {:02}m", hours, minutes)
}
