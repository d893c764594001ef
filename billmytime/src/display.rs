use serde::Deserialize;

pub const NO_PROJECT: &str = "No Project Selected";
pub const NO_TASK: &str = "No Task Selected";
pub const TIMER_ZERO: &str = "00h 00m";

/// Text regions of the base screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Project,
    Task,
    Timer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    project: String,
    task: String,
    timer: String,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            project: NO_PROJECT.to_string(),
            task: NO_TASK.to_string(),
            timer: TIMER_ZERO.to_string(),
        }
    }
}

impl Display {
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Project => &self.project,
            Slot::Task => &self.task,
            Slot::Timer => &self.timer,
        }
    }

    pub fn set(&mut self, slot: Slot, text: impl Into<String>) {
        let text = text.into();
        match slot {
            Slot::Project => self.project = text,
            Slot::Task => self.task = text,
            Slot::Timer => self.timer = text,
        }
    }
}
