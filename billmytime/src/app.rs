use crate::config::Config;
use crate::display::{Display, Slot};
use crate::input::{Button, Click};
use crate::menu::MenuContext;
use crate::tick::TickCommand;
use crate::timer::TimerEngine;
use billmytime_proto::{OutboundRequest, Payload};
use tracing::{debug, info, trace, warn};

/// Everything that can wake the app up.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Button(Button, Click),
    Tick(i64),
    Inbound(Payload),
    Dropped(String),
    Sent,
    SendFailed(String),
}

/// Work the app hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Ticks(TickCommand),
    Send(OutboundRequest),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Screen {
    #[default]
    Base,
    Menu { context: MenuContext, cursor: usize },
}

pub struct App {
    pub timer: TimerEngine,
    pub display: Display,
    pub screen: Screen,
    pub config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            timer: TimerEngine::new(),
            display: Display::default(),
            screen: Screen::Base,
            config,
        }
    }

    pub fn handle(&mut self, event: Event, now: i64) -> Vec<Effect> {
        match event {
            Event::Button(button, click) => match self.screen {
                Screen::Base => self.on_base_button(button, click, now),
                Screen::Menu { .. } => self.on_menu_button(button, click),
            },
            Event::Tick(now) => {
                if self.timer.on_tick(now) {
                    self.refresh_timer();
                }
                vec![]
            }
            Event::Inbound(payload) => {
                self.show_menu(&payload);
                vec![]
            }
            Event::Dropped(reason) => {
                debug!("Inbound message dropped: {}", reason);
                vec![]
            }
            Event::Sent => {
                trace!("Outbound message delivered");
                vec![]
            }
            Event::SendFailed(reason) => {
                warn!("Outbound message was not delivered: {}", reason);
                vec![]
            }
        }
    }

    fn on_base_button(&mut self, button: Button, click: Click, now: i64) -> Vec<Effect> {
        let page = self.config.protocol.page;
        match (button, click) {
            (Button::Select, Click::Single) => vec![Effect::Ticks(self.timer.toggle(now))],
            (Button::Up, Click::Single) => match self.timer.cancel_or_reset() {
                Some(command) => vec![Effect::Ticks(command)],
                None => {
                    self.refresh_timer();
                    vec![]
                }
            },
            (Button::Down, Click::Single) => {
                info!(
                    "Submitting entry started at {} lasting {}s",
                    self.timer.start_epoch(),
                    self.timer.elapsed()
                );
                vec![Effect::Send(OutboundRequest::PostTask {
                    start_epoch: self.timer.start_epoch(),
                    duration: self.timer.elapsed(),
                })]
            }
            (Button::Up, Click::Long) => vec![Effect::Send(OutboundRequest::GetClients { page })],
            (Button::Select, Click::Long) => {
                vec![Effect::Send(OutboundRequest::GetProjects { page })]
            }
            (Button::Down, Click::Long) => vec![Effect::Send(OutboundRequest::GetTasks { page })],
            (Button::Back, _) => vec![Effect::Exit],
        }
    }

    fn on_menu_button(&mut self, button: Button, click: Click) -> Vec<Effect> {
        let Screen::Menu { context, cursor } = &mut self.screen else {
            return vec![];
        };
        match (button, click) {
            (Button::Up, _) => {
                *cursor = cursor.saturating_sub(1);
                vec![]
            }
            (Button::Down, _) => {
                if !context.is_empty() {
                    *cursor = (*cursor + 1).min(context.len() - 1);
                }
                vec![]
            }
            (Button::Select, Click::Single) => {
                if context.is_empty() {
                    return vec![];
                }
                let selection =
                    context.select_item(*cursor, self.config.display.project_selection_slot);
                self.screen = Screen::Base;
                match selection {
                    Some(selection) => {
                        if let Some((slot, text)) = selection.display {
                            self.display.set(slot, text);
                        }
                        vec![Effect::Send(selection.request)]
                    }
                    None => vec![],
                }
            }
            (Button::Select, Click::Long) => vec![],
            (Button::Back, _) => {
                self.screen = Screen::Base;
                vec![]
            }
        }
    }

    /// Replaces whatever menu is showing with a fresh one.
    fn show_menu(&mut self, payload: &Payload) {
        let context = MenuContext::build(payload);
        debug!(
            "Showing {} menu (code {:?}) with {} items",
            context.section_title(),
            context.code(),
            context.len()
        );
        self.screen = Screen::Menu { context, cursor: 0 };
    }

    fn refresh_timer(&mut self) {
        self.display.set(Slot::Timer, self.timer.display());
    }
}
