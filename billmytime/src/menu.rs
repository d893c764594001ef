//! Menus pushed by the phone bridge
//!
//! An inbound payload is a flat list of pairs: key 0 names the kind of menu
//! and every other pair is one selectable item, shown in arrival order.

use crate::display::Slot;
use billmytime_proto::{OutboundRequest, Payload, ACTION_KEY};
use tracing::warn;

pub const PLACEHOLDER_TITLE: &str = "Select";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Clients,
    Tasks,
    Projects,
    Unknown,
}

impl MenuAction {
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => MenuAction::Clients,
            "t" => MenuAction::Tasks,
            "p" => MenuAction::Projects,
            _ => MenuAction::Unknown,
        }
    }

    pub fn section_title(&self) -> &'static str {
        match self {
            MenuAction::Clients => "Clients",
            MenuAction::Tasks => "Tasks",
            MenuAction::Projects => "Projects",
            MenuAction::Unknown => PLACEHOLDER_TITLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuContext {
    action: MenuAction,
    code: Option<String>,
    items: Vec<MenuItem>,
}

/// What picking an item produces: the request for the phone, and possibly
/// new text for one of the base screen slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub request: OutboundRequest,
    pub display: Option<(Slot, String)>,
}

impl MenuContext {
    /// Builds a menu from an inbound payload.
    ///
    /// The last key-0 pair is the action code. Any earlier key-0 pair is
    /// kept as an ordinary item.
    pub fn build(payload: &Payload) -> Self {
        let pairs = payload.pairs();
        let action_at = pairs.iter().rposition(|p| p.key() == ACTION_KEY);

        let items = pairs
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != action_at)
            .map(|(_, p)| MenuItem {
                title: p.value().to_string(),
            })
            .collect();

        let code = action_at.map(|i| pairs[i].value().to_string());
        let action = match &code {
            Some(code) => {
                let action = MenuAction::from_code(code);
                if action == MenuAction::Unknown {
                    warn!("Unrecognized menu action code {:?}", code);
                }
                action
            }
            None => {
                warn!("Menu payload without an action code");
                MenuAction::Unknown
            }
        };

        Self {
            action,
            code,
            items,
        }
    }

    pub fn action(&self) -> MenuAction {
        self.action
    }

    /// Raw action code as received, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn section_title(&self) -> &'static str {
        self.action.section_title()
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Turns a pick into a selection. `project_slot` is where a picked
    /// project's title is shown. Unknown menus produce nothing.
    ///
    /// # Panics
    ///
    /// If `index` is not an index into `items()`. Indices come from the
    /// rendered list, so that is a caller bug.
    pub fn select_item(&self, index: usize, project_slot: Slot) -> Option<Selection> {
        let title = &self.items[index].title;
        let (request, display) = match self.action {
            MenuAction::Clients => (OutboundRequest::SelectClient { index }, None),
            MenuAction::Tasks => (
                OutboundRequest::SelectTask { index },
                Some((Slot::Task, format!("Task:\n{}", title))),
            ),
            MenuAction::Projects => (
                OutboundRequest::SelectProject { index },
                Some((project_slot, format!("Project:\n{}", title))),
            ),
            MenuAction::Unknown => {
                tracing::debug!(
                    "No selection for menu action code {:?}",
                    self.code.as_deref().unwrap_or("")
                );
                return None;
            }
        };
        Some(Selection { request, display })
    }
}
