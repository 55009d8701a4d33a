// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

/// Grace period between the pointer leaving a menu and the panel closing,
/// long enough to travel from the trigger into the panel.
pub const MENU_CLOSE_GRACE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Follow a link target.
    Navigate(String),
    /// A `#` trigger that exists only to open the panel; activating it
    /// must not navigate anywhere.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub label: String,
    pub trigger: MenuAction,
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    PointerEnter(usize),
    PointerLeave(usize),
    PointerEnterPanel(usize),
    ClickTrigger(usize),
    ClickOutside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEvent {
    Opened(usize),
    Closed(usize),
    Navigated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CloseDeadline {
    index: usize,
    due: Instant,
}

/// All dropdown state lives here; at most one menu is open at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuBar {
    menus: Vec<Menu>,
    open: Option<usize>,
    close_deadline: Option<CloseDeadline>,
}

impl MenuBar {
    pub fn new(menus: Vec<Menu>) -> Self {
        Self {
            menus,
            open: None,
            close_deadline: None,
        }
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn apply(&mut self, input: MenuInput, now: Instant) -> Vec<MenuEvent> {
        match input {
            MenuInput::PointerEnter(index) => {
                if index >= self.menus.len() {
                    return Vec::new();
                }
                self.close_deadline = None;
                let mut events = self.close_all_except(Some(index));
                if self.open != Some(index) {
                    self.open = Some(index);
                    events.push(MenuEvent::Opened(index));
                }
                events
            }
            MenuInput::PointerLeave(index) => {
                if self.open == Some(index) {
                    self.close_deadline = Some(CloseDeadline {
                        index,
                        due: now + MENU_CLOSE_GRACE,
                    });
                }
                Vec::new()
            }
            MenuInput::PointerEnterPanel(index) => {
                if self.close_deadline.map(|deadline| deadline.index) == Some(index) {
                    self.close_deadline = None;
                }
                Vec::new()
            }
            MenuInput::ClickTrigger(index) => {
                let Some(menu) = self.menus.get(index) else {
                    return Vec::new();
                };
                let navigation = match &menu.trigger {
                    MenuAction::Navigate(target) => Some(target.clone()),
                    MenuAction::Placeholder => None,
                };

                let was_open = self.open == Some(index);
                self.close_deadline = None;
                let mut events = self.close_all_except(None);
                if !was_open {
                    self.open = Some(index);
                    events.push(MenuEvent::Opened(index));
                }
                if let Some(target) = navigation {
                    events.push(MenuEvent::Navigated(target));
                }
                events
            }
            MenuInput::ClickOutside => {
                self.close_deadline = None;
                self.close_all_except(None)
            }
        }
    }

    /// Expires a due close deadline. Call on every loop tick.
    pub fn tick(&mut self, now: Instant) -> Vec<MenuEvent> {
        let Some(deadline) = self.close_deadline else {
            return Vec::new();
        };
        if now < deadline.due {
            return Vec::new();
        }

        self.close_deadline = None;
        if self.open == Some(deadline.index) {
            self.open = None;
            return vec![MenuEvent::Closed(deadline.index)];
        }
        Vec::new()
    }

    fn close_all_except(&mut self, keep: Option<usize>) -> Vec<MenuEvent> {
        match self.open {
            Some(index) if keep != Some(index) => {
                self.open = None;
                vec![MenuEvent::Closed(index)]
            }
            _ => Vec::new(),
        }
    }
}
