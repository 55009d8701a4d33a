// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVisibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub chat: ChatVisibility,
    pub unread_count: Option<u64>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            chat: ChatVisibility::Hidden,
            unread_count: None,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    OpenChat,
    CloseChat,
    SetUnreadCount(u64),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ChatVisibilityChanged(ChatVisibility),
    UnreadCountChanged(u64),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::OpenChat => {
                self.chat = ChatVisibility::Visible;
                vec![AppEvent::ChatVisibilityChanged(self.chat)]
            }
            AppCommand::CloseChat => {
                self.chat = ChatVisibility::Hidden;
                vec![AppEvent::ChatVisibilityChanged(self.chat)]
            }
            AppCommand::SetUnreadCount(count) => {
                // A failed poll never reaches here; the prior value stays
                // displayed until the next successful fetch.
                self.unread_count = Some(count);
                vec![AppEvent::UnreadCountChanged(count)]
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }
}
