// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::forms::FormBody;

/// Shown when the server answers `ok: false` without an error message.
pub const GENERIC_REPLY_ERROR: &str = "unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub body: String,
}

impl ChatTurn {
    pub fn new(role: TurnRole, body: impl Into<String>) -> Self {
        Self {
            role,
            body: body.into(),
        }
    }
}

/// The server-rendered chat fragment in typed form. Either form may be
/// missing from the markup; a missing form simply leaves the matching
/// interaction unbound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatWidget {
    pub turns: Vec<ChatTurn>,
    pub submit_form: Option<FormBody>,
    pub clear_form: Option<FormBody>,
}

impl ChatWidget {
    pub fn inject_csrf(&mut self, token: &str) {
        for form in [&mut self.submit_form, &mut self.clear_form]
            .into_iter()
            .flatten()
        {
            crate::forms::inject_csrf_token(form, token);
        }
    }
}

/// The JSON envelope of a message submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The chat dialog: `Closed -> Opening -> Open -> Closed`. Every content
/// replacement goes through [`ChatModal::apply_widget`], which is the
/// single re-bind point for both the initial load and a history clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatModal {
    phase: ModalPhase,
    turns: Vec<ChatTurn>,
    submit_form: Option<FormBody>,
    clear_form: Option<FormBody>,
    pub input: String,
}

impl Default for ChatModal {
    fn default() -> Self {
        Self {
            phase: ModalPhase::Closed,
            turns: Vec::new(),
            submit_form: None,
            clear_form: None,
            input: String::new(),
        }
    }
}

impl ChatModal {
    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Opens the dialog. Returns true when the caller should start a
    /// widget load; every open fetches fresh content.
    pub fn open(&mut self) -> bool {
        if self.phase != ModalPhase::Closed {
            return false;
        }
        self.phase = ModalPhase::Opening;
        true
    }

    pub fn close(&mut self) {
        self.phase = ModalPhase::Closed;
    }

    /// Replaces the transcript and both forms wholesale. A response that
    /// arrives after the dialog was closed is discarded; the stale view
    /// it would have written to no longer exists.
    pub fn apply_widget(&mut self, widget: ChatWidget) {
        if self.phase == ModalPhase::Closed {
            return;
        }
        self.turns = widget.turns;
        self.submit_form = widget.submit_form;
        self.clear_form = widget.clear_form;
        self.input.clear();
        self.phase = ModalPhase::Open;
    }

    pub fn load_failed(&mut self, error: &str) {
        if self.phase == ModalPhase::Closed {
            return;
        }
        self.turns = vec![ChatTurn::new(
            TurnRole::Error,
            format!("failed to load the assistant: {error}"),
        )];
        self.submit_form = None;
        self.clear_form = None;
        self.phase = ModalPhase::Open;
    }

    /// Trims the input and, for a non-empty message with a bound submit
    /// form, appends the user turn immediately and returns the form to
    /// POST with `message` set. The input is cleared before any network
    /// call settles. Whitespace-only input aborts with no side effect.
    pub fn take_submission(&mut self) -> Option<FormBody> {
        let message = self.input.trim().to_owned();
        if message.is_empty() {
            return None;
        }
        let mut form = self.submit_form.clone()?;

        form.set("message", &message);
        self.turns.push(ChatTurn::new(TurnRole::User, message));
        self.input.clear();
        Some(form)
    }

    pub fn clear_request(&self) -> Option<FormBody> {
        self.clear_form.clone()
    }

    /// Appends the assistant or error turn for a settled submission.
    /// Replies land in arrival order; overlapping submissions carry no
    /// sequencing token, so a slow first reply can render after a fast
    /// second one.
    pub fn apply_reply(&mut self, reply: &ChatReply) {
        let turn = if reply.ok {
            ChatTurn::new(TurnRole::Assistant, reply.reply.clone().unwrap_or_default())
        } else {
            ChatTurn::new(
                TurnRole::Error,
                reply.error.clone().unwrap_or_else(|| GENERIC_REPLY_ERROR.to_owned()),
            )
        };
        self.turns.push(turn);
    }

    pub fn apply_send_failure(&mut self, error: &str) {
        self.turns.push(ChatTurn::new(
            TurnRole::Error,
            format!("connection error: {error}"),
        ));
    }
}
