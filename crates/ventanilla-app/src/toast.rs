// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

/// How long a toast stays fully visible before the fade starts.
pub const TOAST_DISMISS_AFTER: Duration = Duration::from_millis(3500);
/// How long the fade lasts before the toast is removed.
pub const TOAST_FADE_FOR: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Info,
    Error,
    Warning,
    Success,
}

impl ToastSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Success => "success",
        }
    }

    /// Unknown severity classes fall back to info.
    pub fn parse(value: &str) -> Self {
        match value {
            "error" => Self::Error,
            "warning" => Self::Warning,
            "success" => Self::Success,
            _ => Self::Info,
        }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Info => (0x2d, 0x7e, 0xf7),
            Self::Error => (0xd9, 0x53, 0x4f),
            Self::Warning => (0xf0, 0xad, 0x4e),
            Self::Success => (0x5c, 0xb8, 0x5c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub body: String,
    pub severity: ToastSeverity,
    shown_at: Instant,
}

impl Toast {
    pub fn phase(&self, now: Instant) -> ToastPhase {
        let age = now.saturating_duration_since(self.shown_at);
        if age < TOAST_DISMISS_AFTER {
            ToastPhase::Visible
        } else if age < TOAST_DISMISS_AFTER + TOAST_FADE_FOR {
            ToastPhase::Fading
        } else {
            ToastPhase::Expired
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToastRack {
    toasts: Vec<Toast>,
}

impl ToastRack {
    pub fn push(&mut self, body: impl Into<String>, severity: ToastSeverity, now: Instant) {
        self.toasts.push(Toast {
            body: body.into(),
            severity,
            shown_at: now,
        });
    }

    /// Drops expired toasts. Call on every loop tick.
    pub fn tick(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| toast.phase(now) != ToastPhase::Expired);
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        TOAST_DISMISS_AFTER, TOAST_FADE_FOR, ToastPhase, ToastRack, ToastSeverity,
    };
    use std::time::{Duration, Instant};

    #[test]
    fn toast_survives_the_full_display_window() {
        let now = Instant::now();
        let mut rack = ToastRack::default();
        rack.push("guardado", ToastSeverity::Success, now);

        rack.tick(now + TOAST_DISMISS_AFTER - Duration::from_millis(1));
        assert_eq!(rack.visible().len(), 1);
        assert_eq!(
            rack.visible()[0].phase(now + TOAST_DISMISS_AFTER - Duration::from_millis(1)),
            ToastPhase::Visible
        );
    }

    #[test]
    fn toast_fades_then_expires() {
        let now = Instant::now();
        let mut rack = ToastRack::default();
        rack.push("fallo de red", ToastSeverity::Error, now);

        let fading_at = now + TOAST_DISMISS_AFTER + Duration::from_millis(1);
        rack.tick(fading_at);
        assert_eq!(rack.visible().len(), 1);
        assert_eq!(rack.visible()[0].phase(fading_at), ToastPhase::Fading);

        rack.tick(now + TOAST_DISMISS_AFTER + TOAST_FADE_FOR + Duration::from_millis(1));
        assert!(rack.is_empty());
    }

    #[test]
    fn independent_toasts_expire_independently() {
        let now = Instant::now();
        let mut rack = ToastRack::default();
        rack.push("primero", ToastSeverity::Info, now);
        rack.push("segundo", ToastSeverity::Warning, now + Duration::from_secs(2));

        rack.tick(now + TOAST_DISMISS_AFTER + TOAST_FADE_FOR + Duration::from_millis(1));
        assert_eq!(rack.visible().len(), 1);
        assert_eq!(rack.visible()[0].body, "segundo");
    }

    #[test]
    fn unknown_severity_class_falls_back_to_info() {
        assert_eq!(ToastSeverity::parse("notice"), ToastSeverity::Info);
        assert_eq!(ToastSeverity::parse("error"), ToastSeverity::Error);
        assert_eq!(ToastSeverity::parse("warning"), ToastSeverity::Warning);
        assert_eq!(ToastSeverity::parse("success"), ToastSeverity::Success);
    }

    #[test]
    fn severity_colors_match_the_fixed_map() {
        assert_eq!(ToastSeverity::Info.rgb(), (0x2d, 0x7e, 0xf7));
        assert_eq!(ToastSeverity::Error.rgb(), (0xd9, 0x53, 0x4f));
        assert_eq!(ToastSeverity::Warning.rgb(), (0xf0, 0xad, 0x4e));
        assert_eq!(ToastSeverity::Success.rgb(), (0x5c, 0xb8, 0x5c));
    }
}
