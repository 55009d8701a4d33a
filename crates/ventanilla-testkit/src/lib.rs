// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Fixture builders shared by the crate tests: rendered HTML in the exact
//! shapes the site's templates emit, plus sample navigation data.

use ventanilla_app::{Menu, MenuAction, MenuEntry};

pub const FIXTURE_CSRF_TOKEN: &str = "fixture-csrf-token";

/// One transcript line in a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Model,
}

impl Speaker {
    const fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }

    const fn class(self) -> &'static str {
        match self {
            Self::User => "user-message",
            Self::Model => "ai-message",
        }
    }
}

/// Renders the chat fragment the way the server templates do: a message
/// list, the submit form, and the clear-history form, each form carrying a
/// hidden token field.
pub fn chat_fragment(turns: &[(Speaker, &str)]) -> String {
    chat_fragment_with_token(turns, FIXTURE_CSRF_TOKEN)
}

pub fn chat_fragment_with_token(turns: &[(Speaker, &str)], token: &str) -> String {
    let mut out = String::new();
    out.push_str("<div id=\"ai-chat-body\">\n");
    for (speaker, text) in turns {
        out.push_str(&format!(
            "  <div class=\"chat-message {}\">\n    <strong>{}:</strong> {}\n  </div>\n",
            speaker.class(),
            speaker.label(),
            escape_html(text).replace('\n', "<br>"),
        ));
    }
    out.push_str("</div>\n");
    out.push_str(&format!(
        concat!(
            "<form id=\"ai-chat-form\" method=\"post\" action=\"/ai_chat/\">\n",
            "  <input type=\"hidden\" name=\"csrf_token\" value=\"{token}\">\n",
            "  <input type=\"text\" name=\"message\" placeholder=\"Escribe tu mensaje...\">\n",
            "  <button type=\"submit\">Enviar</button>\n",
            "</form>\n",
            "<form method=\"post\" action=\"/ai_chat/clear_history\">\n",
            "  <input type=\"hidden\" name=\"csrf_token\" value=\"{token}\">\n",
            "  <button type=\"submit\">Borrar historial</button>\n",
            "</form>\n",
        ),
        token = token,
    ));
    out
}

/// A minimal landing page; `token` controls whether the CSRF meta tag is
/// rendered.
pub fn landing_page(token: Option<&str>) -> String {
    let meta = match token {
        Some(token) => format!("  <meta name=\"csrf-token\" content=\"{token}\">\n"),
        None => String::new(),
    };
    format!(
        concat!(
            "<!doctype html>\n<html>\n<head>\n",
            "  <meta charset=\"utf-8\">\n",
            "{meta}",
            "  <title>Ventanilla</title>\n",
            "</head>\n<body>\n  <nav></nav>\n</body>\n</html>\n",
        ),
        meta = meta,
    )
}

/// The site's navigation bar as the templates render it.
pub fn sample_menus() -> Vec<Menu> {
    vec![
        Menu {
            label: "Trabajos".to_owned(),
            trigger: MenuAction::Placeholder,
            entries: vec![
                entry("Buscar trabajos", "/jobs/search"),
                entry("Mis postulaciones", "/jobs/applications"),
                entry("Publicar trabajo", "/jobs/new"),
            ],
        },
        Menu {
            label: "Catálogo".to_owned(),
            trigger: MenuAction::Placeholder,
            entries: vec![
                entry("Servicios", "/catalog/services"),
                entry("Profesionales", "/catalog/professionals"),
            ],
        },
        Menu {
            label: "Cuenta".to_owned(),
            trigger: MenuAction::Navigate("/account".to_owned()),
            entries: vec![
                entry("Perfil", "/account/profile"),
                entry("Notificaciones", "/notifications/"),
                entry("Salir", "/auth/logout"),
            ],
        },
    ]
}

fn entry(label: &str, target: &str) -> MenuEntry {
    MenuEntry {
        label: label.to_owned(),
        action: MenuAction::Navigate(target.to_owned()),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
