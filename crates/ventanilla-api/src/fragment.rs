// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tolerant scanner for the server-rendered chat fragment. The markup is
//! produced by our own templates, so this reads the handful of shapes they
//! emit (message divs, the two forms, hidden inputs) and skips everything
//! else instead of validating.

use ventanilla_app::{ChatTurn, ChatWidget, FormBody, FormMethod, TurnRole};

/// The submit form's element id in the rendered fragment.
const SUBMIT_FORM_ID: &str = "ai-chat-form";

/// Parses a chat fragment into transcript turns plus whichever of the two
/// forms the markup carries.
pub fn parse_chat_widget(html: &str) -> ChatWidget {
    let mut widget = ChatWidget::default();

    // Message divs sit inside a wrapper div, so only descend past opening
    // tags; a message div itself never nests another div.
    let mut rest = html;
    while let Some((tag, after_open)) = next_open_tag(rest, "div") {
        let is_message = attr_value(tag, "class")
            .is_some_and(|class| has_class(&class, "chat-message"));
        if !is_message {
            rest = after_open;
            continue;
        }

        let (body, after) = split_at_close(after_open, "</div>");
        rest = after;

        let role = if attr_value(tag, "class")
            .is_some_and(|class| has_class(&class, "user-message"))
        {
            TurnRole::User
        } else {
            TurnRole::Assistant
        };
        let text = strip_role_label(&flatten_text(body));
        if !text.is_empty() {
            widget.turns.push(ChatTurn::new(role, text));
        }
    }

    let mut rest = html;
    while let Some((tag, after_open)) = next_open_tag(rest, "form") {
        let (body, after) = split_at_close(after_open, "</form>");
        rest = after;

        let Some(form) = parse_form(tag, body) else {
            continue;
        };
        if attr_value(tag, "id").as_deref() == Some(SUBMIT_FORM_ID) {
            widget.submit_form = Some(form);
        } else if form.action.ends_with("clear_history") {
            widget.clear_form = Some(form);
        }
    }

    widget
}

/// Pulls the CSRF token out of a full page's `<meta name="csrf-token">`
/// tag, if the page carries one.
pub fn find_meta_csrf(html: &str) -> Option<String> {
    let mut rest = html;
    while let Some((tag, after)) = next_open_tag(rest, "meta") {
        rest = after;
        if attr_value(tag, "name").as_deref() != Some("csrf-token") {
            continue;
        }
        return attr_value(tag, "content").filter(|token| !token.is_empty());
    }
    None
}

fn parse_form(tag: &str, body: &str) -> Option<FormBody> {
    let action = attr_value(tag, "action")?;
    let method = attr_value(tag, "method")
        .and_then(|method| FormMethod::parse(&method))
        .unwrap_or(FormMethod::Get);

    let mut form = FormBody::new(method, &action);
    let mut rest = body;
    while let Some((input, after)) = next_open_tag(rest, "input") {
        rest = after;
        if attr_value(input, "type").as_deref() != Some("hidden") {
            continue;
        }
        let Some(name) = attr_value(input, "name") else {
            continue;
        };
        let value = attr_value(input, "value").unwrap_or_default();
        form.append(&name, &value);
    }
    Some(form)
}

/// Finds the next `<name ...>` opening tag, returning its attribute text
/// and the remainder after the closing `>`.
fn next_open_tag<'a>(html: &'a str, name: &str) -> Option<(&'a str, &'a str)> {
    let open = format!("<{name}");
    let mut search_from = 0;
    loop {
        let start = html[search_from..].find(&open)? + search_from;
        let boundary = html[start + open.len()..].chars().next()?;
        if boundary != '>' && boundary != '/' && !boundary.is_whitespace() {
            // A longer tag name that merely starts with ours.
            search_from = start + open.len();
            continue;
        }

        let tag_end = html[start..].find('>')? + start;
        let tag = &html[start + open.len()..tag_end];
        return Some((tag, &html[tag_end + 1..]));
    }
}

/// Splits element content from the remainder at the closing tag. Markup
/// missing its close tag yields everything as content.
fn split_at_close<'a>(html: &'a str, close: &str) -> (&'a str, &'a str) {
    match html.find(close) {
        Some(end) => (&html[..end], &html[end + close.len()..]),
        None => (html, ""),
    }
}

/// Reads `name="value"` (or single-quoted) out of a tag's attribute text.
fn attr_value(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{name}=");
    let mut search_from = 0;
    loop {
        let at = lower[search_from..].find(&needle)? + search_from;
        // Reject matches inside a longer attribute name.
        if at > 0 {
            let before = lower.as_bytes()[at - 1];
            if !(before as char).is_ascii_whitespace() {
                search_from = at + needle.len();
                continue;
            }
        }

        let value_start = at + needle.len();
        let mut chars = tag[value_start..].chars();
        let quote = chars.next()?;
        if quote != '"' && quote != '\'' {
            search_from = value_start;
            continue;
        }
        let rest = &tag[value_start + 1..];
        let end = rest.find(quote)?;
        return Some(decode_entities(&rest[..end]));
    }
}

fn has_class(class_attr: &str, class: &str) -> bool {
    class_attr.split_whitespace().any(|entry| entry == class)
}

/// Drops markup from a message body: `<br>` becomes a newline, every other
/// tag disappears, and entities are decoded. Template indentation around
/// the text nodes goes too.
fn flatten_text(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = after[..end].trim().trim_end_matches('/').trim();
        if tag.eq_ignore_ascii_case("br") {
            out.push('\n');
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    let decoded = decode_entities(&out);
    decoded
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_owned()
}

/// Strips the `user:` / `model:` speaker label the template prefixes onto
/// each message.
fn strip_role_label(text: &str) -> String {
    for label in ["user:", "model:"] {
        if let Some(stripped) = text.strip_prefix(label) {
            return stripped.trim_start().to_owned();
        }
    }
    text.to_owned()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];

        let mut replaced = false;
        for (entity, replacement) in [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&#39;", '\''),
        ] {
            if let Some(after) = rest.strip_prefix(entity) {
                out.push(replacement);
                rest = after;
                replaced = true;
                break;
            }
        }
        if !replaced {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}
