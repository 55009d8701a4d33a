// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

pub const CSRF_FIELD: &str = "csrf_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            _ => None,
        }
    }
}

/// A server-rendered form reduced to what the client needs to submit it:
/// method, action, and the name/value pairs that become the encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormBody {
    pub method: FormMethod,
    pub action: String,
    fields: Vec<(String, String)>,
}

impl FormBody {
    pub fn new(method: FormMethod, action: &str) -> Self {
        Self {
            method,
            action: action.to_owned(),
            fields: Vec::new(),
        }
    }

    /// Replace-or-append, matching `FormData.set` semantics.
    pub fn set(&mut self, name: &str, value: &str) {
        for (existing, slot) in &mut self.fields {
            if existing == name {
                *slot = value.to_owned();
                return;
            }
        }
        self.fields.push((name.to_owned(), value.to_owned()));
    }

    pub fn append(&mut self, name: &str, value: &str) {
        self.fields.push((name.to_owned(), value.to_owned()));
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Appends a hidden `csrf_token` field to a POST form that lacks one.
/// GET forms and forms already carrying the field are left alone, so the
/// injection is idempotent. Returns whether a field was added.
pub fn inject_csrf_token(form: &mut FormBody, token: &str) -> bool {
    if form.method != FormMethod::Post || form.has_field(CSRF_FIELD) {
        return false;
    }
    form.append(CSRF_FIELD, token);
    true
}

#[cfg(test)]
mod tests {
    use super::{CSRF_FIELD, FormBody, FormMethod, inject_csrf_token};

    #[test]
    fn post_form_gains_exactly_one_token_field() {
        let mut form = FormBody::new(FormMethod::Post, "/ai_chat/");
        form.set("message", "hola");

        assert!(inject_csrf_token(&mut form, "tok-1"));
        assert_eq!(form.field(CSRF_FIELD), Some("tok-1"));

        // A second pass is a no-op.
        assert!(!inject_csrf_token(&mut form, "tok-2"));
        let token_fields = form
            .fields()
            .iter()
            .filter(|(name, _)| name == CSRF_FIELD)
            .count();
        assert_eq!(token_fields, 1);
        assert_eq!(form.field(CSRF_FIELD), Some("tok-1"));
    }

    #[test]
    fn get_form_is_never_touched() {
        let mut form = FormBody::new(FormMethod::Get, "/search");
        assert!(!inject_csrf_token(&mut form, "tok"));
        assert!(!form.has_field(CSRF_FIELD));
    }

    #[test]
    fn form_with_existing_token_is_skipped() {
        let mut form = FormBody::new(FormMethod::Post, "/ai_chat/clear_history");
        form.append(CSRF_FIELD, "server-issued");

        assert!(!inject_csrf_token(&mut form, "other"));
        assert_eq!(form.field(CSRF_FIELD), Some("server-issued"));
    }

    #[test]
    fn set_replaces_existing_value() {
        let mut form = FormBody::new(FormMethod::Post, "/ai_chat/");
        form.set("message", "first");
        form.set("message", "second");

        assert_eq!(form.field("message"), Some("second"));
        assert_eq!(form.fields().len(), 1);
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(FormMethod::parse("POST"), Some(FormMethod::Post));
        assert_eq!(FormMethod::parse("get"), Some(FormMethod::Get));
        assert_eq!(FormMethod::parse("dialog"), None);
    }
}
