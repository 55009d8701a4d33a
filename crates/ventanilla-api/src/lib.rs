// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use ventanilla_app::{ChatReply, ChatWidget, FormBody};

pub mod fragment;

pub use fragment::{find_meta_csrf, parse_chat_widget};

/// Blocking client for the ventanilla site: the unread-notification
/// counter, the chat fragment, and the two chat POSTs.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("server.base_url must use http or https, got {:?}", parsed.scheme());
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn unread_count(&self) -> Result<u64> {
        let response = self
            .http
            .get(format!(
                "{}/notifications/api/unread_notifications_count",
                self.base_url
            ))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: UnreadCountResponse = response.json().context("decode unread count")?;
        Ok(parsed.unread_count)
    }

    /// Fetches the rendered chat fragment and parses it into a widget.
    pub fn chat_widget(&self) -> Result<ChatWidget> {
        let response = self
            .http
            .get(format!("{}/ai_chat/content", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(clean_error_response(status, &body));
        }
        Ok(fragment::parse_chat_widget(&body))
    }

    /// POSTs a message submission. A rejected message (empty, expired
    /// token) still answers with the JSON envelope, so any decodable body
    /// becomes an `Ok` reply regardless of status; only transport failures
    /// and opaque server errors are `Err`.
    pub fn send_message(&self, form: &FormBody) -> Result<ChatReply> {
        let response = self
            .http
            .post(self.join(&form.action))
            .form(form.fields())
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        match serde_json::from_str::<ChatReply>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => Err(clean_error_response(status, &body)),
            Err(error) => Err(error).context("decode chat reply"),
        }
    }

    /// POSTs the history clear and parses the fresh fragment the server
    /// answers with.
    pub fn clear_history(&self, form: &FormBody) -> Result<ChatWidget> {
        let response = self
            .http
            .post(self.join(&form.action))
            .form(form.fields())
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(clean_error_response(status, &body));
        }
        Ok(fragment::parse_chat_widget(&body))
    }

    /// Fetches the landing page and reads its CSRF meta tag. `None` means
    /// the page renders without one.
    pub fn fetch_csrf_token(&self) -> Result<Option<String>> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(clean_error_response(status, &body));
        }
        Ok(fragment::find_meta_csrf(&body))
    }

    /// Form actions are site-relative paths; absolute URLs pass through.
    fn join(&self, action: &str) -> String {
        if action.starts_with("http://") || action.starts_with("https://") {
            return action.to_owned();
        }
        if action.starts_with('/') {
            format!("{}{action}", self.base_url)
        } else {
            format!("{}/{action}", self.base_url)
        }
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check server.base_url and that the site is up ({} )",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    unread_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}
