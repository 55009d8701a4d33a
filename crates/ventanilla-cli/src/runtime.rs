// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::mpsc::Sender;
use std::thread;
use ventanilla_api::Client;
use ventanilla_app::{ChatReply, ChatWidget, FormBody};
use ventanilla_tui::{AppRuntime, InternalEvent, WidgetTrigger};

/// Runtime backed by the site's HTTP endpoints. The `spawn_*` overrides
/// move each request onto a worker thread so the event loop never blocks
/// on the network.
pub struct HttpRuntime {
    client: Client,
    csrf_token: Option<String>,
    token_resolved: bool,
}

impl HttpRuntime {
    pub fn new(client: Client, configured_token: Option<String>) -> Self {
        let token_resolved = configured_token.is_some();
        Self {
            client,
            csrf_token: configured_token,
            token_resolved,
        }
    }

    /// The token injected into widget forms that lack one: the configured
    /// value when present, otherwise the landing page meta tag, read once
    /// and cached. A failed landing fetch leaves injection to the
    /// fragment's own hidden fields.
    fn csrf_token(&mut self) -> Option<String> {
        if !self.token_resolved {
            self.token_resolved = true;
            if let Ok(token) = self.client.fetch_csrf_token() {
                self.csrf_token = token;
            }
        }
        self.csrf_token.clone()
    }
}

impl AppRuntime for HttpRuntime {
    fn fetch_unread_count(&mut self) -> Result<u64> {
        self.client.unread_count()
    }

    fn load_chat_widget(&mut self) -> Result<ChatWidget> {
        let mut widget = self.client.chat_widget()?;
        if let Some(token) = self.csrf_token() {
            widget.inject_csrf(&token);
        }
        Ok(widget)
    }

    fn send_chat_message(&mut self, form: &FormBody) -> Result<ChatReply> {
        self.client.send_message(form)
    }

    fn clear_chat_history(&mut self, form: &FormBody) -> Result<ChatWidget> {
        let mut widget = self.client.clear_history(form)?;
        if let Some(token) = self.csrf_token() {
            widget.inject_csrf(&token);
        }
        Ok(widget)
    }

    fn spawn_unread_fetch(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let event = match client.unread_count() {
                Ok(count) => InternalEvent::UnreadCount { count },
                Err(error) => InternalEvent::UnreadCountFailed {
                    error: error.to_string(),
                },
            };
            // A dropped receiver means the UI already exited.
            let _ = tx.send(event);
        });
        Ok(())
    }

    fn spawn_widget_load(
        &mut self,
        trigger: WidgetTrigger,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        // Resolved here so the cached value is shared across spawns.
        let token = self.csrf_token();
        let client = self.client.clone();
        thread::spawn(move || {
            let event = match client.chat_widget() {
                Ok(mut widget) => {
                    if let Some(token) = &token {
                        widget.inject_csrf(token);
                    }
                    InternalEvent::WidgetLoaded { widget, trigger }
                }
                Err(error) => InternalEvent::WidgetFailed {
                    error: error.to_string(),
                    trigger,
                },
            };
            let _ = tx.send(event);
        });
        Ok(())
    }

    fn spawn_chat_send(&mut self, form: FormBody, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::spawn(move || {
            let event = match client.send_message(&form) {
                Ok(reply) => InternalEvent::ReplySettled { reply },
                Err(error) => InternalEvent::ReplyFailed {
                    error: error.to_string(),
                },
            };
            let _ = tx.send(event);
        });
        Ok(())
    }

    fn spawn_history_clear(&mut self, form: FormBody, tx: Sender<InternalEvent>) -> Result<()> {
        let token = self.csrf_token();
        let client = self.client.clone();
        thread::spawn(move || {
            let event = match client.clear_history(&form) {
                Ok(mut widget) => {
                    if let Some(token) = &token {
                        widget.inject_csrf(token);
                    }
                    InternalEvent::WidgetLoaded {
                        widget,
                        trigger: WidgetTrigger::Clear,
                    }
                }
                Err(error) => InternalEvent::WidgetFailed {
                    error: error.to_string(),
                    trigger: WidgetTrigger::Clear,
                },
            };
            let _ = tx.send(event);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HttpRuntime;
    use anyhow::{Result, anyhow};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};
    use ventanilla_api::Client;
    use ventanilla_app::CSRF_FIELD;
    use ventanilla_testkit::landing_page;
    use ventanilla_tui::{AppRuntime, InternalEvent};

    const BARE_FRAGMENT: &str = concat!(
        "<div id=\"ai-chat-body\"></div>\n",
        "<form id=\"ai-chat-form\" method=\"post\" action=\"/ai_chat/\">\n",
        "  <input type=\"text\" name=\"message\">\n",
        "</form>\n",
        "<form method=\"post\" action=\"/ai_chat/clear_history\">\n",
        "  <button type=\"submit\">Borrar historial</button>\n",
        "</form>\n",
    );

    fn html_response(body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
        Response::from_string(body).with_status_code(200).with_header(
            Header::from_bytes("Content-Type", "text/html; charset=utf-8")
                .expect("valid content type header"),
        )
    }

    #[test]
    fn configured_token_is_injected_into_bare_forms() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/ai_chat/content");
            request
                .respond(html_response(BARE_FRAGMENT))
                .expect("response should succeed");
        });

        let client = Client::new(&addr, Duration::from_secs(1))?;
        let mut runtime = HttpRuntime::new(client, Some("configured-tok".to_owned()));
        let widget = runtime.load_chat_widget()?;

        let submit = widget.submit_form.expect("submit form bound");
        assert_eq!(submit.field(CSRF_FIELD), Some("configured-tok"));
        let clear = widget.clear_form.expect("clear form bound");
        assert_eq!(clear.field(CSRF_FIELD), Some("configured-tok"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn landing_page_token_is_fetched_once_when_not_configured() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            // One landing page fetch, then two widget loads; a third "/"
            // request would hang the test and fail the join.
            let expected = ["/", "/ai_chat/content", "/ai_chat/content"];
            for url in expected {
                let request = server.recv().expect("request expected");
                assert_eq!(request.url(), url);
                let body = if url == "/" {
                    landing_page(Some("meta-tok"))
                } else {
                    BARE_FRAGMENT.to_owned()
                };
                request
                    .respond(html_response(&body))
                    .expect("response should succeed");
            }
        });

        let client = Client::new(&addr, Duration::from_secs(1))?;
        let mut runtime = HttpRuntime::new(client, None);

        for _ in 0..2 {
            let widget = runtime.load_chat_widget()?;
            let submit = widget.submit_form.expect("submit form bound");
            assert_eq!(submit.field(CSRF_FIELD), Some("meta-tok"));
        }

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn fragment_token_is_not_overwritten() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(html_response(&ventanilla_testkit::chat_fragment(&[])))
                .expect("response should succeed");
        });

        let client = Client::new(&addr, Duration::from_secs(1))?;
        let mut runtime = HttpRuntime::new(client, Some("configured-tok".to_owned()));
        let widget = runtime.load_chat_widget()?;

        let submit = widget.submit_form.expect("submit form bound");
        assert_eq!(
            submit.field(CSRF_FIELD),
            Some(ventanilla_testkit::FIXTURE_CSRF_TOKEN)
        );

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn unread_fetch_settles_on_the_channel_from_a_worker_thread() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(
                    Response::from_string(r#"{"unread_count": 3}"#)
                        .with_status_code(200)
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json")
                                .expect("valid content type header"),
                        ),
                )
                .expect("response should succeed");
        });

        let client = Client::new(&addr, Duration::from_secs(1))?;
        let mut runtime = HttpRuntime::new(client, None);

        let (tx, rx) = mpsc::channel();
        runtime.spawn_unread_fetch(tx)?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(event, InternalEvent::UnreadCount { count: 3 });

        handle.join().expect("server thread should join");
        Ok(())
    }
}
