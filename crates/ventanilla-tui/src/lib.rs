// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use ventanilla_app::{
    AppCommand, AppState, ChatModal, ChatReply, ChatVisibility, ChatWidget, FormBody, Menu,
    MenuBar, MenuEvent, MenuInput, ModalPhase, Toast, ToastPhase, ToastRack, ToastSeverity,
    TurnRole,
};

/// Why a widget load was started; shapes the notice shown when it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetTrigger {
    Open,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    UnreadCount { count: u64 },
    UnreadCountFailed { error: String },
    WidgetLoaded { widget: ChatWidget, trigger: WidgetTrigger },
    WidgetFailed { error: String, trigger: WidgetTrigger },
    ReplySettled { reply: ChatReply },
    ReplyFailed { error: String },
}

/// The server-facing operations the UI needs. The `spawn_*` defaults run
/// the blocking call inline and push the settled event; a production
/// runtime overrides them with worker threads.
pub trait AppRuntime {
    fn fetch_unread_count(&mut self) -> Result<u64>;
    fn load_chat_widget(&mut self) -> Result<ChatWidget>;
    fn send_chat_message(&mut self, form: &FormBody) -> Result<ChatReply>;
    fn clear_chat_history(&mut self, form: &FormBody) -> Result<ChatWidget>;

    fn spawn_unread_fetch(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.fetch_unread_count() {
            Ok(count) => InternalEvent::UnreadCount { count },
            Err(error) => InternalEvent::UnreadCountFailed {
                error: error.to_string(),
            },
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("internal event channel closed"))?;
        Ok(())
    }

    fn spawn_widget_load(
        &mut self,
        trigger: WidgetTrigger,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.load_chat_widget() {
            Ok(widget) => InternalEvent::WidgetLoaded { widget, trigger },
            Err(error) => InternalEvent::WidgetFailed {
                error: error.to_string(),
                trigger,
            },
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("internal event channel closed"))?;
        Ok(())
    }

    fn spawn_chat_send(&mut self, form: FormBody, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.send_chat_message(&form) {
            Ok(reply) => InternalEvent::ReplySettled { reply },
            Err(error) => InternalEvent::ReplyFailed {
                error: error.to_string(),
            },
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("internal event channel closed"))?;
        Ok(())
    }

    fn spawn_history_clear(&mut self, form: FormBody, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.clear_chat_history(&form) {
            Ok(widget) => InternalEvent::WidgetLoaded {
                widget,
                trigger: WidgetTrigger::Clear,
            },
            Err(error) => InternalEvent::WidgetFailed {
                error: error.to_string(),
                trigger: WidgetTrigger::Clear,
            },
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("internal event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub poll_interval: Duration,
    pub show_toasts: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            show_toasts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    menu: MenuBar,
    modal: ChatModal,
    toasts: ToastRack,
    options: UiOptions,
    selected_entry: usize,
    help_visible: bool,
}

impl ViewData {
    fn new(menus: Vec<Menu>, options: UiOptions) -> Self {
        Self {
            menu: MenuBar::new(menus),
            modal: ChatModal::default(),
            toasts: ToastRack::default(),
            options,
            selected_entry: 0,
            help_visible: false,
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    menus: Vec<Menu>,
    options: UiOptions,
    runtime: &mut R,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(menus, options);
    let (internal_tx, internal_rx) = mpsc::channel();

    // Counter fetch fires immediately, then on the poll interval.
    if let Err(error) = runtime.spawn_unread_fetch(internal_tx.clone()) {
        state.dispatch(AppCommand::SetStatus(format!("unread count failed: {error}")));
    }
    let mut next_poll = Instant::now() + view_data.options.poll_interval;

    let mut result = Ok(());
    loop {
        let now = Instant::now();
        process_internal_events(state, &mut view_data, now, &internal_rx);
        view_data.toasts.tick(now);
        for event in view_data.menu.tick(now) {
            handle_menu_event(state, &mut view_data, event, now);
        }

        if now >= next_poll {
            if let Err(error) = runtime.spawn_unread_fetch(internal_tx.clone()) {
                state.dispatch(AppCommand::SetStatus(format!(
                    "unread count failed: {error}"
                )));
            }
            next_poll = now + view_data.options.poll_interval;
        }

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data, now)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key, now) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    now: Instant,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::UnreadCount { count } => {
                state.dispatch(AppCommand::SetUnreadCount(count));
            }
            InternalEvent::UnreadCountFailed { error } => {
                // A dead counter keeps its last value; the poll retries.
                state.dispatch(AppCommand::SetStatus(format!(
                    "unread count failed: {error}"
                )));
            }
            InternalEvent::WidgetLoaded { widget, trigger } => {
                let was_closed = view_data.modal.phase() == ModalPhase::Closed;
                view_data.modal.apply_widget(widget);
                if !was_closed && trigger == WidgetTrigger::Clear {
                    emit_toast(view_data, "historial borrado", ToastSeverity::Success, now);
                }
            }
            InternalEvent::WidgetFailed { error, trigger } => match trigger {
                WidgetTrigger::Open => view_data.modal.load_failed(&error),
                WidgetTrigger::Clear => {
                    emit_toast(
                        view_data,
                        format!("no se pudo borrar el historial: {error}"),
                        ToastSeverity::Error,
                        now,
                    );
                }
            },
            InternalEvent::ReplySettled { reply } => {
                view_data.modal.apply_reply(&reply);
            }
            InternalEvent::ReplyFailed { error } => {
                view_data.modal.apply_send_failure(&error);
            }
        }
    }
}

fn emit_toast(
    view_data: &mut ViewData,
    message: impl Into<String>,
    severity: ToastSeverity,
    now: Instant,
) {
    if view_data.options.show_toasts {
        view_data.toasts.push(message, severity, now);
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.modal.phase() != ModalPhase::Closed {
        handle_chat_key(state, runtime, view_data, internal_tx, key, now);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Char('@'), _) => {
            open_chat(state, runtime, view_data, internal_tx, now);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            if let Err(error) = runtime.spawn_unread_fetch(internal_tx.clone()) {
                emit_toast(
                    view_data,
                    format!("no se pudo refrescar: {error}"),
                    ToastSeverity::Error,
                    now,
                );
            }
        }
        (KeyCode::Right, _) => {
            let target = match view_data.menu.open_index() {
                Some(index) => (index + 1) % view_data.menu.menus().len().max(1),
                None => 0,
            };
            apply_menu_input(state, view_data, MenuInput::PointerEnter(target), now);
        }
        (KeyCode::Left, _) => {
            let count = view_data.menu.menus().len().max(1);
            let target = match view_data.menu.open_index() {
                Some(index) => (index + count - 1) % count,
                None => count - 1,
            };
            apply_menu_input(state, view_data, MenuInput::PointerEnter(target), now);
        }
        (KeyCode::Down, _) => {
            if let Some(index) = view_data.menu.open_index() {
                let entry_count = view_data.menu.menus()[index].entries.len();
                if view_data.selected_entry + 1 < entry_count {
                    view_data.selected_entry += 1;
                } else {
                    apply_menu_input(state, view_data, MenuInput::PointerEnterPanel(index), now);
                }
            }
        }
        (KeyCode::Up, _) => {
            if view_data.menu.open_index().is_some() {
                if view_data.selected_entry > 0 {
                    view_data.selected_entry -= 1;
                } else if let Some(index) = view_data.menu.open_index() {
                    // Moving off the top of the panel starts the close grace.
                    apply_menu_input(state, view_data, MenuInput::PointerLeave(index), now);
                }
            }
        }
        (KeyCode::Enter, _) => {
            if let Some(index) = view_data.menu.open_index() {
                activate_menu_entry(state, view_data, index, now);
            }
        }
        (KeyCode::Esc, _) => {
            apply_menu_input(state, view_data, MenuInput::ClickOutside, now);
        }
        _ => {}
    }
    false
}

fn open_chat<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    now: Instant,
) {
    if !view_data.modal.open() {
        return;
    }
    state.dispatch(AppCommand::OpenChat);
    if let Err(error) = runtime.spawn_widget_load(WidgetTrigger::Open, internal_tx.clone()) {
        view_data.modal.load_failed(&error.to_string());
        emit_toast(
            view_data,
            format!("no se pudo cargar el asistente: {error}"),
            ToastSeverity::Error,
            now,
        );
    }
}

fn apply_menu_input(state: &mut AppState, view_data: &mut ViewData, input: MenuInput, now: Instant) {
    let events = view_data.menu.apply(input, now);
    for event in events {
        handle_menu_event(state, view_data, event, now);
    }
}

fn handle_menu_event(state: &mut AppState, view_data: &mut ViewData, event: MenuEvent, now: Instant) {
    match event {
        MenuEvent::Opened(_) => {
            view_data.selected_entry = 0;
        }
        MenuEvent::Closed(_) => {
            view_data.selected_entry = 0;
        }
        MenuEvent::Navigated(target) => {
            // The client has no page to swap out; announce the target.
            state.dispatch(AppCommand::SetStatus(format!("abrir {target}")));
            emit_toast(view_data, format!("abrir {target}"), ToastSeverity::Info, now);
        }
    }
}

fn activate_menu_entry(state: &mut AppState, view_data: &mut ViewData, index: usize, now: Instant) {
    let Some(menu) = view_data.menu.menus().get(index) else {
        return;
    };
    let Some(entry) = menu.entries.get(view_data.selected_entry) else {
        // No entries: treat the activation as a trigger click.
        apply_menu_input(state, view_data, MenuInput::ClickTrigger(index), now);
        return;
    };

    let action = entry.action.clone();
    apply_menu_input(state, view_data, MenuInput::ClickOutside, now);
    if let ventanilla_app::MenuAction::Navigate(target) = action {
        handle_menu_event(state, view_data, MenuEvent::Navigated(target), now);
    }
}

fn handle_chat_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.modal.close();
            state.dispatch(AppCommand::CloseChat);
        }
        (KeyCode::Char('l'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            let Some(form) = view_data.modal.clear_request() else {
                emit_toast(
                    view_data,
                    "el historial no se puede borrar todavía",
                    ToastSeverity::Warning,
                    now,
                );
                return;
            };
            if let Err(error) = runtime.spawn_history_clear(form, internal_tx.clone()) {
                emit_toast(
                    view_data,
                    format!("no se pudo borrar el historial: {error}"),
                    ToastSeverity::Error,
                    now,
                );
            }
        }
        (KeyCode::Enter, _) => {
            let Some(form) = view_data.modal.take_submission() else {
                return;
            };
            if let Err(error) = runtime.spawn_chat_send(form, internal_tx.clone()) {
                view_data.modal.apply_send_failure(&error.to_string());
            }
        }
        (KeyCode::Backspace, _) => {
            view_data.modal.input.pop();
        }
        (KeyCode::Char(ch), modifiers) => {
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT {
                view_data.modal.input.push(ch);
            }
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData, now: Instant) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let labels = view_data
        .menu
        .menus()
        .iter()
        .map(|menu| menu.label.clone())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(labels)
        .block(
            Block::default()
                .title(header_title(state))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(view_data.menu.open_index());
    frame.render_widget(tabs, layout[0]);

    let body = Paragraph::new(body_text(state))
        .block(Block::default().borders(Borders::ALL).title("ventanilla"));
    frame.render_widget(body, layout[1]);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(index) = view_data.menu.open_index() {
        render_menu_panel(frame, view_data, index, layout[1]);
    }

    if view_data.modal.phase() != ModalPhase::Closed {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let chat = Paragraph::new(render_chat_overlay_text(&view_data.modal))
            .block(Block::default().title("asistente").borders(Borders::ALL));
        frame.render_widget(chat, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("ayuda").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    render_toasts(frame, view_data, now);
}

fn render_menu_panel(frame: &mut ratatui::Frame<'_>, view_data: &ViewData, index: usize, body: Rect) {
    let Some(menu) = view_data.menu.menus().get(index) else {
        return;
    };
    let height = (menu.entries.len() as u16).saturating_add(2).min(body.height);
    let width = body.width.min(30);
    let area = Rect {
        x: body.x + 1,
        y: body.y,
        width,
        height,
    };
    frame.render_widget(Clear, area);
    let panel = Paragraph::new(render_menu_panel_text(menu, view_data.selected_entry)).block(
        Block::default()
            .title(menu.label.clone())
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(panel, area);
}

fn render_toasts(frame: &mut ratatui::Frame<'_>, view_data: &ViewData, now: Instant) {
    let frame_area = frame.area();
    let width = frame_area.width.min(44);
    let mut y = frame_area.y.saturating_add(1);
    for toast in view_data.toasts.visible() {
        if y + 3 > frame_area.bottom() {
            break;
        }
        let area = Rect {
            x: frame_area.right().saturating_sub(width + 1),
            y,
            width,
            height: 3,
        };
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(toast.body.clone())
            .style(toast_style(toast, now))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, area);
        y += 3;
    }
}

fn toast_style(toast: &Toast, now: Instant) -> Style {
    let (r, g, b) = toast.severity.rgb();
    let style = Style::default().fg(Color::Rgb(r, g, b));
    if toast.phase(now) == ToastPhase::Fading {
        style.add_modifier(Modifier::DIM)
    } else {
        style
    }
}

fn header_title(state: &AppState) -> String {
    match state.unread_count {
        Some(count) => format!("ventanilla [sin leer: {count}]"),
        None => "ventanilla".to_owned(),
    }
}

fn body_text(state: &AppState) -> String {
    let chat_line = match state.chat {
        ChatVisibility::Visible => "asistente abierto",
        ChatVisibility::Hidden => "(@) abre el asistente",
    };
    [
        String::new(),
        format!("  {chat_line}"),
        "  (←/→) recorre los menús, (enter) activa una entrada".to_owned(),
        "  (?) ayuda".to_owned(),
    ]
    .join("\n")
}

fn status_text(state: &AppState) -> String {
    match &state.status_line {
        Some(line) => line.clone(),
        None => "(@) chat  (r) refrescar  (ctrl+q) salir".to_owned(),
    }
}

fn render_menu_panel_text(menu: &Menu, selected: usize) -> String {
    menu.entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if index == selected {
                format!("> {}", entry.label)
            } else {
                format!("  {}", entry.label)
            }
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn render_chat_overlay_text(modal: &ChatModal) -> String {
    let mut lines = Vec::new();
    if modal.phase() == ModalPhase::Opening {
        lines.push("cargando...".to_owned());
    }
    for turn in modal.turns() {
        let prefix = match turn.role {
            TurnRole::User => "tú",
            TurnRole::Assistant => "ia",
            TurnRole::Error => "error",
        };
        for (index, line) in turn.body.lines().enumerate() {
            if index == 0 {
                lines.push(format!("{prefix}: {line}"));
            } else {
                lines.push(format!("    {line}"));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!("> {}_", modal.input));
    lines.push("(enter) envía  (ctrl+l) borra historial  (esc) cierra".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> String {
    [
        "←/→      recorre los menús",
        "↓/↑      recorre las entradas del menú abierto",
        "enter    activa la entrada seleccionada",
        "esc      cierra los menús",
        "@        abre el asistente",
        "r        refresca el contador de notificaciones",
        "ctrl+q   salir",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
