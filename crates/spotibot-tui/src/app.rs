//! App: terminal setup, the event loop and action dispatch.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    Terminal,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use spotibot_core::auth::Authenticator;
use spotibot_core::{Session, TurnReport};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, Entry},
    component::Component,
    components::{
        help_overlay::HelpOverlay, ideas::IdeasPanel, log_panel::LogPanel,
        transcript::Transcript,
    },
    widgets::{
        pane_chrome::pane_chrome,
        prompt_input::{PromptAction, PromptInput},
        status_bar,
        toast::{Severity, ToastManager},
    },
};

/// The ideas panel is hidden below this terminal width.
const IDEAS_MIN_WIDTH: u16 = 90;
const IDEAS_WIDTH: u16 = 36;
const LOG_HEIGHT: u16 = 10;

enum AppMessage {
    Event(Event),
    TurnFinished(TurnReport),
    LoginFinished(bool),
    Log(String),
}

/// Pane rectangles from the last draw, for mouse routing.
#[derive(Default)]
struct PaneAreas {
    transcript: Rect,
    ideas: Rect,
    log_panel: Rect,
}

pub struct App {
    state: AppState,
    session: Arc<Mutex<Session>>,
    auth: Arc<Authenticator>,
    transcript: Transcript,
    prompt: PromptInput,
    ideas: IdeasPanel,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,
    toast: ToastManager,
    focus: ComponentId,
    areas: PaneAreas,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session, auth: Arc<Authenticator>, log_path: String) -> Self {
        let state = AppState::new(auth.is_logged_in(), log_path);
        Self {
            state,
            session: Arc::new(Mutex::new(session)),
            auth,
            transcript: Transcript::new(),
            prompt: PromptInput::default(),
            ideas: IdeasPanel::new(),
            log_panel: LogPanel::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            focus: ComponentId::Transcript,
            areas: PaneAreas::default(),
            tx: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut log_rx: mpsc::UnboundedReceiver<String>,
        mut login_rx: mpsc::Receiver<bool>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        self.tx = Some(tx.clone());

        if !self.state.logged_in {
            self.state.transcript.push(Entry::Info(
                "You are not logged in to Spotify. Press Ctrl-L to log in.".into(),
            ));
        }

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: warnings for the log panel ──────────────────────
        let log_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(line) = log_rx.recv().await {
                if log_tx.send(AppMessage::Log(line)).await.is_err() {
                    break;
                }
            }
        });

        // ── Background task: login callback results ──────────────────────────
        let login_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(ok) = login_rx.recv().await {
                if login_tx.send(AppMessage::LoginFinished(ok)).await.is_err() {
                    break;
                }
            }
        });

        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg).await;
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next).await;
                    }
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    let tick_actions: Vec<Action> = {
                        let s = &self.state;
                        let mut all = Vec::new();
                        all.extend(self.transcript.tick(s));
                        all.extend(self.log_panel.tick(s));
                        all
                    };
                    for action in tick_actions {
                        self.dispatch(action).await;
                    }
                    let animate = !self.toast.is_empty();
                    self.toast.tick();
                    needs_redraw = animate;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("spotibot exiting");

        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return;
                    }
                    for action in self.handle_key(key) {
                        self.dispatch(action).await;
                    }
                }
                Event::Mouse(mouse) => {
                    for action in self.handle_mouse(mouse) {
                        self.dispatch(action).await;
                    }
                }
                Event::Resize(w, h) => self.dispatch(Action::Resize(w, h)).await,
                _ => {}
            },
            AppMessage::TurnFinished(report) => self.on_turn_finished(report),
            AppMessage::LoginFinished(ok) => self.on_login_finished(ok),
            AppMessage::Log(line) => self.state.push_log(line),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return vec![Action::Quit],
            KeyCode::Char('l') if ctrl => return vec![Action::Login],
            KeyCode::Char('o') if ctrl => return vec![Action::Logout],
            KeyCode::Char('y') if ctrl => return vec![Action::CopyLastReply],
            KeyCode::F(1) => return vec![Action::ToggleHelp],
            KeyCode::F(2) => return vec![Action::ToggleLogs],
            KeyCode::F(3) => return vec![Action::ToggleIdeas],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::PageUp | KeyCode::PageDown | KeyCode::Up | KeyCode::Down => {
                return match self.focus {
                    ComponentId::LogPanel => self.log_panel.handle_key(key, &self.state),
                    _ => self.transcript.handle_key(key, &self.state),
                };
            }
            _ => {}
        }

        if self.state.input_mode() != status_bar::InputMode::Chat {
            return vec![];
        }
        match self.prompt.handle_key(key) {
            PromptAction::Submit(text) => vec![Action::Submit(text)],
            PromptAction::Changed | PromptAction::None => vec![],
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Action> {
        if self.help_overlay.visible {
            return vec![];
        }
        let pos = Position::new(mouse.column, mouse.row);
        if self.areas.ideas.contains(pos) {
            self.ideas.handle_mouse(mouse, self.areas.ideas, &self.state)
        } else if self.areas.log_panel.contains(pos) {
            self.log_panel
                .handle_mouse(mouse, self.areas.log_panel, &self.state)
        } else if self.areas.transcript.contains(pos) {
            self.transcript
                .handle_mouse(mouse, self.areas.transcript, &self.state)
        } else {
            vec![]
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        let mut queue = vec![action];
        while let Some(action) = queue.pop() {
            queue.extend(self.apply(&action));
            let s = &self.state;
            queue.extend(self.transcript.on_action(&action, s));
            queue.extend(self.ideas.on_action(&action, s));
            queue.extend(self.log_panel.on_action(&action, s));
            queue.extend(self.help_overlay.on_action(&action, s));
        }
    }

    /// App-level effects of an action; components react in `dispatch`.
    fn apply(&mut self, action: &Action) -> Vec<Action> {
        match action {
            Action::Submit(text) => return self.submit(text.clone()),
            Action::FillPrompt(text) => self.prompt.set_value(text),
            Action::Login => self.login(),
            Action::Logout => return self.logout(),
            Action::FocusNext => {
                self.focus = match self.focus {
                    ComponentId::Transcript if self.log_panel.expanded => ComponentId::LogPanel,
                    _ => ComponentId::Transcript,
                };
            }
            Action::ToggleLogs => {
                // The panel flips in on_action; focus follows it.
                self.focus = if self.log_panel.expanded {
                    ComponentId::Transcript
                } else {
                    ComponentId::LogPanel
                };
            }
            Action::CopyLastReply => match self.state.last_reply() {
                Some(entry) => return vec![Action::CopyToClipboard(entry.plain_text())],
                None => self.toast.info("nothing to copy yet"),
            },
            Action::CopyToClipboard(text) => self.copy_to_clipboard(text),
            Action::Quit => self.should_quit = true,
            Action::ScrollUp(_)
            | Action::ScrollDown(_)
            | Action::ScrollToBottom
            | Action::ToggleHelp
            | Action::ToggleIdeas
            | Action::Resize(_, _) => {}
        }
        vec![]
    }

    fn submit(&mut self, text: String) -> Vec<Action> {
        if !self.state.logged_in {
            self.toast.warning("log in to Spotify first (Ctrl-L)");
            return vec![];
        }
        if self.state.busy {
            return vec![];
        }
        let Some(tx) = self.tx.clone() else {
            return vec![];
        };

        self.state.transcript.push(Entry::User(text.clone()));
        self.state.busy = true;
        self.toast.spinner("thinking…");

        let session = self.session.clone();
        tokio::spawn(async move {
            let report = session.lock().await.submit(&text).await;
            let _ = tx.send(AppMessage::TurnFinished(report)).await;
        });
        vec![Action::ScrollToBottom]
    }

    fn on_turn_finished(&mut self, report: TurnReport) {
        self.state.busy = false;

        if let Some(outcome) = report.outcome.as_ref().filter(|o| o.reset_history) {
            debug!("history reset by {}", outcome.operation);
            self.toast
                .resolve_spinner(Severity::Info, "history cleared", Duration::from_secs(3));
        } else if let Some(error) = &report.error {
            self.toast
                .resolve_spinner(Severity::Error, error.clone(), Duration::from_secs(5));
        } else if let Some(outcome) = &report.outcome {
            let (severity, verdict) = if outcome.success {
                (Severity::Success, "done")
            } else {
                (Severity::Warning, "failed")
            };
            self.toast.resolve_spinner(
                severity,
                format!("{} {}", outcome.operation, verdict),
                Duration::from_secs(3),
            );
        } else if report.is_empty() {
            self.toast
                .resolve_spinner(Severity::Info, "no reply", Duration::from_secs(3));
        } else {
            self.toast.dismiss_spinner();
        }

        self.state.apply_report(&report);
        self.transcript
            .on_action(&Action::ScrollToBottom, &self.state);
    }

    fn login(&mut self) {
        if self.state.logged_in {
            self.toast.info("already logged in to Spotify");
            return;
        }
        match self.auth.authorize_url() {
            Ok(url) => {
                info!("login started");
                self.state.transcript.push(Entry::Info(format!(
                    "Open this link to log in to Spotify: {}",
                    url
                )));
                self.transcript
                    .on_action(&Action::ScrollToBottom, &self.state);
                self.copy_to_clipboard(&url);
            }
            Err(e) => {
                warn!("cannot start login: {}", e);
                self.toast.error(format!("cannot start login: {}", e));
            }
        }
    }

    fn on_login_finished(&mut self, ok: bool) {
        if ok && self.auth.is_logged_in() {
            self.state.logged_in = true;
            self.state
                .transcript
                .push(Entry::Info("Logged in to Spotify.".into()));
            self.toast.success("logged in to Spotify");
        } else {
            self.toast
                .warning("login did not complete, press Ctrl-L to try again");
        }
    }

    fn logout(&mut self) -> Vec<Action> {
        let Ok(mut session) = self.session.try_lock() else {
            self.toast.warning("wait for the current request to finish");
            return vec![];
        };
        session.reset();
        drop(session);

        let auth = self.auth.clone();
        tokio::spawn(async move { auth.logout().await });
        self.state.logged_in = false;
        self.state.transcript.clear();
        self.state.transcript.push(Entry::Info(
            "Logged out. Press Ctrl-L to log in again.".into(),
        ));
        self.toast.info("logged out");
        vec![Action::ScrollToBottom]
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string())) {
            Ok(()) => {
                let display = if text.chars().count() > 40 {
                    format!("{}…", text.chars().take(40).collect::<String>())
                } else {
                    text.to_string()
                };
                self.toast.success(format!("copied: {}", display));
            }
            Err(e) => {
                warn!("clipboard unavailable: {}", e);
                self.toast.warning("clipboard unavailable");
            }
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: body | (log) | prompt | keys ───────────────────────
        let log_h = if self.log_panel.expanded { LOG_HEIGHT } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);
        let (body_area, log_area, prompt_area, keys_area) = (outer[0], outer[1], outer[2], outer[3]);

        // ── Body: transcript | (ideas) ───────────────────────────────────────
        let show_ideas = self.ideas.visible && area.width >= IDEAS_MIN_WIDTH;
        let ideas_w = if show_ideas { IDEAS_WIDTH } else { 0 };
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(ideas_w)])
            .split(body_area);

        let transcript_focused = self.focus == self.transcript.id();
        self.transcript
            .draw(frame, body[0], transcript_focused, &self.state);
        self.areas.transcript = body[0];

        if show_ideas {
            self.ideas.draw(frame, body[1], false, &self.state);
            self.areas.ideas = body[1];
        } else {
            self.areas.ideas = Rect::default();
        }

        // ── Log panel ─────────────────────────────────────────────────────────
        if self.log_panel.expanded {
            let log_focused = self.focus == self.log_panel.id();
            self.log_panel
                .draw(frame, log_area, log_focused, &self.state);
            self.areas.log_panel = log_area;
        } else {
            self.areas.log_panel = Rect::default();
        }

        // ── Prompt ────────────────────────────────────────────────────────────
        let mode = self.state.input_mode();
        let block = pane_chrome("ask", None, mode == status_bar::InputMode::Chat, None);
        let prompt_inner = block.inner(prompt_area);
        frame.render_widget(block, prompt_area);
        let hint = match mode {
            status_bar::InputMode::Chat => None,
            status_bar::InputMode::Busy => Some("working…"),
            status_bar::InputMode::Login => Some("log in to Spotify with Ctrl-L"),
        };
        if !self.help_overlay.visible {
            self.prompt.draw(frame, prompt_inner, hint);
        }

        status_bar::draw_keys_bar(frame, keys_area, mode);

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}
