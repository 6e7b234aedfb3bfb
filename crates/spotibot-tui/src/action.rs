//! Action enum: user intents and internal events routed by the App.

/// Unique identifier for a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Transcript,
    Ideas,
    LogPanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Chat ─────────────────────────────────────────────────────────────────
    Submit(String),
    FillPrompt(String),

    // ── Spotify login ────────────────────────────────────────────────────────
    Login,
    Logout,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToBottom,

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    ToggleLogs,
    ToggleIdeas,

    // ── System ───────────────────────────────────────────────────────────────
    CopyLastReply,
    CopyToClipboard(String),
    Resize(u16, u16),
    Quit,
}
