pub mod pane_chrome;
pub mod prompt_input;
pub mod status_bar;
pub mod toast;
