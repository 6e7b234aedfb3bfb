pub mod help_overlay;
pub mod ideas;
pub mod log_panel;
pub mod transcript;
