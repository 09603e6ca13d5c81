//! HTTP route handlers.

pub mod chat;
pub mod health;
pub mod reports;

pub use chat::{chat_completions, fallback};
pub use health::{health, stats};
pub use reports::{clear_logs, dashboard, logs, report_data};
