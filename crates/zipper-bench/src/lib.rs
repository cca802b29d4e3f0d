//! Seeded races between Zipper policies, with JSONL logs and a Markdown summary.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod race;
pub mod roller;
