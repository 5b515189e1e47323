pub mod calculator;
pub mod engine;
pub mod myquran;
pub mod provider;
pub mod schedule;
pub mod ticker;
pub mod tracker;

pub use calculator::PrayerCalculator;
pub use engine::ScheduleEngine;
pub use myquran::MyQuranClient;
pub use provider::{load_table, ContentProvider};
pub use schedule::ScheduleState;
