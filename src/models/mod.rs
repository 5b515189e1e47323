pub mod prayer;
pub mod table;

pub use prayer::{AlarmSet, PrayerName};
pub use table::{PrayerTable, TableError};
