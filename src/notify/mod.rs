//! Advance scheduling of alarm notifications for today and tomorrow.
//!
//! Delivery itself belongs to an external [`NotificationScheduler`]; this
//! module only decides what to hand it. The batch is rebuilt whenever the
//! table or the alarm set changes.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use log::{debug, info};
use serde::Serialize;

use crate::models::{AlarmSet, PrayerName, PrayerTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledNotification {
    pub prayer: PrayerName,
    pub fire_at: NaiveDateTime,
    pub text: String,
}

pub trait NotificationScheduler {
    fn cancel_all(&mut self) -> Result<()>;
    fn schedule(&mut self, notification: &ScheduledNotification) -> Result<()>;
}

/// Enabled prayers for today and tomorrow that are still ahead of `now`,
/// in firing order. Without a tomorrow table, tomorrow reuses today's
/// times.
pub fn plan_notifications(
    today: &PrayerTable,
    tomorrow: Option<&PrayerTable>,
    alarms: &AlarmSet,
    now: NaiveDateTime,
) -> Vec<ScheduledNotification> {
    let tomorrow_date = today.date + Duration::days(1);
    let days = [
        (today.date, today),
        (tomorrow_date, tomorrow.unwrap_or(today)),
    ];

    let mut plan: Vec<ScheduledNotification> = days
        .iter()
        .flat_map(|(date, table)| {
            alarms.enabled().map(move |prayer| {
                let time = table.time_of(prayer);
                ScheduledNotification {
                    prayer,
                    fire_at: date.and_time(time),
                    text: format!("Waktunya {} ({})", prayer, time.format("%H:%M")),
                }
            })
        })
        .filter(|n| n.fire_at > now)
        .collect();
    plan.sort_by_key(|n| n.fire_at);
    plan
}

/// Replace whatever the scheduler holds with `plan`.
pub fn reschedule(
    scheduler: &mut dyn NotificationScheduler,
    plan: &[ScheduledNotification],
) -> Result<()> {
    scheduler.cancel_all()?;
    for n in plan {
        scheduler.schedule(n)?;
    }
    info!("{} notification(s) scheduled", plan.len());
    Ok(())
}

/// Prints the batch. Stands in for the OS scheduler on a terminal.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    pending: Vec<ScheduledNotification>,
}

impl TerminalNotifier {
    pub fn pending(&self) -> &[ScheduledNotification] {
        &self.pending
    }
}

impl NotificationScheduler for TerminalNotifier {
    fn cancel_all(&mut self) -> Result<()> {
        debug!("cancelling {} pending notification(s)", self.pending.len());
        self.pending.clear();
        Ok(())
    }

    fn schedule(&mut self, notification: &ScheduledNotification) -> Result<()> {
        debug!("schedule {} at {}", notification.prayer, notification.fire_at);
        self.pending.push(notification.clone());
        Ok(())
    }
}
