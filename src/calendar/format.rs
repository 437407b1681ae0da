use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::domain::event::NO_START_TIME;

/// The `start` object of a Calendar API event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// `DD/MM/YYYY às HH:MM` in the event's own offset for timed events,
/// `DD/MM/YYYY (dia inteiro)` for all-day ones.
pub fn format_event_start(start: &EventStart) -> String {
    if let Some(dt) = start.date_time.as_deref() {
        return match DateTime::parse_from_rfc3339(dt) {
            Ok(dt) => dt.format("%d/%m/%Y às %H:%M").to_string(),
            Err(e) => {
                log::warn!("unparseable event dateTime {dt:?}: {e}");
                NO_START_TIME.to_string()
            }
        };
    }
    if let Some(d) = start.date.as_deref() {
        return match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(d) => d.format("%d/%m/%Y (dia inteiro)").to_string(),
            Err(e) => {
                log::warn!("unparseable event date {d:?}: {e}");
                NO_START_TIME.to_string()
            }
        };
    }
    log::warn!("event has no start");
    NO_START_TIME.to_string()
}
