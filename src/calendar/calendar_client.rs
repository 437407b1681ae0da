use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::calendar::format::{EventStart, format_event_start};
use crate::domain::event::{CalendarEvent, NO_TITLE};
use crate::domain::{Entry, degrade};
use crate::google::{GoogleSession, send_json};

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start: EventStart,
}

impl From<ApiEvent> for CalendarEvent {
    fn from(ev: ApiEvent) -> Self {
        let title = ev.summary.unwrap_or_else(|| {
            log::warn!("event {} has no summary", ev.id);
            NO_TITLE.to_string()
        });
        CalendarEvent {
            title,
            display_time: format_event_start(&ev.start),
            description: ev.description.filter(|d| !d.is_empty()),
        }
    }
}

pub struct CalendarClient<'a> {
    session: &'a GoogleSession,
}

impl<'a> CalendarClient<'a> {
    pub fn new(session: &'a GoogleSession) -> Self {
        Self { session }
    }

    /// Upcoming events on the primary calendar, soonest first. Any endpoint
    /// failure collapses the result into a single `Entry::Error`.
    pub fn list_upcoming_events(&self, max_results: u32) -> Vec<Entry<CalendarEvent>> {
        degrade("events", self.try_list_upcoming_events(max_results))
    }

    pub fn try_list_upcoming_events(&self, max_results: u32) -> Result<Vec<CalendarEvent>> {
        self.list_events_from(Utc::now(), max_results)
    }

    fn list_events_from(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/calendar/v3/calendars/primary/events",
            self.session.calendar_base
        );
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        log::debug!("listing up to {max_results} events from {time_min}");

        let list: EventList = send_json(self.session.get(&url).query(&[
            ("timeMin", time_min),
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]))?;

        Ok(list.items.into_iter().map(CalendarEvent::from).collect())
    }
}
