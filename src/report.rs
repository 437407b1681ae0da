use crate::domain::Entry;
use crate::domain::email::EmailSummary;
use crate::domain::event::CalendarEvent;
use crate::mail::decoders::truncate_chars;

const EMAIL_BODY_PREVIEW: usize = 500;
const EVENT_DESCRIPTION_PREVIEW: usize = 200;

/// One email block. `summary` is printed under the body when present.
pub fn render_email(index: usize, email: &EmailSummary, summary: Option<&str>) -> String {
    let mut out = format!(
        "\nEmail {index}:\nSubject: {}\nFrom: {}\nBody:\n{}\n",
        email.subject,
        email.sender,
        truncate_chars(&email.body, EMAIL_BODY_PREVIEW)
    );
    if let Some(s) = summary {
        out.push_str(&format!("\n📝 Summary:\n{s}\n"));
    }
    out.push_str(&"-".repeat(50));
    out.push('\n');
    out
}

pub fn render_event(index: usize, event: &CalendarEvent) -> String {
    let mut out = format!(
        "\nEvent {index}:\n📅 {}\n🕐 {}\n",
        event.title, event.display_time
    );
    if let Some(d) = &event.description {
        out.push_str(&format!("📝 {}\n", truncate_chars(d, EVENT_DESCRIPTION_PREVIEW)));
    }
    out.push_str(&"-".repeat(30));
    out.push('\n');
    out
}

pub fn render_error(message: &str) -> String {
    format!("⚠️  {message}\n")
}

/// The events section, including its header and the empty-state line.
pub fn render_events(events: &[Entry<CalendarEvent>]) -> String {
    let mut out = String::from("\n📅 Upcoming events:\n");
    if events.is_empty() {
        out.push_str("No upcoming events found.\n");
        return out;
    }
    let mut n = 0;
    for entry in events {
        match entry {
            Entry::Item(ev) => {
                n += 1;
                out.push_str(&render_event(n, ev));
            }
            Entry::Error(msg) => out.push_str(&render_error(msg)),
        }
    }
    out
}
