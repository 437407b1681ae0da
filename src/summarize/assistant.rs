use crate::calendar::calendar_client::CalendarClient;
use crate::domain::Entry;
use crate::domain::email::EmailSummary;
use crate::domain::event::CalendarEvent;
use crate::google::GoogleSession;
use crate::mail::decoders::truncate_chars;
use crate::mail::gmail_client::GmailClient;
use crate::summarize::TextGenerator;

pub const ASSISTANT_ERROR_PREFIX: &str = "Error running assistant: ";

/// Answers a free-form prompt using the mailbox and calendar as context.
pub struct Assistant<'a, G> {
    session: &'a GoogleSession,
    generator: G,
    language: String,
}

impl<'a, G: TextGenerator> Assistant<'a, G> {
    pub fn new(session: &'a GoogleSession, generator: G, language: impl Into<String>) -> Self {
        Self {
            session,
            generator,
            language: language.into(),
        }
    }

    pub fn run(&self, prompt: &str, max_emails: u32, max_events: u32) -> String {
        let emails = GmailClient::new(self.session).list_recent_messages(max_emails);
        let events = CalendarClient::new(self.session).list_upcoming_events(max_events);
        self.answer(prompt, &emails, &events)
    }

    pub fn answer(
        &self,
        prompt: &str,
        emails: &[Entry<EmailSummary>],
        events: &[Entry<CalendarEvent>],
    ) -> String {
        let emails: Vec<_> = emails.iter().filter_map(Entry::item).collect();
        let events: Vec<_> = events.iter().filter_map(Entry::item).collect();
        let full = build_prompt(prompt, &emails, &events, &self.language);

        match self.generator.generate(&full) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("assistant call failed: {e:#}");
                format!("{ASSISTANT_ERROR_PREFIX}{e:#}")
            }
        }
    }
}

fn build_prompt(
    prompt: &str,
    emails: &[&EmailSummary],
    events: &[&CalendarEvent],
    language: &str,
) -> String {
    let mut out = format!(
        "{prompt}\n\nAvailable data:\n- Emails: {} messages\n- Events: {} events\n",
        emails.len(),
        events.len()
    );

    if !emails.is_empty() {
        out.push_str("\nEmail details:\n");
        for (i, e) in emails.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. Subject: {}\n   From: {}\n   Content: {}\n",
                i + 1,
                e.subject,
                e.sender,
                truncate_chars(&e.body, 200)
            ));
        }
    }

    if !events.is_empty() {
        out.push_str("\nUpcoming events:\n");
        for (i, ev) in events.iter().enumerate() {
            out.push_str(&format!("\n{}. {} - {}\n", i + 1, ev.title, ev.display_time));
            if let Some(d) = &ev.description {
                out.push_str(&format!("   Description: {}\n", truncate_chars(d, 100)));
            }
        }
    }

    out.push_str(&format!(
        "\nAnalyze the data and provide useful insights in {language}.\n"
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::testing::FakeGenerator;
    use mockito::Matcher;

    fn email(subject: &str, body: &str) -> EmailSummary {
        EmailSummary {
            subject: subject.into(),
            sender: "bob@example.com".into(),
            body: body.into(),
        }
    }

    fn event(title: &str, description: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            title: title.into(),
            display_time: "01/06/2024 às 14:30".into(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn prompt_lists_counts_and_truncated_details() {
        let long = "a".repeat(250);
        let e = email("Orçamento", &long);
        let ev = event("Dentista", Some(&"d".repeat(150)));
        let p = build_prompt("What matters today?", &[&e], &[&ev], "Portuguese");

        assert!(p.starts_with("What matters today?\n"));
        assert!(p.contains("- Emails: 1 messages"));
        assert!(p.contains("- Events: 1 events"));
        assert!(p.contains("1. Subject: Orçamento"));
        assert!(p.contains(&format!("Content: {}...\n", "a".repeat(200))));
        assert!(p.contains("1. Dentista - 01/06/2024 às 14:30"));
        assert!(p.contains(&format!("Description: {}...\n", "d".repeat(100))));
        assert!(p.ends_with("insights in Portuguese.\n"));
    }

    #[test]
    fn prompt_layout() {
        let e = email("Oi", "corpo");
        let ev = event("Aula", None);
        assert_eq!(
            build_prompt("q?", &[&e], &[&ev], "English"),
            "q?\n\nAvailable data:\n- Emails: 1 messages\n- Events: 1 events\n\
             \nEmail details:\n\n1. Subject: Oi\n   From: bob@example.com\n   Content: corpo\n\
             \nUpcoming events:\n\n1. Aula - 01/06/2024 às 14:30\n\
             \nAnalyze the data and provide useful insights in English.\n"
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        let p = build_prompt("hi", &[], &[], "English");
        assert!(p.contains("- Emails: 0 messages"));
        assert!(!p.contains("Email details"));
        assert!(!p.contains("Upcoming events"));
    }

    #[test]
    fn error_entries_are_left_out_of_the_prompt() {
        let session = GoogleSession::new("t", "http://unused", "http://unused").unwrap();
        let fake = FakeGenerator::replying("insight");
        let a = Assistant::new(&session, &fake, "English");

        let out = a.answer(
            "q",
            &[Entry::Error("failed to read emails: boom".into())],
            &[Entry::Item(event("Demo", None))],
        );

        assert_eq!(out, "insight");
        let prompt = &fake.prompts.borrow()[0];
        assert!(prompt.contains("- Emails: 0 messages"));
        assert!(!prompt.contains("boom"));
        assert!(prompt.contains("1. Demo"));
    }

    #[test]
    fn generator_failure_is_reported_as_text() {
        let session = GoogleSession::new("t", "http://unused", "http://unused").unwrap();
        let fake = FakeGenerator::failing();
        let out = Assistant::new(&session, &fake, "English").answer("q", &[], &[]);
        assert!(out.starts_with(ASSISTANT_ERROR_PREFIX));
    }

    #[test]
    fn run_fetches_both_sources() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "1".into()))
            .with_body(r#"{"messages": [{"id": "a"}]}"#)
            .create();
        let _msg = server
            .mock("GET", "/gmail/v1/users/me/messages/a")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"payload": {"mimeType": "text/plain",
                    "headers": [{"name": "Subject", "value": "Boleto"}],
                    "body": {"data": "SGVsbG8="}}}"#,
            )
            .create();
        let _events = server
            .mock("GET", "/calendar/v3/calendars/primary/events")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "2".into()))
            .with_body(r#"{"items": [{"summary": "Aula", "start": {"date": "2024-06-01"}}]}"#)
            .create();

        let session = GoogleSession::new("t", server.url(), server.url()).unwrap();
        let fake = FakeGenerator::replying("done");
        let out = Assistant::new(&session, &fake, "English").run("q", 1, 2);

        assert_eq!(out, "done");
        let prompt = &fake.prompts.borrow()[0];
        assert!(prompt.contains("1. Subject: Boleto"));
        assert!(prompt.contains("Content: Hello"));
        assert!(prompt.contains("1. Aula - 01/06/2024 (dia inteiro)"));
    }
}
