use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use inbox_digest::auth::credential_store::CredentialStore;
use inbox_digest::auth::token_store;
use inbox_digest::calendar::calendar_client::CalendarClient;
use inbox_digest::config::{Config, SCOPES, load_config, resolve_api_key};
use inbox_digest::domain::Entry;
use inbox_digest::google::GoogleSession;
use inbox_digest::mail::gmail_client::GmailClient;
use inbox_digest::report;
use inbox_digest::summarize::Summarizer;
use inbox_digest::summarize::assistant::Assistant;
use inbox_digest::summarize::gemini::GeminiClient;

#[derive(Parser)]
#[command(name = "inbox_digest")]
#[command(about = "Summarize recent Gmail messages and upcoming Calendar events", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read recent emails, summarize each one, then list upcoming events
    Digest {
        #[arg(long)]
        emails: Option<u32>,

        #[arg(long)]
        events: Option<u32>,

        /// Skip the summarization calls
        #[arg(long)]
        no_summary: bool,
    },

    /// List recent inbox messages
    Emails {
        #[arg(long)]
        max: Option<u32>,
    },

    /// List upcoming calendar events
    Events {
        #[arg(long)]
        max: Option<u32>,
    },

    /// Ask a question with recent emails and events as context
    Ask {
        prompt: String,

        #[arg(long, default_value_t = 3)]
        emails: u32,

        #[arg(long, default_value_t = 3)]
        events: u32,
    },

    /// Authorize access and store the token
    Login,

    /// Store the Gemini API key in the keyring
    SetApiKey,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap_or(Command::Digest {
        emails: None,
        events: None,
        no_summary: false,
    });

    let cfg = load_config(cli.config.as_deref())
        .map_err(|e| anyhow!("Configuration error: {e:#}"))?;

    match cmd {
        Command::Digest {
            emails,
            events,
            no_summary,
        } => {
            // resolve before any network or browser interaction
            let gemini = if no_summary {
                None
            } else {
                Some(GeminiClient::from_config(resolve_api_key()?, &cfg)?)
            };
            let session = connect(&cfg)?;
            let summarizer = gemini.map(|g| Summarizer::new(g, cfg.summary_language.clone()));
            run_digest(
                &session,
                summarizer.as_ref(),
                emails.unwrap_or(cfg.max_emails),
                events.unwrap_or(cfg.max_events),
            );
            Ok(())
        }

        Command::Emails { max } => {
            let session = connect(&cfg)?;
            print_emails(&session, None, max.unwrap_or(cfg.max_emails));
            Ok(())
        }

        Command::Events { max } => {
            let session = connect(&cfg)?;
            let events =
                CalendarClient::new(&session).list_upcoming_events(max.unwrap_or(cfg.max_events));
            print!("{}", report::render_events(&events));
            Ok(())
        }

        Command::Ask {
            prompt,
            emails,
            events,
        } => {
            let gemini = GeminiClient::from_config(resolve_api_key()?, &cfg)?;
            let session = connect(&cfg)?;
            let assistant = Assistant::new(&session, gemini, cfg.summary_language.clone());
            println!("{}", assistant.run(&prompt, emails, events));
            Ok(())
        }

        Command::Login => {
            let cred = CredentialStore::from_config(&cfg, SCOPES).obtain()?;
            println!(
                "Authorized {} scope(s); token stored at {}",
                cred.scopes.len(),
                cfg.token_path.display()
            );
            Ok(())
        }

        Command::SetApiKey => set_api_key(),
    }
}

fn set_api_key() -> Result<()> {
    eprintln!("Paste the Gemini API key (end with Ctrl-D):");
    let mut key = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut key)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("no API key given"));
    }
    token_store::save_api_key(key)?;
    println!("Saved Gemini API key to the keyring");
    Ok(())
}

fn connect(cfg: &Config) -> Result<GoogleSession> {
    let cred = CredentialStore::from_config(cfg, SCOPES).obtain()?;
    println!("Authenticated successfully!");
    GoogleSession::from_config(&cred, cfg)
}

fn run_digest(
    session: &GoogleSession,
    summarizer: Option<&Summarizer<GeminiClient>>,
    max_emails: u32,
    max_events: u32,
) {
    println!("\nReading the {max_emails} most recent inbox emails...");
    print_emails(session, summarizer, max_emails);

    let events = CalendarClient::new(session).list_upcoming_events(max_events);
    print!("{}", report::render_events(&events));
}

fn print_emails(
    session: &GoogleSession,
    summarizer: Option<&Summarizer<GeminiClient>>,
    max_emails: u32,
) {
    let emails = GmailClient::new(session).list_recent_messages(max_emails);
    if emails.is_empty() {
        println!("No emails found.");
    }
    let mut n = 0;
    for entry in &emails {
        match entry {
            Entry::Item(email) => {
                n += 1;
                let summary = summarizer.map(|s| s.summarize(&email.body, &email.subject));
                print!("{}", report::render_email(n, email, summary.as_deref()));
            }
            Entry::Error(msg) => print!("{}", report::render_error(msg)),
        }
    }
}
