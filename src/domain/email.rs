pub const NO_SUBJECT: &str = "(no subject)";
pub const UNKNOWN_SENDER: &str = "(unknown sender)";

#[derive(Debug, Clone, PartialEq)]
pub struct EmailSummary {
    pub subject: String,
    pub sender: String,
    pub body: String,
}
