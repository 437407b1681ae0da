pub const NO_TITLE: &str = "(no title)";
pub const NO_START_TIME: &str = "(no start time)";

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub display_time: String,
    pub description: Option<String>,
}
