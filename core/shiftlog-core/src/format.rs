//! Display helpers shared by front ends.

use crate::types::Ticket;

/// `125` → `"2h 5m"`
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// First `max_chars` characters of `text`, with `...` when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

pub fn ticket_labels(tickets: &[Ticket]) -> Vec<&str> {
    tickets.iter().map(|t| t.number.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(45), "0h 45m");
        assert_eq!(format_minutes(125), "2h 5m");
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("short", 60), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_ticket_labels() {
        let tickets = vec![Ticket::from_input("A-1", ""), Ticket::from_input("B-2", "x")];
        assert_eq!(ticket_labels(&tickets), vec!["A-1", "B-2"]);
    }
}
