//! Terminal output formatting.

use ajay_core::broadcast::{Banner, BroadcastMessage, Priority};
use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

/// Colour text in a banner tone.
fn toned(text: &str, priority: Priority) -> ColoredString {
    match priority {
        Priority::Warning => text.red(),
        Priority::Joy => text.green(),
        Priority::Info => text.blue(),
    }
}

fn icon(priority: Priority) -> &'static str {
    match priority {
        Priority::Warning => "⚠",
        Priority::Joy => "✔",
        Priority::Info => "ℹ",
    }
}

/// Print the banner a dashboard would show.
pub fn print_banner(banner: Option<&Banner>) {
    let Some(banner) = banner else {
        println!("{}", "No active broadcast.".dimmed());
        return;
    };

    let msg = &banner.message;
    println!(
        "{} {}",
        toned(icon(msg.priority), msg.priority),
        toned(banner.style.title, msg.priority).bold()
    );
    println!("  {}", msg.message);
    println!(
        "  {}",
        format!("{} · {}", msg.sender, format_timestamp(&msg.timestamp)).dimmed()
    );
}

/// Print confirmation of a published broadcast.
pub fn print_published(msg: &BroadcastMessage) {
    let audience = if msg.recipients.is_empty() {
        "all roles".to_string()
    } else {
        msg.recipients
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!(
        "{} Broadcast {} sent to {}",
        "✓".green(),
        format!("#{}", msg.id).dimmed(),
        audience.bold()
    );
}

/// Print broadcast history as a table.
pub fn print_history_table(history: &[BroadcastMessage]) {
    if history.is_empty() {
        println!("{}", "No broadcasts sent yet.".dimmed());
        return;
    }

    println!(
        "{:<17} {:<8} {:<40} {}",
        "Sent", "Priority", "Message", "Recipients"
    );
    println!("{}", "─".repeat(90));

    for msg in history {
        let recipients = if msg.recipients.is_empty() {
            "all".to_string()
        } else {
            msg.recipients
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        println!(
            "{:<17} {} {} {}",
            format_timestamp(&msg.timestamp),
            toned(&pad_right(msg.priority.as_str(), 8), msg.priority),
            pad_right(&truncate_visual(&msg.message, 40), 40),
            recipients.dimmed()
        );
    }

    println!();
    println!("{} broadcast(s)", history.len());
}

/// Render an RFC 3339 timestamp as local `YYYY-MM-DD HH:MM`, or verbatim if
/// it does not parse.
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("short", 10), "short");
        assert_eq!(truncate_visual("a longer message", 8), "a long..");
        let wide = truncate_visual("प्रधानमंत्री अनुसूचित जाति अभ्युदय योजना", 10);
        assert!(UnicodeWidthStr::width(wide.as_str()) <= 10);
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("info", 8), "info    ");
        assert_eq!(pad_right("warning!!", 8), "warning!!");
    }

    #[test]
    fn test_format_timestamp_falls_back() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
