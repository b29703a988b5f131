//! Calendar-day partitioning of a message list.
//!
//! Messages arrive sorted ascending by timestamp; groups come out in the
//! same order, one per calendar day, each with a display label.

use chrono::{Local, NaiveDate, TimeZone};

use super::message::Message;

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub label: String,
    pub messages: Vec<&'a Message>,
}

/// Label for a day separator: "Today", "Yesterday", else `DD/MM/YYYY`.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_owned()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_owned()
    } else {
        date.format("%d/%m/%Y").to_string()
    }
}

/// Label variant used by search results: empty for today.
pub fn search_day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        String::new()
    } else {
        day_label(date, today)
    }
}

/// Local calendar date of an epoch-millis timestamp.
pub fn timestamp_to_local_date(timestamp_ms: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.date_naive(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        chrono::LocalResult::None => Local::now().date_naive(),
    }
}

/// Partitions messages by calendar date, ascending, preserving in-day order.
pub fn group_by_day<'a>(messages: &'a [Message], today: NaiveDate) -> Vec<DayGroup<'a>> {
    let mut groups: Vec<DayGroup<'a>> = Vec::new();

    for message in messages {
        let date = timestamp_to_local_date(message.timestamp_ms);
        match groups.last_mut() {
            Some(group) if group.date == date => group.messages.push(message),
            _ => groups.push(DayGroup {
                date,
                label: day_label(date, today),
                messages: vec![message],
            }),
        }
    }

    groups.sort_by_key(|group| group.date);
    groups
}
