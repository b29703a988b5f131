use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::{
    cli::{Cli, Command},
    domain::{
        day_groups,
        message::{Direction, Message},
        message_store::{MergeMode, MessageStore},
        search::{self, SearchHit},
    },
    infra::{self, storage_layout::StorageLayout},
    usecases::{
        context::AppContext,
        contracts::{CacheError, MessageCache},
    },
};

pub fn run(cli: Cli) -> Result<()> {
    let config = infra::config::load(cli.config.as_deref())?;
    infra::logging::init(&config.logging)?;

    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;
    let cache = infra::cache::SqliteCache::open(&layout.cache_db_file())?;
    let context = AppContext::new(config, cache);

    match cli.command {
        Command::Show { chat } => show_chat(&context, &chat),
        Command::Search { chat, query } => search_chat(&context, &chat, &query),
    }
}

fn show_chat(context: &AppContext, chat_key: &str) -> Result<()> {
    let store = load_store(context, chat_key)?;
    if store.is_empty() {
        println!("No cached messages for {chat_key}.");
        return Ok(());
    }

    let window = tail(store.messages(), context.config.history.page_size);
    for group in day_groups::group_by_day(window, Local::now().date_naive()) {
        println!("--- {} ---", group.label);
        for message in group.messages {
            println!("{}", message_line(message));
        }
    }

    Ok(())
}

fn search_chat(context: &AppContext, chat_key: &str, query: &str) -> Result<()> {
    let store = load_store(context, chat_key)?;
    let hits = search::search(
        store.messages(),
        query,
        chat_key,
        &context.config.profile.display_name,
        Local::now().date_naive(),
    );

    if hits.is_empty() {
        println!("No matches for \"{}\".", query.trim());
        return Ok(());
    }

    for hit in &hits {
        println!("{}", hit_line(hit));
    }

    Ok(())
}

/// Reads the chat from the cache into a store, which dedupes by identity
/// and restores ascending timestamp order.
fn load_store(context: &AppContext, chat_key: &str) -> Result<MessageStore> {
    let messages = context
        .cache
        .messages_for(chat_key)
        .map_err(|CacheError(reason)| anyhow::anyhow!("cache read failed: {reason}"))?;

    let mut store = MessageStore::new();
    store.upsert_many(messages, MergeMode::Replace);
    Ok(store)
}

/// Newest `limit` messages, the window the initial page would cover.
fn tail(messages: &[Message], limit: usize) -> &[Message] {
    let start = messages.len().saturating_sub(limit);
    &messages[start..]
}

fn message_line(message: &Message) -> String {
    let marker = match message.direction {
        Direction::Incoming => "<-",
        Direction::Outgoing => "->",
    };
    let body = if message.body.is_empty() {
        format!("[{}]", message.display_kind().as_label())
    } else {
        message.body.clone()
    };

    let mut line = format!("{} {marker} {body}", time_label(message.timestamp_ms));
    if let Some(status) = message.status {
        line.push_str(&format!(" [{}]", status.as_label()));
    }
    if let Some(reason) = &message.failure_reason {
        line.push_str(&format!(" ({reason})"));
    }
    line
}

fn hit_line(hit: &SearchHit) -> String {
    let when = if hit.day_label.is_empty() {
        hit.time_label.clone()
    } else {
        format!("{} {}", hit.day_label, hit.time_label)
    };
    format!("{when} {}: {}", hit.direction_label, hit.snippet)
}

fn time_label(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::domain::message::{DeliveryStatus, MediaKind, MessageContent};

    fn local_ms(hour: u32, minute: u32) -> i64 {
        Local::now()
            .date_naive()
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
            .and_local_timezone(Local)
            .earliest()
            .expect("valid local datetime")
            .timestamp_millis()
    }

    fn message(body: &str, direction: Direction) -> Message {
        Message {
            identity: "m-1".to_owned(),
            direction,
            status: None,
            failure_reason: None,
            timestamp_ms: local_ms(12, 34),
            body: body.to_owned(),
            content: MessageContent::Text,
            sent_by: None,
            read_by: None,
        }
    }

    #[test]
    fn tail_keeps_the_newest_messages() {
        let messages: Vec<Message> = (0..5)
            .map(|i| {
                let mut m = message(&format!("n{i}"), Direction::Incoming);
                m.identity = format!("m-{i}");
                m
            })
            .collect();

        let window = tail(&messages, 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].identity, "m-3");

        assert_eq!(tail(&messages, 10).len(), 5);
    }

    #[test]
    fn message_line_shows_time_direction_and_body() {
        let line = message_line(&message("hello there", Direction::Incoming));

        assert_eq!(line, "12:34 <- hello there");
    }

    #[test]
    fn outgoing_line_appends_status_and_failure_reason() {
        let mut msg = message("offer", Direction::Outgoing);
        msg.status = Some(DeliveryStatus::Failed);
        msg.failure_reason = Some("timed out".to_owned());

        assert_eq!(message_line(&msg), "12:34 -> offer [failed] (timed out)");
    }

    #[test]
    fn bodyless_media_falls_back_to_kind_label() {
        let mut msg = message("", Direction::Incoming);
        msg.content = MessageContent::Media {
            kind: MediaKind::Image,
            url: "https://cdn/1.jpg".to_owned(),
            name: "beach.jpg".to_owned(),
        };

        assert_eq!(message_line(&msg), "12:34 <- [image]");
    }

    #[test]
    fn hit_line_omits_empty_day_label() {
        let hit = SearchHit {
            identity: "m-1".to_owned(),
            snippet: "needle".to_owned(),
            time_label: "09:15".to_owned(),
            day_label: String::new(),
            direction_label: "You".to_owned(),
        };

        assert_eq!(hit_line(&hit), "09:15 You: needle");
    }

    #[test]
    fn hit_line_prefixes_day_label_when_present() {
        let hit = SearchHit {
            identity: "m-1".to_owned(),
            snippet: "needle".to_owned(),
            time_label: "09:15".to_owned(),
            day_label: "Yesterday".to_owned(),
            direction_label: "Alice".to_owned(),
        };

        assert_eq!(hit_line(&hit), "Yesterday 09:15 Alice: needle");
    }
}
