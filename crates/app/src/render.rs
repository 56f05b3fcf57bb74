//! Plain-text rendering of session and directory state

use std::fmt::Write as _;
use std::time::Duration;

use colloquy_core::{LogEntry, NoticeKind, RatingStatus, RatingWorkflow, RoomSummary};

pub fn log_entry(entry: &LogEntry) -> String {
    match entry {
        LogEntry::Chat(msg) => {
            let id = msg.server_id().unwrap_or("sending");
            format!(
                "[{}] <{}> {}  ({})",
                msg.format_timestamp(),
                msg.author_username,
                msg.body,
                id
            )
        }
        LogEntry::Notice(notice) => {
            let marker = match notice.kind {
                NoticeKind::System => "*",
                NoticeKind::DiscussionStart | NoticeKind::DiscussionEnd => "==",
                NoticeKind::Timer => "~",
                NoticeKind::UserJoined => "->",
                NoticeKind::UserLeft => "<-",
            };
            format!("{} {}", marker, notice.content)
        }
    }
}

pub fn votes(message_id: &str, like_count: u32, dislike_count: u32) -> String {
    format!("   votes on {}: +{} -{}", message_id, like_count, dislike_count)
}

pub fn remaining(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Grid of peers x criteria with `.` for unscored cells
pub fn rating_form(rating: &RatingWorkflow) -> String {
    if rating.nothing_to_rate() {
        return "Nothing to rate.".to_string();
    }

    let mut out = String::new();
    let width = rating.peers().iter().map(|p| p.len()).max().unwrap_or(0);
    let _ = writeln!(out, "{:width$}  {}", "", rating.criteria().join("  "));
    for peer in rating.peers() {
        let _ = write!(out, "{:width$}", peer);
        for criterion in rating.criteria() {
            let cell = rating
                .score(peer, criterion)
                .map(|v| v.to_string())
                .unwrap_or_else(|| ".".to_string());
            let _ = write!(out, "  {:>w$}", cell, w = criterion.len());
        }
        out.push('\n');
    }

    let status = match rating.status() {
        RatingStatus::Collecting if rating.is_complete() => "complete, /submit to send",
        RatingStatus::Collecting => "incomplete",
        RatingStatus::InFlight => "submitting...",
        RatingStatus::Submitted => "submitted",
    };
    let _ = write!(out, "Ratings {}", status);
    out
}

pub fn room(room: &RoomSummary) -> String {
    let state = if room.discussion_active {
        "in progress"
    } else if !room.open {
        "closed"
    } else if room.is_full() {
        "full"
    } else {
        "joinable"
    };
    let mut line = format!(
        "#{:<5} {:<24} {}/{}  {}",
        room.id, room.name, room.users_count, room.max_users, state
    );
    if !room.topic.description.is_empty() {
        let _ = write!(line, "  - {}", room.topic.description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{Notice, TopicMetadata};

    #[test]
    fn test_remaining_formats() {
        assert_eq!(remaining(Duration::from_secs(125)), "02:05");
        assert_eq!(remaining(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn test_notice_rendering() {
        let entry = LogEntry::Notice(Notice {
            kind: NoticeKind::UserJoined,
            content: "bob joined".into(),
        });
        assert_eq!(log_entry(&entry), "-> bob joined");
    }

    #[test]
    fn test_rating_form_marks_missing_scores() {
        let mut rating = RatingWorkflow::open(
            "alice",
            vec!["alice".into(), "bob".into()],
            vec!["logic".into()],
        );
        assert!(rating_form(&rating).contains("bob      ."));
        rating.set_score("bob", "logic", 4).unwrap();
        let form = rating_form(&rating);
        assert!(form.contains("bob      4"));
        assert!(form.ends_with("complete, /submit to send"));
    }

    #[test]
    fn test_room_state_label() {
        let summary = RoomSummary {
            id: 3,
            name: "Ethics".into(),
            open: true,
            users_count: 2,
            max_users: 2,
            discussion_active: false,
            topic: TopicMetadata::default(),
        };
        assert!(room(&summary).ends_with("2/2  full"));
    }
}
