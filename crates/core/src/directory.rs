//! Live room directory
//!
//! The directory channel is a passive feed: the client pushes its filter and
//! the server answers with the complete list of matching rooms every time
//! something changes. Each snapshot replaces the previous one wholesale.

use tracing::{debug, info};

use crate::error::ProtocolError;
use crate::models::{FilterSpec, RoomSummary, ANY};
use crate::protocol::{decode_room_snapshot, ClientFrame};

#[derive(Debug, Default)]
pub struct DirectoryFeed {
    filter: FilterSpec,
    rooms: Vec<RoomSummary>,
    open: bool,
    ended: bool,
}

impl DirectoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> FilterSpec {
        self.filter
    }

    /// Rooms from the last snapshot, in server order
    pub fn rooms(&self) -> &[RoomSummary] {
        &self.rooms
    }

    pub fn joinable(&self) -> impl Iterator<Item = &RoomSummary> {
        self.rooms.iter().filter(|r| r.is_joinable())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The connection is up; the current filter goes out first
    pub fn on_open(&mut self) -> ClientFrame {
        info!(topic = self.filter.topic_id, subtopic = self.filter.subtopic_id, "Room directory connected");
        self.open = true;
        self.ended = false;
        self.filter_frame()
    }

    /// The connection is gone; the feed stops until reopened
    pub fn on_close(&mut self) {
        info!("Room directory disconnected");
        self.open = false;
        self.ended = true;
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Change the filter.
    ///
    /// A topic change always resets the subtopic to "any", and a subtopic
    /// without a topic is meaningless. Returns the frame to push when the
    /// channel is open.
    pub fn set_filter(&mut self, topic_id: u32, subtopic_id: u32) -> Option<ClientFrame> {
        let subtopic_id = if topic_id == ANY || topic_id != self.filter.topic_id {
            ANY
        } else {
            subtopic_id
        };
        self.filter = FilterSpec {
            topic_id,
            subtopic_id,
        };
        debug!(topic = topic_id, subtopic = subtopic_id, "Room filter changed");

        self.open.then(|| self.filter_frame())
    }

    pub fn set_topic(&mut self, topic_id: u32) -> Option<ClientFrame> {
        self.set_filter(topic_id, ANY)
    }

    pub fn set_subtopic(&mut self, subtopic_id: u32) -> Option<ClientFrame> {
        self.set_filter(self.filter.topic_id, subtopic_id)
    }

    /// Replace the room list with an inbound snapshot.
    ///
    /// A malformed snapshot leaves the previous list in place.
    pub fn apply_snapshot(&mut self, raw: &str) -> Result<usize, ProtocolError> {
        let rooms = decode_room_snapshot(raw)?;
        debug!(count = rooms.len(), "Room snapshot applied");
        self.rooms = rooms;
        Ok(self.rooms.len())
    }

    fn filter_frame(&self) -> ClientFrame {
        ClientFrame::Filter {
            topic: self.filter.topic_id,
            subtopic: self.filter.subtopic_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: u64, open: bool, users: u32, max: u32, active: bool) -> String {
        format!(
            r#"{{"id":{},"name":"r{}","open":{},"users":{},"maxUsers":{},"discussionActive":{}}}"#,
            id, id, open, users, max, active
        )
    }

    #[test]
    fn test_open_pushes_any_filter() {
        let mut feed = DirectoryFeed::new();
        assert!(!feed.is_open());
        assert_eq!(feed.on_open(), ClientFrame::Filter { topic: 0, subtopic: 0 });
        assert!(feed.is_open());
    }

    #[test]
    fn test_filter_not_pushed_while_closed() {
        let mut feed = DirectoryFeed::new();
        assert_eq!(feed.set_topic(3), None);
        assert_eq!(feed.on_open(), ClientFrame::Filter { topic: 3, subtopic: 0 });
    }

    #[test]
    fn test_topic_change_resets_subtopic() {
        let mut feed = DirectoryFeed::new();
        feed.on_open();
        feed.set_topic(1);
        assert_eq!(
            feed.set_subtopic(101),
            Some(ClientFrame::Filter { topic: 1, subtopic: 101 })
        );
        assert_eq!(
            feed.set_filter(2, 101),
            Some(ClientFrame::Filter { topic: 2, subtopic: 0 })
        );
        assert_eq!(
            feed.set_filter(0, 5),
            Some(ClientFrame::Filter { topic: 0, subtopic: 0 })
        );
    }

    #[test]
    fn test_snapshot_replaces_list() {
        let mut feed = DirectoryFeed::new();
        feed.on_open();
        let first = format!("[{},{}]", room(1, true, 1, 2, false), room(2, true, 2, 2, false));
        assert_eq!(feed.apply_snapshot(&first).unwrap(), 2);

        let second = format!("[{}]", room(3, true, 0, 4, true));
        feed.apply_snapshot(&second).unwrap();
        let ids: Vec<u64> = feed.rooms().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_joinable_rooms() {
        let mut feed = DirectoryFeed::new();
        let raw = format!(
            "[{},{},{},{}]",
            room(1, true, 1, 2, false),
            room(2, true, 2, 2, false),
            room(3, false, 0, 2, false),
            room(4, true, 0, 2, true)
        );
        feed.apply_snapshot(&raw).unwrap();
        let ids: Vec<u64> = feed.joinable().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_bad_snapshot_keeps_previous() {
        let mut feed = DirectoryFeed::new();
        feed.apply_snapshot(&format!("[{}]", room(1, true, 0, 2, false)))
            .unwrap();
        assert!(feed.apply_snapshot("{\"type\":\"oops\"}").is_err());
        assert_eq!(feed.rooms().len(), 1);
    }

    #[test]
    fn test_close_ends_feed() {
        let mut feed = DirectoryFeed::new();
        feed.on_open();
        feed.on_close();
        assert!(!feed.is_open());
        assert!(feed.has_ended());
        assert_eq!(feed.set_topic(1), None);
    }
}
