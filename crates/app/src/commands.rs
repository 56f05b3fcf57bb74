//! Terminal input parsing
//!
//! Lines starting with `/` are commands; anything else is typed into the
//! message box as-is (including the `+` readiness token).

use colloquy_core::Vote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    /// Plain text for the message box
    Say(String),
    Vote { message_id: String, vote: Vote },
    Score { peer: String, criterion: String, value: u8 },
    Submit,
    Status,
    Help,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCommand {
    Topic(u32),
    Subtopic(u32),
    Help,
    Quit,
}

pub const ROOM_HELP: &str = "\
  <text>                         send a message (+ to signal readiness)
  /up <id> | /down <id> | /unvote <id>
  /score <peer> <criterion> <1-5>
  /submit                        submit ratings
  /status                        phase, timer and rating progress
  /leave";

pub const DIRECTORY_HELP: &str = "\
  topic <id>       filter by topic (0 = any)
  subtopic <id>    filter by subtopic of the current topic (0 = any)
  quit";

pub fn parse_room_command(line: &str) -> Result<RoomCommand, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(RoomCommand::Say(line.to_string()));
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        ["up", id] => Ok(vote(id, Vote::Like)),
        ["down", id] => Ok(vote(id, Vote::Dislike)),
        ["unvote", id] => Ok(vote(id, Vote::Clear)),
        ["score", peer, criterion, value] => {
            let value = value
                .parse::<u8>()
                .map_err(|_| format!("score must be a number, got '{}'", value))?;
            Ok(RoomCommand::Score {
                peer: peer.to_string(),
                criterion: criterion.to_string(),
                value,
            })
        }
        ["submit"] => Ok(RoomCommand::Submit),
        ["status"] => Ok(RoomCommand::Status),
        ["help"] => Ok(RoomCommand::Help),
        ["leave"] | ["quit"] => Ok(RoomCommand::Leave),
        _ => Err(format!("unknown command '{}', try /help", trimmed)),
    }
}

fn vote(id: &str, vote: Vote) -> RoomCommand {
    RoomCommand::Vote {
        message_id: id.to_string(),
        vote,
    }
}

pub fn parse_directory_command(line: &str) -> Result<DirectoryCommand, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let id = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| format!("expected a numeric id, got '{}'", s))
    };

    match parts.as_slice() {
        ["topic", n] => Ok(DirectoryCommand::Topic(id(n)?)),
        ["subtopic", n] => Ok(DirectoryCommand::Subtopic(id(n)?)),
        ["help"] => Ok(DirectoryCommand::Help),
        ["quit"] | ["q"] => Ok(DirectoryCommand::Quit),
        _ => Err(format!("unknown command '{}', try help", line.trim())),
    }
}
