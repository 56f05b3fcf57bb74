//! Room directory watcher

use colloquy_core::{ClientFrame, DirectoryFeed};
use colloquy_net::{ChannelEvent, DirectoryClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::commands::{parse_directory_command, DirectoryCommand, DIRECTORY_HELP};
use crate::error::AppError;
use crate::render;

fn print_rooms(feed: &DirectoryFeed, joinable_only: bool) {
    let filter = feed.filter();
    println!(
        "-- rooms (topic {}, subtopic {}) --",
        filter.topic_id, filter.subtopic_id
    );
    let rooms: Vec<_> = if joinable_only {
        feed.joinable().collect()
    } else {
        feed.rooms().iter().collect()
    };
    for room in &rooms {
        println!("{}", render::room(room));
    }
    if rooms.is_empty() {
        println!("(no rooms)");
    }
}

async fn push(client: &DirectoryClient, frame: Option<ClientFrame>) {
    if let Some(frame) = frame {
        if let Err(e) = client.push_filter(&frame).await {
            warn!(error = %e, "Failed to push filter");
        }
    }
}

/// Watch the live room list until the user quits or the channel closes
pub async fn run(
    mut client: DirectoryClient,
    topic_id: u32,
    subtopic_id: u32,
    joinable_only: bool,
) -> Result<(), AppError> {
    let mut feed = DirectoryFeed::new();
    // Applied locally now, pushed once the channel opens
    feed.set_topic(topic_id);
    feed.set_subtopic(subtopic_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = client.next_event() => match event {
                Some(ChannelEvent::Opened) => {
                    let frame = feed.on_open();
                    push(&client, Some(frame)).await;
                }
                Some(ChannelEvent::Frame(text)) => match feed.apply_snapshot(&text) {
                    Ok(_) => print_rooms(&feed, joinable_only),
                    Err(e) => warn!(error = %e, "Ignoring room snapshot"),
                },
                Some(ChannelEvent::Closed(reason)) => {
                    feed.on_close();
                    println!("Room list closed: {}", reason);
                    return Ok(());
                }
                None => {
                    feed.on_close();
                    return Ok(());
                }
            },

            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_directory_command(&line) {
                    Ok(DirectoryCommand::Topic(id)) => push(&client, feed.set_topic(id)).await,
                    Ok(DirectoryCommand::Subtopic(id)) => push(&client, feed.set_subtopic(id)).await,
                    Ok(DirectoryCommand::Help) => println!("{}", DIRECTORY_HELP),
                    Ok(DirectoryCommand::Quit) => {
                        client.close().await;
                        feed.on_close();
                        return Ok(());
                    }
                    Err(message) => println!("{}", message),
                },
                None => {
                    debug!("Stdin closed");
                    stdin_open = false;
                }
            },
        }
    }
}
