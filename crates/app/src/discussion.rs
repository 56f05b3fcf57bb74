//! Discussion room driver
//!
//! Pumps three sources into one [`Session`]: channel events, lines typed on
//! stdin, and the outcome of a rating submission running on its own task.
//! Everything the session appends to its log is echoed to stdout.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use colloquy_core::{
    ClientFrame, Phase, ServerFrame, Session, SessionContext, SubmissionError, TransportError,
    READY_TOKEN,
};
use colloquy_net::{ChannelEvent, DiscussionClient, RatingSubmitter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::{parse_room_command, RoomCommand, ROOM_HELP};
use crate::error::AppError;
use crate::render;

/// How much of the session log is already on screen
struct Screen {
    printed: usize,
}

impl Screen {
    /// Print log entries appended since the last flush.
    ///
    /// Confirming a pending message moves it to the tail without growing the
    /// log, so it is not printed twice.
    fn flush(&mut self, session: &Session) {
        let entries = session.store().entries();
        for entry in entries.iter().skip(self.printed) {
            println!("{}", render::log_entry(entry));
        }
        self.printed = entries.len();
    }
}

fn announce_phase(session: &Session, phase: Phase) {
    match phase {
        Phase::AwaitingReady => println!("Connected. Type {} when ready.", READY_TOKEN),
        Phase::Active => println!("Discussion started."),
        Phase::Ended => println!("Discussion ended. Waiting for rating setup..."),
        Phase::RatingOpen => {
            println!("Rate the other participants with /score <peer> <criterion> <1-5>.");
            if let Some(rating) = session.rating() {
                println!("{}", render::rating_form(rating));
            }
        }
        Phase::RatingSubmitted => println!("Ratings submitted. Thank you."),
        Phase::Idle | Phase::Disconnected => {}
    }
}

fn print_status(session: &Session) {
    println!("Phase: {}", session.phase());
    if let Some(name) = session.room_name() {
        println!("Room: {}", name);
    }
    if let Some(left) = session.time_remaining() {
        println!("Time remaining: {}", render::remaining(left));
    }
    if session.store().pending_count() > 0 {
        println!("Unconfirmed messages: {}", session.store().pending_count());
    }
    if let Some(rating) = session.rating() {
        println!("{}", render::rating_form(rating));
        if let Some(err) = rating.visible_error(Instant::now()) {
            println!("Last submission failed: {}", err);
        }
    }
}

/// Run one joined room until the user leaves or the connection ends
pub async fn run<S>(
    mut client: DiscussionClient,
    context: SessionContext,
    submitter: Arc<S>,
) -> Result<(), AppError>
where
    S: RatingSubmitter + Send + Sync + 'static,
{
    let mut session = Session::new(context, Utc::now());
    let mut screen = Screen { printed: 0 };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<Result<(), SubmissionError>>(1);
    let mut stdin_open = true;

    println!("Joining room {}...", client.room_id());

    loop {
        tokio::select! {
            event = client.next_event() => {
                match event {
                    Some(ChannelEvent::Opened) => {
                        if session.on_open() {
                            announce_phase(&session, session.phase());
                        }
                    }
                    Some(ChannelEvent::Frame(text)) => on_frame(&mut session, &text),
                    Some(ChannelEvent::Closed(reason)) => {
                        session.on_transport_error(reason);
                    }
                    None => {
                        session.on_transport_error(TransportError::ConnectionClosed);
                    }
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        let keep_going = on_line(
                            &mut session,
                            &client,
                            &line,
                            &submitter,
                            &outcome_tx,
                        )
                        .await;
                        if !keep_going {
                            client.leave().await;
                            screen.flush(&session);
                            session.leave();
                            return Ok(());
                        }
                    }
                    None => {
                        debug!("Stdin closed");
                        stdin_open = false;
                    }
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                if let Err(err) = &outcome {
                    println!("Rating submission failed: {}", err);
                }
                if let Some(phase) = session.finish_rating_submission(outcome, Instant::now()) {
                    announce_phase(&session, phase);
                }
            }
        }

        screen.flush(&session);

        if session.phase() == Phase::Disconnected {
            if let Some(reason) = session.take_disconnect_notice() {
                println!("Disconnected: {}", reason);
            }
            session.leave();
            return Ok(());
        }
    }
}

fn on_frame(session: &mut Session, text: &str) {
    let frame = match ServerFrame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Dropping inbound frame");
            return;
        }
    };

    let vote = match &frame {
        ServerFrame::VoteUpdate(update) => Some(update.clone()),
        _ => None,
    };

    if let Some(phase) = session.handle_frame(frame) {
        announce_phase(session, phase);
    }

    if let Some(update) = vote {
        if session.store().get(&update.message_id).is_some() {
            println!(
                "{}",
                render::votes(&update.message_id, update.like_count, update.dislike_count)
            );
        }
    }
}

/// Handle one typed line; returns `false` when the user leaves
async fn on_line<S>(
    session: &mut Session,
    client: &DiscussionClient,
    line: &str,
    submitter: &Arc<S>,
    outcome_tx: &mpsc::Sender<Result<(), SubmissionError>>,
) -> bool
where
    S: RatingSubmitter + Send + Sync + 'static,
{
    let command = match parse_room_command(line) {
        Ok(command) => command,
        Err(message) => {
            println!("{}", message);
            return true;
        }
    };

    match command {
        RoomCommand::Say(text) => match session.submit_input(&text, Utc::now()) {
            Ok(Some(frame)) => send(client, &frame).await,
            Ok(None) => {
                if session.phase() == Phase::AwaitingReady && !text.trim().is_empty() {
                    println!("Type {} when ready.", READY_TOKEN);
                }
            }
            Err(e) => println!("{}", e),
        },
        RoomCommand::Vote { message_id, vote } => match session.vote(&message_id, vote) {
            Ok(frame) => send(client, &frame).await,
            Err(e) => println!("{}", e),
        },
        RoomCommand::Score {
            peer,
            criterion,
            value,
        } => match session.set_score(&peer, &criterion, value) {
            Ok(()) => {
                if let Some(rating) = session.rating() {
                    println!("{}", render::rating_form(rating));
                }
            }
            Err(e) => println!("{}", e),
        },
        RoomCommand::Submit => match session.begin_rating_submission() {
            Ok(submission) => {
                println!("Submitting ratings...");
                let submitter = Arc::clone(submitter);
                let outcome_tx = outcome_tx.clone();
                let username = session.context().username.clone();
                tokio::spawn(async move {
                    let outcome = submitter.submit(&username, &submission).await;
                    let _ = outcome_tx.send(outcome).await;
                });
            }
            Err(e) => println!("{}", e),
        },
        RoomCommand::Status => print_status(session),
        RoomCommand::Help => println!("{}", ROOM_HELP),
        RoomCommand::Leave => return false,
    }
    true
}

/// Send failures surface later as a `Closed` event
async fn send(client: &DiscussionClient, frame: &ClientFrame) {
    if let Err(e) = client.send(frame).await {
        warn!(error = %e, "Failed to send frame");
    }
}
