//! # Console Printer
//!
//! The engine reports structured [`Event`]s; this actor turns them into the
//! human-readable log LAZY is known for, one colored line per event.
//!
//! It follows the usual server/client split:
//!
//! - [`ConsolePrinter`] owns the output writer and the receiver, and writes events in
//!   the order they arrive.
//! - [`ConsoleClient`] is the cheap, cloneable sending half. It implements
//!   [`EventSink`], so it can be handed straight to the engine.
//!
//! Dropping every client closes the channel; the printer then flushes and returns
//! its writer.

use async_trait::async_trait;
use lazy_arbiter::{Event, EventKind, EventSink};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const YELLOW: &str = "\x1b[33m";
const PINK: &str = "\x1b[95m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const WHITE: &str = "\x1b[37m";
const RESET: &str = "\x1b[0m";

pub const BANNER: &str = "LAZY has woken up!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// ANSI colors, one per kind of event.
    Colored,
    Plain,
}

impl Palette {
    /// `Plain` when `NO_COLOR` is set to anything non-empty.
    pub fn from_env() -> Self {
        match std::env::var_os("NO_COLOR") {
            Some(value) if !value.is_empty() => Palette::Plain,
            _ => Palette::Colored,
        }
    }

    fn paint(self, color: &str, text: String) -> String {
        match self {
            Palette::Colored => format!("{color}{text}{RESET}"),
            Palette::Plain => text,
        }
    }
}

/// Formats one event as a single line, without the trailing newline.
pub fn render(event: &Event, palette: Palette) -> String {
    let at = event.at;
    let (color, text) = match &event.kind {
        EventKind::Requested {
            user, resource, op, ..
        } => (
            YELLOW,
            format!("User {user} has made request for performing {op} on file {resource} at {at} seconds"),
        ),
        EventKind::TakenUp { user, .. } => (
            PINK,
            format!("LAZY has taken up the request of User {user} at {at} seconds"),
        ),
        EventKind::Deleted { user, resource, .. } => (
            GREEN,
            format!("LAZY has deleted file {resource} for User {user} at {at} seconds"),
        ),
        EventKind::Completed { user, .. } => (
            GREEN,
            format!("The request for User {user} was completed at {at} seconds"),
        ),
        EventKind::Declined { user, .. } => (
            WHITE,
            format!(
                "LAZY has declined the request of User {user} at {at} seconds because an invalid/deleted file was requested."
            ),
        ),
        EventKind::Cancelled { user, .. } => (
            RED,
            format!("User {user} canceled the request due to no response at {at} seconds"),
        ),
        EventKind::Idle => (
            WHITE,
            "LAZY has no more pending requests and is going back to sleep!".to_string(),
        ),
    };
    palette.paint(color, text)
}

pub struct ConsolePrinter<W> {
    receiver: mpsc::Receiver<Event>,
    out: W,
    palette: Palette,
}

impl<W: AsyncWrite + Unpin + Send> ConsolePrinter<W> {
    /// Creates the printer and its client. `buffer_size` bounds how far the engine
    /// may run ahead of the output.
    pub fn new(out: W, palette: Palette, buffer_size: usize) -> (Self, ConsoleClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let printer = Self {
            receiver,
            out,
            palette,
        };
        (printer, ConsoleClient { sender })
    }

    /// Prints the banner, then every event until all clients are dropped.
    pub async fn run(mut self) -> io::Result<W> {
        info!("Console printer started");
        let banner = self.palette.paint(WHITE, BANNER.to_string());
        self.out.write_all(format!("{banner}\n\n").as_bytes()).await?;

        let mut printed = 0usize;
        while let Some(event) = self.receiver.recv().await {
            debug!(?event, "Print");
            let mut line = render(&event, self.palette);
            line.push('\n');
            self.out.write_all(line.as_bytes()).await?;
            printed += 1;
        }

        self.out.flush().await?;
        info!(printed, "Console printer stopped");
        Ok(self.out)
    }
}

/// Sending half of the [`ConsolePrinter`].
#[derive(Clone)]
pub struct ConsoleClient {
    sender: mpsc::Sender<Event>,
}

#[async_trait]
impl EventSink for ConsoleClient {
    async fn emit(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(event = ?e.0, "Console printer is gone; event not printed");
        }
    }
}
