//! Line-oriented console adapter.
//!
//! Every non-blank input line is heard with the configured `user` and
//! `room` fields. Output events are written one per line, with severity
//! events labelled:
//!
//! ```text
//! say / reply   hello
//! error         [error] something broke
//! warn          [warn] careful
//! success       [ok] done
//! topic         [topic] today's topic
//! ```
//!
//! Output events that carry a different `room` are ignored.

use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_core::{Context, EventKind, Robot, SubscriptionId, fields};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Adapter;
use crate::config::ConsoleConfig;
use crate::error::{AdapterError, AdapterResult};

type BoxedReader = Box<dyn AsyncBufRead + Send + Unpin>;
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Output events and the label written before their text.
const OUTPUT_EVENTS: [(EventKind, Option<&str>); 6] = [
    (EventKind::Say, None),
    (EventKind::Reply, None),
    (EventKind::Error, Some("[error]")),
    (EventKind::Warn, Some("[warn]")),
    (EventKind::Success, Some("[ok]")),
    (EventKind::Topic, Some("[topic]")),
];

/// Reads lines from a reader and writes robot output to a writer.
///
/// [`ConsoleAdapter::new`] uses the process's stdin and stdout, acquired on
/// `connect`. [`ConsoleAdapter::with_io`] takes any reader and writer, which
/// is what tests use.
pub struct ConsoleAdapter {
    config: ConsoleConfig,
    reader: Option<BoxedReader>,
    writer: Option<SharedWriter>,
    subscriptions: Vec<SubscriptionId>,
    connected: bool,
}

impl ConsoleAdapter {
    /// Creates a console adapter over stdin and stdout.
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            reader: None,
            writer: None,
            subscriptions: Vec::new(),
            connected: false,
        }
    }

    /// Creates a console adapter over the given reader and writer.
    pub fn with_io<R, W>(config: ConsoleConfig, reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: Write + Send + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            config,
            reader: Some(reader),
            writer: Some(Arc::new(Mutex::new(writer))),
            subscriptions: Vec::new(),
            connected: false,
        }
    }

    /// Returns the adapter's settings.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    fn writer(&mut self) -> SharedWriter {
        Arc::clone(self.writer.get_or_insert_with(|| {
            let stdout: Box<dyn Write + Send> = Box::new(io::stdout());
            Arc::new(Mutex::new(stdout))
        }))
    }

    fn prompt(&self) -> io::Result<()> {
        if let (Some(prompt), Some(writer)) = (&self.config.prompt, &self.writer) {
            let mut writer = writer.lock();
            write!(writer, "{prompt}")?;
            writer.flush()?;
        }
        Ok(())
    }
}

fn write_output(
    writer: &SharedWriter,
    room: &str,
    label: Option<&str>,
    ctx: &Context,
) -> io::Result<()> {
    if ctx.room().is_some_and(|r| r != room) {
        return Ok(());
    }
    let mut writer = writer.lock();
    match label {
        Some(label) => writeln!(writer, "{label} {}", ctx.message())?,
        None => writeln!(writer, "{}", ctx.message())?,
    }
    writer.flush()
}

#[async_trait]
impl Adapter for ConsoleAdapter {
    fn name(&self) -> &str {
        "console"
    }

    async fn connect(&mut self, robot: &Robot) -> AdapterResult<()> {
        if self.connected {
            warn!("Console adapter is already connected");
            return Ok(());
        }

        let writer = self.writer();
        if self.reader.is_none() {
            let stdin: BoxedReader = Box::new(BufReader::new(tokio::io::stdin()));
            self.reader = Some(stdin);
        }

        for (kind, label) in OUTPUT_EVENTS {
            let writer = Arc::clone(&writer);
            let room = self.config.room.clone();
            let id = robot.on_any(kind, move |ctx| write_output(&writer, &room, label, ctx));
            self.subscriptions.push(id);
        }

        self.connected = true;
        info!(
            user = %self.config.user,
            room = %self.config.room,
            "Console adapter connected"
        );
        Ok(())
    }

    async fn run(&mut self, robot: &Robot, shutdown: CancellationToken) -> AdapterResult<()> {
        if !self.connected {
            return Err(AdapterError::NotConnected(self.name().to_string()));
        }
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| AdapterError::NotConnected(self.name().to_string()))?;

        let mut line = String::new();
        let outcome = loop {
            if let Err(e) = self.prompt() {
                break Err(e.into());
            }
            line.clear();

            let read = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Console adapter cancelled");
                    break Ok(());
                }
                read = reader.read_line(&mut line) => read,
            };

            match read {
                Ok(0) => {
                    info!("Console input closed");
                    break Ok(());
                }
                Ok(_) => {
                    let text = line.trim_end_matches(['\r', '\n']);
                    if text.trim().is_empty() {
                        continue;
                    }
                    robot.hear(
                        text,
                        fields([
                            ("user", self.config.user.as_str()),
                            ("room", self.config.room.as_str()),
                        ]),
                    );
                }
                Err(e) => break Err(e.into()),
            }
        };

        self.reader = Some(reader);
        outcome
    }

    async fn disconnect(&mut self, robot: &Robot) -> AdapterResult<()> {
        for id in self.subscriptions.drain(..) {
            robot.off(id);
        }
        // The reader is kept so a reconnect resumes the same input.
        self.connected = false;

        if let Some(writer) = &self.writer {
            writer.lock().flush()?;
        }
        info!("Console adapter disconnected");
        Ok(())
    }
}
