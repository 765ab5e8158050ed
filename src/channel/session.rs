use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::Value;
use tracing::{debug, info};

use crate::channel::PageChannel;
use crate::channel::server::{QUIT, Reply};
use crate::error::ChannelError;
use crate::page::message::Message;

/// A page context running in a child process.
///
/// The child speaks the `serve` protocol: one JSON message per line on its
/// stdin, one reply per line on its stdout, and a ready line first.
pub struct ProcessChannel {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl ProcessChannel {
    /// Spawn `program` with `args` and wait for its ready signal.
    pub fn launch(program: &str, args: &[&str]) -> Result<Self, ChannelError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ChannelError::ContextDestroyed(format!("failed to capture stdin of {}", program))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ChannelError::ContextDestroyed(format!("failed to capture stdout of {}", program))
        })?;

        let mut channel = ProcessChannel {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let ready = channel.read_reply("ready signal")?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(ChannelError::Remote {
                message: "launch".into(),
                error: ready
                    .error
                    .unwrap_or_else(|| format!("{} did not send a ready signal", program)),
            });
        }

        info!(program, "Page context process ready");
        Ok(channel)
    }

    fn send(&mut self, message: &Message) -> Result<Reply, ChannelError> {
        if self.closed {
            return Err(ChannelError::ContextDestroyed("channel already closed".into()));
        }

        let json = serde_json::to_string(message).map_err(|source| ChannelError::Json {
            context: format!("{} request", message.kind),
            source,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| match e.kind() {
                ErrorKind::BrokenPipe => ChannelError::ContextDestroyed(
                    "page context process closed its input".into(),
                ),
                _ => ChannelError::Io(e),
            })?;

        self.read_reply(&message.kind)
    }

    fn read_reply(&mut self, context: &str) -> Result<Reply, ChannelError> {
        let mut line = String::new();
        self.reader.read_line(&mut line)?;

        if line.trim().is_empty() {
            self.closed = true;
            return Err(ChannelError::ContextDestroyed(format!(
                "no reply to {} (process may have exited)",
                context
            )));
        }

        serde_json::from_str(line.trim()).map_err(|source| ChannelError::Json {
            context: format!("{} reply", context),
            source,
        })
    }

    /// Ask the child to stop and wait for it. Safe to call more than once.
    pub fn quit(&mut self) -> Result<(), ChannelError> {
        if !self.closed {
            // The child may already be gone.
            let _ = self.send(&Message::bare(QUIT));
            self.closed = true;
        }
        self.child.wait()?;
        debug!("Page context process exited");
        Ok(())
    }
}

impl PageChannel for ProcessChannel {
    fn request(&mut self, message: &Message) -> Result<Value, ChannelError> {
        let reply = self.send(message)?;
        if !reply.ok {
            return Err(ChannelError::Remote {
                message: message.kind.clone(),
                error: reply.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(reply.data.unwrap_or(Value::Null))
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
