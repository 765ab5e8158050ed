use std::io::{BufRead, Write};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::page::context::PageContext;
use crate::page::message::{Message, Response};

/// Ends a serve loop without tearing down the caller's pipes.
pub const QUIT: &str = "QUIT";

/// One NDJSON line written back by the serve loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
}

impl Reply {
    pub fn ready() -> Self {
        Reply {
            ok: true,
            error: None,
            data: None,
            ready: Some(true),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Reply {
            ok: false,
            error: Some(error.into()),
            data: None,
            ready: None,
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        match response {
            Response::Ok(data) => Reply {
                ok: true,
                error: None,
                data: Some(data),
                ready: None,
            },
            Response::Error(error) => Reply::failure(error),
        }
    }
}

/// Serve a page context over line-delimited JSON until `QUIT` or end of input.
///
/// The overlay clock follows wall time: before each request it is advanced
/// by the milliseconds elapsed since the loop started.
pub fn serve<R: BufRead, W: Write>(
    context: &mut PageContext,
    reader: R,
    mut writer: W,
) -> Result<(), ChannelError> {
    let started = Instant::now();
    write_reply(&mut writer, &Reply::ready())?;
    info!("Page context ready");

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        context.advance(started.elapsed().as_millis() as u64);

        let reply = match serde_json::from_str::<Message>(line) {
            Ok(message) if message.kind == QUIT => {
                debug!("Received quit");
                write_reply(&mut writer, &Reply::from(Response::Ok(Value::Null)))?;
                break;
            }
            Ok(message) => Reply::from(context.handle(&message)),
            Err(e) => {
                warn!(error = %e, "Malformed request line");
                Reply::failure(format!("malformed request: {}", e))
            }
        };
        write_reply(&mut writer, &reply)?;
    }

    context.destroy();
    info!("Page context closed");
    Ok(())
}

fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<(), ChannelError> {
    let json = serde_json::to_string(reply).map_err(|source| ChannelError::Json {
        context: "reply".into(),
        source,
    })?;
    writeln!(writer, "{}", json)?;
    writer.flush()?;
    Ok(())
}
