use serde_json::Value;

use crate::channel::PageChannel;
use crate::error::ChannelError;
use crate::page::context::PageContext;
use crate::page::message::{Message, Response};

/// Channel to a page context living in this process.
#[derive(Debug)]
pub struct LocalChannel {
    context: Option<PageContext>,
}

impl LocalChannel {
    pub fn new(context: PageContext) -> Self {
        LocalChannel {
            context: Some(context),
        }
    }

    pub fn context(&self) -> Option<&PageContext> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut PageContext> {
        self.context.as_mut()
    }

    /// Tear the context down; later requests fail with `ContextDestroyed`.
    pub fn destroy(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.destroy();
        }
    }
}

impl PageChannel for LocalChannel {
    fn request(&mut self, message: &Message) -> Result<Value, ChannelError> {
        let context = self
            .context
            .as_mut()
            .ok_or_else(|| ChannelError::ContextDestroyed("page context was destroyed".into()))?;

        match context.handle(message) {
            Response::Ok(value) => Ok(value),
            Response::Error(error) => Err(ChannelError::Remote {
                message: message.kind.clone(),
                error,
            }),
        }
    }
}
