//! Request/response boundary between the controlling side and a page context.
//!
//! Every call is a single round trip: no streaming, no partial results, no
//! cancellation and no retries. A failure fails the whole call.

pub mod local;
pub mod server;
pub mod session;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dom::PageSnapshot;
use crate::error::ChannelError;
use crate::page::message::Message;
use crate::resolve::{ExtractResult, ReplicaLayoutEntry};
use crate::screen::{ElementDescriptor, SavedConfigEntry};

pub use local::LocalChannel;
pub use server::serve;
pub use session::ProcessChannel;

pub trait PageChannel {
    /// Send one message and wait for its reply.
    fn request(&mut self, message: &Message) -> Result<Value, ChannelError>;

    fn scan_all(&mut self) -> Result<Vec<ElementDescriptor>, ChannelError> {
        decode(&Message::scan_all(), self.request(&Message::scan_all())?)
    }

    fn save_by_indexes(&mut self, indexes: &[usize]) -> Result<Vec<SavedConfigEntry>, ChannelError> {
        let message = Message::save_by_indexes(indexes);
        decode(&message, self.request(&message)?)
    }

    fn extract_by_config(
        &mut self,
        config: &[SavedConfigEntry],
    ) -> Result<Vec<ExtractResult>, ChannelError> {
        let message = Message::extract_by_config(config);
        decode(&message, self.request(&message)?)
    }

    fn generate_replica_data(
        &mut self,
        config: &[SavedConfigEntry],
    ) -> Result<Vec<ReplicaLayoutEntry>, ChannelError> {
        let message = Message::generate_replica_data(config);
        decode(&message, self.request(&message)?)
    }

    fn highlight_by_index(&mut self, index: usize) -> Result<(), ChannelError> {
        self.request(&Message::highlight_by_index(index)).map(|_| ())
    }

    fn highlight_by_config_entry(
        &mut self,
        config_index: usize,
        entry: &SavedConfigEntry,
    ) -> Result<(), ChannelError> {
        self.request(&Message::highlight_by_config_entry(config_index, entry))
            .map(|_| ())
    }

    fn clear_highlight(&mut self) -> Result<(), ChannelError> {
        self.request(&Message::clear_highlight()).map(|_| ())
    }

    fn load_page(&mut self, snapshot: &PageSnapshot) -> Result<(), ChannelError> {
        self.request(&Message::load_page(snapshot)).map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(message: &Message, value: Value) -> Result<T, ChannelError> {
    serde_json::from_value(value).map_err(|source| ChannelError::Json {
        context: format!("{} reply", message.kind),
        source,
    })
}
