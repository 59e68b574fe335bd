//! Core types for the WhatsApp intake service.
//!
//! Holds the normalized message model, the webhook envelope normalizer, the
//! message buffer, and the Graph API history client shared by the HTTP server
//! and the CLI.
pub mod graph;
pub mod history;
pub mod message;
pub mod normalize;
pub mod query;
pub mod store;

pub use graph::{
    DEFAULT_GRAPH_API_BASE, GraphApi, GraphError, MockGraphApi, MockReply, ReqwestGraphApi,
};
pub use history::{HistoryPage, PageCursors, parse_history};
pub use message::{NormalizedMessage, TimestampSource};
pub use normalize::{Normalized, SkipReason, SkippedFragment, normalize_webhook};
pub use query::{HistoryQuery, HistoryRequest, ValidationError};
pub use store::{InMemoryMessageStore, MessageStore, SharedMessageStore};
