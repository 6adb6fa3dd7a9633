//! External collaborators of the chat gateway
//!
//! - `session`: who is calling
//! - `store`: where conversations are kept
//! - `completion`: the language model

pub mod completion;
pub mod session;
pub mod store;

pub use completion::{
    CompletionError, CompletionRequest, CompletionService, HttpCompletionClient,
};
pub use session::{Session, SessionProvider, StaticTokenSessions};
pub use store::{ChatStore, InMemoryChatStore, StoreError, StoredChat};
