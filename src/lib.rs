pub mod api;
pub mod chat;
pub mod plants;
pub mod session;
pub mod storage;
pub mod utils;

pub use api::client::ApiClient;
pub use api::error::Error;
pub use chat::{ChatController, MessageApi, MessageFeed, MessageGateway, Viewport};
pub use session::Session;
