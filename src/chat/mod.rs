pub mod compose;
pub mod feed;
pub mod pager;

pub use compose::{ChatController, MessageApi, MessageGateway, OlderLoad, SendOutcome, SendState};
pub use feed::MessageFeed;
pub use pager::{ScrollAnchor, TopSentinel, Viewport};
