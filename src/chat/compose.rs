use std::time::Instant;

use crate::api::client::ApiClient;
use crate::api::error::Error;
use crate::api::models::{Message, MessagePage};
use crate::chat::feed::MessageFeed;
use crate::chat::pager::{ScrollAnchor, TopSentinel, Viewport};
use crate::session::Session;

/// Transport seam for the chat view. The real implementation is
/// [`MessageApi`]; tests substitute a fake so the whole feed state machine
/// runs without a network.
#[allow(async_fn_in_trait)]
pub trait MessageGateway {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<MessagePage, Error>;
    async fn send(&self, msg: &Message) -> Result<Message, Error>;
}

/// [`ApiClient`] plus the session it authenticates with, bundled so the
/// chat controller needs a single injected collaborator.
pub struct MessageApi {
    client: ApiClient,
    session: Session,
}

impl MessageApi {
    pub fn new(client: ApiClient, session: Session) -> Self {
        Self { client, session }
    }
}

impl MessageGateway for MessageApi {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<MessagePage, Error> {
        self.client.messages_page(&self.session, page, limit).await
    }

    async fn send(&self, msg: &Message) -> Result<Message, Error> {
        self.client.send_message(&self.session, msg).await
    }
}

/// Where one send currently stands. The controller is `Idle` except while
/// a send is actually in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

/// How a completed send ended up.
#[derive(Debug)]
pub enum SendOutcome {
    /// The confirmed echo was appended after the optimistic entry.
    Reconciled,
    /// The write failed; the optimistic entry stays in the feed and the
    /// error went to the log only.
    FailedSilently(Error),
}

/// What came of one scroll event at the top sentinel.
#[derive(Debug)]
pub enum OlderLoad {
    /// Guards not met, or the fetch failed (logged, feed untouched).
    NotTriggered,
    /// The backend had nothing older; `has_more_older` is now false.
    Exhausted,
    /// An older page was merged. Hand `anchor` the re-rendered content
    /// height to get the scroll offset that keeps the view steady.
    Loaded { anchor: ScrollAnchor, added: usize },
}

/// Drives one chat view: initial load, sentinel-guarded older pages, and
/// optimistic sends with reconciliation. Owns the feed exclusively; a new
/// view instance starts from an empty one.
pub struct ChatController<G: MessageGateway> {
    gateway: G,
    feed: MessageFeed,
    sentinel: TopSentinel,
    owner_id: Option<String>,
    send_state: SendState,
    scroll_to_bottom: bool,
}

impl<G: MessageGateway> ChatController<G> {
    pub fn new(gateway: G, owner_id: Option<String>, page_size: u32) -> Self {
        Self {
            gateway,
            feed: MessageFeed::new(page_size),
            sentinel: TopSentinel::new(),
            owner_id,
            send_state: SendState::Idle,
            scroll_to_bottom: false,
        }
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    /// Latched scroll-to-bottom request; consuming it resets the latch.
    /// The shell checks this once per render pass.
    pub fn take_scroll_to_bottom(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }

    /// Fetch and install the most recent page. On failure the feed keeps
    /// its last-good contents (empty, on a fresh view).
    pub async fn load_initial(&mut self) -> Result<(), Error> {
        let page = self
            .gateway
            .fetch_page(1, self.feed.page_size())
            .await
            .inspect_err(|e| log::warn!("initial message load failed: {}", e))?;
        self.feed.load_initial(page);
        self.scroll_to_bottom = true;
        Ok(())
    }

    /// Feed one scroll event through the sentinel guards and, when they
    /// all pass, load exactly one older page. A fetch failure is silent
    /// beyond the log; the feed keeps its last-good state.
    pub async fn maybe_load_older(&mut self, viewport: Viewport, now: Instant) -> OlderLoad {
        if !self.sentinel.should_load(&self.feed, &viewport, now) {
            return OlderLoad::NotTriggered;
        }
        let anchor = self.sentinel.begin(&viewport);
        let next_page = self.feed.current_page() + 1;
        match self.gateway.fetch_page(next_page, self.feed.page_size()).await {
            Ok(page) => {
                let before = self.feed.len();
                let merged = self.feed.prepend_older(page);
                self.sentinel.finish(now, merged);
                if merged {
                    OlderLoad::Loaded {
                        anchor,
                        added: self.feed.len() - before,
                    }
                } else {
                    OlderLoad::Exhausted
                }
            }
            Err(e) => {
                log::warn!("older-page load failed: {}", e);
                self.sentinel.finish(now, false);
                OlderLoad::NotTriggered
            }
        }
    }

    /// Optimistic send: append locally, dispatch, reconcile the confirmed
    /// echo. An all-whitespace body is rejected before anything mutates.
    /// A failed write keeps the optimistic entry — no rollback, no retry;
    /// the error lands in the log and in the returned outcome.
    pub async fn send(&mut self, body: &str) -> Result<SendOutcome, Error> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("message body is empty"));
        }

        self.send_state = SendState::Sending;
        let optimistic = Message::optimistic(self.owner_id.clone(), trimmed);
        self.feed.append_optimistic(optimistic.clone());
        self.scroll_to_bottom = true;

        let outcome = match self.gateway.send(&optimistic).await {
            Ok(confirmed) => {
                self.feed.reconcile(confirmed);
                self.scroll_to_bottom = true;
                SendOutcome::Reconciled
            }
            Err(e) => {
                log::error!("send failed, optimistic message kept: {}", e);
                SendOutcome::FailedSilently(e)
            }
        };
        self.send_state = SendState::Idle;
        Ok(outcome)
    }
}
