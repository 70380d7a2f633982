//! Drives the chat controller end to end over a fake transport: initial
//! load, sentinel-guarded history paging with scroll anchoring, and an
//! optimistic send reconciled against the server echo.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use aarchid_client::api::error::Error;
use aarchid_client::api::models::{AuthorKind, Message, MessagePage};
use aarchid_client::chat::{ChatController, MessageGateway, OlderLoad, SendOutcome, Viewport};
use chrono::{DateTime, Utc};

const PAGE_SIZE: u32 = 15;

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn server_msg(id: &str, secs: i64) -> Message {
    Message {
        id: Some(id.into()),
        user_id: Some("u1".into()),
        sent_by: AuthorKind::Assistant,
        message_content: format!("msg {}", id),
        created_at: ts(secs),
    }
}

/// Two pages of history: page 1 holds the newest fifteen messages, page 2
/// five older ones, page 3 and up are empty.
struct FakeBackend {
    fetches: Mutex<Vec<u32>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn fetched_pages(&self) -> Vec<u32> {
        self.fetches.lock().unwrap().clone()
    }
}

impl MessageGateway for &FakeBackend {
    async fn fetch_page(&self, page: u32, _limit: u32) -> Result<MessagePage, Error> {
        self.fetches.lock().unwrap().push(page);
        let page = match page {
            1 => MessagePage {
                items: (0..15).map(|i| server_msg(&format!("n{}", i), 1_000 + i)).collect(),
                total_pages: Some(2),
            },
            2 => MessagePage {
                items: (0..5).map(|i| server_msg(&format!("o{}", i), 100 + i)).collect(),
                total_pages: Some(2),
            },
            _ => MessagePage::default(),
        };
        Ok(page)
    }

    async fn send(&self, msg: &Message) -> Result<Message, Error> {
        let mut confirmed = msg.clone();
        confirmed.id = Some("srv-1".into());
        confirmed.created_at = msg.created_at + chrono::Duration::milliseconds(40);
        Ok(confirmed)
    }
}

fn top_viewport(content_height: f64) -> Viewport {
    Viewport {
        scroll_top: 0.0,
        viewport_height: 800.0,
        content_height,
    }
}

fn assert_ascending(messages: &[Message]) {
    assert!(
        messages.windows(2).all(|w| w[0].created_at <= w[1].created_at),
        "feed lost its ascending createdAt order"
    );
}

#[tokio::test]
async fn full_feed_lifecycle() {
    let backend = FakeBackend::new();
    let mut ctl = ChatController::new(&backend, Some("u1".into()), PAGE_SIZE);

    // mount: newest page replaces the empty feed, view snaps to bottom
    ctl.load_initial().await.unwrap();
    assert_eq!(ctl.feed().len(), 15);
    assert!(ctl.feed().has_more_older());
    assert!(ctl.take_scroll_to_bottom());
    assert_ascending(ctl.feed().messages());

    // user scrolls near the top: one older page comes in, anchored
    let t0 = Instant::now();
    let anchor = match ctl.maybe_load_older(top_viewport(2000.0), t0).await {
        OlderLoad::Loaded { anchor, added } => {
            assert_eq!(added, 5);
            anchor
        }
        other => panic!("expected a merged page, got {:?}", other),
    };
    assert_eq!(ctl.feed().len(), 20);
    assert_eq!(ctl.feed().current_page(), 2);
    assert_ascending(ctl.feed().messages());
    // five 100px rows re-rendered: offset compensates exactly
    assert_eq!(anchor.offset_after(2500.0), 500.0);

    // a second event inside the cooldown is swallowed
    let t1 = t0 + Duration::from_millis(200);
    assert!(matches!(
        ctl.maybe_load_older(top_viewport(2500.0), t1).await,
        OlderLoad::NotTriggered
    ));

    // past the cooldown the empty page 3 marks exhaustion
    let t2 = t0 + Duration::from_millis(600);
    assert!(matches!(
        ctl.maybe_load_older(top_viewport(2500.0), t2).await,
        OlderLoad::Exhausted
    ));
    assert!(!ctl.feed().has_more_older());

    // once exhausted, nothing ever fetches again
    let t3 = t2 + Duration::from_secs(5);
    assert!(matches!(
        ctl.maybe_load_older(top_viewport(2500.0), t3).await,
        OlderLoad::NotTriggered
    ));
    assert_eq!(backend.fetched_pages(), vec![1, 2, 3]);

    // send: optimistic entry lands instantly, echo follows it
    let outcome = ctl.send("  water the fern  ").await.unwrap();
    assert!(matches!(outcome, SendOutcome::Reconciled));
    let msgs = ctl.feed().messages();
    assert_eq!(msgs.len(), 22);
    let tail = &msgs[msgs.len() - 2..];
    assert!(tail[0].id.is_none());
    assert_eq!(tail[0].message_content, "water the fern");
    assert_eq!(tail[1].id.as_deref(), Some("srv-1"));
    assert!(ctl.take_scroll_to_bottom());
}
