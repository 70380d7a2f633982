use crate::api::models::{Message, MessagePage};

/// The ordered set of messages currently materialized for one chat view.
///
/// Messages are kept in non-decreasing `createdAt` order: the initial page
/// replaces the whole store, older pages are spliced in front of the head,
/// and locally-authored sends go on the tail. The store owns no
/// persistence; it lives and dies with the view that created it.
pub struct MessageFeed {
    messages: Vec<Message>,
    page_size: u32,
    current_page: u32,
    has_more_older: bool,
}

impl MessageFeed {
    pub fn new(page_size: u32) -> Self {
        Self {
            messages: Vec::new(),
            page_size,
            current_page: 1,
            has_more_older: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Highest page number merged so far; page 1 is the most recent page.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more_older(&self) -> bool {
        self.has_more_older
    }

    /// Replace the store with the most recent page, sorted ascending.
    /// More history is assumed to exist when the backend reports multiple
    /// pages, or when it reported nothing but handed back a full page.
    pub fn load_initial(&mut self, page: MessagePage) {
        let MessagePage { mut items, total_pages } = page;
        items.sort_by_key(|m| m.created_at);
        self.has_more_older = total_pages.map(|t| t > 1).unwrap_or(false)
            || items.len() == self.page_size as usize;
        self.messages = items;
        self.current_page = 1;
    }

    /// Splice an older page in front of the current head, preserving the
    /// overall ascending order. An empty page signals exhaustion: it flips
    /// `has_more_older`, leaves the page counter alone and reports `false`
    /// to the caller. Calling it again with another empty page is a no-op.
    pub fn prepend_older(&mut self, page: MessagePage) -> bool {
        if page.items.is_empty() {
            self.has_more_older = false;
            return false;
        }
        let mut older = page.items;
        older.sort_by_key(|m| m.created_at);
        older.append(&mut self.messages);
        self.messages = older;
        self.current_page += 1;
        self.has_more_older = true;
        true
    }

    /// Tail-append a locally-authored message before the server has seen
    /// it. No re-sort: the tail is assumed newest.
    pub fn append_optimistic(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// Tail-append the server-confirmed echo. The optimistic entry stays
    /// where it is; the feed ends up holding both copies of the send.
    pub fn reconcile(&mut self, confirmed: Message) {
        self.messages.push(confirmed);
    }
}
