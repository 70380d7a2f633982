use std::time::{Duration, Instant};

use crate::chat::feed::MessageFeed;

/// Don't reach for older pages until the initial page has meaningfully
/// rendered.
pub const MIN_MATERIALIZED: usize = 15;
/// Cooldown after a successful older-page load.
pub const DEBOUNCE: Duration = Duration::from_millis(500);
/// Fraction of the scroll range, measured from the top, inside which the
/// sentinel counts as reached.
pub const TOP_PROXIMITY: f64 = 0.15;

/// What the embedding shell knows about its scrollable container at the
/// moment an event fires. Heights are in whatever unit the shell renders
/// in; only differences and ratios matter here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Offset of the visible top edge from the top of the content.
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl Viewport {
    fn scroll_range(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// True once the visible top edge sits inside the top 15% of the
    /// scroll range — not merely "sentinel visible at all", which would
    /// fire spuriously right after mount.
    pub fn near_top(&self) -> bool {
        self.scroll_top <= self.scroll_range() * TOP_PROXIMITY
    }
}

/// Captured content height from just before an older page is merged.
/// After the merge re-renders, `offset_after` yields the scroll offset
/// that puts the exact same content back under the user's eyes.
#[derive(Debug, Clone, Copy)]
pub struct ScrollAnchor {
    height_before: f64,
}

impl ScrollAnchor {
    pub fn offset_after(&self, new_content_height: f64) -> f64 {
        new_content_height - self.height_before
    }
}

/// Decides when the top sentinel may trigger an older-page load. One
/// logical load at a time per view instance; the guard is a flag, not a
/// lock, because everything runs on the shell's single event loop.
pub struct TopSentinel {
    loading: bool,
    last_loaded: Option<Instant>,
}

impl Default for TopSentinel {
    fn default() -> Self {
        Self::new()
    }
}

impl TopSentinel {
    pub fn new() -> Self {
        Self {
            loading: false,
            last_loaded: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn debounce_elapsed(&self, now: Instant) -> bool {
        self.last_loaded
            .map(|t| now.duration_since(t) >= DEBOUNCE)
            .unwrap_or(true)
    }

    /// All four guards from one scroll event: no load in flight, more
    /// history known to exist, enough messages materialized, cooldown
    /// elapsed — and the viewport actually near the top.
    pub fn should_load(&self, feed: &MessageFeed, viewport: &Viewport, now: Instant) -> bool {
        !self.loading
            && feed.has_more_older()
            && feed.len() >= MIN_MATERIALIZED
            && self.debounce_elapsed(now)
            && viewport.near_top()
    }

    /// Mark the load in flight and capture the pre-merge content height.
    pub fn begin(&mut self, viewport: &Viewport) -> ScrollAnchor {
        self.loading = true;
        ScrollAnchor {
            height_before: viewport.content_height,
        }
    }

    /// Clear the in-flight flag. Only a load that actually merged content
    /// starts the cooldown; an exhausted or failed load leaves it alone.
    pub fn finish(&mut self, now: Instant, merged: bool) {
        self.loading = false;
        if merged {
            self.last_loaded = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Message, MessagePage};

    fn feed_with(count: usize, has_more: bool) -> MessageFeed {
        // page size above `count` so only totalPages decides has_more_older
        let mut feed = MessageFeed::new(count as u32 + 1);
        let items: Vec<Message> = (0..count)
            .map(|i| {
                let mut m = Message::optimistic(Some("u1".into()), format!("m{}", i));
                m.id = Some(format!("m{}", i));
                m
            })
            .collect();
        feed.load_initial(MessagePage {
            items,
            total_pages: Some(if has_more { 5 } else { 1 }),
        });
        feed
    }

    fn top_viewport() -> Viewport {
        Viewport {
            scroll_top: 0.0,
            viewport_height: 800.0,
            content_height: 2000.0,
        }
    }

    #[test]
    fn near_top_is_biased_into_the_top_fifteen_percent() {
        // scroll range 1000 -> threshold 150
        let mut vp = Viewport {
            scroll_top: 150.0,
            viewport_height: 800.0,
            content_height: 1800.0,
        };
        assert!(vp.near_top());
        vp.scroll_top = 151.0;
        assert!(!vp.near_top());
    }

    #[test]
    fn anchor_compensates_for_prepended_height() {
        let mut sentinel = TopSentinel::new();
        let vp = Viewport {
            scroll_top: 0.0,
            viewport_height: 800.0,
            content_height: 2000.0,
        };
        let anchor = sentinel.begin(&vp);
        // five 100px items prepended
        assert_eq!(anchor.offset_after(2500.0), 500.0);
    }

    #[test]
    fn minimum_materialization_guard() {
        let sentinel = TopSentinel::new();
        let now = Instant::now();
        let short = feed_with(MIN_MATERIALIZED - 1, true);
        assert!(!sentinel.should_load(&short, &top_viewport(), now));

        let enough = feed_with(MIN_MATERIALIZED, true);
        assert!(sentinel.should_load(&enough, &top_viewport(), now));
    }

    #[test]
    fn exhausted_feed_never_triggers() {
        let sentinel = TopSentinel::new();
        let feed = feed_with(MIN_MATERIALIZED, false);
        assert!(!sentinel.should_load(&feed, &top_viewport(), Instant::now()));
    }

    #[test]
    fn debounce_swallows_the_second_trigger() {
        let mut sentinel = TopSentinel::new();
        let feed = feed_with(MIN_MATERIALIZED, true);
        let t0 = Instant::now();

        assert!(sentinel.should_load(&feed, &top_viewport(), t0));
        sentinel.begin(&top_viewport());
        sentinel.finish(t0, true);

        // a second event 400ms later is ignored, 500ms later is honored
        assert!(!sentinel.should_load(&feed, &top_viewport(), t0 + Duration::from_millis(400)));
        assert!(sentinel.should_load(&feed, &top_viewport(), t0 + Duration::from_millis(500)));
    }

    #[test]
    fn in_flight_load_blocks_reentry() {
        let mut sentinel = TopSentinel::new();
        let feed = feed_with(MIN_MATERIALIZED, true);
        let now = Instant::now();

        sentinel.begin(&top_viewport());
        assert!(sentinel.is_loading());
        assert!(!sentinel.should_load(&feed, &top_viewport(), now));

        // a failed load clears the flag without starting the cooldown
        sentinel.finish(now, false);
        assert!(sentinel.should_load(&feed, &top_viewport(), now));
    }
}
