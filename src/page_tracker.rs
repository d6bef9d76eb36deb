//! Current-page tracking
//!
//! One authoritative `current_page`, reconciled from three signal
//! sources: an externally controlled target ("go to page N"), viewport
//! intersection during free scroll, and prev/next navigation. The
//! tracker is a plain state machine: commands go in, effects come out,
//! and the owner performs the effects (scrolling, clearing the pending
//! selection, running the text-availability check).

use log::debug;

/// Identifier matching an in-flight text-availability check to its
/// resolution. Stale resolutions are dropped by id, not cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// How much of a page intersects the scrollable viewport right now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageObservation {
    /// 1-based page number.
    pub page_number: u32,
    /// Fraction of the page's rendered height visible, in `[0, 1]`.
    pub visible_fraction: f32,
}

/// Commands that drive the tracker.
#[derive(Clone, Debug)]
pub enum Command {
    /// Document (re)loaded: set the page count, reset to page 1.
    SetPageCount(u32),
    /// Externally controlled target: "go to page N".
    GoToPage(u32),
    /// Internal navigation.
    NextPage,
    PrevPage,
    /// Per-page visibility fractions from the current scroll position.
    Observe(Vec<PageObservation>),
    /// A programmatic scroll issued earlier has settled.
    ScrollSettled,
    /// Outcome of a text-availability check. `has_text == None` means
    /// the check itself failed.
    TextCheckResolved {
        page_number: u32,
        request: RequestId,
        has_text: Option<bool>,
    },
}

/// Effects the owner must perform after applying a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Scroll the viewport so the page sits at the top.
    ScrollToPage(u32),
    /// The authoritative current page changed.
    PageChanged(u32),
    /// Any pending selection is no longer valid.
    ClearPendingSelection,
    /// Run a text-availability check for the page and feed the result
    /// back through `Command::TextCheckResolved`.
    CheckPageText { page_number: u32, request: RequestId },
}

/// Threshold a page's visible fraction must cross to take over as
/// current page. Strict: a tie at exactly 0.5 leaves the incumbent.
const TAKEOVER_FRACTION: f32 = 0.5;

#[derive(Debug)]
pub struct PageTracker {
    current_page: u32,
    page_count: u32,
    /// Set while a programmatic scroll is in flight; viewport
    /// observations are ignored until `ScrollSettled` so the scroll
    /// cannot feed back a spurious page change.
    pending_programmatic_target: Option<u32>,
    text_available: bool,
    in_flight_check: Option<(u32, RequestId)>,
    next_request: u64,
}

impl Default for PageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            pending_programmatic_target: None,
            text_available: false,
            in_flight_check: None,
            next_request: 0,
        }
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether the current page has extractable text. False while a
    /// check is in flight or after a failed check: selection-based
    /// actions stay disabled until text is positively confirmed.
    #[must_use]
    pub fn text_available(&self) -> bool {
        self.text_available
    }

    #[must_use]
    pub fn text_check_in_flight(&self) -> bool {
        self.in_flight_check.is_some()
    }

    /// Apply a command and return the effects the owner must perform.
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetPageCount(count) => {
                self.page_count = count;
                self.current_page = 1;
                self.pending_programmatic_target = None;
                if count == 0 {
                    self.text_available = false;
                    self.in_flight_check = None;
                    return vec![];
                }
                self.page_entered(1, false)
            }

            Command::GoToPage(page) => self.navigate_to(page),

            Command::NextPage => self.navigate_to(self.current_page.saturating_add(1)),

            Command::PrevPage => self.navigate_to(self.current_page.saturating_sub(1)),

            Command::Observe(observations) => {
                if self.pending_programmatic_target.is_some() {
                    // Mid programmatic scroll; intersection data is an
                    // echo of our own scrolling.
                    return vec![];
                }
                match self.takeover_candidate(&observations) {
                    Some(page) => self.page_entered(page, false),
                    None => vec![],
                }
            }

            Command::ScrollSettled => {
                let Some(target) = self.pending_programmatic_target.take() else {
                    return vec![];
                };
                if target == self.current_page {
                    vec![]
                } else {
                    self.page_entered(target, false)
                }
            }

            Command::TextCheckResolved {
                page_number,
                request,
                has_text,
            } => {
                match self.in_flight_check {
                    Some((page, id)) if page == page_number && id == request => {}
                    _ => {
                        debug!(
                            "dropping stale text check for page {page_number} (request {})",
                            request.0
                        );
                        return vec![];
                    }
                }
                if page_number != self.current_page {
                    // Page moved on while the check ran.
                    self.in_flight_check = None;
                    return vec![];
                }
                self.in_flight_check = None;
                // A failed check reads as "no text": fail closed.
                self.text_available = has_text.unwrap_or(false);
                vec![]
            }
        }
    }

    fn navigate_to(&mut self, page: u32) -> Vec<Effect> {
        if self.page_count == 0 {
            return vec![];
        }
        let clamped = page.clamp(1, self.page_count);
        if clamped == self.current_page && self.pending_programmatic_target.is_none() {
            return vec![];
        }
        self.pending_programmatic_target = Some(clamped);
        self.page_entered(clamped, true)
    }

    /// Among the observed pages, the one that should take over as
    /// current. Hysteresis: only a *different* page strictly above the
    /// threshold displaces the incumbent; the incumbent dropping below
    /// the threshold on its own changes nothing.
    fn takeover_candidate(&self, observations: &[PageObservation]) -> Option<u32> {
        observations
            .iter()
            .filter(|obs| {
                obs.page_number != self.current_page
                    && obs.page_number >= 1
                    && obs.page_number <= self.page_count
                    && obs.visible_fraction > TAKEOVER_FRACTION
            })
            .max_by(|a, b| a.visible_fraction.total_cmp(&b.visible_fraction))
            .map(|obs| obs.page_number)
    }

    fn page_entered(&mut self, page: u32, scroll: bool) -> Vec<Effect> {
        debug!("current page -> {page} (scroll: {scroll})");
        self.current_page = page;
        self.text_available = false;

        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.in_flight_check = Some((page, request));

        let mut effects = Vec::with_capacity(4);
        if scroll {
            effects.push(Effect::ScrollToPage(page));
        }
        effects.push(Effect::PageChanged(page));
        effects.push(Effect::ClearPendingSelection);
        effects.push(Effect::CheckPageText {
            page_number: page,
            request,
        });
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with_pages(count: u32) -> (PageTracker, RequestId) {
        let mut tracker = PageTracker::new();
        let effects = tracker.apply(Command::SetPageCount(count));
        let request = expect_check(&effects, 1);
        (tracker, request)
    }

    fn expect_check(effects: &[Effect], page: u32) -> RequestId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::CheckPageText {
                    page_number,
                    request,
                } if *page_number == page => Some(*request),
                _ => None,
            })
            .expect("expected a CheckPageText effect")
    }

    fn confirm_text(tracker: &mut PageTracker, page: u32, request: RequestId) {
        let effects = tracker.apply(Command::TextCheckResolved {
            page_number: page,
            request,
            has_text: Some(true),
        });
        assert!(effects.is_empty());
    }

    fn observe(pages: &[(u32, f32)]) -> Command {
        Command::Observe(
            pages
                .iter()
                .map(|&(page_number, visible_fraction)| PageObservation {
                    page_number,
                    visible_fraction,
                })
                .collect(),
        )
    }

    #[test]
    fn scroll_crossing_switches_current_page_once() {
        let (mut tracker, request) = tracker_with_pages(10);
        confirm_text(&mut tracker, 1, request);

        // Spec scenario: [0.6, 0.4] then [0.3, 0.7].
        let effects = tracker.apply(observe(&[(1, 0.6), (2, 0.4)]));
        assert!(effects.is_empty());
        assert_eq!(tracker.current_page(), 1);

        let effects = tracker.apply(observe(&[(1, 0.3), (2, 0.7)]));
        assert!(effects.contains(&Effect::PageChanged(2)));
        assert!(effects.contains(&Effect::ClearPendingSelection));
        assert_eq!(tracker.current_page(), 2);

        // Same observation again: no second switch.
        let effects = tracker.apply(observe(&[(1, 0.3), (2, 0.7)]));
        assert!(effects.is_empty());
    }

    #[test]
    fn near_half_visibility_does_not_flicker() {
        let (mut tracker, _) = tracker_with_pages(10);

        for _ in 0..5 {
            assert!(tracker.apply(observe(&[(1, 0.5), (2, 0.5)])).is_empty());
            assert!(tracker.apply(observe(&[(1, 0.49), (2, 0.5)])).is_empty());
        }
        assert_eq!(tracker.current_page(), 1);
    }

    #[test]
    fn go_to_page_scrolls_and_suppresses_observations() {
        let (mut tracker, _) = tracker_with_pages(10);

        let effects = tracker.apply(Command::GoToPage(5));
        assert_eq!(effects[0], Effect::ScrollToPage(5));
        assert!(effects.contains(&Effect::PageChanged(5)));
        assert_eq!(tracker.current_page(), 5);

        // Intersection events fired by our own scroll are ignored.
        let effects = tracker.apply(observe(&[(3, 0.9)]));
        assert!(effects.is_empty());
        assert_eq!(tracker.current_page(), 5);

        assert!(tracker.apply(Command::ScrollSettled).is_empty());

        // After settling, observations count again.
        let effects = tracker.apply(observe(&[(6, 0.8)]));
        assert!(effects.contains(&Effect::PageChanged(6)));
    }

    #[test]
    fn go_to_page_clamps_to_document_bounds() {
        let (mut tracker, _) = tracker_with_pages(10);

        let effects = tracker.apply(Command::GoToPage(999));
        assert!(effects.contains(&Effect::PageChanged(10)));

        let effects = tracker.apply(Command::PrevPage);
        assert!(effects.contains(&Effect::PageChanged(9)));
    }

    #[test]
    fn next_page_at_end_is_a_no_op() {
        let (mut tracker, _) = tracker_with_pages(2);
        let _ = tracker.apply(Command::GoToPage(2));
        let _ = tracker.apply(Command::ScrollSettled);

        assert!(tracker.apply(Command::NextPage).is_empty());
        assert_eq!(tracker.current_page(), 2);
    }

    #[test]
    fn stale_text_check_is_dropped() {
        let (mut tracker, first_request) = tracker_with_pages(10);

        let effects = tracker.apply(Command::GoToPage(2));
        let second_request = expect_check(&effects, 2);

        // Resolution for the abandoned page-1 check arrives late.
        let effects = tracker.apply(Command::TextCheckResolved {
            page_number: 1,
            request: first_request,
            has_text: Some(true),
        });
        assert!(effects.is_empty());
        assert!(!tracker.text_available());
        assert!(tracker.text_check_in_flight());

        confirm_text(&mut tracker, 2, second_request);
        assert!(tracker.text_available());
        assert!(!tracker.text_check_in_flight());
    }

    #[test]
    fn failed_text_check_fails_closed() {
        let (mut tracker, request) = tracker_with_pages(3);

        let _ = tracker.apply(Command::TextCheckResolved {
            page_number: 1,
            request,
            has_text: None,
        });
        assert!(!tracker.text_available());
        assert!(!tracker.text_check_in_flight());
    }

    #[test]
    fn image_only_page_reports_no_text() {
        let (mut tracker, request) = tracker_with_pages(3);

        let _ = tracker.apply(Command::TextCheckResolved {
            page_number: 1,
            request,
            has_text: Some(false),
        });
        assert!(!tracker.text_available());
    }

    #[test]
    fn empty_document_emits_nothing() {
        let mut tracker = PageTracker::new();
        assert!(tracker.apply(Command::SetPageCount(0)).is_empty());
        assert!(tracker.apply(Command::GoToPage(3)).is_empty());
        assert!(!tracker.text_available());
    }

    #[test]
    fn every_page_change_requests_a_fresh_check() {
        let (mut tracker, first) = tracker_with_pages(10);

        let effects = tracker.apply(Command::GoToPage(2));
        let second = expect_check(&effects, 2);
        assert_ne!(first, second);

        let _ = tracker.apply(Command::ScrollSettled);
        let effects = tracker.apply(observe(&[(3, 0.9)]));
        let third = expect_check(&effects, 3);
        assert_ne!(second, third);
    }
}
