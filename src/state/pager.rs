/// Scroll pager: accumulates pages of images and guards the fetch slot
///
/// The pager never performs I/O itself. `request_next_page` hands out a
/// `FetchTicket` for the page to load, the caller runs the fetch however it
/// likes, and `complete` applies the result. Only one ticket is ever live, so
/// at most one fetch is in flight and results are applied in page order.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use super::data::{ImageItem, PagerState};
use crate::error::FetchError;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Token for the single in-flight fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Which mount of the gallery issued this ticket
    pub session: u64,
    /// Page to fetch
    pub page: u32,
    /// Request counter within the session
    pub seq: u64,
}

/// A fetch that ended in an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub page: u32,
    pub error: FetchError,
}

/// Where the pager is in its fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching(FetchTicket),
    Failed(FetchFailure),
    /// The owning widget was unmounted
    TornDown,
}

/// Outcome of handing a fetch result back to the pager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Items were appended and the cursor advanced
    Applied { added: usize },
    /// The fetch failed and the pager is now in `Failed`
    Failed,
    /// Stale ticket or torn-down pager, nothing changed
    Ignored,
}

#[derive(Debug)]
pub struct ScrollPager {
    items: Vec<ImageItem>,
    page: u32,
    phase: FetchPhase,
    session: u64,
    next_seq: u64,
}

impl ScrollPager {
    /// Create an empty pager for a fresh mount
    pub fn new() -> Self {
        Self::with_session(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn with_session(session: u64) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            phase: FetchPhase::Idle,
            session,
            next_seq: 0,
        }
    }

    pub fn items(&self) -> &[ImageItem] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn phase(&self) -> &FetchPhase {
        &self.phase
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, FetchPhase::Fetching(_))
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.phase {
            FetchPhase::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// View for the render surface
    pub fn state(&self) -> PagerState<'_> {
        PagerState {
            items: &self.items,
            page: self.page,
            loading: self.is_loading(),
            failure: self.failure(),
        }
    }

    /// Claim the fetch slot for the current page.
    ///
    /// Returns `None` unless the pager is idle: while a fetch is in flight,
    /// after a failure, and after teardown this is a no-op.
    pub fn request_next_page(&mut self) -> Option<FetchTicket> {
        match self.phase {
            FetchPhase::Idle => Some(self.issue_ticket()),
            FetchPhase::Fetching(ticket) => {
                debug!(page = ticket.page, "fetch already in flight, ignoring request");
                None
            }
            FetchPhase::Failed(_) | FetchPhase::TornDown => None,
        }
    }

    /// Re-request the page that failed, if its error was retryable
    pub fn retry(&mut self) -> Option<FetchTicket> {
        match &self.phase {
            FetchPhase::Failed(failure) if failure.error.is_retryable() => {
                info!(page = failure.page, "retrying failed page");
                Some(self.issue_ticket())
            }
            _ => None,
        }
    }

    /// Apply the result of the fetch identified by `ticket`
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<ImageItem>, FetchError>,
    ) -> Completion {
        if self.phase != FetchPhase::Fetching(ticket) {
            debug!(
                session = ticket.session,
                page = ticket.page,
                seq = ticket.seq,
                "ignoring completion that does not match the in-flight fetch"
            );
            return Completion::Ignored;
        }

        match result {
            Ok(batch) => {
                let added = batch.len();
                self.items.extend(batch);
                self.page += 1;
                self.phase = FetchPhase::Idle;
                info!(
                    page = ticket.page,
                    added,
                    total = self.items.len(),
                    "appended page"
                );
                Completion::Applied { added }
            }
            Err(error) => {
                warn!(page = ticket.page, %error, "page fetch failed");
                self.phase = FetchPhase::Failed(FetchFailure {
                    page: ticket.page,
                    error,
                });
                Completion::Failed
            }
        }
    }

    /// Stop accepting requests and completions for good
    pub fn teardown(&mut self) {
        if self.is_loading() {
            debug!(session = self.session, "tearing down with a fetch still pending");
        }
        self.phase = FetchPhase::TornDown;
    }

    fn issue_ticket(&mut self) -> FetchTicket {
        let ticket = FetchTicket {
            session: self.session,
            page: self.page,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.phase = FetchPhase::Fetching(ticket);
        debug!(page = ticket.page, seq = ticket.seq, "issued fetch ticket");
        ticket
    }
}

impl Default for ScrollPager {
    fn default() -> Self {
        Self::new()
    }
}
