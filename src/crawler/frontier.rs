//! Pagination frontier
//!
//! A FIFO work queue of page URLs shared by the pagination workers. It tracks
//! how many URLs are checked out, so "queue empty and nothing in flight" is an
//! exact termination condition: new pages are only ever discovered from pages
//! that are currently in flight.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    seen: HashSet<String>,
    in_flight: usize,
}

/// Work queue of page URLs with in-flight accounting
#[derive(Debug, Default)]
pub struct PageFrontier {
    state: Mutex<FrontierState>,
    settled: Notify,
}

impl PageFrontier {
    /// Creates a frontier seeded with the given URLs
    pub fn new<I>(seeds: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let frontier = Self::default();
        {
            let mut state = frontier.lock();
            for url in seeds {
                if state.seen.insert(url.clone()) {
                    state.queue.push_back(url);
                }
            }
        }
        frontier
    }

    /// Checks out the next URL, waiting while other workers may still produce one
    ///
    /// Returns `None` once the queue is empty and no URL is in flight.
    /// Every `Some` must be paired with exactly one [`PageFrontier::complete`].
    pub async fn next(&self) -> Option<String> {
        loop {
            // Registered before inspecting state so a completion in between is not missed
            let settled = self.settled.notified();

            {
                let mut state = self.lock();
                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(url);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            settled.await;
        }
    }

    /// Returns a checked-out URL, enqueueing the page it led to (if any)
    ///
    /// Returns true if `discovered` was enqueued; a URL already seen during
    /// this run is dropped.
    pub fn complete(&self, discovered: Option<String>) -> bool {
        let enqueued = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);

            match discovered {
                Some(url) if state.seen.insert(url.clone()) => {
                    state.queue.push_back(url);
                    true
                }
                Some(url) => {
                    tracing::warn!("Next link {} was already visited, not following it", url);
                    false
                }
                None => false,
            }
        };

        self.settled.notify_waiters();
        enqueued
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
