//! Background loading with generation-tagged delivery.
//!
//! [`LoaderController`] lives on the UI (owner) thread.  Each
//! [`start`](LoaderController::start) checks connectivity, builds the request
//! and hands exactly one fetch to a worker thread.  The worker sends its
//! outcome back over an [`mpsc`] channel tagged with the generation it was
//! started for; the owner drains the channel with
//! [`poll`](LoaderController::poll) on every tick and only the current
//! generation reaches the [`ResultSink`].
//!
//! ```text
//!   Idle ──start──► Loading ──fetch completes──► Delivered
//!    ▲                │                              │
//!    └──reset/cancel──┘◄─────────────reset───────────┘
//! ```
//!
//! A fetch cannot be interrupted mid-request.  Superseding or resetting a
//! load just moves the generation on, so the old result is computed and then
//! dropped without being delivered.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::SearchConfig;
use crate::source::{ConnectivityGate, ErrorKind, LoadOutcome, NewsFetcher, QueryBuilder};

/// Where the controller is in the current load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Delivered,
}

/// Receives exactly one [`LoadOutcome`] per completed generation.
///
/// Only ever called from the owner thread, so implementations need no
/// locking.
pub trait ResultSink {
    fn deliver(&mut self, outcome: LoadOutcome);
}

/// A fetch result on its way back from a worker thread.
struct Completion {
    generation: u64,
    outcome: LoadOutcome,
}

pub struct LoaderController {
    gate: Box<dyn ConnectivityGate>,
    builder: QueryBuilder,
    base: Url,
    fetcher: Arc<dyn NewsFetcher>,
    state: LoadState,
    generation: u64,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl LoaderController {
    pub fn new(
        gate: Box<dyn ConnectivityGate>,
        builder: QueryBuilder,
        base: Url,
        fetcher: Arc<dyn NewsFetcher>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gate,
            builder,
            base,
            fetcher,
            state: LoadState::Idle,
            generation: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Begin a new load, superseding any load still in flight.
    ///
    /// When the gate reports no connectivity, `Failure(NoConnection)` is
    /// delivered to `sink` before this returns and no request is made.
    pub fn start(&mut self, config: &SearchConfig, sink: &mut dyn ResultSink) {
        if self.state == LoadState::Loading {
            debug!(superseded = self.generation, "superseding in-flight load");
        }
        self.generation += 1;
        let generation = self.generation;
        info!(generation, term = %config.term, section = %config.section, "starting load");

        if !self.gate.is_reachable() {
            warn!(generation, "network unreachable; not issuing request");
            self.deliver(LoadOutcome::Failure(ErrorKind::NoConnection), sink);
            return;
        }

        self.state = LoadState::Loading;
        let request = self.builder.build(&self.base, config);
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("news-fetch-{generation}"))
            .spawn(move || {
                let outcome = fetcher.fetch(&request);
                // The controller owns the receiver; a failed send means it is
                // gone and nobody is waiting for this result.
                let _ = tx.send(Completion {
                    generation,
                    outcome,
                });
            });

        match spawned {
            Ok(_) => debug!(generation, "fetch dispatched"),
            Err(e) => {
                warn!(generation, error = %e, "could not spawn fetch thread");
                self.deliver(LoadOutcome::Failure(ErrorKind::NetworkFailure), sink);
            }
        }
    }

    /// Handle a finished fetch for `generation`.
    ///
    /// Returns `true` if the outcome was delivered, `false` if it belonged to
    /// a superseded or reset load and was dropped.
    pub fn on_fetch_complete(
        &mut self,
        generation: u64,
        outcome: LoadOutcome,
        sink: &mut dyn ResultSink,
    ) -> bool {
        if generation != self.generation || self.state != LoadState::Loading {
            debug!(
                generation,
                current = self.generation,
                outcome = outcome.kind(),
                "dropping stale completion"
            );
            return false;
        }

        self.deliver(outcome, sink);
        true
    }

    /// Drain finished fetches without blocking, delivering the current one.
    ///
    /// Call this from the owner thread's loop.  Returns how many completions
    /// were received, delivered or not.
    pub fn poll(&mut self, sink: &mut dyn ResultSink) -> usize {
        let mut received = 0;
        while let Ok(Completion {
            generation,
            outcome,
        }) = self.rx.try_recv()
        {
            received += 1;
            self.on_fetch_complete(generation, outcome, sink);
        }
        received
    }

    /// Return to `Idle`.  Whatever is in flight will never be delivered.
    pub fn reset(&mut self) {
        if self.state == LoadState::Loading {
            debug!(cancelled = self.generation, "cancelling in-flight load");
        }
        self.generation += 1;
        self.state = LoadState::Idle;
    }

    fn deliver(&mut self, outcome: LoadOutcome, sink: &mut dyn ResultSink) {
        info!(generation = self.generation, outcome = outcome.kind(), "delivering outcome");
        self.state = LoadState::Delivered;
        sink.deliver(outcome);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::NewsItem;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const BASE: &str = "https://content.guardianapis.com/search";

    #[derive(Default)]
    struct RecordingSink(Vec<LoadOutcome>);

    impl ResultSink for RecordingSink {
        fn deliver(&mut self, outcome: LoadOutcome) {
            self.0.push(outcome);
        }
    }

    /// Holds each fetch until the test releases it, keyed by the `q` param.
    #[derive(Default)]
    struct ScriptedFetcher {
        releases: Mutex<HashMap<String, Receiver<LoadOutcome>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        /// Register `term`; the returned sender releases its fetch.
        fn hold(&self, term: &str) -> Sender<LoadOutcome> {
            let (tx, rx) = mpsc::channel();
            self.releases.lock().unwrap().insert(term.to_string(), rx);
            tx
        }
    }

    impl NewsFetcher for ScriptedFetcher {
        fn fetch(&self, request: &Url) -> LoadOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let term = request
                .query_pairs()
                .find(|(k, _)| k == "q")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            let release = self.releases.lock().unwrap().remove(&term);
            match release {
                Some(rx) => rx
                    .recv()
                    .unwrap_or(LoadOutcome::Failure(ErrorKind::NetworkFailure)),
                None => LoadOutcome::Failure(ErrorKind::NetworkFailure),
            }
        }
    }

    fn controller(online: bool, fetcher: Arc<ScriptedFetcher>) -> LoaderController {
        LoaderController::new(
            Box::new(move || online),
            QueryBuilder::new("test", "news"),
            Url::parse(BASE).unwrap(),
            fetcher,
        )
    }

    fn search(term: &str) -> SearchConfig {
        SearchConfig {
            term: term.to_string(),
            section: String::new(),
        }
    }

    fn outcome(title: &str) -> LoadOutcome {
        let item = NewsItem::new(title, "", "2021-03-03T10:00:00Z", "", "https://example.com/x")
            .unwrap();
        LoadOutcome::Success(vec![item])
    }

    /// Poll until `expected` completions have come back from workers.
    fn drain(controller: &mut LoaderController, sink: &mut RecordingSink, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = 0;
        while received < expected {
            assert!(Instant::now() < deadline, "timed out waiting for fetches");
            received += controller.poll(sink);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn starts_idle() {
        let ctl = controller(true, Arc::default());
        assert_eq!(ctl.state(), LoadState::Idle);
        assert_eq!(ctl.generation, 0);
    }

    #[test]
    fn delivers_fetch_outcome_once() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let release = fetcher.hold("rust");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("rust"), &mut sink);
        assert_eq!(ctl.state(), LoadState::Loading);
        assert!(sink.0.is_empty());

        release.send(outcome("Rust 2.0")).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert_eq!(ctl.state(), LoadState::Delivered);
        assert_eq!(sink.0, vec![outcome("Rust 2.0")]);
        assert_eq!(ctl.poll(&mut sink), 0);
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn unreachable_network_delivers_no_connection_synchronously() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let mut ctl = controller(false, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("rust"), &mut sink);

        assert_eq!(ctl.state(), LoadState::Delivered);
        assert_eq!(sink.0, vec![LoadOutcome::Failure(ErrorKind::NoConnection)]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0, "no request attempted");
    }

    #[test]
    fn default_term_is_requested_for_empty_search() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let release = fetcher.hold("news");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&SearchConfig::default(), &mut sink);
        release.send(LoadOutcome::Empty).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert_eq!(sink.0, vec![LoadOutcome::Empty]);
    }

    #[test]
    fn second_start_supersedes_first_even_if_first_finishes_last() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let first = fetcher.hold("first");
        let second = fetcher.hold("second");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("first"), &mut sink);
        ctl.start(&search("second"), &mut sink);
        assert_eq!(ctl.generation, 2);

        second.send(outcome("fresh")).unwrap();
        drain(&mut ctl, &mut sink, 1);
        first.send(outcome("stale")).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert_eq!(sink.0, vec![outcome("fresh")]);
        assert_eq!(ctl.state(), LoadState::Delivered);
    }

    #[test]
    fn second_start_supersedes_first_when_first_finishes_first() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let first = fetcher.hold("first");
        let second = fetcher.hold("second");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("first"), &mut sink);
        ctl.start(&search("second"), &mut sink);

        first.send(outcome("stale")).unwrap();
        drain(&mut ctl, &mut sink, 1);
        assert!(sink.0.is_empty(), "stale result must not be delivered");
        assert_eq!(ctl.state(), LoadState::Loading);

        second.send(outcome("fresh")).unwrap();
        drain(&mut ctl, &mut sink, 1);
        assert_eq!(sink.0, vec![outcome("fresh")]);
    }

    #[test]
    fn reset_while_loading_drops_the_result() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let release = fetcher.hold("rust");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("rust"), &mut sink);
        ctl.reset();
        assert_eq!(ctl.state(), LoadState::Idle);

        release.send(outcome("too late")).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert!(sink.0.is_empty());
        assert_eq!(ctl.state(), LoadState::Idle);
    }

    #[test]
    fn reset_after_delivery_returns_to_idle() {
        let mut ctl = controller(false, Arc::default());
        let mut sink = RecordingSink::default();

        ctl.start(&search("rust"), &mut sink);
        assert_eq!(ctl.state(), LoadState::Delivered);

        ctl.reset();
        assert_eq!(ctl.state(), LoadState::Idle);
    }

    #[test]
    fn can_start_again_after_delivery() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let one = fetcher.hold("one");
        let two = fetcher.hold("two");
        let mut ctl = controller(true, Arc::clone(&fetcher));
        let mut sink = RecordingSink::default();

        ctl.start(&search("one"), &mut sink);
        one.send(outcome("1")).unwrap();
        drain(&mut ctl, &mut sink, 1);

        ctl.start(&search("two"), &mut sink);
        assert_eq!(ctl.state(), LoadState::Loading);
        two.send(LoadOutcome::Failure(ErrorKind::ParseFailure)).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert_eq!(
            sink.0,
            vec![outcome("1"), LoadOutcome::Failure(ErrorKind::ParseFailure)]
        );
    }

    #[test]
    fn offline_start_also_supersedes_in_flight_load() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let release = fetcher.hold("rust");
        let online = Arc::new(AtomicUsize::new(1));
        let flag = Arc::clone(&online);
        let mut ctl = LoaderController::new(
            Box::new(move || flag.load(Ordering::SeqCst) == 1),
            QueryBuilder::new("test", "news"),
            Url::parse(BASE).unwrap(),
            Arc::clone(&fetcher) as Arc<dyn NewsFetcher>,
        );
        let mut sink = RecordingSink::default();

        ctl.start(&search("rust"), &mut sink);
        online.store(0, Ordering::SeqCst);
        ctl.start(&search("rust"), &mut sink);

        release.send(outcome("stale")).unwrap();
        drain(&mut ctl, &mut sink, 1);

        assert_eq!(sink.0, vec![LoadOutcome::Failure(ErrorKind::NoConnection)]);
    }

    #[test]
    fn completion_for_old_generation_is_rejected_directly() {
        let mut ctl = controller(true, Arc::default());
        let mut sink = RecordingSink::default();

        assert!(!ctl.on_fetch_complete(0, LoadOutcome::Empty, &mut sink));
        assert!(sink.0.is_empty());
        assert_eq!(ctl.state(), LoadState::Idle);
    }
}
