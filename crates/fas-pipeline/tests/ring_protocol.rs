// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Supervisor and generators as threads of one process. The shared
//! resources are still real named POSIX objects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use fas_graph::{Candidate, Edge, Graph, SearchEngine};
use fas_pipeline::{
    Generator, PublishOutcome, SolutionReporter, StopReason, Supervisor, SupervisorState,
};
use fas_shm::{ResourceNames, SemaphoreKind, SharedSession, WaitOutcome, RING_CAPACITY};

const DEADLINE: Duration = Duration::from_secs(30);

fn unique_names(tag: &str) -> ResourceNames {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    ResourceNames::with_prefix(&format!(
        "/fas_pl_{}_{}_{}",
        std::process::id(),
        tag,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Run `f` on a thread; the returned receiver yields its result.
fn spawn_reporting<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx
}

fn within_deadline<T>(rx: &mpsc::Receiver<T>, what: &str) -> T {
    rx.recv_timeout(DEADLINE)
        .unwrap_or_else(|_| panic!("{what} did not terminate within {DEADLINE:?}"))
}

#[derive(Default)]
struct Recorded {
    improvements: Vec<usize>,
    acyclic: bool,
    finals: usize,
}

#[derive(Clone, Default)]
struct RecordingReporter(Arc<Mutex<Recorded>>);

impl SolutionReporter for RecordingReporter {
    fn report_improvement(&mut self, solution: &Candidate) {
        self.0.lock().unwrap().improvements.push(solution.edge_count());
    }

    fn report_acyclic(&mut self) {
        self.0.lock().unwrap().acyclic = true;
    }

    fn report_final(&mut self, _best: Option<&Candidate>) {
        self.0.lock().unwrap().finals += 1;
    }
}

/// Candidate whose edges all encode producer, sequence and edge count, so a
/// slot mixing two writes is detectable.
fn tagged_candidate(producer: u32, sequence: u32) -> Candidate {
    let count = 1 + (sequence % 8);
    let tag = producer * 1000 + sequence;
    let edges = vec![Edge::new(tag, tag + count); count as usize];
    Candidate::from_edges(&edges).unwrap()
}

#[test]
fn concurrent_producers_never_tear_slots() {
    const PRODUCERS: u32 = 3;
    const PER_PRODUCER: u32 = 100;

    let names = unique_names("tear");
    let owner = SharedSession::create(&names).unwrap();
    owner.set_running(true);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let engine = SearchEngine::with_seed(Graph::default(), u64::from(producer));
            let mut generator = Generator::attach(&names, engine).unwrap();
            spawn_reporting(move || {
                for sequence in 0..PER_PRODUCER {
                    let outcome = generator
                        .publish(&tagged_candidate(producer, sequence))
                        .unwrap();
                    assert!(matches!(outcome, PublishOutcome::Published { .. }));
                }
                generator
            })
        })
        .collect();

    let mut next_sequence = [0u32; PRODUCERS as usize];
    let mut read_cursor = 0;
    for _ in 0..PRODUCERS * PER_PRODUCER {
        assert_eq!(owner.acquire(SemaphoreKind::Used).unwrap(), WaitOutcome::Acquired);
        // SAFETY: holding a used permit
        let slot = unsafe { owner.control().read_slot(read_cursor) };
        owner.release(SemaphoreKind::Free).unwrap();
        read_cursor = (read_cursor + 1) % RING_CAPACITY;

        let edges = slot.edges();
        let count = slot.edge_count;
        assert!((1..=8).contains(&count), "bad count {count}");
        assert!(edges.iter().all(|e| *e == edges[0]), "mixed slot {edges:?}");
        assert_eq!(edges[0].v - edges[0].u, count, "count from another write");

        let producer = (edges[0].u / 1000) as usize;
        let sequence = edges[0].u % 1000;
        // Per-producer order is preserved through the ring
        assert_eq!(sequence, next_sequence[producer]);
        next_sequence[producer] += 1;
    }
    assert!(next_sequence.iter().all(|&n| n == PER_PRODUCER));

    for rx in producers {
        let generator = within_deadline(&rx, "producer");
        assert!(generator.shutdown().teardown.is_clean());
    }
    assert!(owner.teardown().is_clean());
}

#[test]
fn acyclic_graph_terminates_everyone() {
    let names = unique_names("acyclic");
    let graph = Graph::parse("0-1 1-2 2-3").unwrap();

    let supervisor = Supervisor::create(&names).unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Created);
    let generators: Vec<_> = (0..3)
        .map(|seed| Generator::attach(&names, SearchEngine::with_seed(graph.clone(), seed)).unwrap())
        .collect();

    let reporter = RecordingReporter::default();
    let mut supervisor_reporter = reporter.clone();
    let supervisor_rx = spawn_reporting(move || supervisor.run(&mut supervisor_reporter));
    let generator_rxs: Vec<_> = generators
        .into_iter()
        .map(|generator| spawn_reporting(move || generator.run()))
        .collect();

    let outcome = within_deadline(&supervisor_rx, "supervisor").unwrap();
    assert_eq!(outcome.reason, StopReason::AcyclicFound);
    assert_eq!(outcome.best.map(|b| b.edge_count()), Some(0));
    assert!(outcome.teardown.is_clean());

    for rx in &generator_rxs {
        let generator_outcome = within_deadline(rx, "generator").unwrap();
        assert!(generator_outcome.iterations >= generator_outcome.published);
        assert!(generator_outcome.teardown.is_clean());
    }

    let recorded = reporter.0.lock().unwrap();
    assert!(recorded.acyclic);
    assert_eq!(recorded.finals, 1);
    assert!(recorded.improvements.windows(2).all(|w| w[0] > w[1]));

    // Supervisor removed every name
    assert!(SharedSession::attach(&names).is_err());
}

#[test]
fn edgeless_graph_stops_on_first_slot() {
    let names = unique_names("edgeless");
    let graph = Graph::default();
    assert_eq!(graph.max_index(), 0);

    let supervisor = Supervisor::create(&names).unwrap();
    let generator = Generator::attach(&names, SearchEngine::with_seed(graph, 0)).unwrap();

    let reporter = RecordingReporter::default();
    let mut supervisor_reporter = reporter.clone();
    let supervisor_rx = spawn_reporting(move || supervisor.run(&mut supervisor_reporter));
    let generator_rx = spawn_reporting(move || generator.run());

    let outcome = within_deadline(&supervisor_rx, "supervisor").unwrap();
    assert_eq!(outcome.reason, StopReason::AcyclicFound);
    assert_eq!(outcome.slots_consumed, 1);
    assert_eq!(outcome.best.map(|b| b.edge_count()), Some(0));
    assert!(outcome.teardown.is_clean());

    let generator_outcome = within_deadline(&generator_rx, "generator").unwrap();
    assert_eq!(generator_outcome.best_edge_count, Some(0));
    assert!(generator_outcome.published >= 1);
    assert!(generator_outcome.teardown.is_clean());

    let recorded = reporter.0.lock().unwrap();
    assert!(recorded.acyclic);
    assert!(recorded.improvements.is_empty());
    assert_eq!(recorded.finals, 1);
    assert!(SharedSession::attach(&names).is_err());
}

#[test]
fn external_stop_terminates_cyclic_search() {
    let names = unique_names("cancel");
    let graph = Graph::parse("0-1 1-2 1-3 1-4 2-4 3-6 4-3 4-5 6-0").unwrap();

    let supervisor = Supervisor::create(&names).unwrap();
    let generators: Vec<_> = (0..2)
        .map(|seed| Generator::attach(&names, SearchEngine::with_seed(graph.clone(), seed)).unwrap())
        .collect();

    let reporter = RecordingReporter::default();
    let mut supervisor_reporter = reporter.clone();
    let supervisor_rx = spawn_reporting(move || supervisor.run(&mut supervisor_reporter));
    let generator_rxs: Vec<_> = generators
        .into_iter()
        .map(|generator| spawn_reporting(move || generator.run()))
        .collect();

    let started = Instant::now();
    while reporter.0.lock().unwrap().improvements.is_empty() {
        assert!(started.elapsed() < DEADLINE, "no solution reported");
        thread::sleep(Duration::from_millis(5));
    }

    let observer = SharedSession::attach(&names).unwrap();
    observer.request_stop();
    assert!(observer.teardown().is_clean());

    let outcome = within_deadline(&supervisor_rx, "supervisor").unwrap();
    assert_eq!(outcome.reason, StopReason::Cancelled);
    let best = outcome.best.expect("at least one solution was reported");
    assert!(best.edge_count() >= 1, "graph has a cycle");
    assert!(outcome.slots_consumed >= 1);

    for rx in &generator_rxs {
        assert!(within_deadline(rx, "generator").is_ok());
    }

    let recorded = reporter.0.lock().unwrap();
    assert!(!recorded.acyclic);
    assert!(recorded.improvements.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(recorded.improvements.last(), Some(&best.edge_count()));
}
