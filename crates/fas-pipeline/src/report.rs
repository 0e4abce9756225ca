// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Human-readable progress output of the supervisor

use std::io::{self, Write};

use fas_graph::Candidate;
use tracing::warn;

const SEPARATOR: &str = "----------------";

/// Receives the supervisor's findings
pub trait SolutionReporter {
    /// A strictly smaller, non-empty feedback arc set was received.
    fn report_improvement(&mut self, solution: &Candidate);

    /// An empty feedback arc set was received: the graph is acyclic.
    fn report_acyclic(&mut self);

    /// Called once after the supervisor loop ends.
    fn report_final(&mut self, _best: Option<&Candidate>) {}
}

/// Writes reports to a stream, stdout by default
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            warn!(error = %err, "Failed to write report");
        }
    }
}

impl<W: Write> SolutionReporter for ConsoleReporter<W> {
    fn report_improvement(&mut self, solution: &Candidate) {
        let mut text = format!(
            "Current best solution with {} edges:\n",
            solution.edge_count()
        );
        for edge in solution.edges() {
            text.push_str(&format!("{edge}\n"));
        }
        text.push_str(SEPARATOR);
        text.push('\n');
        self.emit(&text);
    }

    fn report_acyclic(&mut self) {
        self.emit(&format!("This graph is already acyclic!\n{SEPARATOR}\n"));
    }

    fn report_final(&mut self, best: Option<&Candidate>) {
        let text = match best {
            None => "Final result: no solution received.\n".to_string(),
            Some(best) if best.is_acyclic() => {
                "Final result: the graph is already acyclic.\n".to_string()
            }
            Some(best) => format!(
                "Final result: removing {} edges makes the graph acyclic: {}\n",
                best.edge_count(),
                best
            ),
        };
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fas_graph::Edge;

    fn rendered(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new());
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_improvement_lists_edges() {
        let solution = Candidate::from_edges(&[Edge::new(4, 3), Edge::new(6, 0)]).unwrap();
        let text = rendered(|r| r.report_improvement(&solution));
        assert_eq!(
            text,
            "Current best solution with 2 edges:\n4-3\n6-0\n----------------\n"
        );
    }

    #[test]
    fn test_acyclic_message() {
        let text = rendered(|r| r.report_acyclic());
        assert!(text.starts_with("This graph is already acyclic!\n"));
    }

    #[test]
    fn test_final_summary() {
        let solution = Candidate::from_edges(&[Edge::new(6, 0)]).unwrap();
        assert_eq!(
            rendered(|r| r.report_final(Some(&solution))),
            "Final result: removing 1 edges makes the graph acyclic: 6-0\n"
        );
        assert_eq!(
            rendered(|r| r.report_final(Some(&Candidate::empty()))),
            "Final result: the graph is already acyclic.\n"
        );
        assert_eq!(
            rendered(|r| r.report_final(None)),
            "Final result: no solution received.\n"
        );
    }
}
