//! Index selection for partially bound patterns
//!
//! Boundedness is a 3-bit mask (S = 1, P = 2, O = 4). Each rotation starts at
//! one of S, P, O and walks the triple cyclically; its score is the number of
//! consecutive bound terms from that start. The highest score wins and ties
//! go to the rotation declared first, so the choice is deterministic.
//!
//! | bound     | rotation | prefix  |
//! |-----------|----------|---------|
//! | none      | SPO      | ()      |
//! | S         | SPO      | (s)     |
//! | P         | POS      | (p)     |
//! | O         | OSP      | (o)     |
//! | S P       | SPO      | (s p)   |
//! | P O       | POS      | (p o)   |
//! | S O       | OSP      | (o s)   |
//! | S P O     | SPO      | (s p o) |
//!
//! A bound context switches to the context-first rotations with the context
//! id prepended to the prefix.

use super::dictionary::TermId;
use super::index::{Rotation, TripleKey};

/// Bit for a bound subject
pub const SUBJECT: u8 = 0b001;
/// Bit for a bound predicate
pub const PREDICATE: u8 = 0b010;
/// Bit for a bound object
pub const OBJECT: u8 = 0b100;

/// A pattern resolved to interned ids; `None` marks a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdPattern {
    pub terms: [Option<TermId>; 3],
    pub context: Option<TermId>,
}

impl IdPattern {
    pub fn new(terms: [Option<TermId>; 3], context: Option<TermId>) -> Self {
        Self { terms, context }
    }

    /// Bound-term mask over subject, predicate and object
    pub fn mask(&self) -> u8 {
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, term)| term.is_some())
            .fold(0, |mask, (position, _)| mask | (1u8 << position))
    }
}

/// Which rotation to scan and with what prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub rotation: Rotation,
    pub prefix: Vec<TermId>,
}

impl ScanPlan {
    /// Number of S/P/O terms covered by the prefix
    pub fn bound_run(&self) -> usize {
        if self.rotation.has_context() {
            self.prefix.len().saturating_sub(1)
        } else {
            self.prefix.len()
        }
    }

    /// Map a scanned key back to canonical order
    pub fn to_spo(&self, rotated: &TripleKey) -> TripleKey {
        self.rotation.to_spo(rotated)
    }
}

/// Length of the run of bound positions starting at `start`, walking S, P, O cyclically
fn bound_run(mask: u8, start: usize) -> usize {
    (0..3)
        .take_while(|offset| mask & (1u8 << ((start + offset) % 3)) != 0)
        .count()
}

/// Picks the rotation and prefix for a pattern
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexSelector;

impl IndexSelector {
    pub fn new() -> Self {
        Self
    }

    /// Choose the rotation with the longest bound run
    pub fn select(&self, pattern: &IdPattern) -> ScanPlan {
        let mask = pattern.mask();
        let candidates = if pattern.context.is_some() {
            Rotation::CONTEXT
        } else {
            Rotation::TRIPLE
        };

        let mut best = candidates[0];
        let mut best_run = bound_run(mask, best.start());
        for rotation in &candidates[1..] {
            let run = bound_run(mask, rotation.start());
            // Strictly greater: ties keep the earlier rotation
            if run > best_run {
                best = *rotation;
                best_run = run;
            }
        }

        let mut prefix = Vec::with_capacity(best_run + 1);
        if let Some(context) = pattern.context {
            prefix.push(context);
        }
        for offset in 0..best_run {
            if let Some(id) = pattern.terms[(best.start() + offset) % 3] {
                prefix.push(id);
            }
        }

        ScanPlan {
            rotation: best,
            prefix,
        }
    }
}
