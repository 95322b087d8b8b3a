//! Rotated indices over interned triples
//!
//! The same triples are kept under several key rotations so that any pattern
//! with a bound term can be answered by a bounded prefix scan:
//!
//! - `Spo`, `Pos`, `Osp`: one entry per stored triple
//! - `Cspo`, `Cpos`, `Cosp`: one entry per (context, triple) membership,
//!   context first, so a per-graph query never leaves its graph
//!
//! Each rotation is an ordered set of fixed-size id arrays; a scan is a
//! `BTreeSet::range` between the prefix padded with [`TermId::MIN`] and with
//! [`TermId::MAX`].

use super::dictionary::TermId;
use std::collections::BTreeSet;
use std::fmt;

/// Stored triple key in canonical (subject, predicate, object) order
pub type TripleKey = [TermId; 3];

/// Key ordering of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Spo,
    Pos,
    Osp,
    Cspo,
    Cpos,
    Cosp,
}

impl Rotation {
    /// Triple rotations in declaration order
    pub const TRIPLE: [Rotation; 3] = [Rotation::Spo, Rotation::Pos, Rotation::Osp];

    /// Context-first rotations in declaration order
    pub const CONTEXT: [Rotation; 3] = [Rotation::Cspo, Rotation::Cpos, Rotation::Cosp];

    /// Canonical position (0 = S, 1 = P, 2 = O) of the first triple component
    pub fn start(self) -> usize {
        match self {
            Rotation::Spo | Rotation::Cspo => 0,
            Rotation::Pos | Rotation::Cpos => 1,
            Rotation::Osp | Rotation::Cosp => 2,
        }
    }

    /// Whether the key leads with the context id
    pub fn has_context(self) -> bool {
        matches!(self, Rotation::Cspo | Rotation::Cpos | Rotation::Cosp)
    }

    /// Rotate a canonical key into this rotation's component order
    pub fn rotate(self, key: &TripleKey) -> TripleKey {
        let start = self.start();
        [key[start], key[(start + 1) % 3], key[(start + 2) % 3]]
    }

    /// Map a rotated key back to canonical (subject, predicate, object) order
    pub fn to_spo(self, rotated: &TripleKey) -> TripleKey {
        let start = self.start();
        let mut key = [TermId::MIN; 3];
        for (offset, id) in rotated.iter().enumerate() {
            key[(start + offset) % 3] = *id;
        }
        key
    }

    fn slot(self) -> usize {
        self.start()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rotation::Spo => "SPO",
            Rotation::Pos => "POS",
            Rotation::Osp => "OSP",
            Rotation::Cspo => "CSPO",
            Rotation::Cpos => "CPOS",
            Rotation::Cosp => "COSP",
        };
        f.write_str(name)
    }
}

fn padded<const N: usize>(prefix: &[TermId], fill: TermId) -> [TermId; N] {
    let mut key = [fill; N];
    for (slot, id) in key.iter_mut().zip(prefix) {
        *slot = *id;
    }
    key
}

/// Redundant orderings of the stored triples
///
/// Mutated only by the engine, which decides when a triple or a membership
/// comes and goes. Inserts and removals are idempotent.
#[derive(Debug, Default)]
pub struct IndexSet {
    triples: [BTreeSet<[TermId; 3]>; 3],
    memberships: [BTreeSet<[TermId; 4]>; 3],
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple to every triple rotation
    pub fn insert(&mut self, key: &TripleKey) {
        for rotation in Rotation::TRIPLE {
            self.triples[rotation.slot()].insert(rotation.rotate(key));
        }
    }

    /// Remove a triple from every triple rotation
    pub fn remove(&mut self, key: &TripleKey) {
        for rotation in Rotation::TRIPLE {
            self.triples[rotation.slot()].remove(&rotation.rotate(key));
        }
    }

    /// Add a (context, triple) membership to every context rotation
    pub fn insert_membership(&mut self, context: TermId, key: &TripleKey) {
        for rotation in Rotation::CONTEXT {
            let [a, b, c] = rotation.rotate(key);
            self.memberships[rotation.slot()].insert([context, a, b, c]);
        }
    }

    /// Remove a (context, triple) membership from every context rotation
    pub fn remove_membership(&mut self, context: TermId, key: &TripleKey) {
        for rotation in Rotation::CONTEXT {
            let [a, b, c] = rotation.rotate(key);
            self.memberships[rotation.slot()].remove(&[context, a, b, c]);
        }
    }

    pub fn contains(&self, key: &TripleKey) -> bool {
        self.triples[Rotation::Spo.slot()].contains(key)
    }

    /// Stored triples
    pub fn len(&self) -> usize {
        self.triples[Rotation::Spo.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored (context, triple) memberships
    pub fn membership_len(&self) -> usize {
        self.memberships[Rotation::Cspo.slot()].len()
    }

    #[cfg(test)]
    fn rotation_len(&self, rotation: Rotation) -> usize {
        if rotation.has_context() {
            self.memberships[rotation.slot()].len()
        } else {
            self.triples[rotation.slot()].len()
        }
    }

    /// Lazily scan one rotation for keys starting with `prefix`
    ///
    /// Context rotations expect the context id as the first prefix element.
    /// Yields canonical triple keys in the rotation's key order.
    pub fn scan<'a>(
        &'a self,
        rotation: Rotation,
        prefix: &[TermId],
    ) -> Box<dyn Iterator<Item = TripleKey> + 'a> {
        if rotation.has_context() {
            let low: [TermId; 4] = padded(prefix, TermId::MIN);
            let high: [TermId; 4] = padded(prefix, TermId::MAX);
            Box::new(
                self.memberships[rotation.slot()]
                    .range(low..=high)
                    .map(move |[_, a, b, c]| rotation.to_spo(&[*a, *b, *c])),
            )
        } else {
            let low: [TermId; 3] = padded(prefix, TermId::MIN);
            let high: [TermId; 3] = padded(prefix, TermId::MAX);
            Box::new(
                self.triples[rotation.slot()]
                    .range(low..=high)
                    .map(move |rotated| rotation.to_spo(rotated)),
            )
        }
    }

    /// Distinct leading components of a triple rotation
    pub fn distinct_leading(&self, rotation: Rotation) -> Vec<TermId> {
        let mut leading = Vec::new();
        if rotation.has_context() {
            for key in &self.memberships[rotation.slot()] {
                if leading.last() != Some(&key[0]) {
                    leading.push(key[0]);
                }
            }
        } else {
            for key in &self.triples[rotation.slot()] {
                if leading.last() != Some(&key[0]) {
                    leading.push(key[0]);
                }
            }
        }
        leading
    }

    pub fn clear(&mut self) {
        for index in self.triples.iter_mut() {
            index.clear();
        }
        for index in self.memberships.iter_mut() {
            index.clear();
        }
    }
}
