//! Property tests for index agreement
//!
//! Whatever rotation the selector picks, the result set must equal a
//! brute-force filter over a plain model of the store.

use proptest::prelude::*;
use samyama_triplestore::{
    GraphName, LenMode, RdfTerm, StoreConfig, Triple, TriplePattern, TripleStore,
};
use std::collections::{BTreeMap, BTreeSet};

const SUBJECTS: usize = 4;
const PREDICATES: usize = 3;
const OBJECTS: usize = 4;
const GRAPHS: usize = 3;

fn subject(n: usize) -> RdfTerm {
    RdfTerm::iri(&format!("http://example.org/s{}", n)).unwrap()
}

fn predicate(n: usize) -> RdfTerm {
    RdfTerm::iri(&format!("http://example.org/p{}", n)).unwrap()
}

// Objects mix IRIs (shared with subjects) and literals
fn object(n: usize) -> RdfTerm {
    if n % 2 == 0 {
        subject(n / 2)
    } else {
        RdfTerm::literal(n.to_string())
    }
}

fn graph(n: usize) -> GraphName {
    if n == 0 {
        GraphName::DefaultGraph
    } else {
        GraphName::iri(&format!("http://example.org/g{}", n)).unwrap()
    }
}

#[derive(Debug, Clone)]
struct QuadSpec {
    s: usize,
    p: usize,
    o: usize,
    g: usize,
    quoted: bool,
}

impl QuadSpec {
    fn triple(&self) -> Triple {
        Triple::new(subject(self.s), predicate(self.p), object(self.o))
    }
}

fn quad_strategy() -> impl Strategy<Value = QuadSpec> {
    (0..SUBJECTS, 0..PREDICATES, 0..OBJECTS, 0..GRAPHS, any::<bool>())
        .prop_map(|(s, p, o, g, quoted)| QuadSpec { s, p, o, g, quoted })
}

#[derive(Debug, Clone)]
struct PatternSpec {
    s: Option<usize>,
    p: Option<usize>,
    o: Option<usize>,
    g: Option<usize>,
}

impl PatternSpec {
    fn pattern(&self) -> TriplePattern {
        TriplePattern::new(self.s.map(subject), self.p.map(predicate), self.o.map(object))
    }

    fn graph(&self) -> Option<GraphName> {
        self.g.map(graph)
    }
}

fn pattern_strategy() -> impl Strategy<Value = PatternSpec> {
    (
        proptest::option::of(0..SUBJECTS),
        proptest::option::of(0..PREDICATES),
        proptest::option::of(0..OBJECTS),
        proptest::option::of(0..GRAPHS),
    )
        .prop_map(|(s, p, o, g)| PatternSpec { s, p, o, g })
}

/// Triple -> (graph -> quoted), asserted wins
type Model = BTreeMap<Triple, BTreeMap<GraphName, bool>>;

fn model_add(model: &mut Model, spec: &QuadSpec) {
    let memberships = model.entry(spec.triple()).or_default();
    let quoted = memberships.get(&graph(spec.g)).map_or(spec.quoted, |was| *was && spec.quoted);
    memberships.insert(graph(spec.g), quoted);
}

fn model_remove(model: &mut Model, spec: &PatternSpec) {
    let pattern = spec.pattern();
    let target = spec.graph();
    for (triple, memberships) in model.iter_mut() {
        if pattern.matches(triple) {
            match &target {
                Some(graph) => {
                    memberships.remove(graph);
                }
                None => memberships.clear(),
            }
        }
    }
    model.retain(|_, memberships| !memberships.is_empty());
}

fn model_query(model: &Model, spec: &PatternSpec) -> BTreeSet<Triple> {
    let pattern = spec.pattern();
    let target = spec.graph();
    model
        .iter()
        .filter(|(triple, memberships)| {
            pattern.matches(triple)
                && target.as_ref().map_or(true, |graph| memberships.contains_key(graph))
        })
        .map(|(triple, _)| triple.clone())
        .collect()
}

// Distinct interned terms: every slot of a stored triple plus each named
// graph with a membership
fn model_terms(model: &Model) -> usize {
    let mut terms: BTreeSet<RdfTerm> = BTreeSet::new();
    for (triple, memberships) in model {
        terms.insert(triple.subject.clone());
        terms.insert(triple.predicate.clone());
        terms.insert(triple.object.clone());
        for graph in memberships.keys() {
            if let GraphName::Named(term) = graph {
                terms.insert(term.clone());
            }
        }
    }
    terms.len()
}

fn store_query(store: &TripleStore, spec: &PatternSpec) -> BTreeSet<Triple> {
    let graph = spec.graph();
    store
        .triples(&spec.pattern(), graph.as_ref())
        .unwrap()
        .map(|(triple, _)| triple)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_pattern_shape_agrees_with_brute_force(
        quads in prop::collection::vec(quad_strategy(), 0..40),
        removals in prop::collection::vec(pattern_strategy(), 0..4),
    ) {
        let mut store = TripleStore::in_memory();
        let mut union = TripleStore::new(
            StoreConfig::in_memory().with_len_mode(LenMode::UnionOfAllGraphs),
        );
        union.open().unwrap();
        let mut model = Model::new();
        for spec in &quads {
            store.add(&spec.triple(), &graph(spec.g), spec.quoted).unwrap();
            union.add(&spec.triple(), &graph(spec.g), spec.quoted).unwrap();
            model_add(&mut model, spec);
        }
        for spec in &removals {
            let graph = spec.graph();
            store.remove(&spec.pattern(), graph.as_ref()).unwrap();
            union.remove(&spec.pattern(), graph.as_ref()).unwrap();
            model_remove(&mut model, spec);
        }

        // Every bound/unbound combination, with and without a context
        for mask in 0u8..8 {
            for g in [None, Some(0), Some(1), Some(2)] {
                for anchor in &quads {
                    let spec = PatternSpec {
                        s: (mask & 1 != 0).then(|| anchor.s),
                        p: (mask & 2 != 0).then(|| anchor.p),
                        o: (mask & 4 != 0).then(|| anchor.o),
                        g,
                    };
                    prop_assert_eq!(store_query(&store, &spec), model_query(&model, &spec));
                }
            }
        }

        // Each stored triple is yielded once by the full wildcard scan
        let all: Vec<_> = store.triples(&TriplePattern::any(), None).unwrap().collect();
        prop_assert_eq!(all.len(), model.len());

        // Asserted counts per graph
        for g in 0..GRAPHS {
            let asserted = model
                .values()
                .filter(|memberships| memberships.get(&graph(g)) == Some(&false))
                .count() as u64;
            prop_assert_eq!(store.len(Some(&graph(g))).unwrap(), asserted);
        }

        // Graph-less len under both modes
        let default_only = model
            .values()
            .filter(|memberships| memberships.get(&GraphName::DefaultGraph) == Some(&false))
            .count() as u64;
        let any_asserted = model
            .values()
            .filter(|memberships| memberships.values().any(|quoted| !quoted))
            .count() as u64;
        prop_assert_eq!(store.len(None).unwrap(), default_only);
        prop_assert_eq!(union.len(None).unwrap(), any_asserted);

        // Reference counts release every term no longer in use
        let memberships: usize = model.values().map(|memberships| memberships.len()).sum();
        for handle in [&store, &union] {
            let stats = handle.statistics().unwrap();
            prop_assert_eq!(stats.triples, model.len());
            prop_assert_eq!(stats.memberships, memberships);
            prop_assert_eq!(stats.terms, model_terms(&model));
        }
    }
}
