use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use samyama_triplestore::{GraphName, RdfTerm, Triple, TriplePattern, TripleStore};

fn person(i: usize) -> RdfTerm {
    RdfTerm::iri(&format!("http://example.org/person/{}", i)).unwrap()
}

fn predicate(name: &str) -> RdfTerm {
    RdfTerm::iri(&format!("http://xmlns.com/foaf/0.1/{}", name)).unwrap()
}

fn populated(size: usize) -> TripleStore {
    let mut store = TripleStore::in_memory();
    let knows = predicate("knows");
    let age = predicate("age");
    let graph = GraphName::iri("http://example.org/social").unwrap();
    for i in 0..size {
        store
            .insert(Triple::new(person(i), age.clone(), RdfTerm::literal((i % 100).to_string())))
            .unwrap();
        store
            .add(&Triple::new(person(i), knows.clone(), person((i + 1) % size)), &graph, false)
            .unwrap();
    }
    store
}

/// Benchmark insertion into the default graph
fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("triple_insertion");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = TripleStore::in_memory();
                let age = predicate("age");
                for i in 0..size {
                    store
                        .insert(Triple::new(person(i), age.clone(), RdfTerm::literal(i.to_string())))
                        .unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Benchmark each bound-term shape against the same store
fn bench_pattern_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_shapes");
    let store = populated(10_000);
    let shapes = [
        ("s", TriplePattern::any().with_subject(person(42))),
        ("p", TriplePattern::any().with_predicate(predicate("knows"))),
        ("o", TriplePattern::any().with_object(RdfTerm::literal("42"))),
        ("so", TriplePattern::any().with_subject(person(42)).with_object(person(43))),
        ("po", TriplePattern::any().with_predicate(predicate("age")).with_object(RdfTerm::literal("7"))),
    ];

    for (name, pattern) in shapes.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), pattern, |b, pattern| {
            b.iter(|| store.triples(pattern, None).unwrap().count());
        });
    }
    group.finish();
}

/// Benchmark a graph-bounded scan
fn bench_graph_scan(c: &mut Criterion) {
    let store = populated(10_000);
    let graph = GraphName::iri("http://example.org/social").unwrap();
    let pattern = TriplePattern::any().with_subject(person(42));

    c.bench_function("graph_scan_by_subject", |b| {
        b.iter(|| store.triples(&pattern, Some(&graph)).unwrap().count());
    });
}

criterion_group!(benches, bench_insertion, bench_pattern_shapes, bench_graph_scan);
criterion_main!(benches);
