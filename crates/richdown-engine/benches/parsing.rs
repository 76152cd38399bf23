use criterion::{Criterion, criterion_group, criterion_main};
use richdown_engine::{parse, serialize};

fn generate_markdown(sections: usize) -> String {
    let mut out = String::new();
    for n in 0..sections {
        out.push_str(&format!("## Section {n}\n\n"));
        out.push_str("A paragraph with **bold**, *italic*, `code`, a [link](https://example.com) and :tada:.\n\n");
        out.push_str("- item one\n- item two\n  - nested\n\n");
        out.push_str("> a quoted line with @someone and #tags\n\n");
        if n % 5 == 0 {
            out.push_str("| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n\n");
        }
    }
    out
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.sample_size(10);

    let content = generate_markdown(100);
    group.bench_function("parse", |b| {
        b.iter(|| std::hint::black_box(parse(std::hint::black_box(&content))));
    });

    let doc = parse(&content);
    group.bench_function("serialize", |b| {
        b.iter(|| std::hint::black_box(serialize(std::hint::black_box(&doc))));
    });

    group.bench_function("roundtrip", |b| {
        b.iter(|| {
            let doc = parse(std::hint::black_box(&content));
            std::hint::black_box(parse(&serialize(&doc)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
