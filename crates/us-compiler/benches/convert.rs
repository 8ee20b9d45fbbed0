use criterion::{black_box, criterion_group, criterion_main, Criterion};

use us_compiler::{convert_userstyle, ScriptMetadata};

fn sample_userstyle(blocks: usize) -> String {
    let mut css = String::from("@namespace url(http://www.w3.org/1999/xhtml);\n");
    for i in 0..blocks {
        css.push_str(&format!(
            "@-moz-document domain(\"site{i}.example\"), url-prefix(\"https://site{i}.example/app/\") {{\n  \
             .header-{i} {{ display: none !important; }}\n  \
             .content-{i} > p {{\n    max-width: none;\n    color: #222;\n  }}\n}}\n"
        ));
        css.push_str(&format!("/* shared {i} */\n.global-{i} {{ margin: 0; }}\n"));
    }
    css
}

fn bench_convert(c: &mut Criterion) {
    let metadata = ScriptMetadata::new("Bench", "bench", "");
    let small = sample_userstyle(10);
    let large = sample_userstyle(1000);

    c.bench_function("convert_10_blocks", |b| {
        b.iter(|| convert_userstyle(black_box(&small), &metadata).unwrap())
    });
    c.bench_function("convert_1000_blocks", |b| {
        b.iter(|| convert_userstyle(black_box(&large), &metadata).unwrap())
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
