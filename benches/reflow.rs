//! Benchmarks for the live editing pipeline.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use synapse::editor::{Editor, InputEvent};

fn bench_type_into_paragraph(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/notes.md");
    let caret = md.find("loose ends").unwrap_or(0);
    c.bench_function("type_into_paragraph", |b| {
        b.iter_batched(
            || {
                let mut editor = Editor::open(md).unwrap();
                editor.set_caret(caret);
                editor
            },
            |mut editor| {
                for ch in "abc".chars() {
                    editor.handle_input(&mut InputEvent::insert_text(ch.to_string()));
                }
                black_box(editor)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_caret_walk(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/notes.md");
    let mut editor = Editor::open(md).unwrap();
    let mut offset = 0;
    c.bench_function("caret_walk", |b| {
        b.iter(|| {
            offset = (offset + 17) % md.len();
            black_box(editor.set_caret(offset))
        });
    });
}

criterion_group!(benches, bench_type_into_paragraph, bench_caret_walk);
criterion_main!(benches);
