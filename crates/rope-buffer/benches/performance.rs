use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rope_buffer::Rope;

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (rope-buffer benchmark line)\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let rope = Rope::from_text(black_box(&text));
            black_box(rope.line_count());
        })
    });
}

fn bench_stream_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("stream_open/50k_lines", |b| {
        b.iter(|| {
            let rope =
                Rope::from_reader(black_box(text.as_bytes()), Default::default()).unwrap();
            black_box(rope.char_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || Rope::from_text(&text),
            |mut rope| {
                let mut offset = rope.char_count() / 2;
                for _ in 0..100 {
                    rope.insert(offset, "x").unwrap();
                    offset += 1;
                }
                black_box(rope.leaf_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_scattered_edits_and_undo(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("scattered_edits/200_edits_then_undo", |b| {
        b.iter_batched(
            || Rope::from_text(&text),
            |mut rope| {
                for i in 0..200 {
                    let offset = (i * 7919) % (rope.char_count() - 16);
                    if i % 2 == 0 {
                        rope.insert(offset, "edit").unwrap();
                    } else {
                        rope.remove(offset, 8).unwrap();
                    }
                }
                while rope.undo().unwrap().is_some() {}
                black_box(rope.char_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_line_lookup(c: &mut Criterion) {
    let text = large_text(50_000);
    let rope = Rope::from_text(&text);
    c.bench_function("line_lookup/1000_lines", |b| {
        b.iter(|| {
            for line in (0..50_000).step_by(50) {
                let start = rope.first_char_index_at_line(black_box(line)).unwrap();
                black_box(rope.line_index_for_char(start));
            }
        })
    });
}

fn bench_find_all(c: &mut Criterion) {
    let text = large_text(10_000);
    let rope = Rope::from_text(&text);
    c.bench_function("find_all/lazy_dog", |b| {
        b.iter(|| black_box(rope.find_all("lazy dog", 0..rope.char_count()).count()))
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_stream_open,
    bench_typing_in_middle,
    bench_scattered_edits_and_undo,
    bench_line_lookup,
    bench_find_all
);
criterion_main!(benches);
