//! Edit session example
//!
//! Loads a document, edits it, and walks the undo history while a subscriber prints every
//! committed change. Run with `RUST_LOG=rope_buffer=trace` to see the rope's own events.

use rope_buffer::{Rope, RopeConfig, TextEncoding};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let source = "fn main() {\n    println!(\"Hello, World!\");\n}\n";
    let config = RopeConfig {
        stream_chunk_size: 16,
        ..RopeConfig::with_capacities(8, 64)
    };
    let mut rope = Rope::from_reader_with_config(source.as_bytes(), TextEncoding::Utf8, config)
        .expect("loading from memory cannot fail");

    println!("1. Loaded document:");
    print_document(&rope);

    rope.subscribe(|event| {
        let m = event.modification;
        println!(
            "  change #{} ({:?}): at {} removed {} inserted {}",
            event.version,
            event.origin,
            m.start(),
            m.removed_len(),
            m.inserted_len()
        );
    });

    println!("\n2. Editing:");
    let hello = rope
        .find_all("Hello", 0..rope.char_count())
        .next()
        .expect("sample contains Hello");
    rope.replace(hello.start, hello.len(), "Goodbye").unwrap();
    let end_of_body = rope.first_char_index_at_line(2).unwrap();
    rope.insert(end_of_body, "    let answer = 42;\n").unwrap();
    print_document(&rope);

    println!("\n3. Word jumps on line 2:");
    let mut caret = rope.first_char_index_at_line(2).unwrap();
    caret = rope.skip_whitespaces(caret);
    let line_end = caret + rope.line_text(2).unwrap().trim_start().len();
    while caret < line_end {
        let next = rope.next_word_start(caret, true);
        println!("  {caret:>3} -> {next:>3}  {:?}", rope.text(caret..next));
        caret = next;
    }

    println!("\n4. Undo everything:");
    while let Some(caret) = rope.undo().unwrap() {
        println!("  caret now at {caret}");
    }
    print_document(&rope);

    println!("\n5. Redo once:");
    rope.redo().unwrap();
    print_document(&rope);
}

fn print_document(rope: &Rope) {
    println!(
        "  {} code units, {} lines, {} leaves, depth {}",
        rope.char_count(),
        rope.line_count(),
        rope.leaf_count(),
        rope.depth()
    );
    for line in 0..rope.line_count() {
        println!("  {line:>2} | {}", rope.line_text(line).unwrap_or_default());
    }
}
