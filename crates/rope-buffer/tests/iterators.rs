use pretty_assertions::assert_eq;
use rope_buffer::{CharWidth, Rope, RopeConfig};

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn small(text: &str) -> Rope {
    Rope::from_text_with_config(text, RopeConfig::with_capacities(2, 4)).unwrap()
}

#[test]
fn test_leafs_cover_range_in_order() {
    let rope = small("the quick brown fox");
    assert!(rope.leaf_count() > 1);

    let all: Vec<u16> = rope.leafs(0..rope.char_count()).flatten().copied().collect();
    assert_eq!(all, units("the quick brown fox"));
    assert!(rope.leafs(0..rope.char_count()).all(|slice| slice.len() <= 4));

    let middle: Vec<u16> = rope.leafs(5..9).flatten().copied().collect();
    assert_eq!(middle, units("uick"));

    let mut reversed: Vec<&[u16]> = rope.leafs_rev(5..9).collect();
    reversed.reverse();
    assert_eq!(reversed.concat(), units("uick"));
}

#[test]
fn test_chars_forward_and_reverse() {
    let rope = small("abcdefghij");
    let forward: Vec<u16> = rope.chars(3..8).map(|c| c.unit).collect();
    assert_eq!(forward, units("defgh"));

    let backward: Vec<u16> = rope.chars_rev(0..10).map(|c| c.unit).collect();
    assert_eq!(String::from_utf16(&backward).unwrap(), "jihgfedcba");

    assert_eq!(rope.chars(2..10).len(), 8);
    assert_eq!(rope.chars(8..100).len(), 2);
    assert_eq!(rope.chars(20..30).count(), 0);
    assert_eq!(rope.chars(6..3).count(), 0);
}

#[test]
fn test_chars_meet_in_the_middle() {
    let rope = small("abcdefgh");
    let mut chars = rope.chars(0..8);
    let mut front = Vec::new();
    let mut back = Vec::new();
    while let Some(c) = chars.next() {
        front.push(c.unit);
        if let Some(c) = chars.next_back() {
            back.push(c.unit);
        }
    }
    back.reverse();
    front.extend(back);
    assert_eq!(front, units("abcdefgh"));
    assert!(chars.next().is_none());
}

#[test]
fn test_char_pairs_expose_lookahead() {
    let rope = Rope::from_text("a\u{1F600}");
    let pairs: Vec<_> = rope
        .char_pairs(0..3)
        .map(|(c, next)| (c.width, next.map(|n| n.width)))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (CharWidth::Single, Some(CharWidth::PairStart)),
            (CharWidth::PairStart, Some(CharWidth::PairContinuation)),
            (CharWidth::PairContinuation, None),
        ]
    );
}

#[test]
fn test_ranges_never_cut_surrogate_pairs() {
    let rope = Rope::from_text("a\u{1F600}b");

    let widened: Vec<CharWidth> = rope.chars(2..3).map(|c| c.width).collect();
    assert_eq!(widened, vec![CharWidth::PairStart, CharWidth::PairContinuation]);

    let end_widened: Vec<u16> = rope.chars(0..2).map(|c| c.unit).collect();
    assert_eq!(end_widened, units("a\u{1F600}"));

    let first = rope.chars_rev(0..2).last().unwrap();
    assert_eq!(first.unit, u16::from(b'a'));
}

#[test]
fn test_surrogate_pairs_never_straddle_leaves() {
    let text = "\u{1F600}".repeat(9);
    let rope = Rope::from_text_with_config(&text, RopeConfig::with_capacities(2, 3)).unwrap();
    for slice in rope.leafs(0..rope.char_count()) {
        assert_eq!(slice.len() % 2, 0);
    }
    assert_eq!(rope.to_string(), text);
    rope.check_invariants().unwrap();
}

#[test]
fn test_find_all_is_lazy_and_non_overlapping() {
    let rope = small("abcabcab");
    let hits: Vec<_> = rope.find_all("ab", 0..8).collect();
    assert_eq!(hits, vec![0..2, 3..5, 6..8]);

    let limited: Vec<_> = rope.find_all("ab", 1..8).collect();
    assert_eq!(limited, vec![3..5, 6..8]);

    // Matches must lie completely inside the range.
    let clipped: Vec<_> = rope.find_all("ab", 0..7).collect();
    assert_eq!(clipped, vec![0..2, 3..5]);

    let repeated: Vec<_> = small("aaaa").find_all("aa", 0..4).collect();
    assert_eq!(repeated, vec![0..2, 2..4]);

    assert_eq!(rope.find_all("", 0..8).count(), 0);
    assert_eq!(rope.find_all("zz", 0..8).count(), 0);
    assert_eq!(rope.find_all("abcabcabc", 0..8).count(), 0);

    // A fresh iterator starts over.
    let mut first = rope.find_all("c", 0..8);
    assert_eq!(first.next(), Some(2..3));
    assert_eq!(rope.find_all("c", 0..8).count(), 2);
}

#[test]
fn test_iterators_see_edits() {
    let mut rope = small("hello world");
    rope.insert(5, ",").unwrap();
    rope.remove(6, 1).unwrap();
    let text: String = rope.decoded_chars(0..rope.char_count()).collect();
    assert_eq!(text, "hello,world");
    assert_eq!(rope.find_all("o", 0..rope.char_count()).count(), 2);
}
