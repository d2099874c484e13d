use pretty_assertions::assert_eq;
use rope_buffer::{Modification, ModificationOrigin, Rope, RopeConfig};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_undo_returns_caret_and_restores_text() {
    let mut rope = Rope::from_text("hello world");
    rope.insert(11, "!").unwrap();
    rope.remove(0, 6).unwrap();
    rope.replace(0, 5, "there").unwrap();
    assert_eq!(rope.to_string(), "there!");
    assert_eq!(rope.undo_depth(), 3);

    // Undoing a replace puts the caret after the restored text.
    assert_eq!(rope.undo().unwrap(), Some(5));
    assert_eq!(rope.to_string(), "world!");
    // Undoing a removal puts the caret after the re-inserted text.
    assert_eq!(rope.undo().unwrap(), Some(6));
    assert_eq!(rope.to_string(), "hello world!");
    // Undoing an insertion puts the caret where the text started.
    assert_eq!(rope.undo().unwrap(), Some(11));
    assert_eq!(rope.to_string(), "hello world");

    assert_eq!(rope.undo().unwrap(), None);
    assert!(!rope.can_undo());
    assert_eq!(rope.redo_depth(), 3);
    rope.check_invariants().unwrap();
}

#[test]
fn test_redo_reapplies_in_order() {
    let mut rope = Rope::from_text("hello world");
    rope.insert(11, "!").unwrap();
    rope.remove(0, 6).unwrap();
    rope.replace(0, 5, "there").unwrap();
    while rope.undo().unwrap().is_some() {}

    assert_eq!(rope.redo().unwrap(), Some(12));
    assert_eq!(rope.to_string(), "hello world!");
    assert_eq!(rope.redo().unwrap(), Some(0));
    assert_eq!(rope.to_string(), "world!");
    assert_eq!(rope.redo().unwrap(), Some(5));
    assert_eq!(rope.to_string(), "there!");
    assert_eq!(rope.redo().unwrap(), None);

    assert_eq!(rope.undo_depth(), 3);
    rope.check_invariants().unwrap();
}

#[test]
fn test_new_edit_clears_redo() {
    let mut rope = Rope::from_text("abc");
    rope.insert(3, "d").unwrap();
    rope.undo().unwrap();
    assert!(rope.can_redo());

    rope.insert(0, "x").unwrap();
    assert!(!rope.can_redo());
    assert_eq!(rope.redo().unwrap(), None);
    assert_eq!(rope.to_string(), "xabc");
}

#[test]
fn test_undo_all_restores_original_across_leaves() {
    let config = RopeConfig::with_capacities(2, 4);
    let original = "The quick brown fox\njumps over\nthe lazy dog";
    let mut rope = Rope::from_text_with_config(original, config).unwrap();

    rope.insert(4, "very ").unwrap();
    rope.remove(10, 12).unwrap();
    rope.replace(0, 3, "A").unwrap();
    rope.insert(rope.char_count(), "\n").unwrap();
    rope.remove(0, rope.char_count()).unwrap();
    assert!(rope.is_empty());

    for _ in 0..5 {
        assert!(rope.undo().unwrap().is_some());
        rope.check_invariants().unwrap();
    }
    assert_eq!(rope.to_string(), original);

    for _ in 0..5 {
        assert!(rope.redo().unwrap().is_some());
        rope.check_invariants().unwrap();
    }
    assert!(rope.is_empty());
}

#[test]
fn test_removed_text_is_kept_by_reference() {
    let mut rope = Rope::from_text("keep this text");
    rope.remove(5, 5).unwrap();

    let Some(Modification::Remove(remove)) = rope.modifications().last_undo() else {
        panic!("expected a removal");
    };
    assert_eq!(remove.removed_text(), "this ");
    // The removed window still shares the original buffer with the remaining leaves.
    assert!(remove.buffer_refs.iter().all(|r| r.ref_count() > 1));

    rope.clear_history();
    assert!(!rope.can_undo());
    assert_eq!(rope.to_string(), "keep text");
}

#[test]
fn test_subscribers_see_every_committed_change() {
    type Seen = Vec<(ModificationOrigin, usize, usize, usize, u64)>;
    let seen: Rc<RefCell<Seen>> = Rc::new(RefCell::new(Vec::new()));

    let mut rope = Rope::new();
    let sink = Rc::clone(&seen);
    rope.subscribe(move |event| {
        let m = event.modification;
        sink.borrow_mut().push((
            event.origin,
            m.start(),
            m.inserted_len(),
            m.removed_len(),
            event.version,
        ));
    });

    rope.insert(0, "ab").unwrap();
    rope.remove(0, 1).unwrap();
    rope.undo().unwrap();
    rope.redo().unwrap();
    assert!(rope.insert(99, "x").is_err());
    rope.undo().unwrap();
    rope.undo().unwrap();
    // Nothing left to undo: no event.
    rope.undo().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            (ModificationOrigin::Edit, 0, 2, 0, 1),
            (ModificationOrigin::Edit, 0, 0, 1, 2),
            (ModificationOrigin::Undo, 0, 1, 0, 3),
            (ModificationOrigin::Redo, 0, 0, 1, 4),
            (ModificationOrigin::Undo, 0, 1, 0, 5),
            (ModificationOrigin::Undo, 0, 0, 2, 6),
        ]
    );
    assert_eq!(rope.version(), 6);
    assert!(rope.is_empty());
}
