#![warn(missing_docs)]
//! Rope Buffer - Rope-based UTF-16 Text Storage for Editors
//!
//! # Overview
//!
//! `rope-buffer` is the storage engine underneath an editor's view layer. It keeps arbitrarily
//! large text in a binary tree of references into shared, append-only UTF-16 buffers, and
//! offers logarithmic-time editing and index translation without ever copying the document.
//!
//! # Core Features
//!
//! - **Shared Buffers**: text is never copied on split; leaves hold windows into
//!   reference-counted buffers, and typing extends a buffer in place when nothing else aliases it
//! - **Fast Index Translation**: O(log n) character ↔ line lookups through cached counts
//! - **Undo / Redo**: structural diffs that keep removed text alive without copying it
//! - **Word Scanning**: "ctrl+arrow" word-start lookups that respect surrogate pairs
//! - **Lazy Iteration**: leaf, code unit, code unit pair and match iterators, both directions
//! - **Change Notifications**: subscribers see every committed modification and a version number
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Rope (edits, undo/redo, queries, events)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Iterators / Words / Search                 │  ← Read paths
//! ├─────────────────────────────────────────────┤
//! │  ModificationsStack                         │  ← History
//! ├─────────────────────────────────────────────┤
//! │  Tree (arena of nodes, cached Counts)       │  ← Index
//! ├─────────────────────────────────────────────┤
//! │  BufferReference → Rc<Buffer>               │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use rope_buffer::Rope;
//!
//! let mut rope = Rope::from_text("fn main() {\n}\n");
//! rope.insert(12, "    println!(\"hi\");\n").unwrap();
//!
//! assert_eq!(rope.line_count(), 4);
//! assert_eq!(rope.line_text(1).as_deref(), Some("    println!(\"hi\");"));
//! assert_eq!(rope.first_char_index_at_line(2), Some(32));
//!
//! rope.undo().unwrap();
//! assert_eq!(rope.to_string(), "fn main() {\n}\n");
//! ```
//!
//! ## Loading and Searching
//!
//! ```rust
//! use rope_buffer::{Rope, SearchOptions, TextEncoding, search};
//!
//! let bytes = "alpha beta\nalphabet".as_bytes();
//! let rope = Rope::from_reader(bytes, TextEncoding::Utf8).unwrap();
//!
//! let plain: Vec<_> = rope.find_all("alpha", 0..rope.char_count()).collect();
//! assert_eq!(plain, vec![0..5, 11..16]);
//!
//! let options = SearchOptions { whole_word: true, ..SearchOptions::default() };
//! let words = search::find_all(&rope, "alpha", options).unwrap();
//! assert_eq!(words.len(), 1);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - append-only UTF-16 buffers
//! - [`buffer_ref`] - windows into shared buffers
//! - [`counts`] - character and line break aggregates
//! - [`modification`] - undo/redo log
//! - [`rope`] - the facade and change notifications
//! - [`iter`] - lazy traversals
//! - [`words`] - word-boundary scanning
//! - [`search`] - regex / whole-word search
//! - [`encoding`] - source decoding
//!
//! # Offsets
//!
//! Every offset is a UTF-16 code unit offset. Characters outside the BMP take two units; edits
//! that would cut such a pair are rejected with [`RopeError::SplitSurrogatePair`].
//!
//! # Logging
//!
//! The crate emits `tracing` events (buffer allocation, stream loading, undo/redo at `debug`;
//! leaf splits and grafts at `trace`) and never installs a subscriber itself.

pub mod buffer;
pub mod buffer_ref;
pub mod config;
pub mod counts;
pub mod encoding;
pub mod error;
pub mod iter;
pub mod modification;
mod node;
pub mod rope;
pub mod search;
pub mod words;

pub use buffer::{Buffer, CharWidth};
pub use buffer_ref::BufferReference;
pub use config::RopeConfig;
pub use counts::Counts;
pub use encoding::TextEncoding;
pub use error::{BufferError, RopeError};
pub use iter::{CharPairs, Chars, Leafs, Matches, RopeChar};
pub use modification::{InsertModification, Modification, ModificationsStack, RemoveModification};
pub use rope::{ModificationCallback, ModificationEvent, ModificationOrigin, Rope};
pub use search::{SearchError, SearchMatch, SearchOptions};
pub use words::CharClass;
