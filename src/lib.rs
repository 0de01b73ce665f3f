//! # dawg-cache
//!
//! Minimal [DAWGs](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (Directed Acyclic Word Graphs) over byte strings, with a compact,
//! checksummed binary format that can be stored and queried in place.
//!
//! Words are inserted in sorted order and minimized incrementally, following
//! [Daciuk et al. (2000)](https://arxiv.org/abs/cs/0007009v1). The finished
//! automaton is encoded once into a flat buffer; a [`CompactDawg`](dawg::CompactDawg)
//! answers every query straight from those bytes.
//!
//! ## Features
//!
//! - **Exact and prefix lookup** in O(word length) binary searches
//! - **Counted buffers**: rank of a word, number of words below a prefix,
//!   and the word at a given rank
//! - **Ordered iteration**, optionally scoped to a prefix
//! - **Fuzzy lookup** tolerating one inserted, deleted or substituted byte
//! - **Shareable**: [`CompactDawg`](dawg::CompactDawg) is `Clone + Send + Sync`
//!   over reference-counted bytes
//!
//! ## Quick Start
//!
//! Building requires the `builder` feature, enabled by default:
//!
//! ```
//! # #[cfg(feature = "builder")] {
//! use dawg_cache::dawg::builder::build_dawg;
//! use dawg_cache::dawg::CompactDawg;
//!
//! let builder = build_dawg(["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"]).unwrap();
//! let buf = builder.to_compact_buffer(true).unwrap();
//!
//! let dawg = CompactDawg::new(buf).unwrap();
//! assert!(dawg.lookup("CAKE"));
//! assert!(!dawg.lookup("AKE"));
//! assert!(dawg.lookup_prefix("LA"));
//! assert_eq!(dawg.lookup_counts("FAKE").unwrap().index, 2);
//! # }
//! ```
//!
//! ## Loading a Stored Buffer
//!
//! Reading needs no builder. Buffers are validated on load:
//!
//! ```
//! use dawg_cache::dawg::{CompactDawg, FormatError};
//!
//! let err = CompactDawg::new(&b"not a dawg buffer"[..]).unwrap_err();
//! assert_eq!(err, FormatError::BadMagic);
//! ```
//!
//! ## Streams
//!
//! ```
//! # #[cfg(feature = "builder")] {
//! use dawg_cache::dawg::{build_from_reader, write_words, CompactDawg};
//!
//! let builder = build_from_reader(&b"ant\nbee\ncat\n"[..]).unwrap();
//! let dawg = CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap();
//!
//! let mut out = Vec::new();
//! write_words(&dawg, &mut out).unwrap();
//! assert_eq!(out, b"ant\nbee\ncat\n");
//! # }
//! ```

#![warn(missing_docs)]

/// Core DAWG types: builder, compact format, reader, iteration and fuzzy lookup.
pub mod dawg;
