//! Example: a spell-checking wordlist backed by a compact DAWG buffer.
//!
//! Builds a DAWG from sorted words, encodes it with counts, reloads it from
//! the raw bytes and runs the different kinds of query against it.
//!
//! Run with: cargo run --example wordlist

use dawg_cache::dawg::builder::build_dawg;
use dawg_cache::dawg::{CompactDawg, Result};

fn main() -> Result<()> {
    let words = ["BAKE", "BAKED", "BAKER", "CAKE", "CAKED", "FAKE", "LAKE"];
    let builder = build_dawg(words)?;
    println!(
        "Built {} words into {} states and {} edges",
        builder.word_count(),
        builder.node_count(),
        builder.edge_count()
    );

    // The buffer is what would be written to disk or shipped to clients.
    let buf = builder.to_compact_buffer(true)?;
    println!("Compact buffer: {} bytes", buf.len());
    let wordlist = CompactDawg::new(buf)?;

    // Word lookup
    println!("\nWord lookup:");
    for word in ["BAKE", "BAKER", "BAKES", "CAKE", "LAKE", "MAKE"] {
        println!("  {word}: {}", if wordlist.lookup(word) { "yes" } else { "no" });
    }

    // Prefix checking
    println!("\nPrefix checking:");
    for prefix in ["BA", "CAK", "MA", "FAK"] {
        match wordlist.lookup_prefix_counts(prefix) {
            Some(found) => println!("  {prefix}*: {} words", found.suffix_count),
            None => println!("  {prefix}*: none"),
        }
    }

    // Ranks
    println!("\nRanks:");
    for word in ["CAKE", "LAKE"] {
        if let Some(found) = wordlist.lookup_counts(word) {
            println!("  {word}: #{}", found.index);
        }
    }

    // Spelling suggestions
    println!("\nSuggestions:");
    for typo in ["BAKR", "CAJE", "FLAKE", "QQQQ"] {
        match wordlist.lookup_fuzzy(typo) {
            Some(found) => println!("  {typo}: {}", String::from_utf8_lossy(&found.text)),
            None => println!("  {typo}: no suggestion"),
        }
    }

    // Autocomplete
    let next: Vec<_> = wordlist
        .prefix_continuations("BAKE", 5)
        .iter()
        .map(|w| String::from_utf8_lossy(w).into_owned())
        .collect();
    println!("\nAfter BAKE: {next:?}");

    // List all words
    let all: Vec<_> = wordlist
        .iter()
        .map(|w| String::from_utf8_lossy(&w).into_owned())
        .collect();
    println!("\nAll words: {all:?}");
    Ok(())
}
