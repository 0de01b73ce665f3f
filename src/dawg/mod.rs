/// Incremental construction of a minimal automaton from sorted words.
#[cfg(feature = "builder")]
pub mod builder;
/// Serialization of a finished automaton into the compact format.
#[cfg(feature = "builder")]
pub(crate) mod encoder;
/// Arena states and edges used during construction.
#[cfg(feature = "builder")]
pub mod state;

/// Error types.
pub mod error;
/// Compact buffer header and validation.
pub mod format;
/// Single-edit approximate lookup.
pub mod fuzzy;
/// Ordered enumeration of stored words.
pub mod iter;
/// Queries over a validated compact buffer.
pub mod reader;

#[cfg(feature = "builder")]
pub use builder::{build_dawg, build_from_reader, Builder, IntoWord};
pub use error::{BuildError, Error, FormatError, Result};
pub use format::{validate, Header, Layout};
pub use fuzzy::FuzzyMatch;
pub use iter::{write_words, Words};
pub use reader::{CompactDawg, CountedMatch};

#[cfg(test)]
#[cfg(feature = "builder")]
mod test {
    use super::builder::{build_dawg, build_from_reader};
    use super::CompactDawg;
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    const FIXTURE: &str = "testdata/words.txt";

    fn fixture_words() -> Vec<String> {
        let file = File::open(FIXTURE).unwrap();
        BufReader::new(file).lines().map(|line| line.unwrap()).collect()
    }

    fn fixture_dawg(preserve_counts: bool) -> CompactDawg {
        let builder = build_from_reader(BufReader::new(File::open(FIXTURE).unwrap())).unwrap();
        CompactDawg::new(builder.to_compact_buffer(preserve_counts).unwrap()).unwrap()
    }

    #[test]
    fn all_words() {
        let words = fixture_words();
        let dawg = fixture_dawg(true);
        assert_eq!(dawg.word_count(), Some(words.len() as u32));
        for (i, word) in words.iter().enumerate() {
            assert!(dawg.lookup(word), "{}", word);
            let found = dawg.lookup_counts(word).unwrap();
            assert_eq!(found.index, i as u32, "{}", word);
            assert_eq!(dawg.lookup_index(i as u32).unwrap().text, word.as_bytes());
        }
        let iterated: Vec<_> = dawg.iter().map(|w| String::from_utf8(w).unwrap()).collect();
        assert_eq!(iterated, words);

        // test some non-words
        assert!(!dawg.lookup("YEOMAN"));
        assert!(!dawg.lookup("yeomen"));
        assert!(!dawg.lookup("wrongheadednesses"));
        assert!(!dawg.lookup("testab"));
    }

    #[test]
    fn plain_and_counted_agree() {
        let plain = fixture_dawg(false);
        let counted = fixture_dawg(true);
        assert!(plain.structure_len() < counted.structure_len());
        assert!(plain.iter().eq(counted.iter()));
        for word in fixture_words() {
            assert!(plain.lookup(&word));
        }
    }

    #[test]
    fn fixture_fuzzy() {
        let dawg = fixture_dawg(false);
        let fuzzy = |query: &str| {
            dawg.lookup_fuzzy(query)
                .map(|m| (String::from_utf8(m.text).unwrap(), m.exact_match))
        };

        assert_eq!(fuzzy("yeniseian"), Some(("yeniseian".into(), true)));
        // missing a letter at the beginning, middle and end
        assert_eq!(fuzzy("eomaness"), Some(("yeomaness".into(), false)));
        assert_eq!(fuzzy("yeoaness"), Some(("yeomaness".into(), false)));
        assert_eq!(fuzzy("yeomanes"), Some(("yeomaness".into(), false)));
        // an extra letter at the beginning, middle and end
        assert_eq!(fuzzy("tyeniseian"), Some(("yeniseian".into(), false)));
        assert_eq!(fuzzy("yenisteian"), Some(("yeniseian".into(), false)));
        assert_eq!(fuzzy("yeniseiant"), Some(("yeniseian".into(), false)));
        // substitutions
        assert_eq!(fuzzy("ake"), Some(("ace".into(), false)));
        assert_eq!(fuzzy("caxt"), Some(("cat".into(), false)));
        // more than one edit away
        assert_eq!(fuzzy("wrongheeeeadedness"), None);
        assert_eq!(fuzzy("wrogheadness"), None);
        assert_eq!(fuzzy("zzz"), None);
    }

    #[test]
    fn test_words_scenario() {
        let builder = build_dawg(["test", "testable", "testament", "testing"]).unwrap();
        assert_eq!(builder.word_count(), 4);
        let dawg = CompactDawg::new(builder.to_compact_buffer(true).unwrap()).unwrap();

        assert!(dawg.lookup("testing"));
        assert!(!dawg.lookup("testin"));
        assert!(dawg.lookup_prefix("testin"));
        assert_eq!(dawg.lookup_counts("testing").unwrap().index, 3);
        assert_eq!(dawg.lookup_prefix_counts("testa").unwrap().suffix_count, 2);
        assert_eq!(dawg.lookup_index(1).unwrap().text, b"testable");
        assert_eq!(
            dawg.prefix_continuations("test", 5),
            [b"testa".to_vec(), b"testi".to_vec()]
        );
        assert_eq!(dawg.lookup_fuzzy("testng").unwrap().text, b"testing");
    }
}
