//! Property tests for the greedy chunker.

use medchat_rag::chunking::{Chunker, Chunks, Granularity, GreedyChunker};
use medchat_rag::document::Document;
use proptest::prelude::*;
use serde_json::Map;

fn arb_granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![Just(Granularity::Char), Just(Granularity::Word)]
}

/// Text mixing ASCII words, accented Spanish, whitespace runs and newlines.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-z]{1,12}",
            "[áéíóúñü]{1,6}",
            "[A-Za-z0-9]{20,60}",
            Just(" ".to_string()),
            Just("  ".to_string()),
            Just("\n".to_string()),
            Just("\t".to_string()),
        ],
        0..80,
    )
    .prop_map(|parts| parts.concat())
}

fn document(id: &str, text: String) -> Document {
    Document { id: id.to_string(), text, metadata: Map::new(), source_uri: None }
}

/// Chunks of a document concatenate back to its text, and none exceeds the bound.
mod prop_chunk_round_trip {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_reconstruct_text_within_bound(
            text in arb_text(),
            chunk_size in 1usize..64,
            granularity in arb_granularity(),
        ) {
            let chunker = GreedyChunker::new(chunk_size, granularity);
            let doc = document("record_0", text.clone());
            let chunks = chunker.chunk(&doc);

            let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(&rebuilt, &text);

            for chunk in &chunks {
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(chunk.text.chars().count() <= chunk_size);
                prop_assert_eq!(&chunk.document_id, "record_0");
            }
        }

        #[test]
        fn word_chunks_only_split_oversized_words(
            text in arb_text(),
            chunk_size in 8usize..64,
        ) {
            let chunker = GreedyChunker::new(chunk_size, Granularity::Word);
            let pieces = chunker.split_text(&text);

            // A boundary inside a word is only allowed when its unit alone exceeds the bound.
            let mut offset = 0;
            for piece in pieces.iter().take(pieces.len().saturating_sub(1)) {
                offset += piece.len();
                let before = text[..offset].chars().next_back();
                let after = text[offset..].chars().next();
                if let (Some(b), Some(a)) = (before, after) {
                    if !b.is_whitespace() && !a.is_whitespace() {
                        let start = text[..offset]
                            .rfind(char::is_whitespace)
                            .map(|i| i + text[i..].chars().next().map_or(1, char::len_utf8))
                            .unwrap_or(0);
                        // The unit is the word plus its trailing whitespace.
                        let word_end = text[offset..]
                            .find(char::is_whitespace)
                            .map_or(text.len(), |i| offset + i);
                        let end = text[word_end..]
                            .find(|c: char| !c.is_whitespace())
                            .map_or(text.len(), |i| word_end + i);
                        prop_assert!(text[start..end].chars().count() > chunk_size);
                    }
                }
            }
        }

        #[test]
        fn lazy_sequence_matches_per_document_chunks(
            texts in proptest::collection::vec(arb_text(), 0..6),
            chunk_size in 1usize..40,
        ) {
            let chunker = GreedyChunker::new(chunk_size, Granularity::Word);
            let docs: Vec<Document> = texts
                .into_iter()
                .enumerate()
                .map(|(i, t)| document(&format!("record_{i}"), t))
                .collect();

            let eager: Vec<_> = docs.iter().flat_map(|d| chunker.chunk(d)).collect();
            let lazy: Vec<_> = Chunks::new(&chunker, &docs).collect();
            let again: Vec<_> = chunker.chunks(&docs).collect();

            prop_assert_eq!(&eager, &lazy);
            prop_assert_eq!(&lazy, &again);
        }
    }
}

#[test]
fn default_chunker_uses_512_character_bound() {
    let chunker = GreedyChunker::default();
    assert_eq!(chunker.chunk_size(), 512);
    let text = "paciente ".repeat(200);
    let chunks = chunker.chunk(&document("record_0", text.clone()));
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.text.chars().count() <= 512));
    assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), text);
}
