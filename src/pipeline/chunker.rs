use crate::core::models::Chunk;

/// Splits `text` into chunks of at most `max_words` whitespace-separated words.
///
/// Words are accumulated greedily in original order; the last chunk may be
/// shorter. Text with no words yields no chunks. A `max_words` of zero is
/// treated as one.
#[must_use]
pub fn chunk_text(text: &str, max_words: usize) -> Vec<Chunk> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    words
        .chunks(max_words)
        .enumerate()
        .map(|(index, words)| Chunk {
            index,
            text: words.join(" "),
            word_count: words.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn splits_into_bounded_chunks() {
        let chunks = chunk_text(&words(2500), 1000);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.word_count).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = chunk_text(&words(2000), 1000);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(chunk_text("", 1000).is_empty());
        assert!(chunk_text(" \n\t  \r\n", 1000).is_empty());
    }

    #[test]
    fn zero_bound_is_treated_as_one() {
        let chunks = chunk_text("a b c", 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn chunk_text_normalizes_inner_whitespace() {
        let chunks = chunk_text("alpha\n\nbeta\tgamma", 2);
        assert_eq!(chunks[0].text, "alpha beta");
        assert_eq!(chunks[1].text, "gamma");
    }
}
