//! Pure text helpers shared by the crawl pipeline: the translate-or-not
//! language heuristic and the chunker feeding the summarizer.

/// True when `text` contains strictly more ASCII alphabetic characters than
/// Hangul characters (compatibility jamo U+3131..U+318E plus the syllable
/// block U+AC00..U+D7A3). Ties favor the Korean side, so mixed titles are
/// left untranslated.
pub fn is_mostly_english(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut english = 0usize;
    let mut korean = 0usize;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            english += 1;
        } else if is_hangul(c) {
            korean += 1;
        }
    }
    english > korean
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{3131}'..='\u{318E}' | '\u{AC00}'..='\u{D7A3}')
}

/// Splits `text` into an ordered sequence of chunks of at most `max_chars`
/// characters each. Breaks fall on sentence boundaries where possible; only
/// a single sentence longer than the bound is hard-split. Concatenating the
/// chunks reproduces the input.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in text.split_inclusive(['.', '!', '?', '\n']) {
        let len = sentence.chars().count();
        if current_len + len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if len > max_chars {
            let chars: Vec<char> = sentence.chars().collect();
            for piece in chars.chunks(max_chars) {
                if piece.len() == max_chars {
                    chunks.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
        } else {
            current.push_str(sentence);
            current_len += len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
