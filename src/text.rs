//! Normalización de texto y construcción del corpus de frases.
//!
//! Todo el motor trabaja sobre texto en minúsculas y sin la puntuación de
//! `PUNCTUATION`. Las palabras se separan por espacios simples: una secuencia
//! de espacios produce palabras vacías, igual que en el cliente original.

/// Caracteres eliminados por `normalize`. Incluye guion y guion bajo.
const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '_', '-', '`', '~',
    '(', ')',
];

/// Separadores de frase usados por `build_corpus`.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '\n'];

/// Longitud mínima (exclusiva, en caracteres) de una frase del corpus.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Pasa a minúsculas y elimina la puntuación.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .collect()
}

/// Divide en palabras por espacios simples. Texto vacío → sin palabras.
pub fn split_words(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(' ').collect()
}

/// Longitud de una palabra en caracteres (no en bytes).
pub fn char_len(word: &str) -> usize {
    word.chars().count()
}

/// Trocea el texto en frases normalizadas, descartando las cortas.
pub fn build_corpus(text: &str) -> Vec<String> {
    text.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|segment| char_len(segment) > MIN_SENTENCE_CHARS)
        .map(normalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_lowercases() {
        assert_eq!(normalize("Xin Chào, Bạn!"), "xin chào bạn");
        assert_eq!(normalize("a-b_c (d) {e}"), "abc d e");
        // '?' no forma parte del conjunto
        assert_eq!(normalize("Ai?"), "ai?");
    }

    #[test]
    fn split_words_keeps_empty_tokens_between_double_spaces() {
        assert_eq!(split_words("con  mèo"), vec!["con", "", "mèo"]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn build_corpus_filters_short_segments() {
        let text = "Ngắn quá. Đây là một câu đủ dài!\nCâu thứ ba cũng đủ dài? ok";
        let corpus = build_corpus(text);
        assert_eq!(
            corpus,
            vec!["đây là một câu đủ dài", "câu thứ ba cũng đủ dài"]
        );
    }

    #[test]
    fn build_corpus_counts_characters_not_bytes() {
        // 10 caracteres exactos con diacríticos: se descarta (límite exclusivo)
        assert!(build_corpus("ẩẩẩẩẩẩẩẩẩẩ").is_empty());
        assert_eq!(build_corpus("ẩẩẩẩẩẩẩẩẩẩẩ").len(), 1);
    }

    #[test]
    fn build_corpus_of_empty_text_is_empty() {
        assert!(build_corpus("").is_empty());
        assert!(build_corpus("...\n\n!!").is_empty());
    }
}
