use crate::error::{QueryError, Result};

/// Characters that always form a token of their own.
pub const SPECIAL_CHARS: [char; 11] = ['!', '=', '>', '<', '(', ')', '&', '|', ':', '^', '$'];

/// Check if a character is an operator character
pub fn is_special(ch: char) -> bool {
    SPECIAL_CHARS.contains(&ch)
}

/// Split a raw query into lexical tokens.
///
/// Single pass, no backtracking:
/// - whitespace outside quotes separates tokens and is dropped
/// - a double-quoted span is taken verbatim and ends the token it is
///   part of, so `ab"c d"e` becomes `abc d`, `e`
/// - every special character is its own one-character token and ends the
///   word being built, so `year<2004` becomes `year`, `<`, `2004`
///
/// Multi-character operators (`&&`, `<=`, ...) are not recognised here;
/// they are fused afterwards by [`replace`](super::replace::replace).
pub fn tokenize(query: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars = query.chars();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            // the literal joins the word in progress: `ab"cd"` is `abcd`
            let mut terminated = false;
            for c in chars.by_ref() {
                if c == '"' {
                    terminated = true;
                    break;
                }
                word.push(c);
            }

            if !terminated {
                return Err(QueryError::syntax("unterminated string literal"));
            }
            flush_word(&mut tokens, &mut word);
        } else if ch.is_whitespace() {
            flush_word(&mut tokens, &mut word);
        } else if is_special(ch) {
            flush_word(&mut tokens, &mut word);
            tokens.push(ch.to_string());
        } else {
            word.push(ch);
        }
    }

    flush_word(&mut tokens, &mut word);
    Ok(tokens)
}

fn flush_word(tokens: &mut Vec<String>, word: &mut String) {
    if !word.is_empty() {
        tokens.push(std::mem::take(word));
    }
}
