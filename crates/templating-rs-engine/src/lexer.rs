//! Slot lexer (tokenizer).
//!
//! Splits one line of source text into a stream of [`Token`]s: plain text,
//! `${...}` slots, and escaped slots.
//!
//! ## Syntax
//!
//! | Source | Token |
//! |---|---|
//! | `${content}` | [`Token::Slot`] with `content` |
//! | `# ${content}` | [`Token::Slot`]; the leading `#` and whitespace are consumed |
//! | `!${content}` | [`Token::Escaped`] with `${content}`; the `!` is dropped |
//! | `${` without a matching `}` | plain text |
//!
//! Slot boundaries are found by balancing braces, so slots may nest inside
//! literals (`${'${"Y"}'}`) and several slots may share one line.

/// The character that suppresses expansion of an immediately following slot.
pub const ESCAPE_MARKER: char = '!';

/// A token produced by the slot lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A literal text segment.
    Text(&'a str),
    /// The inner content of a `${...}` slot, as written.
    Slot(&'a str),
    /// An escaped slot, including its `${` and `}` delimiters.
    Escaped(&'a str),
}

/// Tokenizes a source string into a sequence of [`Token`]s.
///
/// Tokenizing never fails: anything that is not a complete slot is text.
///
/// # Examples
///
/// ```
/// use templating_rs_engine::lexer::{tokenize, Token};
///
/// let tokens = tokenize("v = ${pyproject.version} !${env}");
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Text("v = "),
///         Token::Slot("pyproject.version"),
///         Token::Text(" "),
///         Token::Escaped("${env}"),
///     ]
/// );
/// ```
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find("${") {
        let open = cursor + offset;
        let Some(close) = find_close(source, open + 2) else {
            // Unterminated: treat this `${` as text and keep scanning.
            cursor = open + 2;
            continue;
        };

        let before = &source[text_start..open];
        if before.ends_with(ESCAPE_MARKER) {
            push_text(&mut tokens, &before[..before.len() - ESCAPE_MARKER.len_utf8()]);
            tokens.push(Token::Escaped(&source[open..=close]));
        } else {
            push_text(&mut tokens, &before[..comment_prefix_start(before)]);
            tokens.push(Token::Slot(&source[open + 2..close]));
        }

        cursor = close + 1;
        text_start = cursor;
    }

    push_text(&mut tokens, &source[text_start..]);
    tokens
}

/// Finds the byte index of the `}` closing a slot whose content starts at `start`.
fn find_close(source: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in source[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Returns where the text preceding a slot ends once a trailing `#` comment
/// marker (plus whitespace) is consumed by the slot.
fn comment_prefix_start(before: &str) -> usize {
    let trimmed = before.trim_end();
    if trimmed.ends_with('#') {
        trimmed.len() - 1
    } else {
        before.len()
    }
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
}
