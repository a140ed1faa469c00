//! Character and word boundaries for deletion commands.
//!
//! Offsets and returned lengths count `char`s; scanning steps over whole
//! grapheme clusters so a combined emoji or accented letter is never split.

use unicode_segmentation::UnicodeSegmentation;

/// Length of the grapheme cluster ending at `offset`.
pub fn char_offset_backward(text: &str, offset: usize) -> usize {
    prefix(text, offset)
        .graphemes(true)
        .next_back()
        .map_or(0, char_len)
}

/// Length of the grapheme cluster starting at `offset`.
pub fn char_offset_forward(text: &str, offset: usize) -> usize {
    suffix(text, offset).graphemes(true).next().map_or(0, char_len)
}

/// Characters between `offset` and the start of the word before it,
/// including any whitespace or punctuation in between.
pub fn word_offset_backward(text: &str, offset: usize) -> usize {
    let graphemes: Vec<&str> = prefix(text, offset).graphemes(true).rev().collect();
    word_length(&graphemes)
}

/// Characters between `offset` and the end of the word after it.
pub fn word_offset_forward(text: &str, offset: usize) -> usize {
    let graphemes: Vec<&str> = suffix(text, offset).graphemes(true).collect();
    word_length(&graphemes)
}

fn word_length(graphemes: &[&str]) -> usize {
    let mut length = 0;
    let mut started = false;
    for (i, grapheme) in graphemes.iter().enumerate() {
        if is_word(grapheme, &graphemes[i + 1..]) {
            started = true;
        } else if started {
            break;
        }
        length += char_len(grapheme);
    }
    length
}

/// Whether `grapheme` belongs to a word, given the graphemes that follow it
/// in scanning order. An apostrophe joins a word when a word follows.
fn is_word(grapheme: &str, rest: &[&str]) -> bool {
    let Some(first) = grapheme.chars().next() else {
        return false;
    };
    if first.is_whitespace() {
        return false;
    }
    if is_chameleon(first) {
        if let Some((next, after)) = rest.split_first() {
            if is_word(next, after) {
                return true;
            }
        }
    }
    !is_punctuation(first)
}

fn is_chameleon(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}')
}

fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation() && !matches!(c, '$' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~');
    }
    matches!(c,
        '\u{00A1}' | '\u{00A7}' | '\u{00AB}' | '\u{00B6}' | '\u{00B7}' | '\u{00BB}' | '\u{00BF}'
        | '\u{037E}' | '\u{0387}' | '\u{055A}'..='\u{055F}' | '\u{0589}' | '\u{05BE}' | '\u{05C0}'
        | '\u{060C}' | '\u{061B}' | '\u{061F}' | '\u{066A}'..='\u{066D}' | '\u{06D4}'
        | '\u{0964}' | '\u{0965}' | '\u{0E4F}' | '\u{0E5A}' | '\u{0E5B}'
        | '\u{2010}'..='\u{2027}' | '\u{2030}'..='\u{2043}' | '\u{2045}'..='\u{2051}' | '\u{2053}'..='\u{205E}'
        | '\u{207D}' | '\u{207E}' | '\u{208D}' | '\u{208E}' | '\u{2308}'..='\u{230B}'
        | '\u{2329}' | '\u{232A}' | '\u{2E00}'..='\u{2E4F}'
        | '\u{3001}'..='\u{3003}' | '\u{3008}'..='\u{3011}' | '\u{3014}'..='\u{301F}' | '\u{3030}' | '\u{303D}'
        | '\u{30A0}' | '\u{30FB}' | '\u{FE10}'..='\u{FE19}' | '\u{FE30}'..='\u{FE52}' | '\u{FE54}'..='\u{FE61}'
        | '\u{FE63}' | '\u{FE68}' | '\u{FE6A}' | '\u{FE6B}' | '\u{FF01}'..='\u{FF03}' | '\u{FF05}'..='\u{FF0A}'
        | '\u{FF0C}'..='\u{FF0F}' | '\u{FF1A}' | '\u{FF1B}' | '\u{FF1F}' | '\u{FF20}' | '\u{FF3B}'..='\u{FF3D}'
        | '\u{FF3F}' | '\u{FF5B}' | '\u{FF5D}' | '\u{FF5F}'..='\u{FF65}')
}

fn char_len(grapheme: &str) -> usize {
    grapheme.chars().count()
}

fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(i, _)| i)
}

fn prefix(text: &str, offset: usize) -> &str {
    &text[..byte_index(text, offset)]
}

fn suffix(text: &str, offset: usize) -> &str {
    &text[byte_index(text, offset)..]
}
