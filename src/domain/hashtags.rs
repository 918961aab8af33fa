//! Hashtag extraction grammar.
//!
//! A tag is either `#(` followed by free text (first character
//! non-whitespace, no newline) closed by `)` and a whitespace delimiter, or
//! a bare `#` followed by a non-whitespace run up to the next whitespace.
//! The parenthesized form exists so tags can contain spaces, e.g.
//! `#(rust async)`. Extraction is pure and deterministic; consumers decide
//! whether to deduplicate the result.

/// Extract hashtag names from `content`, left to right, non-overlapping.
///
/// First-occurrence order is preserved and duplicates are kept. A trailing
/// whitespace sentinel is appended internally so a tag in final position
/// without a following delimiter is still captured.
pub fn parse_hashtags(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().chain(std::iter::once(' ')).collect();
    let mut tags = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '#' {
            i += 1;
            continue;
        }
        if let Some((tag, next)) = match_parenthesized(&chars, i).or_else(|| match_bare(&chars, i))
        {
            tags.push(tag);
            i = next;
        } else {
            i += 1;
        }
    }

    tags
}

/// Match `#(` text `)` whitespace at `start`, returning the inner text and
/// the scan position past the delimiter.
///
/// The inner text must begin with a non-whitespace character and may not
/// span a newline. The earliest `)` followed by whitespace closes the tag;
/// an unclosed `)` stays part of the text.
fn match_parenthesized(chars: &[char], start: usize) -> Option<(String, usize)> {
    if chars.get(start + 1) != Some(&'(') {
        return None;
    }
    let first = *chars.get(start + 2)?;
    if first.is_ascii_whitespace() {
        return None;
    }

    let mut end = start + 3;
    loop {
        let ch = *chars.get(end)?;
        if ch == '\n' {
            return None;
        }
        if ch == ')' && next_is_delimiter(chars, end + 1) {
            let tag = chars[start + 2..end].iter().collect();
            return Some((tag, end + 2));
        }
        end += 1;
    }
}

/// Match `#` run whitespace at `start`, returning the run and the scan
/// position past the delimiter.
fn match_bare(chars: &[char], start: usize) -> Option<(String, usize)> {
    let first = *chars.get(start + 1)?;
    if first.is_ascii_whitespace() {
        return None;
    }

    let mut end = start + 2;
    while let Some(&ch) = chars.get(end) {
        if ch.is_ascii_whitespace() {
            let tag = chars[start + 1..end].iter().collect();
            return Some((tag, end + 1));
        }
        end += 1;
    }
    None
}

fn next_is_delimiter(chars: &[char], index: usize) -> bool {
    chars
        .get(index)
        .is_some_and(|ch| ch.is_ascii_whitespace())
}
