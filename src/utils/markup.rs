//! Text sanitization for outbound chat messages
//!
//! One implementation for every provider: close dangling code fences, escape
//! markup outside fenced blocks for the target dialect, then split into
//! transport-sized chunks.

use regex::Regex;

/// Maximum characters Telegram accepts in one text message
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const FENCE: &str = "```";

/// Target markup dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDialect {
    MarkdownV2,
    /// Legacy Telegram Markdown
    Markdown,
    Html,
}

impl MarkupDialect {
    fn reserved(&self) -> &'static [char] {
        match self {
            MarkupDialect::MarkdownV2 => &[
                '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}',
                '.', '!',
            ],
            MarkupDialect::Markdown => &['_', '*', '`', '['],
            MarkupDialect::Html => &[],
        }
    }
}

/// Escape every reserved character of the dialect
pub fn escape(text: &str, dialect: MarkupDialect) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match dialect {
            MarkupDialect::Html => match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            },
            _ => {
                if dialect.reserved().contains(&c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out
}

/// Drop backslash escapes a model added on its own
pub fn unescape_markdown(text: &str) -> String {
    match Regex::new(r"\\([#\-*_`\[\](){}>+=|.!])") {
        Ok(re) => re.replace_all(text, "$1").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Append a closing fence when the text opens more fences than it closes
pub fn close_unterminated_fences(text: &str) -> String {
    if text.matches(FENCE).count() % 2 == 0 {
        return text.to_string();
    }
    let mut fixed = text.to_string();
    if !fixed.ends_with('\n') {
        fixed.push('\n');
    }
    fixed.push_str(FENCE);
    fixed
}

/// Escape text outside fenced code blocks; fenced blocks pass through verbatim.
/// Fences must be balanced.
pub fn escape_outside_code(text: &str, dialect: MarkupDialect) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, part) in text.split(FENCE).enumerate() {
        if i % 2 == 0 {
            out.push_str(&escape(part, dialect));
        } else {
            out.push_str(FENCE);
            out.push_str(part);
            out.push_str(FENCE);
        }
    }
    out
}

/// Full normalization applied to provider text before chunking
pub fn normalize(text: &str, dialect: MarkupDialect) -> String {
    escape_outside_code(&close_unterminated_fences(text), dialect)
}

/// A ``` marker found in the text
#[derive(Debug)]
struct FenceMark {
    at: usize,
    /// First index past the marker and, for an opening fence, its info line
    end: usize,
    opens: bool,
    info: String,
}

/// Locate every fence marker, pairing them the same way `escape_outside_code` does
fn scan_fences(chars: &[char]) -> Vec<FenceMark> {
    let marker: Vec<char> = FENCE.chars().collect();
    let mut marks = Vec::new();
    let mut opens = true;
    let mut i = 0;
    while i < chars.len() {
        if !chars[i..].starts_with(&marker) {
            i += 1;
            continue;
        }
        let after = i + marker.len();
        let mut mark = FenceMark { at: i, end: after, opens, info: String::new() };
        if opens {
            let header_len = chars[after..]
                .iter()
                .take_while(|c| **c != '\n' && **c != '`')
                .count();
            if chars.get(after + header_len) == Some(&'\n') {
                mark.info = chars[after..after + header_len].iter().collect::<String>().trim().to_string();
                mark.end = after + header_len + 1;
            }
        }
        marks.push(mark);
        opens = !opens;
        i = after;
    }
    marks
}

/// The opening fence still unclosed at `pos`, if any
fn open_fence_at(marks: &[FenceMark], pos: usize) -> Option<&FenceMark> {
    marks
        .iter()
        .take_while(|mark| mark.at < pos)
        .last()
        .filter(|mark| mark.opens)
}

/// Cut point for a chunk starting at `start` holding at most `budget` characters
fn pick_cut(chars: &[char], marks: &[FenceMark], start: usize, budget: usize) -> usize {
    let budget = budget.max(2);
    let window = &chars[start..(start + budget).min(chars.len())];
    let mut cut = window
        .iter()
        .rposition(|c| *c == '\n')
        .filter(|pos| *pos >= budget / 2)
        .map(|pos| pos + 1)
        .unwrap_or(window.len());

    let trailing_backslashes = window[..cut].iter().rev().take_while(|c| **c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        cut -= 1;
    }
    let mut cut = start + cut;

    // Never cut through a marker or an opening fence's info line, and never
    // leave an empty block on either side of the cut
    let unsafe_mark = marks.iter().find(|mark| {
        if mark.opens {
            mark.at < cut && cut <= mark.end
        } else {
            mark.at <= cut && cut < mark.end
        }
    });
    if let Some(mark) = unsafe_mark {
        let back = if mark.opens {
            mark.at
        } else {
            // Keep the last code line together with the closing marker
            chars[start..mark.at.saturating_sub(1).max(start)]
                .iter()
                .rposition(|c| *c == '\n')
                .map(|pos| start + pos + 1)
                .unwrap_or(mark.at)
        };
        if back > start {
            cut = back;
        }
    }
    cut.max(start + 1)
}

/// Split into ordered chunks of at most `limit` characters.
///
/// Prefers cutting after a newline in the second half of the window and
/// never leaves an escape backslash dangling at the end of a chunk. A cut
/// inside a fenced block closes the fence at the end of the chunk and reopens
/// it with the same info string at the start of the next one, so every chunk
/// holds balanced fences. Fences in `text` must be balanced.
pub fn split_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    let chars: Vec<char> = text.chars().collect();
    let marks = scan_fences(&chars);
    let close_len = FENCE.len() + 1;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let prefix = open_fence_at(&marks, start)
            .map(|mark| format!("{}{}\n", FENCE, mark.info))
            .unwrap_or_default();
        let room = limit.saturating_sub(prefix.chars().count());

        if chars.len() - start <= room {
            chunks.push(prefix + &chars[start..].iter().collect::<String>());
            break;
        }

        let mut cut = pick_cut(&chars, &marks, start, room);
        if open_fence_at(&marks, cut).is_some() {
            cut = pick_cut(&chars, &marks, start, room.saturating_sub(close_len));
        }

        let mut chunk = prefix + &chars[start..cut].iter().collect::<String>();
        if open_fence_at(&marks, cut).is_some() {
            if !chunk.ends_with('\n') {
                chunk.push('\n');
            }
            chunk.push_str(FENCE);
        }
        chunks.push(chunk);
        start = cut;
    }

    chunks
}

/// Normalize and chunk in one step
pub fn prepare_messages(text: &str, dialect: MarkupDialect, limit: usize) -> Vec<String> {
    split_chunks(&normalize(text, dialect), limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape("*bold*", MarkupDialect::MarkdownV2), r"\*bold\*");
        assert_eq!(escape("v1.5-flash!", MarkupDialect::MarkdownV2), r"v1\.5\-flash\!");
        assert_eq!(escape(r"a\b", MarkupDialect::MarkdownV2), r"a\\b");
    }

    #[test]
    fn test_escape_html_and_legacy() {
        assert_eq!(escape("a<b>&c", MarkupDialect::Html), "a&lt;b&gt;&amp;c");
        assert_eq!(escape("_x_ 1.5", MarkupDialect::Markdown), r"\_x\_ 1.5");
    }

    #[test]
    fn test_code_blocks_pass_through() {
        let text = "Use *this*:\n```rust\nlet x = a.b();\n```\nDone.";
        let out = normalize(text, MarkupDialect::MarkdownV2);
        assert_eq!(out, "Use \\*this\\*:\n```rust\nlet x = a.b();\n```\nDone\\.");
    }

    #[test]
    fn test_unterminated_fence_closed() {
        let text = "Example:\n```python\nprint(1)";
        let fixed = close_unterminated_fences(text);
        assert_eq!(fixed, "Example:\n```python\nprint(1)\n```");
        assert_eq!(close_unterminated_fences("no code"), "no code");

        let out = normalize(text, MarkupDialect::MarkdownV2);
        assert!(out.ends_with("print(1)\n```"));
        assert!(out.starts_with("Example:\n```python"));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_markdown(r"\# Title \- item \*"), "# Title - item *");
    }

    #[test]
    fn test_split_short_text() {
        assert_eq!(split_chunks("hello", 4096), vec!["hello".to_string()]);
        assert!(split_chunks("", 4096).is_empty());
    }

    #[test]
    fn test_split_prefers_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_chunks(text, 8);
        assert_eq!(chunks, vec!["aaaa\n", "bbbb\n", "cccc"]);
    }

    #[test]
    fn test_split_does_not_strand_escape() {
        let chunks = split_chunks(r"abc\.def", 4);
        assert_eq!(chunks[0], "abc");
        assert_eq!(chunks.concat(), r"abc\.def");
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        let text = "привет".repeat(1000);
        let chunks = split_chunks(&text, TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), TELEGRAM_MESSAGE_LIMIT);
    }

    fn fence_count(chunk: &str) -> usize {
        chunk.matches(FENCE).count()
    }

    #[test]
    fn test_long_code_block_is_split_with_balanced_fences() {
        let mut text = String::from("Here is the code:\n```rust\n");
        for i in 0..300 {
            text.push_str(&format!("let value_{} = compute(a.b, {});\n", i, i));
        }
        text.push_str("```\nDone.");

        let chunks = prepare_messages(&text, MarkupDialect::MarkdownV2, TELEGRAM_MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
            assert_eq!(fence_count(chunk) % 2, 0, "unbalanced chunk: {:?}", chunk);
        }
        assert!(chunks[0].starts_with("Here is the code:\n```rust\n"));
        assert!(chunks[0].ends_with("\n```"));
        for chunk in &chunks[1..] {
            assert!(chunk.starts_with("```rust\n"));
        }
        assert!(chunks.last().unwrap().ends_with("```\nDone\\."));
        for i in [0, 150, 299] {
            let line = format!("let value_{} = compute(a.b, {});", i, i);
            assert_eq!(chunks.iter().filter(|c| c.contains(&line)).count(), 1);
        }
    }

    #[test]
    fn test_split_never_cuts_fence_header() {
        let text = "abcdefghijklmnop ```python\nprint(1)\n```";
        let chunks = split_chunks(text, 22);
        assert_eq!(chunks, vec!["abcdefghijklmnop ", "```python\nprint(1)\n```"]);
    }

    #[test]
    fn test_scan_inline_fence_without_info() {
        let marks = scan_fences(&"a ```x``` b".chars().collect::<Vec<_>>());
        assert_eq!(marks.len(), 2);
        assert!(marks[0].opens && marks[0].info.is_empty());
        assert_eq!(marks[0].end, 5);
        assert!(!marks[1].opens);
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z .()!\n]{0,80}",
            (
                prop::sample::select(vec!["", "rust", "python"]),
                "[a-z =();.\n]{0,200}"
            )
                .prop_map(|(info, body)| format!("```{}\n{}\n```\n", info, body)),
        ]
    }

    proptest! {
        #[test]
        fn prop_chunks_preserve_text(text in "[a-z\\\\\n.*]{0,300}", limit in 2usize..40) {
            let chunks = split_chunks(&text, limit);
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= limit);
                prop_assert!(!chunk.is_empty());
            }
            if chunks.len() > 1 {
                for chunk in &chunks[..chunks.len() - 1] {
                    let run = chunk.chars().rev().take_while(|c| *c == '\\').count();
                    prop_assert_eq!(run % 2, 0);
                }
            }
        }

        #[test]
        fn prop_chunks_keep_fences_balanced(
            segments in prop::collection::vec(segment(), 0..12),
            limit in 40usize..200,
        ) {
            let text = segments.concat();
            let chunks = prepare_messages(&text, MarkupDialect::MarkdownV2, limit);
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= limit);
                prop_assert_eq!(fence_count(chunk) % 2, 0);
            }
        }
    }
}
