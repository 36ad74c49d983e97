//! Pattern cleaner: deterministic removal of PDF extraction garbage.
//!
//! Raw PDF text is full of noise that carries no information once the page
//! layout is gone:
//!
//! - running headers and footers repeated on every page
//! - page-number lines (`12`, `Page 3 of 40`, `- 7 -`)
//! - encoding artefacts (`â€™` mojibake, control characters, U+FFFD)
//! - data dumps: pixel maps, hex address tables, long digit runs
//!
//! [`clean_text`] strips these with an ordered list of cheap string/regex
//! rules. It never fails, performs no I/O, and is used both on fresh
//! extractions and on AI output (models echo headers and wrap answers in
//! code fences).
//!
//! ## Rule Order
//!
//! Line endings are normalised before fence detection; encoding repair runs
//! before line classification so that mojibake does not defeat the header
//! counter; removal markers are collapsed last so that consecutive removals
//! of different kinds fold into one marker.
//!
//! ## Convergence
//!
//! Removing a line can expose a new outer code fence or change a line's
//! repetition count, so one pass is not always a fixed point. The pass is
//! re-applied until the text stops changing (bounded by [`MAX_PASSES`]),
//! which makes `clean_text(clean_text(x)) == clean_text(x)`.

use crate::pipeline::extract::is_page_marker;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Upper bound on full passes; real documents settle in one or two.
pub const MAX_PASSES: usize = 4;

/// Lines at or above this many chars are never headers/footers.
const MAX_HEADER_CHARS: usize = 200;

const CONTENT_REMOVED: &str = "[content removed]";
const DATA_REMOVED: &str = "[data removed]";
const PIXEL_DATA_REMOVED: &str = "[pixel data removed]";
const ADDRESS_DATA_REMOVED: &str = "[address data removed]";
const NUMERIC_DATA_REMOVED: &str = "[numeric data removed]";

/// Clean garbage from extracted PDF text or AI-generated responses.
///
/// Rules (applied in order, per pass):
/// 1. Normalise line endings (CRLF/CR/form feed → LF)
/// 2. Strip code fences wrapping the whole text
/// 3. Repair mojibake; drop control, invisible and replacement characters
/// 4. Detect running headers/footers (3+ repeats, or present on every page)
/// 5. Classify each line: drop headers, page numbers and contact footers;
///    replace data dumps and binary junk with a `[… removed]` marker
/// 6. Remove `--- Page Break ---` style markers
/// 7. Collapse consecutive removal markers and blank lines
/// 8. Collapse 4+ newlines to 3 and trim
pub fn clean_text(input: &str) -> String {
    let mut current = clean_pass(input);
    for _ in 1..MAX_PASSES {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// One application of the full rule list.
pub fn clean_pass(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    let s = repair_encoding(&s);

    let lines: Vec<&str> = s.split('\n').collect();
    let repeated = find_repeated_lines(&lines);
    let processed: Vec<Cow<'_, str>> = lines
        .iter()
        .map(|line| clean_line(line, &repeated))
        .collect();
    let s = processed.join("\n");

    let s = remove_page_breaks(&s);
    let s = collapse_removed_lines(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n")
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    let mut current = input.trim().to_string();
    loop {
        let inner = match RE_OUTER_FENCES.captures(&current) {
            Some(caps) => caps[1].trim().to_string(),
            None => return current,
        };
        current = inner;
    }
}

// ── Rule 3: Encoding artefacts ───────────────────────────────────────────────

/// UTF-8 text that was decoded as Windows-1252 somewhere upstream.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "\u{2019}"),
    ("â€˜", "\u{2018}"),
    ("â€œ", "\u{201C}"),
    ("â€\u{9D}", "\u{201D}"),
    ("â€“", "\u{2013}"),
    ("â€”", "\u{2014}"),
    ("â€¦", "\u{2026}"),
    ("â€¢", "\u{2022}"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã¡", "á"),
    ("Ã\u{AD}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
    ("Ã¤", "ä"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("ÃŸ", "ß"),
    ("Â°", "°"),
    ("Âµ", "µ"),
    ("Â±", "±"),
    ("Â©", "©"),
    ("Â®", "®"),
    ("Â\u{A0}", " "),
];

fn is_junk_char(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(
            c,
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{FFFD}' | '\u{FFFE}'
        )
}

fn repair_encoding(input: &str) -> String {
    // Repair and stripping feed each other ("Ã\u{1}©" only becomes "Ã©"
    // once the control char is gone), so iterate to a fixed point. Every
    // step only shortens the text.
    let mut current = input.to_string();
    loop {
        let mut next = current.clone();
        for (bad, good) in MOJIBAKE {
            if next.contains(bad) {
                next = next.replace(bad, good);
            }
        }
        let next: String = next
            .chars()
            .filter(|&c| !is_junk_char(c) && c != '\u{00AD}')
            .collect();
        if next == current {
            return current;
        }
        current = next;
    }
}

// ── Rule 4: Running headers/footers ──────────────────────────────────────────

/// Lines classified as running headers/footers.
#[derive(Debug, Default)]
struct RepeatedLines {
    /// Lines occurring 3+ times anywhere.
    by_count: HashSet<String>,
    /// Lines present on every page of a 2+ page document.
    every_page: HashSet<String>,
}

fn is_header_candidate(trimmed: &str) -> bool {
    !trimmed.is_empty()
        && trimmed.chars().count() < MAX_HEADER_CHARS
        && !is_removal_marker(trimmed)
        && !is_page_marker(trimmed)
}

fn find_repeated_lines(lines: &[&str]) -> RepeatedLines {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut pages: Vec<HashSet<&str>> = vec![HashSet::new()];

    for line in lines {
        let trimmed = line.trim();
        if is_page_marker(trimmed) {
            pages.push(HashSet::new());
            continue;
        }
        if !is_header_candidate(trimmed) {
            continue;
        }
        *counts.entry(trimmed).or_insert(0) += 1;
        if let Some(page) = pages.last_mut() {
            page.insert(trimmed);
        }
    }

    let by_count = counts
        .into_iter()
        .filter(|&(_, n)| n >= 3)
        .map(|(line, _)| line.to_string())
        .collect();

    let every_page = if pages.len() >= 2 {
        pages[0]
            .iter()
            .filter(|line| pages[1..].iter().all(|page| page.contains(*line)))
            .map(|line| line.to_string())
            .collect()
    } else {
        HashSet::new()
    };

    RepeatedLines {
        by_count,
        every_page,
    }
}

/// Short title-case/upper-case or `#` lines are kept even when repeated.
fn is_likely_heading(trimmed: &str) -> bool {
    let len = trimmed.chars().count();
    if !(3..=80).contains(&len) {
        return false;
    }
    if trimmed.starts_with('#') {
        return true;
    }
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 > 0.4
}

// ── Rule 5: Per-line classification ──────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:page\s+)?\d{1,4}(?:\s*(?:of|/)\s*\d{1,4})?$|^[-–—]\s*\d{1,4}\s*[-–—]$")
        .unwrap()
});

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.]+").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bwww\.|https?://").unwrap());
static RE_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:phone|tel|telephone)\b").unwrap());
static RE_FAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfax\b").unwrap());
static RE_SUPPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)customer\s+support").unwrap());

static RE_PIXEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Pixel\s+\d+").unwrap());
static RE_HEX_ADDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[0-9A-Fa-f]{2,}").unwrap());

fn is_removal_marker(trimmed: &str) -> bool {
    trimmed.starts_with('[') && trimmed.ends_with(" removed]")
}

fn clean_line<'a>(line: &'a str, repeated: &RepeatedLines) -> Cow<'a, str> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Cow::Borrowed("");
    }
    if is_removal_marker(trimmed) || is_page_marker(trimmed) {
        return Cow::Borrowed(trimmed);
    }

    let len = line.chars().count();

    // No legitimate line is this long.
    if len > 2000 {
        return Cow::Borrowed(CONTENT_REMOVED);
    }

    if repeated.every_page.contains(trimmed) && !trimmed.starts_with('#') {
        return Cow::Borrowed("");
    }
    if repeated.by_count.contains(trimmed) && !is_likely_heading(trimmed) {
        return Cow::Borrowed("");
    }

    if is_page_number_line(trimmed) || is_contact_footer(trimmed) {
        return Cow::Borrowed("");
    }

    if trimmed.chars().count() > 300 && digit_hex_ratio(trimmed) > 0.6 {
        return Cow::Borrowed(DATA_REMOVED);
    }
    if RE_PIXEL.find_iter(trimmed).count() >= 5 {
        return Cow::Borrowed(PIXEL_DATA_REMOVED);
    }
    if RE_HEX_ADDR.find_iter(trimmed).count() >= 4 {
        return Cow::Borrowed(ADDRESS_DATA_REMOVED);
    }
    if is_numeric_garbage(trimmed) {
        return Cow::Borrowed(NUMERIC_DATA_REMOVED);
    }

    // Binary or encoded blobs: long and (almost) space-free.
    if len > 500 {
        let spaces = line.chars().filter(|&c| c == ' ').count();
        if (spaces as f64 / len as f64) < 0.05 {
            return Cow::Borrowed(CONTENT_REMOVED);
        }
    }
    if len > 200 && !line.contains(' ') {
        return Cow::Borrowed(CONTENT_REMOVED);
    }
    if len > 500 && is_repetitive(line) {
        return Cow::Borrowed(CONTENT_REMOVED);
    }

    Cow::Borrowed(line.trim_end())
}

fn is_page_number_line(trimmed: &str) -> bool {
    trimmed.chars().count() <= 50 && RE_PAGE_NUMBER.is_match(trimmed)
}

/// A short line made of nothing but contact details.
fn is_contact_footer(trimmed: &str) -> bool {
    if trimmed.chars().count() > MAX_HEADER_CHARS {
        return false;
    }
    let indicators = [&*RE_EMAIL, &*RE_URL, &*RE_PHONE, &*RE_FAX, &*RE_SUPPORT];
    indicators.iter().filter(|re| re.is_match(trimmed)).count() >= 3
}

fn digit_hex_ratio(s: &str) -> f64 {
    let total = s.chars().count();
    if total == 0 {
        return 0.0;
    }
    let hits = s
        .chars()
        .filter(|c| c.is_ascii_digit() || "abcdefx".contains(c.to_ascii_lowercase()))
        .count();
    hits as f64 / total as f64
}

/// Rows of numbers: pixel indices, register dumps, lookup tables.
fn is_numeric_garbage(trimmed: &str) -> bool {
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        // Short numbers were handled as page numbers.
        return true;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() >= 5 {
        let numeric = words
            .iter()
            .filter(|w| w.chars().all(|c| c.is_ascii_digit()))
            .count();
        if numeric as f64 / words.len() as f64 > 0.8 {
            return true;
        }
    }

    let len = trimmed.chars().count();
    if len > 50 {
        let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
        if digits as f64 / len as f64 > 0.7 {
            return true;
        }
    }

    false
}

/// "the the the …" or a handful of words cycling for hundreds of chars.
fn is_repetitive(line: &str) -> bool {
    let words: Vec<String> = line.split_whitespace().map(str::to_lowercase).collect();
    if words.len() <= 50 {
        return false;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for w in &words {
        *counts.entry(w.as_str()).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    let total = words.len() as f64;
    max as f64 / total > 0.4 || (counts.len() as f64 / total) < 0.1
}

// ── Rule 6: Page-break markers ───────────────────────────────────────────────

static RE_PAGE_BREAK_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^##?[ \t]*-{2,}[ \t]*Page[ \t]*Break[ \t]*-{2,}[ \t]*$").unwrap());
static RE_PAGE_BREAK_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^-{3,}[ \t]*Page[ \t]*Break[ \t]*-{3,}[ \t]*$").unwrap());

fn remove_page_breaks(input: &str) -> String {
    let s = RE_PAGE_BREAK_HEADING.replace_all(input, "");
    RE_PAGE_BREAK_RULE.replace_all(&s, "").into_owned()
}

// ── Rule 7: Collapse removal markers and blank lines ─────────────────────────

fn collapse_removed_lines(input: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut prev_was_removed = false;
    let mut prev_was_empty = false;

    for line in input.split('\n') {
        if is_removal_marker(line) {
            if !prev_was_removed {
                result.push(line);
                prev_was_removed = true;
            }
            prev_was_empty = false;
        } else if line.trim().is_empty() {
            if !prev_was_empty && !prev_was_removed {
                result.push("");
            }
            prev_was_empty = true;
            prev_was_removed = false;
        } else {
            result.push(line);
            prev_was_removed = false;
            prev_was_empty = false;
        }
    }

    result.join("\n")
}

// ── Rule 8: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
