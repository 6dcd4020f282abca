//! Filename conventions: `NNN-name` display titles and natural ordering.
//!
//! Photographers number their files (`001-dawn.jpg`, `010-dusk.jpg`) to pin
//! the order they appear in. The prefix is stripped for display, and the
//! ordering compares digit runs numerically so `img2` sorts before `img10`
//! even without zero padding.

use std::cmp::Ordering;

/// Result of parsing a numbered entry name like `020-My-Best-Photos`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `20` from `020-My-Best-Photos`)
    pub number: Option<u32>,
    /// Raw name part after `NNN-`. For unnumbered entries, the full input.
    pub name: String,
    /// Display title: name with dashes and underscores converted to spaces.
    pub display_title: String,
}

/// Parse an entry name following the `NNN-name` convention.
///
/// - `"020-My-Best-Photos"` → number=Some(20), display_title="My Best Photos"
/// - `"001"` → number=Some(1), display_title=""
/// - `"misty_morning"` → number=None, display_title="misty morning"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(dash_pos) = name.find('-') {
        let prefix = &name[..dash_pos];
        if let Ok(num) = prefix.parse::<u32>() {
            let raw = &name[dash_pos + 1..];
            return ParsedName {
                number: Some(num),
                name: raw.to_string(),
                display_title: display(raw),
            };
        }
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            name: String::new(),
            display_title: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: display(name),
    }
}

fn display(raw: &str) -> String {
    raw.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Alt text for an image file stem. Falls back to the raw stem when the
/// name is number-only (`001.jpg` has nothing better to offer).
pub fn alt_text(stem: &str) -> String {
    let parsed = parse_entry_name(stem);
    if parsed.display_title.is_empty() {
        stem.to_string()
    } else {
        parsed.display_title
    }
}

/// Numeric-aware string comparison.
///
/// Runs of ASCII digits compare by value (leading zeros ignored, ties broken
/// by run length so `01` < `1` stays total); everything else compares
/// case-insensitively, with a byte-wise tiebreak so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ai, mut bi) = (a.as_bytes(), b.as_bytes());
    loop {
        match (ai.first(), bi.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (da, ra) = split_digits(ai);
                let (db, rb) = split_digits(bi);
                let ord = cmp_digit_runs(da, db);
                if ord != Ordering::Equal {
                    return ord;
                }
                ai = ra;
                bi = rb;
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.to_ascii_lowercase().cmp(&cb.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai = &ai[1..];
                bi = &bi[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (sa, sb) = (&a[trim(a)..], &b[trim(b)..]);
    sa.len()
        .cmp(&sb.len())
        .then_with(|| sa.cmp(sb))
        .then_with(|| b.len().cmp(&a.len()))
}
