// 📈 Benefit Scoring - Heuristic strength from free-text descriptions
//
// Signals, summed:
//   "<n>%"                         → max percentage × PERCENT_WEIGHT
//   "<n> mpd" / "<n> miles/$" ...  → first rate × MILES_PER_DOLLAR_WEIGHT
//   "<int>x points"                → first multiplier × MULTIPLIER_WEIGHT
// then "up to" scales the total by UP_TO_PENALTY.
//
// The score only orders benefits against each other. It is not a money amount.

use crate::catalog::Benefit;
use serde::Serialize;

pub const PERCENT_WEIGHT: f64 = 8.0;
pub const MILES_PER_DOLLAR_WEIGHT: f64 = 12.0;
pub const MULTIPLIER_WEIGHT: f64 = 4.0;

/// Guaranteed rates edge out "up to" rates of the same nominal size
pub const UP_TO_PENALTY: f64 = 0.95;

const UP_TO_PHRASE: &str = "up to";

const MILES_SUFFIXES: &[&[&str]] = &[
    &["mpd"],
    &["miles", " ?", "per", " ?", "dollar"],
    &["miles/$"],
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub max_percent: Option<f64>,
    pub miles_per_dollar: Option<f64>,
    pub multiplier: Option<f64>,
    pub up_to: bool,
    pub total: f64,
}

/// Score a description. Pure; never fails.
pub fn score_description(description: &str) -> f64 {
    breakdown(description).total
}

pub fn breakdown(description: &str) -> ScoreBreakdown {
    let text = description.to_lowercase();
    let bytes = text.as_bytes();

    let max_percent = find_all(bytes, |at| number_followed_by(bytes, at, b"%"))
        .into_iter()
        .reduce(f64::max);
    let miles_per_dollar = find_first(bytes, |at| miles_rate_at(bytes, at));
    let multiplier = find_first(bytes, |at| multiplier_at(bytes, at));
    let up_to = text.contains(UP_TO_PHRASE);

    let mut total = 0.0;
    if let Some(pct) = max_percent {
        total += pct * PERCENT_WEIGHT;
    }
    if let Some(mpd) = miles_per_dollar {
        total += mpd * MILES_PER_DOLLAR_WEIGHT;
    }
    if let Some(x) = multiplier {
        total += x * MULTIPLIER_WEIGHT;
    }
    if up_to {
        total *= UP_TO_PENALTY;
    }

    ScoreBreakdown {
        max_percent,
        miles_per_dollar,
        multiplier,
        up_to,
        total,
    }
}

/// Description strength, or the benefit's `rewards` value when the text has no signal
pub fn score_benefit(benefit: &Benefit) -> f64 {
    let strength = score_description(&benefit.description);
    if strength > 0.0 {
        strength
    } else {
        benefit.rewards.unwrap_or(0.0)
    }
}

// ============================================================================
// SCANNER
// ============================================================================
//
// Each matcher is tried at every byte offset, left to right. A match resumes
// scanning after its end; a miss moves on by one byte.

/// (value, end offset)
type Hit = Option<(f64, usize)>;

fn find_all(bytes: &[u8], matcher: impl Fn(usize) -> Hit) -> Vec<f64> {
    let mut found = Vec::new();
    let mut at = 0;
    while at < bytes.len() {
        match matcher(at) {
            Some((value, end)) => {
                found.push(value);
                at = end.max(at + 1);
            }
            None => at += 1,
        }
    }
    found
}

fn find_first(bytes: &[u8], matcher: impl Fn(usize) -> Hit) -> Option<f64> {
    (0..bytes.len()).find_map(|at| matcher(at).map(|(value, _)| value))
}

/// `\d+`, returning the end offset
fn digits(bytes: &[u8], at: usize) -> Option<usize> {
    let end = at + bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count();
    (end > at).then_some(end)
}

/// `\d+(\.\d+)?`
fn decimal(bytes: &[u8], at: usize) -> Hit {
    let int_end = digits(bytes, at)?;
    let end = match bytes.get(int_end) {
        Some(b'.') => digits(bytes, int_end + 1).unwrap_or(int_end),
        _ => int_end,
    };
    let value: f64 = std::str::from_utf8(&bytes[at..end]).ok()?.parse().ok()?;
    Some((value, end))
}

/// `\s*` over Unicode whitespace, U+00A0 included.
/// `at` always follows an ASCII digit, so it sits on a char boundary.
fn skip_whitespace(bytes: &[u8], at: usize) -> usize {
    let rest = match std::str::from_utf8(&bytes[at..]) {
        Ok(rest) => rest,
        Err(e) => std::str::from_utf8(&bytes[at..at + e.valid_up_to()]).unwrap_or_default(),
    };
    at + rest
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum::<usize>()
}

fn number_followed_by(bytes: &[u8], at: usize, suffix: &[u8]) -> Hit {
    let (value, end) = decimal(bytes, at)?;
    let after = skip_whitespace(bytes, end);
    bytes[after..]
        .starts_with(suffix)
        .then_some((value, after + suffix.len()))
}

/// Literal pieces in order; a " ?" piece is an optional single space
fn match_pieces(bytes: &[u8], at: usize, pieces: &[&str]) -> Option<usize> {
    let mut pos = at;
    for piece in pieces {
        if *piece == " ?" {
            if bytes.get(pos) == Some(&b' ') {
                pos += 1;
            }
        } else if bytes[pos..].starts_with(piece.as_bytes()) {
            pos += piece.len();
        } else {
            return None;
        }
    }
    Some(pos)
}

fn miles_rate_at(bytes: &[u8], at: usize) -> Hit {
    let (value, end) = decimal(bytes, at)?;
    let after = skip_whitespace(bytes, end);
    MILES_SUFFIXES
        .iter()
        .find_map(|pieces| match_pieces(bytes, after, pieces))
        .map(|stop| (value, stop))
}

/// `\d+\s*x`; a trailing currency word ("points", "uni$", ...) does not change the value
fn multiplier_at(bytes: &[u8], at: usize) -> Hit {
    let end = digits(bytes, at)?;
    let after = skip_whitespace(bytes, end);
    if bytes.get(after) != Some(&b'x') {
        return None;
    }
    let value: f64 = std::str::from_utf8(&bytes[at..end]).ok()?.parse().ok()?;
    Some((value, after + 1))
}
