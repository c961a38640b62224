//! Positional field extraction over page-1 text blocks.
//!
//! The letter layout is stable enough that fields can be located by where
//! a block falls in the page's block sequence plus a leading keyword, with
//! no coordinate geometry. Each target field is described by a declarative
//! [`ScanRule`]: an index window, a prefix, and token picks. Window bounds
//! and offsets are data, so a page with fewer blocks than a window covers
//! produces lookup misses (empty fields), never an out-of-bounds fault.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::TextBlock;
use crate::{FieldReport, Rejection};

/// Qualifying blocks needed to cover every scan window (the last window
/// ends at index 9). Shorter pages still extract; unreached fields stay
/// empty.
pub const FULL_SCHEMA_MIN_BLOCKS: usize = 9;

static VTL_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"VTL \(.*?\)").unwrap());
static VTP_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"VTP \(.*?\)").unwrap());

/// The positionally scanned fields, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    IssueDate,
    ReferenceNumber,
    Name,
    FinNumber,
    PassportNumber,
    ValidFrom,
    ValidTo,
}

const FIELD_COUNT: usize = 7;

/// How to pull one value out of a block's whitespace tokens.
#[derive(Debug, Clone, Copy)]
enum TokenPick {
    /// The n-th token, 0-based.
    Nth(usize),
    /// The last token.
    Last,
    /// The n-th token counted from the end (0 = last).
    FromEnd(usize),
    /// All tokens from the n-th onward, space-joined.
    JoinFrom(usize),
}

/// A value captured from the block that matched the rule's prefix.
struct Capture {
    field: Field,
    pick: TokenPick,
}

/// A value captured from a block at a fixed offset after the matched
/// block, gated on that block's own prefix.
struct FollowUp {
    offset: usize,
    prefix: &'static str,
    field: Field,
    pick: TokenPick,
}

/// One bounded scan: within `window`, the first block starting with
/// `prefix` wins and the rule stops there.
struct ScanRule {
    window: Range<usize>,
    prefix: &'static str,
    captures: &'static [Capture],
    follow_ups: &'static [FollowUp],
}

/// The letter's field layout. Issue date and reference share the "Date"
/// header line near the top; the salutation line carries the name with
/// FIN/passport lines directly under it; the travel-lane line near the
/// middle carries the validity window as its trailing date pair.
static SCAN_RULES: [ScanRule; 3] = [
    ScanRule {
        window: 0..3,
        prefix: "Date",
        captures: &[
            Capture {
                field: Field::IssueDate,
                pick: TokenPick::Nth(1),
            },
            Capture {
                field: Field::ReferenceNumber,
                pick: TokenPick::Last,
            },
        ],
        follow_ups: &[],
    },
    ScanRule {
        window: 2..5,
        prefix: "Dear",
        captures: &[Capture {
            field: Field::Name,
            pick: TokenPick::JoinFrom(1),
        }],
        follow_ups: &[
            FollowUp {
                offset: 1,
                prefix: "FIN",
                field: Field::FinNumber,
                pick: TokenPick::Last,
            },
            FollowUp {
                offset: 2,
                prefix: "Passport",
                field: Field::PassportNumber,
                pick: TokenPick::Last,
            },
        ],
    },
    ScanRule {
        window: 6..9,
        prefix: "Vaccinated Travel Lane (Air)",
        captures: &[
            Capture {
                field: Field::ValidFrom,
                pick: TokenPick::FromEnd(2),
            },
            Capture {
                field: Field::ValidTo,
                pick: TokenPick::FromEnd(1),
            },
        ],
        follow_ups: &[],
    },
];

/// Trim blocks and drop layout noise (trimmed length <= 3 characters).
/// Order is preserved; all positional windows index into this filtered
/// sequence, starting at 0.
pub fn qualifying_blocks(blocks: &[TextBlock]) -> Vec<String> {
    blocks
        .iter()
        .map(|b| b.text.trim())
        .filter(|t| t.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

/// Non-overlapping matches of `re`, deduplicated preserving first
/// occurrence, so the reported tag is deterministic.
fn distinct_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        if !distinct.iter().any(|t| t == m.as_str()) {
            distinct.push(m.as_str().to_string());
        }
    }
    distinct
}

fn pick_token(tokens: &[&str], pick: TokenPick) -> Option<String> {
    match pick {
        TokenPick::Nth(n) => tokens.get(n).map(|t| t.to_string()),
        TokenPick::Last => tokens.last().map(|t| t.to_string()),
        TokenPick::FromEnd(n) => tokens
            .len()
            .checked_sub(n + 1)
            .and_then(|i| tokens.get(i))
            .map(|t| t.to_string()),
        TokenPick::JoinFrom(n) => (tokens.len() > n).then(|| tokens[n..].join(" ")),
    }
}

fn apply_rules(blocks: &[String]) -> [String; FIELD_COUNT] {
    let mut values: [String; FIELD_COUNT] = Default::default();

    for rule in &SCAN_RULES {
        let end = rule.window.end.min(blocks.len());
        let Some(hit) =
            (rule.window.start..end).find(|&i| blocks[i].starts_with(rule.prefix))
        else {
            continue;
        };

        let tokens: Vec<&str> = blocks[hit].split_whitespace().collect();
        for capture in rule.captures {
            if let Some(value) = pick_token(&tokens, capture.pick) {
                values[capture.field as usize] = value;
            }
        }

        for follow_up in rule.follow_ups {
            let Some(block) = blocks.get(hit + follow_up.offset) else {
                continue;
            };
            if !block.starts_with(follow_up.prefix) {
                continue;
            }
            let tokens: Vec<&str> = block.split_whitespace().collect();
            if let Some(value) = pick_token(&tokens, follow_up.pick) {
                values[follow_up.field as usize] = value;
            }
        }
    }

    values
}

/// Extract the field schema from page-1 blocks.
///
/// Runs the second-stage template-tag gate first: the page must mention
/// exactly one distinct `VTL (...)` tag and exactly one distinct
/// `VTP (...)` tag, else the letter is rejected even though the metadata
/// fingerprint passed. Fields a scan rule cannot locate are returned as
/// empty strings, never absent keys.
pub fn extract_fields(blocks: &[TextBlock]) -> Result<FieldReport, Rejection> {
    let blocks = qualifying_blocks(blocks);
    tracing::debug!(blocks = blocks.len(), "filtered page-1 blocks");
    if blocks.len() < FULL_SCHEMA_MIN_BLOCKS {
        tracing::warn!(
            blocks = blocks.len(),
            required = FULL_SCHEMA_MIN_BLOCKS,
            "page has fewer blocks than the scan windows cover; unreached fields stay empty"
        );
    }

    let page_text = blocks.join(" ");
    let vtl_tags = distinct_matches(&VTL_TAG_RE, &page_text);
    let vtp_tags = distinct_matches(&VTP_TAG_RE, &page_text);
    if vtl_tags.len() != 1 || vtp_tags.len() != 1 {
        return Err(Rejection::TemplateTags {
            vtl: vtl_tags.len(),
            vtp: vtp_tags.len(),
        });
    }

    let values = apply_rules(&blocks);
    let [issue_date, reference_number, name, fin_number, passport_number, valid_from, valid_to] =
        values;

    Ok(FieldReport {
        vtp_type: vtp_tags.into_iter().next().unwrap_or_default(),
        vtl_type: vtl_tags.into_iter().next().unwrap_or_default(),
        issue_date,
        reference_number,
        name,
        fin_number,
        passport_number,
        valid_from,
        valid_to,
    })
}
