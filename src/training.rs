//! Training corpus records and abstraction levels.
//!
//! A training corpus is UTF-8 text with one record per line:
//!
//! ```text
//! //if (x == y)
//! 4711,AST_expression_ONE:(if_statement (parenthesized_expression ...))
//! 4711,AST_expression_TWO:(parenthesized_expression (binary_expression ...))
//! ```
//!
//! The dump tool emits the original predicate as a `//` comment followed by
//! one record per abstraction level. The loader keeps only the lines whose
//! level tag matches the trie being built and skips everything else
//! silently.

/// How aggressively a predicate subtree is canonicalized into a string.
///
/// Coarser levels redact identifiers and literals harder, so more predicates
/// collapse onto the same pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeLevel {
    /// Raw syntax-tree print, no redaction.
    Min,
    /// Full tree shape plus operators; identifiers reduced to node types.
    One,
    /// Expression skeleton with terminals redacted to type-only markers.
    Two,
    /// Coarsest representation.
    Max,
}

impl TreeLevel {
    /// The level tag as it appears in corpus record markers.
    pub fn tag(self) -> &'static str {
        match self {
            TreeLevel::Min => "MIN",
            TreeLevel::One => "ONE",
            TreeLevel::Two => "TWO",
            TreeLevel::Max => "MAX",
        }
    }

    /// Map a numeric CLI selector onto a level, clamping out-of-range
    /// values to the nearest bound.
    pub fn from_cli(level: i32) -> Self {
        match level {
            i32::MIN..=0 => TreeLevel::Min,
            1 => TreeLevel::One,
            2 => TreeLevel::Two,
            _ => TreeLevel::Max,
        }
    }
}

impl std::fmt::Display for TreeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One recognized corpus line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingRecord<'a> {
    /// Opaque id of whoever contributed the pattern.
    pub contributor_id: u64,
    /// The abstracted predicate, verbatim.
    pub pattern: &'a str,
}

/// Parse one corpus line against the marker for `level`.
///
/// A line is recognized when its first comma is immediately followed by
/// `AST_expression_<LEVEL>:`. Comment lines (`//...`), records at another
/// level and lines without the marker all return `None`. The contributor
/// field is parsed with `strtoul` semantics: leading decimal digits count,
/// anything else reads as 0.
pub fn parse_record(line: &str, level: TreeLevel) -> Option<TrainingRecord<'_>> {
    const MARKER: &str = "AST_expression_";

    let comma = line.find(',')?;
    let rest = line[comma + 1..].strip_prefix(MARKER)?;
    let rest = rest.strip_prefix(level.tag())?;
    let pattern = rest.strip_prefix(':')?;
    Some(TrainingRecord {
        contributor_id: parse_contributor_id(&line[..comma]),
        pattern,
    })
}

fn parse_contributor_id(field: &str) -> u64 {
    let digits: &str = {
        let end = field
            .bytes()
            .position(|c| !c.is_ascii_digit())
            .unwrap_or(field.len());
        &field[..end]
    };
    digits.parse().unwrap_or(0)
}
