//! Line-level configuration diff
//!
//! Compares a previous and a current configuration line by line and renders
//! the result as a unified-diff style edit script. The script keeps hunk
//! headers and unchanged context lines so that a consumer walking it can see
//! the line enclosing a removal (for example the `interface` a
//! `service-instance` belonged to).

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp, DiffTag};
use std::fmt;
use std::ops::Range;

/// Label of the previous configuration in the script header
pub const PREVIOUS_LABEL: &str = "previous_config";

/// Label of the current configuration in the script header
pub const CURRENT_LABEL: &str = "current_config";

/// Number of unchanged lines kept around each change
pub const CONTEXT_RADIUS: usize = 3;

/// Number of header lines (`---` / `+++`) preceding the script body
pub const HEADER_LEN: usize = 2;

// ============================================================================
// Configuration Text
// ============================================================================

/// An ordered, immutable sequence of configuration lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigText {
    lines: Vec<String>,
}

impl ConfigText {
    /// Build from literal content, splitting strictly on `\n`.
    ///
    /// A trailing newline yields a trailing empty line, which matters for the
    /// diff: content handed in inline is compared exactly as given.
    pub fn from_content(content: &str) -> Self {
        Self {
            lines: content.split('\n').map(str::to_string).collect(),
        }
    }

    /// Build from the text of a configuration file (line terminators dropped).
    pub fn from_file_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ConfigText {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Changed Lines
// ============================================================================

/// Direction of a changed line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the current configuration
    Added,
    /// Present only in the previous configuration
    Removed,
}

impl ChangeKind {
    /// The marker character used in the edit script
    pub fn marker(self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
        }
    }

    /// Map an edit-script marker back to a change kind.
    ///
    /// Context (` `) and hunk (`@`) markers have no change kind.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '+' => Some(ChangeKind::Added),
            '-' => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

/// A line that was added or removed, without its marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: ChangeKind,
    pub content: String,
}

impl DiffLine {
    pub fn new(kind: ChangeKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn added(content: impl Into<String>) -> Self {
        Self::new(ChangeKind::Added, content)
    }

    pub fn removed(content: impl Into<String>) -> Self {
        Self::new(ChangeKind::Removed, content)
    }

    pub fn is_removed(&self) -> bool {
        self.kind == ChangeKind::Removed
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.marker(), self.content)
    }
}

// ============================================================================
// Edit Script
// ============================================================================

/// A unified-diff style edit script: a two-line header followed by the body.
///
/// Identical inputs produce an empty script with no header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    lines: Vec<String>,
}

impl EditScript {
    /// Every line of the script, header included
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The script without its header
    pub fn body(&self) -> &[String] {
        self.lines.get(HEADER_LEN..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the whole script as text, one line per row
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Compute the edit script turning `previous` into `current`.
///
/// Uses the Myers algorithm and groups changes into hunks carrying
/// [`CONTEXT_RADIUS`] lines of context on each side. Hunk ranges are
/// formatted the classic way: `start` for a single line, `start-1,0` for an
/// empty range and `start,len` otherwise.
pub fn diff<P, C>(previous: &[P], current: &[C]) -> EditScript
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    let old: Vec<&str> = previous.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = current.iter().map(AsRef::as_ref).collect();

    let ops = capture_diff_slices(Algorithm::Myers, &old, &new);
    if ops.iter().all(|op| op.tag() == DiffTag::Equal) {
        return EditScript::default();
    }

    let mut lines = vec![
        format!("--- {}", PREVIOUS_LABEL),
        format!("+++ {}", CURRENT_LABEL),
    ];

    for group in group_diff_ops(ops, CONTEXT_RADIUS) {
        lines.push(hunk_header(&group));
        for op in &group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    lines.extend(old[old_range].iter().map(|line| format!(" {}", line)));
                }
                DiffTag::Delete => {
                    lines.extend(old[old_range].iter().map(|line| format!("-{}", line)));
                }
                DiffTag::Insert => {
                    lines.extend(new[new_range].iter().map(|line| format!("+{}", line)));
                }
                DiffTag::Replace => {
                    lines.extend(old[old_range].iter().map(|line| format!("-{}", line)));
                    lines.extend(new[new_range].iter().map(|line| format!("+{}", line)));
                }
            }
        }
    }

    tracing::trace!(
        previous_lines = old.len(),
        current_lines = new.len(),
        script_lines = lines.len(),
        "Computed configuration diff"
    );

    EditScript { lines }
}

fn hunk_header(group: &[DiffOp]) -> String {
    let (old, new) = match (group.first(), group.last()) {
        (Some(first), Some(last)) => (
            first.old_range().start..last.old_range().end,
            first.new_range().start..last.new_range().end,
        ),
        _ => (0..0, 0..0),
    };
    format!("@@ -{} +{} @@", format_range(old), format_range(new))
}

fn format_range(range: Range<usize>) -> String {
    let start = range.start + 1;
    match range.len() {
        0 => format!("{},0", start - 1),
        1 => format!("{}", start),
        len => format!("{},{}", start, len),
    }
}
