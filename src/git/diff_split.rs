//! Commit and per-file segmentation of `git diff` / `git show` output.
//!
//! Splits raw text into [`CommitUnit`]s at `commit <hash>` lines, and each
//! commit span into [`FileDiffUnit`]s at `diff --git` headers. Segmentation is
//! lossless: concatenating every unit's pieces in order reproduces the input
//! byte-for-byte (see [`CommitUnit::write_to`]).

use std::sync::LazyLock;

use regex::{Match, Regex};

/// Marker that begins a per-file section in unified diff output.
const FILE_DIFF_MARKER: &str = "diff --git a/";

/// A `commit <hash>` line at the start of a line, including the rest of the
/// line (decorations such as `(HEAD -> main)`) and its newline.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static COMMIT_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^commit [a-z0-9]+[^\n]*(?:\n|\z)").unwrap());

/// A file-diff header: the `diff --git` line, any extended header lines, and
/// the optional `---`/`+++` pair. Binary and mode-only diffs have no pair.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static FILE_DIFF_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^diff --git [^\n]*\n",
        r"(?:(?:old mode|new mode|deleted file mode|new file mode|similarity index",
        r"|dissimilarity index|rename from|rename to|copy from|copy to|index) [^\n]*\n)*",
        r"(?:--- [^\n]*\n\+\+\+ [^\n]*\n)?",
    ))
    .unwrap()
});

/// One commit's slice of diff/show output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitUnit {
    /// The `commit <hash>` line including its newline. Empty for the implicit
    /// commit used when the input has no commit lines, or for text that
    /// precedes the first commit line.
    pub header: String,
    /// Text between the header and the first file-diff header (author, date,
    /// and message lines). Holds the whole span when no file diff is found.
    pub message: String,
    /// File diffs in input order.
    pub file_diffs: Vec<FileDiffUnit>,
}

/// One file's slice of a commit's diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffUnit {
    /// Path of the file (extracted from the `b/` side of `diff --git a/... b/...`).
    pub path: String,
    /// The header lines (`diff --git`, mode/index lines, `---`, `+++`).
    pub header: String,
    /// Everything after the header up to the next file diff or commit.
    pub body: String,
}

impl CommitUnit {
    /// Returns the commit identifier token (the hash), or `""` for an
    /// implicit commit.
    pub fn id(&self) -> &str {
        self.header
            .strip_prefix("commit ")
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap_or("")
    }

    /// Appends this unit's original text to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.header);
        out.push_str(&self.message);
        for file_diff in &self.file_diffs {
            out.push_str(&file_diff.header);
            out.push_str(&file_diff.body);
        }
    }
}

/// Splits diff/show output into commits, each split into file diffs.
///
/// Always returns at least one [`CommitUnit`]. Input with no commit lines is
/// treated as a single implicit commit; input with no recognizable file-diff
/// headers yields a commit whose `message` is the whole span.
pub fn split_commits(text: &str) -> Vec<CommitUnit> {
    let boundaries: Vec<Match<'_>> = COMMIT_BOUNDARY.find_iter(text).collect();

    let Some(first) = boundaries.first() else {
        return vec![build_commit("", text)];
    };

    let mut commits = Vec::with_capacity(boundaries.len() + 1);

    // Text before the first commit line becomes its own implicit commit.
    if first.start() > 0 {
        commits.push(build_commit("", &text[..first.start()]));
    }

    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).map_or(text.len(), Match::start);
        commits.push(build_commit(
            boundary.as_str(),
            &text[boundary.end()..end],
        ));
    }

    commits
}

/// Segments one commit span (everything after the commit line) into the
/// message prefix and file diffs.
fn build_commit(header: &str, span: &str) -> CommitUnit {
    let headers: Vec<Match<'_>> = FILE_DIFF_HEADER.find_iter(span).collect();
    let message_end = headers.first().map_or(span.len(), Match::start);

    let file_diffs = headers
        .iter()
        .enumerate()
        .map(|(i, header_match)| {
            let end = headers.get(i + 1).map_or(span.len(), Match::start);
            let header_text = header_match.as_str();
            let first_line = header_text.lines().next().unwrap_or("");
            FileDiffUnit {
                path: extract_path_from_diff_header(first_line),
                header: header_text.to_string(),
                body: span[header_match.end()..end].to_string(),
            }
        })
        .collect();

    CommitUnit {
        header: header.to_string(),
        message: span[..message_end].to_string(),
        file_diffs,
    }
}

/// Extracts the file path from the `b/` side of a `diff --git` header line.
fn extract_path_from_diff_header(header_line: &str) -> String {
    // Format: "diff --git a/old_path b/new_path"
    // Find the last " b/" to handle paths that may contain spaces.
    if let Some(b_pos) = header_line.rfind(" b/") {
        header_line[b_pos + 3..].to_string()
    } else {
        header_line
            .strip_prefix(FILE_DIFF_MARKER)
            .unwrap_or(header_line)
            .to_string()
    }
}
