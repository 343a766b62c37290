//! Diff acquisition from a git repository.
//!
//! Produces `git diff` / `git show` style text through libgit2 so the
//! segmenter sees the same layout the git CLI prints.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, Diff, DiffFormat, DiffOptions, Index, Repository};
use tracing::debug;

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at the current directory.
    pub fn open() -> Result<Self> {
        let repo = Repository::open(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Opens the repository at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Equivalent of `git diff --staged`: HEAD against the index.
    pub fn staged_diff(&self) -> Result<String> {
        let head_tree = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree().context("Failed to peel HEAD to tree")?),
            // Unborn branch: everything staged is new.
            Err(_) => None,
        };
        let index = self.reloaded_index()?;

        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
            .context("Failed to diff HEAD against index")?;
        render_patch(&diff)
    }

    /// Equivalent of `git diff <rev>`: the revision against the working tree
    /// (index included).
    pub fn diff_against(&self, rev: &str) -> Result<String> {
        let tree = self
            .repo
            .revparse_single(rev)
            .with_context(|| format!("Failed to parse revision: {rev}"))?
            .peel_to_tree()
            .with_context(|| format!("Failed to peel {rev} to tree"))?;
        // The workdir diff reads the same shared index.
        self.reloaded_index()?;

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&tree), None)
            .with_context(|| format!("Failed to diff {rev} against working tree"))?;
        render_patch(&diff)
    }

    /// Equivalent of `git show <rev>`: commit header, indented message and
    /// the patch against the first parent.
    pub fn show_commit(&self, rev: &str) -> Result<String> {
        let commit = self
            .repo
            .revparse_single(rev)
            .with_context(|| format!("Failed to parse commit: {rev}"))?
            .peel_to_commit()
            .context("Failed to peel object to commit")?;

        self.render_commit(&commit, false)
    }

    /// Equivalent of `git show <base>..HEAD`, oldest commit first.
    ///
    /// Merge commits are skipped. With `ignore_space_change` the patches
    /// ignore changes in the amount of whitespace.
    pub fn show_range(&self, base: &str, ignore_space_change: bool) -> Result<String> {
        let base_commit = self
            .repo
            .revparse_single(base)
            .with_context(|| format!("Failed to parse base commit: {base}"))?
            .peel_to_commit()
            .context("Failed to peel base object to commit")?;
        let head_commit = self
            .repo
            .head()
            .context("Failed to get HEAD")?
            .peel_to_commit()
            .context("Failed to peel HEAD to commit")?;

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .push(head_commit.id())
            .context("Failed to push HEAD")?;
        walker
            .hide(base_commit.id())
            .context("Failed to hide base commit")?;

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;

            // Skip merge commits
            if commit.parent_count() > 1 {
                continue;
            }
            commits.push(commit);
        }

        // Reverse to get chronological order (oldest first)
        commits.reverse();
        debug!(base, commit_count = commits.len(), "Rendering commit range");

        let mut output = String::new();
        for commit in &commits {
            output.push_str(&self.render_commit(commit, ignore_space_change)?);
        }
        Ok(output)
    }

    /// Input for commit message generation: `show <rev>` when a revision is
    /// given, otherwise the staged diff, otherwise the diff against `HEAD~1`.
    pub fn commit_message_input(&self, rev: Option<&str>) -> Result<String> {
        if let Some(rev) = rev {
            return self.show_commit(rev);
        }

        let staged = self.staged_diff()?;
        if !staged.trim().is_empty() {
            return Ok(staged);
        }

        debug!("Nothing staged, falling back to diff against HEAD~1");
        self.diff_against("HEAD~1")
    }

    /// Input for pull request generation: `show <target>..HEAD` ignoring
    /// whitespace-amount changes.
    pub fn pull_request_input(&self, target: &str) -> Result<String> {
        self.show_range(target, true)
    }

    /// The repository index, re-read from disk so changes staged by other
    /// handles or processes are visible.
    fn reloaded_index(&self) -> Result<Index> {
        let mut index = self.repo.index().context("Failed to read index")?;
        index.read(true).context("Failed to reload index")?;
        Ok(index)
    }

    fn render_commit(&self, commit: &Commit<'_>, ignore_space_change: bool) -> Result<String> {
        let author = commit.author();
        let when = author.when();
        let date = DateTime::from_timestamp(when.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(
                &FixedOffset::east_opt(when.offset_minutes() * 60)
                    .context("Invalid commit timezone offset")?,
            );

        let mut output = format!(
            "commit {}\nAuthor: {} <{}>\nDate:   {}\n\n",
            commit.id(),
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or("unknown@example.com"),
            date.format("%a %b %-d %H:%M:%S %Y %z"),
        );
        for line in commit.message().unwrap_or("").trim_end().lines() {
            output.push_str("    ");
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');

        let commit_tree = commit.tree().context("Failed to get commit tree")?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(
                commit
                    .parent(0)
                    .context("Failed to get parent commit")?
                    .tree()
                    .context("Failed to get parent tree")?,
            )
        } else {
            None
        };

        let mut options = DiffOptions::new();
        options.ignore_whitespace_change(ignore_space_change);
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), Some(&mut options))
            .context("Failed to create diff")?;

        output.push_str(&render_patch(&diff)?);
        Ok(output)
    }
}

/// Formats a diff as a unified patch.
fn render_patch(diff: &Diff<'_>) -> Result<String> {
    let mut patch = String::new();

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        let prefix = match line.origin() {
            '+' => "+",
            '-' => "-",
            ' ' => " ",
            _ => "", // file and hunk headers carry their own text
        };
        patch.push_str(prefix);
        patch.push_str(&content);
        true
    })
    .context("Failed to format diff")?;

    Ok(patch)
}
