//! Prompt templates for the pull request and commit skills.

/// System prompt shared by the diff-reading functions.
pub const DIFF_SYSTEM_PROMPT: &str = "You are an expert software engineer reviewing version control changes. \
Base every statement on the actual lines added and removed in the diff, not on file names or assumptions.";

/// System prompt for merging partial results.
pub const CONDENSER_SYSTEM_PROMPT: &str = "You merge several partial answers to the same task into one answer. \
Keep every distinct fact, drop repetition, and keep the requested output format.";

/// Result format used when the caller does not supply one.
pub const DEFAULT_COMMIT_RESULT_FORMAT: &str =
    "The result format should be \"<TITLE>\n\n<SUMMARY>\"";

/// Commit message generation over one chunk of `git diff` output.
pub const COMMIT_MESSAGE_TEMPLATE: &str = r"[GITDIFFCONTENT]
{{$input}}
[END GITDIFFCONTENT]

[GITDIFFCONTENT] is part or all of the output of `git diff`.

Write a commit message that describes the changes in [GITDIFFCONTENT].
The title is a single imperative line under 72 characters.
The summary lists the notable changes as short bullet points.
{{$resultformat}}

Commit message:
";

/// Pull request description over one chunk of `git show` output.
pub const PULL_REQUEST_DESCRIPTION_TEMPLATE: &str = r"[GITSHOWCONTENT]
{{$input}}
[END GITSHOWCONTENT]

[GITSHOWCONTENT] is part or all of the output of `git show` for the commits of a pull request.

Write a pull request description for the changes in [GITSHOWCONTENT].
Start with a one paragraph overview, then list the changes grouped by area.
Mention breaking changes and new configuration explicitly.

Pull request description:
";

/// Pull request description that extends the description of earlier chunks.
pub const PULL_REQUEST_DESCRIPTION_ROLLING_TEMPLATE: &str = r"[PREVIOUSDESCRIPTION]
{{$previousresults}}
[END PREVIOUSDESCRIPTION]

[GITSHOWCONTENT]
{{$input}}
[END GITSHOWCONTENT]

[GITSHOWCONTENT] is the next part of the `git show` output for a pull request.
[PREVIOUSDESCRIPTION] describes the parts already seen and may be empty.

Rewrite [PREVIOUSDESCRIPTION] so it also covers the changes in [GITSHOWCONTENT].
Start with a one paragraph overview, then list the changes grouped by area.

Pull request description:
";

/// Review feedback over one chunk of `git diff` or `git show` output.
pub const PULL_REQUEST_FEEDBACK_TEMPLATE: &str = r"[GITDIFFCONTENT]
{{$input}}
[END GITDIFFCONTENT]

[GITDIFFCONTENT] is part of the changes in a pull request.

Review the changes in [GITDIFFCONTENT]. For each problem give the file, the
line, what is wrong and a suggested fix. Cover bugs, missing error handling,
unclear naming and missing tests. Reply with nothing if there are no problems.

Feedback:
";

/// Free-form task over one chunk of `git diff` output.
pub const DYNAMIC_TEMPLATE: &str = r"[GITDIFFCONTENT]
{{$input}}
[END GITDIFFCONTENT]

[GITDIFFCONTENT] is part or all of the output of `git diff`.

Use [GITDIFFCONTENT] as knowledge for completing tasks.

Task:
{{$instructions}}

Result:
";

/// Merges partial results separated by tagged delimiters.
pub const CONDENSER_TEMPLATE: &str = r"[ORIGINALPROMPT]
{{$prompt}}
[END ORIGINALPROMPT]

[RESULTS]
{{$input}}
[END RESULTS]

[RESULTS] holds several answers to [ORIGINALPROMPT], each produced from a
different part of the same input and each followed by a delimiter line.

Combine [RESULTS] into one answer to [ORIGINALPROMPT]. Do not mention the
delimiters or that the input was split.

Combined result:
";
