use regex::Regex;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}(?:[ \t]+|$)").expect("valid regex"));

// A fence opening a line, with its language tag and the line break after it.
static FENCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```[\w+#.\-]*[ \t]*\r?\n?").expect("valid regex")
});

// A fence after other text on the line. The tag goes; the line break stays.
static FENCE_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\w+#.\-]*").expect("valid regex"));

static BOLD_ITALIC_STAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*\*([^*\s](?:[^*\n]*[^*\s])?)\*\*\*").expect("valid regex")
});

static BOLD_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\s](?:[^*\n]*[^*\s])?)\*\*").expect("valid regex"));

static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").expect("valid regex"));

// Underscore emphasis only counts at word boundaries; snake_case stays intact.
static BOLD_ITALIC_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b___([^_\s](?:[^_\n]*[^_\s])?)___\b").expect("valid regex")
});

static BOLD_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b__([^_\s](?:[^_\n]*[^_\s])?)__\b").expect("valid regex"));

static ITALIC_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\s](?:[^_\n]*[^_\s])?)_\b").expect("valid regex"));

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));

/// Strip markdown artifacts from provider text, leaving plain text.
///
/// Headers, code fences, emphasis markers and inline-code backticks are
/// removed while the text they wrap is kept; runs of two or more blank lines
/// collapse to one; the result is trimmed.
///
/// Passes repeat until nothing changes, so `sanitize(sanitize(x)) ==
/// sanitize(x)`. Every pass that changes the text makes it shorter, which
/// bounds the loop.
pub fn sanitize(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let mut s = HEADER_RE.replace_all(text, "").into_owned();
    s = FENCE_LINE_RE.replace_all(&s, "").into_owned();
    s = FENCE_INLINE_RE.replace_all(&s, "").into_owned();

    for re in [
        &*BOLD_ITALIC_STAR_RE,
        &*BOLD_STAR_RE,
        &*ITALIC_STAR_RE,
        &*BOLD_ITALIC_UNDERSCORE_RE,
        &*BOLD_UNDERSCORE_RE,
        &*ITALIC_UNDERSCORE_RE,
        &*INLINE_CODE_RE,
    ] {
        s = re.replace_all(&s, "$1").into_owned();
    }

    s = BLANK_RUN_RE.replace_all(&s, "\n\n").into_owned();
    s.trim().to_string()
}
