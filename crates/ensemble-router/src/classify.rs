//! Classifies a prompt into a coarse intent bucket used to score a model's
//! specialty match.

use regex::Regex;
use std::sync::LazyLock;

/// Coarse intent bucket a prompt is classified into before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Creative,
    Analytical,
    Technical,
    Explanatory,
    Conversational,
    Factual,
    General,
}

struct Rule {
    kind: RequestKind,
    pattern: Regex,
}

/// Ordered regex set; the first matching rule wins. Order matters: a
/// request asking "why does X work" should classify as explanatory before
/// it's caught by the broader factual rule.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let defs: &[(RequestKind, &str)] = &[
        (
            RequestKind::Creative,
            r"(?i)\b(write|compose|imagine|story|poem|creative|brainstorm)\b",
        ),
        (
            RequestKind::Technical,
            r"(?i)\b(code|function|algorithm|debug|compile|api|stack trace|regex)\b",
        ),
        (
            RequestKind::Analytical,
            r"(?i)\b(analyze|evaluate|compare|trade-?off|pros and cons|assess)\b",
        ),
        (
            RequestKind::Explanatory,
            r"(?i)\b(explain|how does|how do|why does|why is|walk me through)\b",
        ),
        (
            RequestKind::Conversational,
            r"(?i)\b(hi|hello|hey|how are you|chat|talk)\b",
        ),
        (
            RequestKind::Factual,
            r"(?i)\b(what is|what are|when did|who is|define|fact)\b",
        ),
    ];

    defs.iter()
        .map(|(kind, pattern)| Rule {
            kind: *kind,
            pattern: Regex::new(pattern).expect("static classification pattern is valid"),
        })
        .collect()
});

/// Classifies `prompt` into the first matching [`RequestKind`], falling
/// back to `General` if none match.
pub fn classify(prompt: &str) -> RequestKind {
    RULES
        .iter()
        .find(|rule| rule.pattern.is_match(prompt))
        .map(|rule| rule.kind)
        .unwrap_or(RequestKind::General)
}
