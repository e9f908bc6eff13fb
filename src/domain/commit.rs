use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Semantic category of a commit, as far as release tagging is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitKind {
    Fix,
    Feature,
    Breaking,
    Other,
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitKind::Fix => write!(f, "fix"),
            CommitKind::Feature => write!(f, "feature"),
            CommitKind::Breaking => write!(f, "breaking"),
            CommitKind::Other => write!(f, "other"),
        }
    }
}

/// The two lines of a commit message that classification looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage<'a> {
    /// First line, trimmed
    pub subject: &'a str,
    /// Last non-blank line of the message, trimmed. Equal to `subject` for one-line messages.
    pub footer: &'a str,
}

impl<'a> CommitMessage<'a> {
    pub fn parse(message: &'a str) -> Self {
        // git stores messages with a trailing newline; it is not a footer line
        let body = message.trim_end();
        let subject = body.lines().next().unwrap_or("").trim();
        let footer = body.lines().last().unwrap_or("").trim();
        CommitMessage { subject, footer }
    }
}

fn short_breaking_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(?:\([A-Za-z0-9_./-]*\))?!(?::|$)")
            .expect("valid breaking marker regex")
    })
}

fn long_breaking_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^breaking[ -]change").expect("valid breaking footer regex"))
}

fn subject_starts_with(message: &CommitMessage<'_>, prefix: &str) -> bool {
    message
        .subject
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_fix(message: &CommitMessage<'_>) -> bool {
    subject_starts_with(message, "fix")
}

fn is_feature(message: &CommitMessage<'_>) -> bool {
    subject_starts_with(message, "feat")
}

fn is_breaking(message: &CommitMessage<'_>) -> bool {
    short_breaking_regex().is_match(message.subject) || long_breaking_regex().is_match(message.footer)
}

/// A single classification rule: first matching rule wins
pub struct ClassificationRule {
    pub kind: CommitKind,
    pub matches: fn(&CommitMessage<'_>) -> bool,
}

/// Classification rules in precedence order.
///
/// A `feat!:` subject is therefore a feature, not a breaking change.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        kind: CommitKind::Fix,
        matches: is_fix,
    },
    ClassificationRule {
        kind: CommitKind::Feature,
        matches: is_feature,
    },
    ClassificationRule {
        kind: CommitKind::Breaking,
        matches: is_breaking,
    },
];

/// Classify a full commit message
pub fn classify(message: &str) -> CommitKind {
    let parsed = CommitMessage::parse(message);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&parsed))
        .map(|rule| rule.kind)
        .unwrap_or(CommitKind::Other)
}
