//! Keyword pre-check that keeps off-topic questions away from retrieval.

/// Reply for questions outside the allowed HR topics.
pub const OUT_OF_SCOPE_REPLY: &str =
    "Question outside allowed HR topics. Please ask about leave, overtime, compensation, or company policy.";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "leave",
    "overtime",
    "compensation",
    "salary",
    "hours",
    "policy",
    "holiday",
];

/// Case-insensitive substring match against an allow-list.
///
/// Deliberately crude: "leaves" and "unleavened" both match "leave". A false
/// positive only costs an embedding call; a false negative gets the fixed
/// out-of-scope reply.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    keywords: Vec<String>,
}

impl TopicFilter {
    /// Build a filter from custom keywords. Blank entries are dropped and an
    /// empty list falls back to [`DEFAULT_KEYWORDS`].
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Self::default();
        }
        Self { keywords }
    }

    pub fn in_scope(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.keywords.iter().any(|k| query.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}
