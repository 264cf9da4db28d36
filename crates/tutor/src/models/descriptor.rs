use regex::Regex;
use std::collections::BTreeSet;

/// Static routing metadata for one agent: its name, the keywords that point at it,
/// and any patterns that recognise its inputs by shape rather than vocabulary.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub keywords: BTreeSet<String>,
    pub patterns: Vec<Regex>,
}

impl AgentDescriptor {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            keywords: BTreeSet::new(),
            patterns: Vec::new(),
        }
    }

    pub fn with_keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.keywords
            .extend(keywords.into_iter().map(|k| k.as_ref().to_lowercase()));
        self
    }

    /// Compile and attach patterns, matched against the lowercased raw query
    pub fn with_patterns<I, P>(mut self, patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        for pattern in patterns {
            self.patterns.push(Regex::new(pattern.as_ref())?);
        }
        Ok(self)
    }
}
