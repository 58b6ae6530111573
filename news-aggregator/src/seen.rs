use std::collections::HashSet;

/// Links the session has already acknowledged. Only ever grows.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    links: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many links were not already present.
    pub fn mark_all_seen<I, S>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.links.len();
        self.links.extend(links.into_iter().map(Into::into));
        self.links.len() - before
    }

    pub fn mark_seen(&mut self, link: impl Into<String>) -> bool {
        self.links.insert(link.into())
    }

    pub fn is_seen(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_all_seen_is_idempotent() {
        let mut seen = SeenSet::new();
        assert_eq!(seen.mark_all_seen(["https://a", "https://b"]), 2);
        assert_eq!(seen.mark_all_seen(["https://a", "https://b"]), 0);
        assert_eq!(seen.len(), 2);
        assert!(seen.is_seen("https://a"));
        assert!(!seen.is_seen("https://c"));
    }

    #[test]
    fn single_mark_reports_novelty() {
        let mut seen = SeenSet::new();
        assert!(seen.is_empty());
        assert!(seen.mark_seen("https://a"));
        assert!(!seen.mark_seen(String::from("https://a")));
    }
}
