use std::collections::HashSet;

/// Product URLs already recorded in the store
///
/// Rebuilt from every stored row at startup and grown only by the discovery
/// pass. A URL is inserted right after its stub row is durably appended and
/// before its detail workflow starts, so a crash mid-extraction never
/// re-queues it.
#[derive(Debug, Clone, Default)]
pub struct SeenUrls {
    urls: HashSet<String>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Returns true if the URL was not already present
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl From<HashSet<String>> for SeenUrls {
    fn from(urls: HashSet<String>) -> Self {
        Self { urls }
    }
}

impl FromIterator<String> for SeenUrls {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_novelty() {
        let mut seen = SeenUrls::new();
        assert!(seen.insert("https://printify.com/app/products/1"));
        assert!(!seen.insert("https://printify.com/app/products/1"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let seen: SeenUrls = vec!["a".to_string(), "b".to_string(), "a".to_string()]
            .into_iter()
            .collect();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("a"));
        assert!(!seen.contains("c"));
    }
}
