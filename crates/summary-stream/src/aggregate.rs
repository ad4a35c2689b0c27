use crate::classify::ClassifiedContent;

/// Owner of the running output string for one session.
///
/// Content is appended verbatim in arrival order, with no separator and no
/// deduplication.
#[derive(Debug, Default)]
pub struct Aggregator {
    output: String,
    units: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the text carried by `content`.
    pub fn append(&mut self, content: ClassifiedContent) {
        self.output.push_str(content.text());
        self.units = self.units.saturating_add(1);
    }

    /// Clears the output before a new session.
    pub fn reset(&mut self) {
        self.output.clear();
        self.units = 0;
    }

    /// Current aggregate output.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Number of units appended since the last reset.
    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_both_variants_in_order_without_separator() {
        let mut aggregator = Aggregator::new();
        aggregator.append(ClassifiedContent::Structured("Hel".into()));
        aggregator.append(ClassifiedContent::Opaque("lo ".into()));
        aggregator.append(ClassifiedContent::Structured("world".into()));
        assert_eq!(aggregator.output(), "Hello world");
        assert_eq!(aggregator.units(), 3);
    }

    #[test]
    fn repeated_content_is_duplicated() {
        let mut aggregator = Aggregator::new();
        let content = ClassifiedContent::Opaque("ab".into());
        aggregator.append(content.clone());
        aggregator.append(content);
        assert_eq!(aggregator.into_output(), "abab");
    }

    #[test]
    fn reset_clears_output() {
        let mut aggregator = Aggregator::new();
        aggregator.append(ClassifiedContent::Opaque("stale".into()));
        aggregator.reset();
        assert_eq!(aggregator.output(), "");
        assert_eq!(aggregator.units(), 0);
    }
}
