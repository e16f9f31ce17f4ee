//! Parser registry - maps files to the parser that claims them
//!
//! An explicitly constructed instance handed to the import workflow; no
//! process-wide state. Registration order is the tie-break: more specific
//! parsers go first, and the first `can_parse` win takes the file.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ports::StatementParser;

/// Ordered collection of registered parsers
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn StatementParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parser; replaces any previous registration under the same
    /// name, keeping the original position
    pub fn register(&mut self, parser: Arc<dyn StatementParser>) {
        if let Some(slot) = self
            .parsers
            .iter_mut()
            .find(|p| p.name() == parser.name())
        {
            *slot = parser;
        } else {
            self.parsers.push(parser);
        }
    }

    /// Remove a parser by name; returns false when it was not registered
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.parsers.len();
        self.parsers.retain(|p| p.name() != name);
        self.parsers.len() != before
    }

    /// First registered parser whose `can_parse` accepts the file, or None
    /// (the caller surfaces "unsupported format", not an error)
    pub fn find_parser(
        &self,
        filename: &str,
        mime: Option<&str>,
    ) -> Option<Arc<dyn StatementParser>> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(filename, mime))
            .cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StatementParser>> {
        self.parsers.iter().find(|p| p.name() == name).cloned()
    }

    /// Registered parser names, in registration order
    pub fn list_parsers(&self) -> Vec<String> {
        self.parsers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn supported_extensions(&self) -> BTreeSet<String> {
        self.parsers
            .iter()
            .flat_map(|p| p.config().supported_extensions.iter().cloned())
            .collect()
    }

    pub fn supported_mime_types(&self) -> BTreeSet<String> {
        self.parsers
            .iter()
            .flat_map(|p| p.config().mime_types.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Result;
    use crate::domain::{BankProfile, ParseResult, ParserConfig};
    use std::path::Path;

    struct StubParser {
        config: ParserConfig,
    }

    impl StubParser {
        fn new(name: &str, extensions: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                config: ParserConfig::new(name, extensions, &[]),
            })
        }
    }

    impl StatementParser for StubParser {
        fn config(&self) -> &ParserConfig {
            &self.config
        }

        fn parse(&self, _path: &Path, _profile: Option<&BankProfile>) -> Result<ParseResult> {
            Ok(ParseResult::new())
        }
    }

    #[test]
    fn test_find_parser_by_extension() {
        let mut registry = ParserRegistry::new();
        registry.register(StubParser::new("csv", &["csv"]));
        registry.register(StubParser::new("pdf", &["pdf"]));

        assert_eq!(registry.find_parser("a.csv", None).unwrap().name(), "csv");
        assert_eq!(registry.find_parser("a.pdf", None).unwrap().name(), "pdf");
        assert!(registry.find_parser("a.docx", None).is_none());
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut registry = ParserRegistry::new();
        registry.register(StubParser::new("specific", &["txt", "csv"]));
        registry.register(StubParser::new("generic", &["csv"]));

        assert_eq!(
            registry.find_parser("a.csv", None).unwrap().name(),
            "specific"
        );
    }

    #[test]
    fn test_reregister_keeps_position() {
        let mut registry = ParserRegistry::new();
        registry.register(StubParser::new("first", &["csv"]));
        registry.register(StubParser::new("second", &["pdf"]));
        registry.register(StubParser::new("first", &["qif"]));

        assert_eq!(registry.list_parsers(), vec!["first", "second"]);
        assert_eq!(registry.find_parser("a.qif", None).unwrap().name(), "first");
        assert!(registry.find_parser("a.csv", None).is_none());
    }

    #[test]
    fn test_unregister() {
        let mut registry = ParserRegistry::new();
        registry.register(StubParser::new("csv", &["csv"]));
        assert!(registry.unregister("csv"));
        assert!(!registry.unregister("csv"));
        assert!(registry.find_parser("a.csv", None).is_none());
    }

    #[test]
    fn test_supported_sets() {
        let mut registry = ParserRegistry::new();
        registry.register(StubParser::new("csv", &["csv"]));
        registry.register(StubParser::new("excel", &["xlsx", "xls"]));
        let extensions = registry.supported_extensions();
        assert!(extensions.contains("csv"));
        assert!(extensions.contains("xlsx"));
        assert_eq!(extensions.len(), 3);
    }
}
