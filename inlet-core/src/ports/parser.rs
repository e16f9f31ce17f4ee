//! Statement parser port
//!
//! Every format parser implements this capability interface. The registry
//! resolves "which parser handles this file" by asking each parser in
//! registration order; parse() is the only step allowed to block on I/O and
//! must not mutate shared state.

use std::path::Path;

use crate::domain::result::Result;
use crate::domain::{BankProfile, ParseResult, ParserConfig};

/// Capability interface implemented by every statement format parser
pub trait StatementParser: Send + Sync {
    /// Static descriptor: registry key, extensions, MIME types, tunables
    fn config(&self) -> &ParserConfig;

    /// Registry key
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Whether this parser claims the file. The default answer matches on
    /// extension or MIME from the descriptor; parsers with sniffing logic
    /// override this.
    fn can_parse(&self, filename: &str, mime: Option<&str>) -> bool {
        let config = self.config();
        if let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) {
            if config.matches_extension(ext) {
                return true;
            }
        }
        mime.map(|m| config.matches_mime(m)).unwrap_or(false)
    }

    /// Turn raw bytes into a ParseResult, consulting the bank profile when
    /// the format is bank-specific. File-level failures are reported inside
    /// the result (`success == false`), not as an Err; Err is reserved for
    /// I/O-level faults.
    fn parse(&self, path: &Path, profile: Option<&BankProfile>) -> Result<ParseResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeParser {
        config: ParserConfig,
    }

    impl StatementParser for FakeParser {
        fn config(&self) -> &ParserConfig {
            &self.config
        }

        fn parse(&self, _path: &Path, _profile: Option<&BankProfile>) -> Result<ParseResult> {
            Ok(ParseResult::new())
        }
    }

    #[test]
    fn test_default_can_parse_by_extension_and_mime() {
        let parser = FakeParser {
            config: ParserConfig::new("csv", &["csv"], &["text/csv"]),
        };
        assert!(parser.can_parse("statement.csv", None));
        assert!(parser.can_parse("STATEMENT.CSV", None));
        assert!(parser.can_parse("blob", Some("text/csv")));
        assert!(!parser.can_parse("statement.pdf", None));
        assert!(!parser.can_parse("blob", None));
    }
}
