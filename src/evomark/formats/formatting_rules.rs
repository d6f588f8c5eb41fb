use crate::evomark::config::FormattingConfig;

/// Knobs of the evomark pretty-printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingRules {
    /// One indentation unit, repeated per nesting level of block bodies
    pub indent_string: String,
}

impl Default for FormattingRules {
    fn default() -> Self {
        Self {
            indent_string: "  ".to_string(),
        }
    }
}

impl From<&FormattingConfig> for FormattingRules {
    fn from(config: &FormattingConfig) -> Self {
        Self {
            indent_string: config.indent_string.clone(),
        }
    }
}
