use std::fmt;

/// How the snippet window is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetMethod {
    /// Uniformly random start, reproducible from the seed.
    Random,
    /// Window with the greatest RMS energy.
    HighestRms,
    /// Unknown name; selected like [`SnippetMethod::Random`] but recorded
    /// under the requested name.
    Other(String),
}

impl SnippetMethod {
    pub fn parse(name: &str) -> Self {
        match name {
            "random" => SnippetMethod::Random,
            "highest_rms" => SnippetMethod::HighestRms,
            other => SnippetMethod::Other(other.to_string()),
        }
    }

    /// Name written to the ledger.
    pub fn label(&self) -> &str {
        match self {
            SnippetMethod::Random => "random",
            SnippetMethod::HighestRms => "highest_rms",
            SnippetMethod::Other(name) => name,
        }
    }
}

impl Default for SnippetMethod {
    fn default() -> Self {
        SnippetMethod::Random
    }
}

impl fmt::Display for SnippetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_parse() {
        assert_eq!(SnippetMethod::parse("random"), SnippetMethod::Random);
        assert_eq!(SnippetMethod::parse("highest_rms"), SnippetMethod::HighestRms);
    }

    #[test]
    fn unknown_name_keeps_its_label() {
        let m = SnippetMethod::parse("loudest");
        assert_eq!(m, SnippetMethod::Other("loudest".into()));
        assert_eq!(m.label(), "loudest");
        assert_eq!(m.to_string(), "loudest");
    }
}
