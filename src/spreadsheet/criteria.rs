use crate::error::SheetLinkError;
use glob::Pattern;

/// Criteria for selecting which sheets are loaded from a workbook file.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Sheet name patterns for filtering which sheets to load.
    pub sheet_name_patterns: Option<Vec<Pattern>>,

    /// Maximum number of sheets to load.
    pub sheet_limit: Option<usize>,

    /// Load error cells (`#N/A`, `#REF!`, ...) as blanks instead of failing.
    pub error_as_null: bool,
}

impl Criteria {
    /// Builds criteria that only accept sheets matching one of the glob patterns.
    pub fn with_sheet_names(patterns: &[&str]) -> Result<Self, SheetLinkError> {
        let patterns = patterns
            .iter()
            .map(|pattern| Pattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Criteria {
            sheet_name_patterns: Some(patterns),
            ..Default::default()
        })
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.sheet_name_patterns {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_by_pattern() {
        assert!(Criteria::default().accept("anything"));

        let criteria = Criteria::with_sheet_names(&["Item*", "Config"]).unwrap();
        assert!(criteria.accept("Items"));
        assert!(criteria.accept("Config"));
        assert!(!criteria.accept("Notes"));
    }

    #[test]
    fn invalid_pattern() {
        assert!(matches!(
            Criteria::with_sheet_names(&["[unclosed"]),
            Err(SheetLinkError::PatternError(_))
        ));
    }
}
