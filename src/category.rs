//! Category maps: feature types to column category numbers.
//!
//! Category 0 is always the background category, named `background`.
//! A feature type maps to a contiguous range of categories; ranges wider
//! than one category are *cyclic* (e.g. the three codon positions of a
//! CDS) and are assigned column by column.
//!
//! ## Text format
//!
//! ```text
//! # comment
//! NCATS = 4
//! CDS     1-3
//! intron  4
//! LABELLING_PRECEDENCE = 1,2,3,4
//! ```
//!
//! `NCATS` counts the non-background categories. A category listed earlier
//! in `LABELLING_PRECEDENCE` wins over one listed later. Unlisted
//! categories are always overwritable, and only overwrite labels that are
//! unlisted too.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

/// Name of category 0.
pub const BACKGROUND_NAME: &str = "background";

/// Errors that can occur when building a category map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryMapError {
    #[error("Missing NCATS declaration")]
    MissingNcats,

    #[error("Line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("Range {start}-{end} for '{name}' is outside 1..={max}")]
    RangeOutOfBounds { name: String, start: usize, end: usize, max: usize },

    #[error("Category {0} in precedence list does not exist")]
    UnknownPrecedence(usize),
}

/// Result type for category map operations.
pub type CategoryMapResult<T> = Result<T, CategoryMapError>;

/// Lookup interface used when labeling alignment columns.
pub trait CategoryMap {
    /// Total number of categories, background included.
    fn ncats(&self) -> usize;

    /// First category of the range named `name`. `background` is 0.
    fn category(&self, name: &str) -> Option<usize>;

    /// The range containing category `cat`.
    fn range(&self, cat: usize) -> RangeInclusive<usize>;

    /// Labeling precedence of `cat`; lower wins, `None` never wins.
    fn precedence(&self, cat: usize) -> Option<usize>;
}

/// In-memory category map built from names and ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCategoryMap {
    names: HashMap<String, usize>,
    /// Range containing each category, indexed by category.
    ranges: Vec<RangeInclusive<usize>>,
    precedence: Vec<Option<usize>>,
}

impl SimpleCategoryMap {
    /// Creates a map with `ncats` non-background categories, each its own range.
    pub fn new(ncats: usize) -> Self {
        let mut names = HashMap::new();
        names.insert(BACKGROUND_NAME.to_string(), 0);
        Self {
            names,
            ranges: (0..=ncats).map(|c| c..=c).collect(),
            precedence: vec![None; ncats + 1],
        }
    }

    /// Names a range of categories (1-based category numbers, inclusive).
    pub fn add(&mut self, name: &str, range: RangeInclusive<usize>) -> CategoryMapResult<()> {
        let (start, end) = (*range.start(), *range.end());
        let max = self.ranges.len() - 1;
        if start == 0 || end > max || start > end {
            return Err(CategoryMapError::RangeOutOfBounds {
                name: name.to_string(),
                start,
                end,
                max,
            });
        }
        for cat in start..=end {
            self.ranges[cat] = start..=end;
        }
        self.names.insert(name.to_string(), start);
        Ok(())
    }

    /// Sets labeling precedence: earlier categories win.
    pub fn set_precedence(&mut self, order: &[usize]) -> CategoryMapResult<()> {
        let mut precedence = vec![None; self.ranges.len()];
        for (rank, &cat) in order.iter().enumerate() {
            let slot = precedence
                .get_mut(cat)
                .ok_or(CategoryMapError::UnknownPrecedence(cat))?;
            *slot = Some(rank);
        }
        self.precedence = precedence;
        Ok(())
    }
}

impl CategoryMap for SimpleCategoryMap {
    fn ncats(&self) -> usize {
        self.ranges.len()
    }

    fn category(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    fn range(&self, cat: usize) -> RangeInclusive<usize> {
        self.ranges.get(cat).cloned().unwrap_or(cat..=cat)
    }

    fn precedence(&self, cat: usize) -> Option<usize> {
        self.precedence.get(cat).copied().flatten()
    }
}

fn parse_range(field: &str, line: usize) -> CategoryMapResult<RangeInclusive<usize>> {
    let bad = || CategoryMapError::Parse {
        line,
        msg: format!("bad category range '{}'", field),
    };
    match field.split_once('-') {
        Some((a, b)) => {
            let a = a.trim().parse().map_err(|_| bad())?;
            let b = b.trim().parse().map_err(|_| bad())?;
            Ok(a..=b)
        }
        None => {
            let c = field.trim().parse().map_err(|_| bad())?;
            Ok(c..=c)
        }
    }
}

impl FromStr for SimpleCategoryMap {
    type Err = CategoryMapError;

    fn from_str(s: &str) -> CategoryMapResult<Self> {
        let mut map: Option<SimpleCategoryMap> = None;
        for (i, raw) in s.lines().enumerate() {
            let line = i + 1;
            let text = raw.split('#').next().unwrap_or("").trim();
            if text.is_empty() {
                continue;
            }

            if let Some((key, value)) = text.split_once('=') {
                let key = key.trim().to_ascii_uppercase();
                let value = value.trim();
                match key.as_str() {
                    "NCATS" => {
                        let n = value.parse().map_err(|_| CategoryMapError::Parse {
                            line,
                            msg: format!("bad NCATS value '{}'", value),
                        })?;
                        map = Some(SimpleCategoryMap::new(n));
                    }
                    "LABELLING_PRECEDENCE" | "LABELING_PRECEDENCE" => {
                        let cm = map.as_mut().ok_or(CategoryMapError::MissingNcats)?;
                        let order = value
                            .split(',')
                            .map(|c| c.trim().parse::<usize>())
                            .collect::<Result<Vec<_>, _>>()
                            .map_err(|_| CategoryMapError::Parse {
                                line,
                                msg: format!("bad precedence list '{}'", value),
                            })?;
                        cm.set_precedence(&order)?;
                    }
                    _ => log::debug!("Ignoring category map setting {}", key),
                }
                continue;
            }

            let cm = map.as_mut().ok_or(CategoryMapError::MissingNcats)?;
            let mut fields = text.split_whitespace();
            let (Some(name), Some(range)) = (fields.next(), fields.next()) else {
                return Err(CategoryMapError::Parse {
                    line,
                    msg: format!("expected '<name> <range>', got '{}'", text),
                });
            };
            cm.add(name, parse_range(range, line)?)?;
        }
        map.ok_or(CategoryMapError::MissingNcats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "\
# gene model
NCATS = 5
CDS     1-3
intron  4
start_codon 5
LABELLING_PRECEDENCE = 5,1,2,3
";

    #[test]
    fn test_parse_category_map() {
        let cm: SimpleCategoryMap = MAP.parse().unwrap();
        assert_eq!(cm.ncats(), 6);
        assert_eq!(cm.category("background"), Some(0));
        assert_eq!(cm.category("CDS"), Some(1));
        assert_eq!(cm.category("intron"), Some(4));
        assert_eq!(cm.category("UTR"), None);
        assert_eq!(cm.range(2), 1..=3);
        assert_eq!(cm.range(4), 4..=4);
        assert_eq!(cm.range(0), 0..=0);
    }

    #[test]
    fn test_precedence_order() {
        let cm: SimpleCategoryMap = MAP.parse().unwrap();
        assert_eq!(cm.precedence(5), Some(0));
        assert_eq!(cm.precedence(1), Some(1));
        assert_eq!(cm.precedence(4), None);
        assert_eq!(cm.precedence(0), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "CDS 1-3".parse::<SimpleCategoryMap>(),
            Err(CategoryMapError::MissingNcats)
        );
        assert!(matches!(
            "NCATS = 2\nCDS 1-3".parse::<SimpleCategoryMap>(),
            Err(CategoryMapError::RangeOutOfBounds { .. })
        ));
        assert!(matches!(
            "NCATS = 2\nCDS x".parse::<SimpleCategoryMap>(),
            Err(CategoryMapError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            "NCATS = 2\nLABELLING_PRECEDENCE = 1,7".parse::<SimpleCategoryMap>(),
            Err(CategoryMapError::UnknownPrecedence(7))
        ));
    }
}
