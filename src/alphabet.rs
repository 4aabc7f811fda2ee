//! Alphabet and character classification.
//!
//! An [`Alphabet`] is the ordered set of "real" symbols an alignment may
//! contain, plus the set of missing-data symbols. The gap character is
//! always [`GAP_CHAR`] and is never part of either set.
//!
//! Lookups are table-driven (one slot per byte value), so classifying a
//! character is a single array access.

use thiserror::Error;

/// Alignment gap character.
pub const GAP_CHAR: u8 = b'-';

/// Default alphabet (DNA).
pub const DEFAULT_ALPHABET: &str = "ACGT";

/// Default missing-data characters. The first one is used when a
/// missing-data character has to be synthesized.
pub const DEFAULT_MISSING: &str = "*N";

/// Ambiguity symbol substituted for unrecognized letters when reading.
pub const AMBIGUITY_CHAR: u8 = b'N';

/// Errors that can occur when building an alphabet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("Empty alphabet")]
    Empty,

    #[error("Alphabet contains the gap character '-'")]
    ContainsGap,

    #[error("Alphabet contains non-printable or whitespace character (byte {0})")]
    InvalidSymbol(u8),

    #[error("Duplicate symbol '{0}' in alphabet")]
    DuplicateSymbol(char),
}

/// Result type for alphabet operations.
pub type AlphabetResult<T> = Result<T, AlphabetError>;

/// Ordered symbol set with inverse lookup and missing-data table.
///
/// Every symbol has exactly one inverse-lookup slot holding its index;
/// every other slot is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    inverse: [Option<u8>; 256],
    missing: Vec<u8>,
    is_missing: [bool; 256],
}

impl Alphabet {
    /// Creates an alphabet from its symbols, using the default missing-data set.
    pub fn new(symbols: &str) -> AlphabetResult<Self> {
        Self::with_missing(symbols, DEFAULT_MISSING)
    }

    /// Creates an alphabet with an explicit set of missing-data characters.
    pub fn with_missing(symbols: &str, missing: &str) -> AlphabetResult<Self> {
        let symbols = symbols.as_bytes().to_vec();
        Self::validate(&symbols)?;
        let mut alphabet = Self {
            symbols,
            inverse: [None; 256],
            missing: missing.as_bytes().to_vec(),
            is_missing: [false; 256],
        };
        alphabet.rebuild_tables();
        Ok(alphabet)
    }

    fn validate(symbols: &[u8]) -> AlphabetResult<()> {
        if symbols.is_empty() {
            return Err(AlphabetError::Empty);
        }
        if symbols.len() > u8::MAX as usize {
            return Err(AlphabetError::InvalidSymbol(symbols[u8::MAX as usize]));
        }
        let mut seen = [false; 256];
        for &c in symbols {
            if c == GAP_CHAR {
                return Err(AlphabetError::ContainsGap);
            }
            if !c.is_ascii_graphic() {
                return Err(AlphabetError::InvalidSymbol(c));
            }
            if seen[c as usize] {
                return Err(AlphabetError::DuplicateSymbol(c as char));
            }
            seen[c as usize] = true;
        }
        Ok(())
    }

    fn rebuild_tables(&mut self) {
        self.inverse = [None; 256];
        self.is_missing = [false; 256];
        for (i, &c) in self.symbols.iter().enumerate() {
            self.inverse[c as usize] = Some(i as u8);
        }
        for &c in &self.missing {
            self.is_missing[c as usize] = true;
        }
    }

    /// The symbols, in order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// The symbols as a string.
    pub fn as_str(&self) -> &str {
        // symbols are validated as ASCII graphic characters
        std::str::from_utf8(&self.symbols).unwrap_or("")
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a validated alphabet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Index of a symbol, or `None` if it is not in the alphabet.
    #[inline]
    pub fn index(&self, c: u8) -> Option<usize> {
        self.inverse[c as usize].map(usize::from)
    }

    /// True if `c` is a symbol of the alphabet.
    #[inline]
    pub fn contains(&self, c: u8) -> bool {
        self.inverse[c as usize].is_some()
    }

    /// True if `c` is a missing-data character.
    #[inline]
    pub fn is_missing(&self, c: u8) -> bool {
        self.is_missing[c as usize]
    }

    /// True if `c` is the gap character.
    #[inline]
    pub fn is_gap(c: u8) -> bool {
        c == GAP_CHAR
    }

    /// True for observed characters: neither gap nor missing data.
    #[inline]
    pub fn is_observed(&self, c: u8) -> bool {
        c != GAP_CHAR && !self.is_missing[c as usize]
    }

    /// The missing-data characters.
    pub fn missing_chars(&self) -> &[u8] {
        &self.missing
    }

    /// Preferred missing-data character.
    pub fn missing_char(&self) -> u8 {
        self.missing.first().copied().unwrap_or(b'*')
    }

    /// True if any symbol is a lowercase letter.
    pub fn has_lowercase(&self) -> bool {
        self.symbols.iter().any(u8::is_ascii_lowercase)
    }

    /// Replaces lowercase symbols by their uppercase versions.
    ///
    /// A lowercase symbol whose uppercase version is already present is
    /// dropped; otherwise it takes the uppercase version in place.
    pub fn to_uppercase(&mut self) {
        let mut kept = Vec::with_capacity(self.symbols.len());
        let mut present = [false; 256];
        for &c in &self.symbols {
            if !c.is_ascii_lowercase() {
                present[c as usize] = true;
            }
        }
        for &c in &self.symbols {
            if c.is_ascii_lowercase() {
                let upper = c.to_ascii_uppercase();
                if !present[upper as usize] {
                    present[upper as usize] = true;
                    kept.push(upper);
                }
            } else {
                kept.push(c);
            }
        }
        self.symbols = kept;
        self.rebuild_tables();
    }

    /// Removes a symbol. Other symbols keep their relative order; returns
    /// false if the symbol was not present.
    pub fn remove_symbol(&mut self, c: u8) -> bool {
        if !self.contains(c) {
            return false;
        }
        self.symbols.retain(|&s| s != c);
        self.rebuild_tables();
        true
    }

    /// Replaces the symbol set, keeping the missing-data characters.
    pub fn reset(&mut self, symbols: &str) -> AlphabetResult<()> {
        let symbols = symbols.as_bytes().to_vec();
        Self::validate(&symbols)?;
        self.symbols = symbols;
        self.rebuild_tables();
        Ok(())
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.as_bytes().to_vec(),
            inverse: [None; 256],
            missing: DEFAULT_MISSING.as_bytes().to_vec(),
            is_missing: [false; 256],
        }
        .with_tables()
    }
}

impl Alphabet {
    fn with_tables(mut self) -> Self {
        self.rebuild_tables();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alphabet() {
        let alph = Alphabet::default();
        assert_eq!(alph.as_str(), "ACGT");
        assert_eq!(alph.index(b'A'), Some(0));
        assert_eq!(alph.index(b'T'), Some(3));
        assert_eq!(alph.index(b'N'), None);
        assert!(alph.is_missing(b'N'));
        assert!(alph.is_missing(b'*'));
        assert!(!alph.is_missing(b'-'));
        assert_eq!(alph.missing_char(), b'*');
    }

    #[test]
    fn test_malformed_alphabets() {
        assert_eq!(Alphabet::new(""), Err(AlphabetError::Empty));
        assert_eq!(Alphabet::new("AC-G"), Err(AlphabetError::ContainsGap));
        assert_eq!(Alphabet::new("ACCG"), Err(AlphabetError::DuplicateSymbol('C')));
        assert!(matches!(Alphabet::new("A CG"), Err(AlphabetError::InvalidSymbol(b' '))));
    }

    #[test]
    fn test_observed() {
        let alph = Alphabet::default();
        assert!(alph.is_observed(b'A'));
        assert!(!alph.is_observed(b'-'));
        assert!(!alph.is_observed(b'N'));
    }

    #[test]
    fn test_remove_symbol_keeps_other_slots() {
        let mut alph = Alphabet::new("ACGTN").unwrap();
        assert!(alph.remove_symbol(b'N'));
        assert_eq!(alph.as_str(), "ACGT");
        assert_eq!(alph.index(b'N'), None);
        assert_eq!(alph.index(b'G'), Some(2));
        assert!(!alph.remove_symbol(b'N'));

        let mut alph = Alphabet::new("ACGT").unwrap();
        alph.remove_symbol(b'C');
        assert_eq!(alph.index(b'A'), Some(0));
        assert_eq!(alph.index(b'G'), Some(1));
        assert_eq!(alph.index(b'T'), Some(2));
    }

    #[test]
    fn test_to_uppercase() {
        let mut alph = Alphabet::new("ACGTacgtn").unwrap();
        assert!(alph.has_lowercase());
        alph.to_uppercase();
        assert_eq!(alph.as_str(), "ACGTN");
        assert!(!alph.has_lowercase());
        assert_eq!(alph.index(b'a'), None);
        assert_eq!(alph.index(b'N'), Some(4));
    }

    #[test]
    fn test_reset() {
        let mut alph = Alphabet::default();
        alph.reset("ACDEFGHIKLMNPQRSTVWY").unwrap();
        assert_eq!(alph.len(), 20);
        assert_eq!(alph.index(b'Y'), Some(19));
        assert!(alph.is_missing(b'*'));
        assert!(alph.reset("").is_err());
    }
}
