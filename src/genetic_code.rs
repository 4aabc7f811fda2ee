//! Genetic codes for codon classification.
//!
//! Coding-sequence cleaning needs to recognize start and stop codons in
//! alignment rows. A [`GeneticCode`] stores the NCBI translation table as
//! a 64-entry array indexed by codon (bases in `TCAG` order), so a lookup
//! is three table reads.
//!
//! Only `ATG` is treated as a start codon; stop codons are the codons the
//! selected table translates to `*`.

/// A genetic code table.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    pub name: &'static str,
    table: [u8; 64],
}

/// Index of a base in NCBI `TCAG` order (case-insensitive, `U` as `T`).
#[inline]
fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

impl GeneticCode {
    /// # Arguments
    /// * `id` - NCBI genetic code ID
    /// * `name` - Name of the genetic code
    /// * `ncbieaa` - 64-character amino acid string (NCBI order TTT, TTC, TTA, ...)
    fn new(id: u8, name: &'static str, ncbieaa: &str) -> Self {
        let mut table = [b'X'; 64];
        for (slot, aa) in table.iter_mut().zip(ncbieaa.bytes()) {
            *slot = aa;
        }
        Self { id, name, table }
    }

    /// Amino acid for a codon; `None` for ambiguous or gapped codons.
    pub fn translate(&self, codon: &[u8]) -> Option<u8> {
        if codon.len() < 3 {
            return None;
        }
        let idx = base_index(codon[0])? * 16 + base_index(codon[1])? * 4 + base_index(codon[2])?;
        Some(self.table[idx])
    }

    /// True if the first three bytes form a stop codon.
    pub fn is_stop(&self, codon: &[u8]) -> bool {
        self.translate(codon) == Some(b'*')
    }

    /// True if the first three bytes are `ATG` (any case).
    pub fn is_start(codon: &[u8]) -> bool {
        codon.len() >= 3 && codon[..3].eq_ignore_ascii_case(b"ATG")
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        GeneticCodes::standard()
    }
}

/// Registry of the supported NCBI genetic codes.
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    pub fn new() -> Self {
        let codes = vec![
            Self::standard(),
            GeneticCode::new(2, "Vertebrate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG"),
            GeneticCode::new(3, "Yeast Mitochondrial",
                "FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(4, "Mold/Protozoan/Coelenterate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(5, "Invertebrate Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG"),
            GeneticCode::new(6, "Ciliate/Dasycladacean/Hexamita Nuclear",
                "FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
            GeneticCode::new(9, "Echinoderm/Flatworm Mitochondrial",
                "FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
            GeneticCode::new(11, "Bacterial/Archaeal/Plant Plastid",
                "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
        ];
        Self { codes }
    }

    fn standard() -> GeneticCode {
        GeneticCode::new(1, "Standard",
            "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG")
    }

    pub fn all(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Gets a genetic code by NCBI ID.
    pub fn get(&self, id: u8) -> Option<&GeneticCode> {
        self.codes.iter().find(|c| c.id == id)
    }
}

impl Default for GeneticCodes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_stops() {
        let code = GeneticCode::default();
        assert!(code.is_stop(b"TAA"));
        assert!(code.is_stop(b"tag"));
        assert!(code.is_stop(b"TGA"));
        assert!(code.is_stop(b"UAA"));
        assert!(!code.is_stop(b"TGG"));
        assert!(!code.is_stop(b"T-A"));
        assert!(!code.is_stop(b"TA"));
    }

    #[test]
    fn test_start_codon() {
        assert!(GeneticCode::is_start(b"ATG"));
        assert!(GeneticCode::is_start(b"atgAAA"));
        assert!(!GeneticCode::is_start(b"ATA"));
        assert!(!GeneticCode::is_start(b"AT"));
    }

    #[test]
    fn test_translate() {
        let code = GeneticCode::default();
        assert_eq!(code.translate(b"ATG"), Some(b'M'));
        assert_eq!(code.translate(b"GGG"), Some(b'G'));
        assert_eq!(code.translate(b"ANG"), None);
    }

    #[test]
    fn test_mitochondrial_tga() {
        let codes = GeneticCodes::new();
        assert!(codes.get(1).unwrap().is_stop(b"TGA"));
        let mito = codes.get(2).unwrap();
        assert!(!mito.is_stop(b"TGA"));
        assert!(mito.is_stop(b"AGA"));
        assert!(codes.get(7).is_none());
    }
}
