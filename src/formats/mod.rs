//! Alignment file readers and writers.
//!
//! Supported formats:
//! - FASTA (.fa, .fasta, .fas, .fna, .ffn, .frn)
//! - PHYLIP (.ph, .phy, .phylip)
//! - MPM (.mpm): PHYLIP-like header, then all names, then unbroken sequences
//! - SS (.ss): sufficient statistics (compressed view)
//! - MAF (.maf): multiple alignment format, read only
//!
//! Format detection priority:
//! 1. Explicit format specification (-f option)
//! 2. File extension
//! 3. Content-based detection
//!
//! All readers except SS normalize characters the same way: upper-cased
//! unless the alphabet has lowercase symbols, `.` read as missing data
//! unless `.` is in the alphabet, unknown letters read as `N`, and any
//! other unknown character rejected.

pub mod fasta;
pub mod maf;
pub mod phylip;
pub mod ss;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::alphabet::{Alphabet, AlphabetError, AMBIGUITY_CHAR, GAP_CHAR};
use crate::model::{Alignment, AlignmentError, CharView, Rows};

/// Characters per line in FASTA and PHYLIP output.
pub const OUTPUT_LINE_LEN: usize = 70;

/// Alignment file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Phylip,
    Mpm,
    Ss,
    Maf,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Phylip => write!(f, "PHYLIP"),
            FileFormat::Mpm => write!(f, "MPM"),
            FileFormat::Ss => write!(f, "SS"),
            FileFormat::Maf => write!(f, "MAF"),
        }
    }
}

impl FromStr for FileFormat {
    type Err = FormatError;

    /// Parses a format name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FASTA" => Ok(FileFormat::Fasta),
            "PHYLIP" => Ok(FileFormat::Phylip),
            "MPM" => Ok(FileFormat::Mpm),
            "SS" => Ok(FileFormat::Ss),
            "MAF" => Ok(FileFormat::Maf),
            _ => Err(FormatError::UnknownFormatName(s.to_string())),
        }
    }
}

impl FileFormat {
    /// Format for a file name suffix (without the dot), case-insensitively.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_lowercase().as_str() {
            "fa" | "fas" | "fasta" | "fna" | "ffn" | "frn" => Some(FileFormat::Fasta),
            "ph" | "phy" | "phylip" => Some(FileFormat::Phylip),
            "mpm" => Some(FileFormat::Mpm),
            "ss" => Some(FileFormat::Ss),
            "maf" => Some(FileFormat::Maf),
            _ => None,
        }
    }

    /// Canonical file name suffix.
    pub fn suffix(self) -> &'static str {
        match self {
            FileFormat::Fasta => "fa",
            FileFormat::Phylip => "ph",
            FileFormat::Mpm => "mpm",
            FileFormat::Ss => "ss",
            FileFormat::Maf => "maf",
        }
    }
}

/// Errors that can occur while reading or writing alignment files.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Could not determine file format.\n\
             Hint: Use -f/--format to specify the format explicitly:\n  \
             msakit -f fasta <file>   # FASTA format\n  \
             msakit -f phylip <file>  # PHYLIP format\n  \
             msakit -f mpm <file>     # MPM format\n  \
             msakit -f ss <file>      # sufficient statistics\n  \
             msakit -f maf <file>     # MAF format")]
    UnknownFormat,

    #[error("Unknown format name '{0}' (expected FASTA, PHYLIP, MPM, SS or MAF)")]
    UnknownFormatName(String),

    #[error("Writing {0} is not supported")]
    UnsupportedOutput(FileFormat),

    #[error("No match for sequence name '{0}' in list")]
    NameNotInList(String),

    #[error("Invalid alphabet: {0}")]
    Alphabet(#[from] AlphabetError),

    #[error("{0}")]
    Alignment(#[from] AlignmentError),

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("PHYLIP error: {0}")]
    PhylipError(#[from] phylip::PhylipError),

    #[error("SS error: {0}")]
    SsError(#[from] ss::SsError),

    #[error("MAF error: {0}")]
    MafError(#[from] maf::MafError),
}

/// Result type for file operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Maps a raw input character onto the alignment's character set.
///
/// Returns `None` for characters that cannot be interpreted.
pub(crate) fn normalize_residue(c: u8, alphabet: &Alphabet, upcase: bool) -> Option<u8> {
    let c = if upcase { c.to_ascii_uppercase() } else { c };
    if c == b'.' && !alphabet.contains(b'.') {
        return Some(alphabet.missing_char());
    }
    if c == GAP_CHAR || alphabet.is_missing(c) || alphabet.contains(c) {
        Some(c)
    } else if c.is_ascii_alphabetic() {
        Some(AMBIGUITY_CHAR)
    } else {
        None
    }
}

/// Appends the non-whitespace characters of `text`, normalized; on
/// failure returns the offending character.
pub(crate) fn push_residues(text: &str, alphabet: &Alphabet, out: &mut Vec<u8>) -> Result<(), char> {
    let upcase = !alphabet.has_lowercase();
    for b in text.bytes().filter(|b| !b.is_ascii_whitespace()) {
        out.push(normalize_residue(b, alphabet, upcase).ok_or(b as char)?);
    }
    Ok(())
}

/// A row as it should be printed; with `pretty`, characters identical to
/// the first row's are shown as `.`.
pub(crate) fn display_row(view: &CharView<'_>, row: usize, len: usize, pretty: bool) -> Vec<u8> {
    (0..len)
        .map(|col| {
            let c = view.get(row, col);
            if pretty && row > 0 && c == view.get(0, col) {
                b'.'
            } else {
                c
            }
        })
        .collect()
}

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    FileFormat::from_suffix(ext)
}

/// Detects the file format by examining the content.
///
/// MPM files share PHYLIP's header and are reported as PHYLIP; read them
/// with an explicit format or the `.mpm` extension.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let first = content.lines().map(str::trim).find(|l| !l.is_empty())?;

    if first.starts_with('>') {
        return Some(FileFormat::Fasta);
    }
    if first.starts_with("##maf") || first == "a" || first.starts_with("a ") || first.starts_with("a\t") {
        return Some(FileFormat::Maf);
    }
    if first.to_ascii_uppercase().starts_with("NSEQS") {
        return Some(FileFormat::Ss);
    }
    let parts: Vec<&str> = first.split_whitespace().collect();
    if parts.len() >= 2 && parts[0].parse::<usize>().is_ok() && parts[1].parse::<usize>().is_ok() {
        return Some(FileFormat::Phylip);
    }
    None
}

/// Parses content with a specific format.
fn parse_content(content: &str, format: FileFormat, alphabet: Option<&str>) -> FormatResult<Alignment> {
    let requested = alphabet.map(Alphabet::new).transpose()?;
    let default = Alphabet::default();
    let alphabet = requested.as_ref().unwrap_or(&default);
    let aln = match format {
        FileFormat::Fasta => fasta::parse_fasta_str(content, alphabet)?,
        FileFormat::Phylip => phylip::parse_phylip_str(content, alphabet)?,
        FileFormat::Mpm => phylip::parse_mpm_str(content, alphabet)?,
        FileFormat::Ss => ss::parse_ss_str(content, requested.as_ref())?,
        FileFormat::Maf => maf::parse_maf_str(content, alphabet)?,
    };
    Ok(aln)
}

/// Reads an alignment with optional format and alphabet specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension
/// 3. Content-based detection
///
/// `alphabet` defaults to DNA (or, for SS files, to the alphabet the file
/// declares).
pub fn read_alignment_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<FileFormat>,
    alphabet: Option<&str>,
) -> FormatResult<Alignment> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;

    if file_size == 0 {
        return Err(FormatError::EmptyFile);
    }

    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;

    // 1. Use explicit format if provided
    if let Some(format) = forced_format {
        return parse_content(&content, format, alphabet);
    }

    // 2. Extension, falling back on content if the extension is wrong
    if let Some(format) = detect_format_from_extension(&path) {
        match parse_content(&content, format, alphabet) {
            Ok(aln) => return Ok(aln),
            Err(e) => log::debug!("Reading as {} (from extension) failed: {}", format, e),
        }
    }

    // 3. Content-based detection
    match detect_format_from_content(&content) {
        Some(format) => {
            log::debug!("Detected {} from content", format);
            parse_content(&content, format, alphabet)
        }
        None => Err(FormatError::UnknownFormat),
    }
}

/// Reads an alignment, detecting the format, with the default alphabet.
pub fn read_alignment<P: AsRef<Path>>(path: P) -> FormatResult<Alignment> {
    read_alignment_with_options(path, None, None)
}

/// Writes an alignment in the given format.
///
/// `pretty` prints `.` for characters identical to the first row's
/// (ignored for SS output).
pub fn write_alignment<W: Write>(writer: &mut W, aln: &Alignment, format: FileFormat, pretty: bool) -> FormatResult<()> {
    match format {
        FileFormat::Fasta => fasta::write_fasta(writer, aln, pretty)?,
        FileFormat::Phylip => phylip::write_phylip(writer, aln, pretty)?,
        FileFormat::Mpm => phylip::write_mpm(writer, aln, pretty)?,
        FileFormat::Ss => ss::write_ss(writer, aln)?,
        FileFormat::Maf => return Err(FormatError::UnsupportedOutput(format)),
    }
    Ok(())
}

/// Reads several alignments and concatenates them.
///
/// `seqnames` fixes the rows of the result; every sequence of every file
/// must be listed, and sequences a file lacks are filled with gaps.
pub fn concat_from_files<P: AsRef<Path>>(
    files: &[P],
    format: Option<FileFormat>,
    seqnames: &[String],
    alphabet: Option<&str>,
) -> FormatResult<Alignment> {
    let alph = alphabet.map(Alphabet::new).transpose()?.unwrap_or_default();
    let mut aggregate = Alignment::from_rows(seqnames.to_vec(), Rows::filled(seqnames.len(), 0, GAP_CHAR), alph);

    for path in files {
        let source = read_alignment_with_options(path, format, alphabet)?;
        let view = source.char_view()?;
        let mut rows = vec![vec![GAP_CHAR; source.length()]; seqnames.len()];
        for (j, name) in source.names().iter().enumerate() {
            let idx = seqnames
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| FormatError::NameNotInList(name.clone()))?;
            rows[idx] = view.row_vec(j, source.length());
        }
        let part = Alignment::from_rows(seqnames.to_vec(), Rows::new(rows)?, source.alphabet().clone());
        aggregate.concatenate(&part)?;
        log::debug!("Appended {} columns from {}", source.length(), path.as_ref().display());
    }
    Ok(aggregate)
}
