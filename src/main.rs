//! msakit - alignment conversion and cleaning
//!
//! ## Usage
//!
//! ```bash
//! msakit alignment.fa --out-format phylip
//! msakit -f ss alignment.txt --summary
//! msakit genes.fa --clean-coding human --genetic-code 2 -o clean.fa
//! msakit a.fa b.fa --order human,chimp,mouse     # concatenate
//! ```
//!
//! Transforms run in a fixed order: reorder, gap strip, coding clean,
//! indel clean, macro-indel mask, missing data to gaps, reverse
//! complement, column permutation.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use msakit::category::SimpleCategoryMap;
use msakit::features::FeatureSet;
use msakit::formats::{concat_from_files, read_alignment_with_options, write_alignment, FileFormat};
use msakit::genetic_code::GeneticCodes;
use msakit::model::Alignment;
use msakit::overlay::CoordFrame;
use msakit::transform::{CodingCleanOptions, GapStrip, IndelCleanOptions};

/// Input format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// PHYLIP format
    Phylip,
    /// MPM format
    Mpm,
    /// Sufficient statistics
    Ss,
    /// MAF (import only)
    Maf,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(FileFormat::Fasta),
            FormatArg::Phylip => Some(FileFormat::Phylip),
            FormatArg::Mpm => Some(FileFormat::Mpm),
            FormatArg::Ss => Some(FileFormat::Ss),
            FormatArg::Maf => Some(FileFormat::Maf),
            FormatArg::Auto => None,
        }
    }
}

/// Output format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutFormatArg {
    Fasta,
    Phylip,
    Mpm,
    Ss,
}

impl From<OutFormatArg> for FileFormat {
    fn from(arg: OutFormatArg) -> Self {
        match arg {
            OutFormatArg::Fasta => FileFormat::Fasta,
            OutFormatArg::Phylip => FileFormat::Phylip,
            OutFormatArg::Mpm => FileFormat::Mpm,
            OutFormatArg::Ss => FileFormat::Ss,
        }
    }
}

/// msakit - convert, clean and summarize multiple sequence alignments
///
/// Several input files are concatenated; --order then fixes the rows.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alignment file(s) (FASTA, PHYLIP, MPM, SS or MAF)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Force a specific input format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Alphabet symbols (default: ACGT)
    #[arg(short = 'a', long = "alphabet")]
    alphabet: Option<String>,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Output format
    #[arg(long = "out-format", value_enum, default_value = "fasta")]
    out_format: OutFormatArg,

    /// Print '.' for characters identical to the first sequence
    #[arg(long)]
    pretty: bool,

    /// Print summary statistics instead of the alignment
    #[arg(long)]
    summary: bool,

    /// Row order (comma-separated names); names not in the alignment get missing data
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<String>>,

    /// Remove gapped columns: "ALL" (all-gap columns), "ANY", or a sequence name or number
    #[arg(long = "gap-strip")]
    gap_strip: Option<String>,

    /// Clean as a coding alignment against this reference (name or number)
    #[arg(long = "clean-coding")]
    clean_coding: Option<String>,

    /// Minimum number of codons in a cleaned coding alignment
    #[arg(long = "min-ncodons", default_value = "1")]
    min_ncodons: usize,

    /// Drop the final stop codon when cleaning coding alignments
    #[arg(long = "remove-stop")]
    remove_stop: bool,

    /// Genetic code for stop codons (NCBI id, default: 1 = Standard)
    #[arg(short = 'g', long = "genetic-code", default_value = "1")]
    genetic_code: u8,

    /// Mask characters near indels
    #[arg(long = "clean-indels")]
    clean_indels: bool,

    /// Characters masked on each side of an indel
    #[arg(long = "indel-border", default_value = "3")]
    indel_border: usize,

    /// Minimum gapless stretch between two indels
    #[arg(long = "min-nbases", default_value = "15")]
    min_nbases: usize,

    /// Minimum number of real characters for a column to be kept
    #[arg(long = "min-nseqs", default_value = "2")]
    min_nseqs: usize,

    /// Tuple size of the downstream model (indel cleaning, SS output)
    #[arg(long = "tuple-size", default_value = "1")]
    tuple_size: usize,

    /// Replace gap runs longer than K with missing data
    #[arg(long = "mask-macro-indels", value_name = "K")]
    mask_macro_indels: Option<usize>,

    /// Convert missing data to gaps (Ns of the first sequence become random bases)
    #[arg(long = "missing-to-gaps")]
    missing_to_gaps: bool,

    /// Reverse complement the alignment
    #[arg(long = "reverse-complement")]
    reverse_complement: bool,

    /// Randomly permute columns
    #[arg(long)]
    permute: bool,

    /// Random seed (permutation, missing-data substitution)
    #[arg(long)]
    seed: Option<u64>,

    /// GFF features used to label column categories (requires --catmap)
    #[arg(long, requires = "catmap")]
    features: Option<PathBuf>,

    /// Category map for --features
    #[arg(long, requires = "features")]
    catmap: Option<PathBuf>,
}

/// Resolves a sequence given by name or 1-based number to a row index.
fn resolve_seq(aln: &Alignment, seq: &str) -> Result<usize> {
    aln.seq_indices(&[seq.to_string()])?
        .first()
        .copied()
        .with_context(|| format!("No sequence named '{}'", seq))
}

fn load(args: &Args) -> Result<Alignment> {
    let format: Option<FileFormat> = args.format.into();
    let alphabet = args.alphabet.as_deref();
    if let [file] = args.files.as_slice() {
        return read_alignment_with_options(file, format, alphabet)
            .with_context(|| format!("Failed to read {}", file.display()));
    }
    let Some(order) = args.order.as_ref() else {
        anyhow::bail!("Concatenating several files requires --order");
    };
    Ok(concat_from_files(&args.files, format, order, alphabet)?)
}

fn label(aln: &mut Alignment, features: &Path, catmap: &Path) -> Result<()> {
    let cm: SimpleCategoryMap = std::fs::read_to_string(catmap)
        .with_context(|| format!("Failed to read {}", catmap.display()))?
        .parse()?;
    let mut feats = FeatureSet::read_gff(BufReader::new(File::open(features)?))?;
    aln.map_feature_coords(&mut feats, CoordFrame::InferFromName, CoordFrame::Alignment, 0)?;
    aln.label_categories(&feats, &cm);
    log::info!("Labeled columns with {} features", feats.len());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let mut aln = load(args)?;
    log::info!("Read {} sequences, {} columns", aln.nseqs(), aln.length());

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if let (Some(features), Some(catmap)) = (&args.features, &args.catmap) {
        label(&mut aln, features, catmap)?;
    }

    if let Some(order) = &args.order {
        if args.files.len() == 1 {
            aln.reorder_rows(order)?;
        }
    }

    if let Some(mode) = &args.gap_strip {
        let mode = match mode.to_ascii_uppercase().as_str() {
            "ALL" => GapStrip::AllGaps,
            "ANY" => GapStrip::AnyGaps,
            _ => GapStrip::Project(resolve_seq(&aln, mode)?),
        };
        aln.strip_gaps(mode)?;
    }

    if let Some(refseq) = &args.clean_coding {
        let refseq = resolve_seq(&aln, refseq)?;
        let codes = GeneticCodes::new();
        let code = codes
            .get(args.genetic_code)
            .ok_or_else(|| anyhow::anyhow!("Unknown genetic code: {}", args.genetic_code))?;
        let opts = CodingCleanOptions {
            min_ncodons: args.min_ncodons,
            keep_stop_codons: !args.remove_stop,
        };
        aln.coding_clean(refseq, &opts, code)?;
    }

    if args.clean_indels {
        aln.indel_clean(&IndelCleanOptions {
            indel_border: args.indel_border,
            min_nbases: args.min_nbases,
            min_nseqs: args.min_nseqs,
            tuple_size: args.tuple_size,
            ..IndelCleanOptions::default()
        })?;
    }

    if let Some(k) = args.mask_macro_indels {
        aln.mask_macro_indels(k, None)?;
    }

    if args.missing_to_gaps {
        aln.missing_to_gaps(Some(0), &mut rng);
    }

    if args.reverse_complement {
        aln.reverse_complement()?;
    }

    if args.permute {
        aln.permute_columns(&mut rng)?;
    }

    let out_format: FileFormat = args.out_format.into();
    if out_format == FileFormat::Ss && aln.stats().is_none() {
        aln.build_stats(args.tuple_size, true)?;
    }

    let mut writer: Box<dyn Write> = if args.output == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let file = File::create(&args.output).with_context(|| format!("Failed to create {}", args.output))?;
        Box::new(BufWriter::new(file))
    };

    if args.summary {
        let label = args
            .files
            .first()
            .and_then(|f| f.file_name())
            .map_or_else(String::new, |f| f.to_string_lossy().into_owned());
        writeln!(writer, "{}", aln.stats_header())?;
        writeln!(writer, "{}", aln.stats_line(&label, None)?)?;
    } else {
        write_alignment(&mut writer, &aln, out_format, args.pretty)?;
    }
    writer.flush()?;

    if args.output != "-" {
        log::info!("Wrote {} sequences to {}", aln.nseqs(), args.output);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.tuple_size < 1 || args.tuple_size > 5 {
        anyhow::bail!("Tuple size must be 1-5 (got {})", args.tuple_size);
    }
    if args.genetic_code < 1 || args.genetic_code > 33 {
        anyhow::bail!("Genetic code must be 1-33 (got {})", args.genetic_code);
    }

    run(&args)
}
