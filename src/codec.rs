//! # PNG Codec Module
//!
//! Questo modulo definisce il confine verso il codec lossless esterno.
//!
//! ## Responsabilità:
//! - Trait `Codec`: riscrittura in-place di un PNG, solo se più piccolo
//! - `CodecParams`: set completo di parametri, costruito una volta da `Settings`
//! - Mapping statico nome → variante per filtri, interlacing e deflate
//! - `OxipngCodec`: binding di produzione alla libreria `oxipng`
//!
//! ## Parametri fissi:
//! - `fix_errors` sempre attivo
//! - `force` sempre disattivo: il file viene scritto solo se l'output è più piccolo
//! - riduzioni bit depth / color type / palette / grayscale disattivate
//! - `idat_recoding` attivo, `scale_16` disattivo
//!
//! ## Esempio:
//! ```rust,ignore
//! let params = CodecParams::from_settings(&settings);
//! OxipngCodec::new().optimize_in_place(Path::new("card.png"), &params)?;
//! ```

use crate::config::Settings;
use crate::error::OptimizeError;
use indexmap::IndexSet;
use std::num::NonZeroU8;
use std::path::Path;
use std::time::Duration;

/// PNG row filter tried by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    NoOp,
    Sub,
    Up,
    Average,
    Paeth,
    MinSum,
    Entropy,
    Bigrams,
    BigEnt,
    Brute,
}

impl Filter {
    const NAMES: &'static [(&'static str, Filter)] = &[
        ("NoOp", Filter::NoOp),
        ("None", Filter::NoOp),
        ("Sub", Filter::Sub),
        ("Up", Filter::Up),
        ("Average", Filter::Average),
        ("Paeth", Filter::Paeth),
        ("MinSum", Filter::MinSum),
        ("Entropy", Filter::Entropy),
        ("Bigrams", Filter::Bigrams),
        ("BigEnt", Filter::BigEnt),
        ("Brute", Filter::Brute),
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, filter)| *filter)
    }

    /// Resolve a comma-separated filter chain.
    ///
    /// Unknown names are dropped, repeats keep their first position and an
    /// empty result becomes `[NoOp]`.
    pub fn parse_list(list: &str) -> Vec<Self> {
        let filters: IndexSet<Self> = list
            .split(',')
            .filter_map(|name| Self::from_name(name.trim()))
            .collect();

        if filters.is_empty() {
            vec![Self::NoOp]
        } else {
            filters.into_iter().collect()
        }
    }
}

/// Interlacing requested from the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interlace {
    /// No interlacing is applied; the codec keeps the input layout
    None,
    Adam7,
}

impl Interlace {
    /// `"Adam7"` selects Adam7; `"None"` and unknown names apply no interlacing
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Adam7" => Self::Adam7,
            _ => Self::None,
        }
    }
}

/// Deflate implementation selected by `advanced.deflate_method`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeflateMethod {
    Libdeflate,
    Zopfli,
}

impl DeflateMethod {
    /// `"zopfli"` selects zopfli; everything else is libdeflate
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "zopfli" {
            Self::Zopfli
        } else {
            Self::Libdeflate
        }
    }
}

impl std::fmt::Display for DeflateMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Libdeflate => write!(f, "libdeflate"),
            Self::Zopfli => write!(f, "zopfli"),
        }
    }
}

/// Which ancillary chunks the codec may remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPolicy {
    /// Strip only chunks that cannot affect rendering
    Safe,
    None,
}

/// Parameter set handed to the codec for every file of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParams {
    pub level: i64,
    pub fix_errors: bool,
    pub force: bool,
    pub filters: Vec<Filter>,
    pub interlace: Interlace,
    pub optimize_alpha: bool,
    pub bit_depth_reduction: bool,
    pub color_type_reduction: bool,
    pub palette_reduction: bool,
    pub grayscale_reduction: bool,
    pub idat_recoding: bool,
    pub scale_16: bool,
    pub strip: StripPolicy,
    pub deflate: DeflateMethod,
    pub deflate_level: i64,
    pub fast_evaluation: bool,
    pub timeout: Option<Duration>,
}

impl CodecParams {
    pub fn from_settings(settings: &Settings) -> Self {
        let compression = &settings.compression;
        let advanced = &settings.advanced;

        Self {
            level: compression.level,
            fix_errors: true,
            force: false,
            filters: advanced.filters.clone(),
            interlace: advanced.interlace,
            optimize_alpha: compression.optimize_alpha,
            bit_depth_reduction: false,
            color_type_reduction: false,
            palette_reduction: false,
            grayscale_reduction: false,
            idat_recoding: true,
            scale_16: false,
            strip: if compression.strip_metadata {
                StripPolicy::Safe
            } else {
                StripPolicy::None
            },
            deflate: advanced.deflate_method,
            deflate_level: advanced.deflate_level,
            fast_evaluation: compression.fast_evaluation,
            timeout: compression.timeout,
        }
    }
}

/// Lossless in-place PNG re-encoder.
///
/// Implementations must leave the file untouched unless they produced a
/// strictly smaller encoding (or `force` is set), and report failures as
/// errors rather than panicking.
pub trait Codec: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Checked once before any job is submitted
    fn check_available(&self) -> Result<(), OptimizeError> {
        Ok(())
    }

    /// Rewrite `path` in place with `params`
    fn optimize_in_place(&self, path: &Path, params: &CodecParams) -> Result<(), OptimizeError>;
}

/// Codec backed by the `oxipng` library
#[derive(Debug, Clone, Copy, Default)]
pub struct OxipngCodec;

impl OxipngCodec {
    pub fn new() -> Self {
        Self
    }

    fn row_filter(filter: Filter) -> oxipng::RowFilter {
        match filter {
            Filter::NoOp => oxipng::RowFilter::None,
            Filter::Sub => oxipng::RowFilter::Sub,
            Filter::Up => oxipng::RowFilter::Up,
            Filter::Average => oxipng::RowFilter::Average,
            Filter::Paeth => oxipng::RowFilter::Paeth,
            Filter::MinSum => oxipng::RowFilter::MinSum,
            Filter::Entropy => oxipng::RowFilter::Entropy,
            Filter::Bigrams => oxipng::RowFilter::Bigrams,
            Filter::BigEnt => oxipng::RowFilter::BigEnt,
            Filter::Brute => oxipng::RowFilter::Brute,
        }
    }

    /// Translate `params` into oxipng options, rejecting out-of-range values
    pub fn options(params: &CodecParams) -> Result<oxipng::Options, OptimizeError> {
        let level = u8::try_from(params.level)
            .ok()
            .filter(|level| *level <= 6)
            .ok_or_else(|| {
                OptimizeError::InvalidParameter(format!(
                    "compression level {} (expected 0-6)",
                    params.level
                ))
            })?;

        let deflate = match params.deflate {
            DeflateMethod::Libdeflate => {
                let compression = u8::try_from(params.deflate_level)
                    .ok()
                    .filter(|level| *level <= 12)
                    .ok_or_else(|| {
                        OptimizeError::InvalidParameter(format!(
                            "libdeflate level {} (expected 0-12)",
                            params.deflate_level
                        ))
                    })?;
                oxipng::Deflaters::Libdeflater { compression }
            }
            DeflateMethod::Zopfli => {
                let iterations = u8::try_from(params.deflate_level)
                    .ok()
                    .and_then(NonZeroU8::new)
                    .ok_or_else(|| {
                        OptimizeError::InvalidParameter(format!(
                            "zopfli iterations {} (expected 1-255)",
                            params.deflate_level
                        ))
                    })?;
                oxipng::Deflaters::Zopfli { iterations }
            }
        };

        let mut options = oxipng::Options::from_preset(level);
        options.fix_errors = params.fix_errors;
        options.force = params.force;
        options.filter = params.filters.iter().map(|f| Self::row_filter(*f)).collect();
        options.interlace = match params.interlace {
            Interlace::None => None,
            Interlace::Adam7 => Some(oxipng::Interlacing::Adam7),
        };
        options.optimize_alpha = params.optimize_alpha;
        options.bit_depth_reduction = params.bit_depth_reduction;
        options.color_type_reduction = params.color_type_reduction;
        options.palette_reduction = params.palette_reduction;
        options.grayscale_reduction = params.grayscale_reduction;
        options.idat_recoding = params.idat_recoding;
        options.scale_16 = params.scale_16;
        options.strip = match params.strip {
            StripPolicy::Safe => oxipng::StripChunks::Safe,
            StripPolicy::None => oxipng::StripChunks::None,
        };
        options.deflate = deflate;
        options.fast_evaluation = params.fast_evaluation;
        options.timeout = params.timeout;

        Ok(options)
    }
}

impl Codec for OxipngCodec {
    fn name(&self) -> &str {
        "oxipng"
    }

    fn optimize_in_place(&self, path: &Path, params: &CodecParams) -> Result<(), OptimizeError> {
        let options = Self::options(params)?;
        let input = oxipng::InFile::Path(path.to_path_buf());
        let output = oxipng::OutFile::from_path(path.to_path_buf());

        oxipng::optimize(&input, &output, &options)
            .map_err(|e| OptimizeError::Codec(e.to_string()))
    }
}
