use thiserror::Error;

use super::Stage;

/// Reason why a pixel buffer couldn't be split into blocks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
	/// The buffer length is not a multiple of 4 or not `side * side * 4`.
	#[error("pixel buffer of {len} bytes does not hold a {side}x{side} RGBA image")]
	InvalidBuffer { len: usize, side: usize },
	/// The block size is zero or does not evenly divide the image size.
	#[error("block size {block_size} does not evenly divide image size {image_size}")]
	InvalidGrid { image_size: usize, block_size: usize },
}

/// Reason why median cut couldn't produce a palette.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantizeError {
	/// A leaf of the recursion was left with no samples to average.
	#[error("empty color bucket at depth {depth}")]
	EmptyBucket { depth: u32 },
}

/// Reason why a histogram couldn't be built.
#[derive(Debug, Error, PartialEq)]
pub enum HistogramError {
	/// A value rounds to something outside `0..=255`.
	#[error("grayscale value {0} is outside 0..=255")]
	OutOfRange(f64),
}

/// Reason why a grayscale formula selector wasn't understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
	#[error("unknown grayscale formula `{0}`")]
	Unknown(String),
}

/// Reason why a normalizer couldn't be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
	#[error("posterization needs at least one level")]
	ZeroLevels,
}

/// Reason why a palette or color couldn't be made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
	/// A palette needs at least one entry to match against.
	#[error("palette has no colors")]
	Empty,
	#[error("`{0}` is not a #rrggbb color")]
	ParseColor(String),
	#[error("channel value {0} is outside 0..=255")]
	ChannelOutOfRange(i32),
}

/// Any failure of a mosaic pipeline run.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
	#[error(transparent)]
	Sample(#[from] SampleError),
	#[error(transparent)]
	Quantize(#[from] QuantizeError),
	#[error(transparent)]
	Histogram(#[from] HistogramError),
	#[error(transparent)]
	Normalize(#[from] NormalizeError),
	#[error(transparent)]
	Palette(#[from] PaletteError),
	/// A stage was asked for before the stages it builds on had run.
	#[error("stage {required:?} has not been reached (currently at {current:?})")]
	StageNotReached { required: Stage, current: Stage },
}
