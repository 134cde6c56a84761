pub mod error;
pub mod gray;
pub mod quantize;
pub mod sample;

use error::PipelineError;
use gray::{Formula, Histogram, NormalizedLevel, Normalizer};
use quantize::{EmptyBucketPolicy, MedianCut, SplitMode};
use quantize::palette::{Color, Palette};
use sample::{Grid, Sampler};

/// Settings for one mosaic run.
#[derive(Clone, Copy, Debug)]
pub struct MosaicConfig {
	/// Edge length of the square canvas, in pixels.
	pub image_size: usize,
	/// Edge length of one tile, in pixels.
	pub block_size: usize,
	/// Median cut depth for the whole-image palette (`2^max_depth` colors).
	pub max_depth: u32,
	/// Median cut depth inside one tile. At 0 the tile color is the plain
	/// mean of its pixels.
	pub tile_depth: u32,
	pub formula: Formula,
	/// Posterization level count.
	pub levels: u32,
	pub split: SplitMode,
	pub empty_bucket: EmptyBucketPolicy,
}

impl Default for MosaicConfig {
	fn default() -> Self {
		MosaicConfig {
			image_size: 512,
			block_size: 8,
			max_depth: 4,
			tile_depth: 0,
			formula: Formula::Average,
			levels: 8,
			split: SplitMode::Corrected,
			empty_bucket: EmptyBucketPolicy::ReuseParent,
		}
	}
}

impl MosaicConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn image_size(mut self, n: usize) -> Self {
		self.image_size = n;
		self
	}

	pub fn block_size(mut self, n: usize) -> Self {
		self.block_size = n;
		self
	}

	pub fn max_depth(mut self, n: u32) -> Self {
		self.max_depth = n;
		self
	}

	pub fn tile_depth(mut self, n: u32) -> Self {
		self.tile_depth = n;
		self
	}

	pub fn formula(mut self, f: Formula) -> Self {
		self.formula = f;
		self
	}

	pub fn levels(mut self, n: u32) -> Self {
		self.levels = n;
		self
	}

	pub fn split(mut self, s: SplitMode) -> Self {
		self.split = s;
		self
	}

	pub fn empty_bucket(mut self, p: EmptyBucketPolicy) -> Self {
		self.empty_bucket = p;
		self
	}

	fn median_cut(&self, depth: u32) -> MedianCut {
		MedianCut::new(depth)
			.split(self.split)
			.empty_buckets(self.empty_bucket)
	}
}

/// How far a `Mosaic` has been taken along the grayscale path. Palette
/// matching is tracked per block instead, see `Mosaic::is_matched`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
	/// Every block has its dominant color.
	Dominant,
	/// Gray values and the histogram are known.
	Grayscale,
	/// Gray values are posterized into levels.
	Normalized,
}

/// One tile of the image grid, filled in stage by stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
	pub index: usize,
	pub row: usize,
	pub col: usize,
	pub dominant: Color,
	pub gray: Option<f64>,
	pub level: Option<NormalizedLevel>,
	/// Index into the palette the block was last matched against.
	pub matched: Option<usize>,
}

/// Which tile a block was assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MosaicAssignment {
	pub block: usize,
	/// 0-based position in the palette.
	pub palette_index: usize,
}

impl MosaicAssignment {
	/// 1-based tile number, as tile images are numbered from one.
	pub fn tile_number(&self) -> usize {
		self.palette_index + 1
	}
}

/// The block grid of one image and everything derived from it so far.
#[derive(Clone, Debug)]
pub struct Mosaic {
	config: MosaicConfig,
	grid: Grid,
	blocks: Vec<Block>,
	histogram: Option<Histogram>,
	formula: Formula,
	stage: Stage,
}

impl Mosaic {
	/// Splits `buffer` into blocks and finds each block's dominant color.
	///
	/// The dominant color is the first entry of the block's own median cut
	/// palette at `config.tile_depth`.
	pub fn analyze(buffer: &[u8], config: &MosaicConfig) -> Result<Mosaic, PipelineError> {
		let sampler = Sampler::new(buffer, config.image_size, config.block_size)?;
		let grid = sampler.grid();
		let cut = config.median_cut(config.tile_depth);
		let mut blocks = Vec::with_capacity(grid.block_count());
		for (index, pixels) in sampler.blocks().enumerate() {
			let palette = cut.quantize(&pixels)?;
			let (row, col) = grid.position(index);
			blocks.push(Block {
				index,
				row,
				col,
				dominant: palette.colors()[0],
				gray: None,
				level: None,
				matched: None,
			});
		}
		tracing::debug!(
			blocks = blocks.len(),
			block_size = grid.block_size,
			"dominant colors extracted"
		);
		Ok(Mosaic {
			config: *config,
			grid,
			blocks,
			histogram: None,
			formula: config.formula,
			stage: Stage::Dominant,
		})
	}

	pub fn config(&self) -> &MosaicConfig {
		&self.config
	}

	pub fn grid(&self) -> Grid {
		self.grid
	}

	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}

	pub fn stage(&self) -> Stage {
		self.stage
	}

	/// Whether the blocks have been matched against a palette.
	pub fn is_matched(&self) -> bool {
		self.blocks.iter().all(|b| b.matched.is_some())
	}

	/// Formula behind the current gray values.
	pub fn formula(&self) -> Formula {
		self.formula
	}

	pub fn histogram(&self) -> Option<&Histogram> {
		self.histogram.as_ref()
	}

	pub fn dominant_colors(&self) -> Vec<Color> {
		self.blocks.iter().map(|b| b.dominant).collect()
	}

	/// Gray values of all blocks, if they have been computed.
	pub fn gray_values(&self) -> Option<Vec<f64>> {
		self.blocks.iter().map(|b| b.gray).collect()
	}

	/// Computes gray values and the histogram under `formula`.
	///
	/// Can be called again with another formula at any later stage: gray
	/// values, the histogram and, if present, the posterized levels are all
	/// recomputed from the stored dominant colors.
	pub fn grayscale(&mut self, formula: Formula) -> Result<&Histogram, PipelineError> {
		let values = self.blocks.iter()
			.map(|b| formula.to_gray(b.dominant))
			.collect::<Vec<_>>();
		let histogram = Histogram::build(&values)?;
		let normalizer = if self.blocks.iter().any(|b| b.level.is_some()) {
			Some(Normalizer::new(self.config.levels)?)
		} else {
			None
		};
		for (block, &gs) in self.blocks.iter_mut().zip(values.iter()) {
			block.gray = Some(gs);
			block.level = normalizer.map(|n| n.level(gs));
		}
		self.formula = formula;
		self.stage = self.stage.max(Stage::Grayscale);
		tracing::debug!(?formula, renormalized = normalizer.is_some(), "grayscale computed");
		Ok(&*self.histogram.insert(histogram))
	}

	/// Posterizes every block's gray value into `config.levels` levels.
	pub fn normalize(&mut self) -> Result<(), PipelineError> {
		if self.blocks.iter().any(|b| b.gray.is_none()) {
			return Err(PipelineError::StageNotReached {
				required: Stage::Grayscale,
				current: self.stage,
			});
		}
		let normalizer = Normalizer::new(self.config.levels)?;
		for block in self.blocks.iter_mut() {
			block.level = block.gray.map(|gs| normalizer.level(gs));
		}
		self.stage = self.stage.max(Stage::Normalized);
		tracing::debug!(levels = normalizer.levels(), "gray values normalized");
		Ok(())
	}

	/// Matches each block's dominant color against `palette`, replacing
	/// any earlier match.
	pub fn match_palette(&mut self, palette: &Palette) -> Vec<MosaicAssignment> {
		let indices = quantize::quantize_to_palette(&self.dominant_colors(), palette);
		for (block, index) in self.blocks.iter_mut().zip(indices) {
			block.matched = Some(index);
		}
		tracing::debug!(colors = palette.len(), "blocks matched to palette");
		self.assignments()
	}

	/// Palette assignments of all blocks matched so far.
	pub fn assignments(&self) -> Vec<MosaicAssignment> {
		self.blocks.iter()
			.filter_map(|b| b.matched.map(|palette_index| MosaicAssignment {
				block: b.index,
				palette_index,
			}))
			.collect()
	}

	/// Tile numbers for the grayscale mosaic: each block uses the tile of
	/// its posterized level.
	pub fn level_tiles(&self) -> Result<Vec<u32>, PipelineError> {
		self.blocks.iter()
			.map(|b| b.level.map(|l| l.index))
			.collect::<Option<Vec<_>>>()
			.ok_or(PipelineError::StageNotReached {
				required: Stage::Normalized,
				current: self.stage,
			})
	}
}

/// Median cut palette of the whole image, brightest color first.
pub fn extract_palette(buffer: &[u8], config: &MosaicConfig) -> Result<Palette, PipelineError> {
	let sampler = Sampler::new(buffer, config.image_size, config.block_size)?;
	let palette = config.median_cut(config.max_depth).quantize(&sampler.all())?;
	tracing::debug!(colors = palette.len(), "palette extracted");
	Ok(palette.by_luminance())
}

/// Finds the whole-image palette and matches every block against it.
pub fn palette_mosaic(buffer: &[u8], config: &MosaicConfig) -> Result<(Mosaic, Palette), PipelineError> {
	let palette = extract_palette(buffer, config)?;
	let mut mosaic = Mosaic::analyze(buffer, config)?;
	mosaic.match_palette(&palette);
	Ok((mosaic, palette))
}

/// Runs dominant color, grayscale and normalization in one go.
pub fn gray_mosaic(buffer: &[u8], config: &MosaicConfig) -> Result<Mosaic, PipelineError> {
	let mut mosaic = Mosaic::analyze(buffer, config)?;
	mosaic.grayscale(config.formula)?;
	mosaic.normalize()?;
	Ok(mosaic)
}
