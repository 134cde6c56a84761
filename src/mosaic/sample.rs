use super::error::SampleError;
use super::quantize::palette::Color;

/// Colors pulled from one region of an image, unordered.
pub type PixelSet = Vec<Color>;

/// Reads the RGB part of every pixel in an RGBA buffer; alpha is ignored.
pub fn sample_pixels(buffer: &[u8]) -> Result<PixelSet, SampleError> {
	if buffer.len() % 4 != 0 {
		return Err(SampleError::InvalidBuffer { len: buffer.len(), side: 0 });
	}
	Ok(buffer.chunks_exact(4).map(|p| Color::new(p[0], p[1], p[2])).collect())
}

/// The division of a square image into square blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
	pub image_size: usize,
	pub block_size: usize,
}

impl Grid {
	pub fn new(image_size: usize, block_size: usize) -> Result<Self, SampleError> {
		if image_size == 0 || block_size == 0 || image_size % block_size != 0 {
			return Err(SampleError::InvalidGrid { image_size, block_size });
		}
		Ok(Grid { image_size, block_size })
	}

	/// Number of blocks along one edge.
	pub fn blocks_per_side(&self) -> usize {
		self.image_size / self.block_size
	}

	pub fn block_count(&self) -> usize {
		self.blocks_per_side() * self.blocks_per_side()
	}

	/// `(row, col)` of a block in row-major order.
	pub fn position(&self, index: usize) -> (usize, usize) {
		(index / self.blocks_per_side(), index % self.blocks_per_side())
	}
}

/// Splits a validated RGBA buffer into per-block pixel sets.
#[derive(Clone, Copy, Debug)]
pub struct Sampler<'a> {
	buffer: &'a [u8],
	grid: Grid,
}

impl<'a> Sampler<'a> {
	/// Checks that `buffer` is an `image_size` square of RGBA pixels and that
	/// `block_size` tiles it exactly.
	pub fn new(buffer: &'a [u8], image_size: usize, block_size: usize) -> Result<Self, SampleError> {
		let expected = image_size.checked_mul(image_size).and_then(|n| n.checked_mul(4));
		if buffer.len() % 4 != 0 || expected != Some(buffer.len()) {
			return Err(SampleError::InvalidBuffer { len: buffer.len(), side: image_size });
		}
		let grid = Grid::new(image_size, block_size)?;
		Ok(Sampler { buffer, grid })
	}

	pub fn grid(&self) -> Grid {
		self.grid
	}

	/// Every pixel of the image.
	pub fn all(&self) -> PixelSet {
		self.buffer.chunks_exact(4).map(|p| Color::new(p[0], p[1], p[2])).collect()
	}

	/// Pixels of block `index`, row by row, or `None` past the last block.
	pub fn block(&self, index: usize) -> Option<PixelSet> {
		if index < self.grid.block_count() {
			Some(self.block_pixels(index))
		} else {
			None
		}
	}

	fn block_pixels(&self, index: usize) -> PixelSet {
		let Grid { image_size, block_size } = self.grid;
		let (row, col) = self.grid.position(index);
		let mut pixels = Vec::with_capacity(block_size * block_size);
		for y in row * block_size..(row + 1) * block_size {
			let start = (y * image_size + col * block_size) * 4;
			pixels.extend(self.buffer[start..start + block_size * 4]
				.chunks_exact(4)
				.map(|p| Color::new(p[0], p[1], p[2])));
		}
		pixels
	}

	/// Pixel sets of all blocks in row-major order, made one at a time.
	pub fn blocks(&self) -> impl Iterator<Item = PixelSet> + 'a {
		let sampler = *self;
		(0..self.grid.block_count()).map(move |i| sampler.block_pixels(i))
	}
}
