use pretty_assertions::assert_eq;

use tile_mosaic::error::{PipelineError, QuantizeError, SampleError};
use tile_mosaic::gray::{Formula, Histogram, NormalizedLevel};
use tile_mosaic::quantize::{self, EmptyBucketPolicy, MedianCut, SplitMode};
use tile_mosaic::quantize::palette::{order_by_luminance, rgb_to_hsl, Color, Palette};
use tile_mosaic::{Canvas, Mosaic, MosaicAssignment, MosaicConfig, Stage};

/// RGBA buffer where each `block`-sized tile of a `side` square gets the
/// color `tile(row, col)`.
fn tiled(side: usize, block: usize, tile: impl Fn(usize, usize) -> Color) -> Vec<u8> {
	let mut buf = Vec::with_capacity(side * side * 4);
	for y in 0..side {
		for x in 0..side {
			let c = tile(y / block, x / block);
			buf.extend_from_slice(&[c.r, c.g, c.b, 255]);
		}
	}
	buf
}

#[test]
fn end_to_end_uniform_block() {
	let c = Color::new(100, 150, 200);
	let buf = tiled(4, 4, |_, _| c);
	let config = MosaicConfig::new().image_size(4).block_size(4).tile_depth(2);

	let mut mosaic = Mosaic::analyze(&buf, &config).unwrap();
	assert_eq!(mosaic.dominant_colors(), vec![c]);
	mosaic.grayscale(Formula::Average).unwrap();
	assert_eq!(mosaic.gray_values(), Some(vec![150.]));
	mosaic.normalize().unwrap();
	assert_eq!(mosaic.blocks()[0].level, Some(NormalizedLevel { index: 5, value: 159.375 }));
}

#[test]
fn gray_mosaic_levels_follow_tiles() {
	// dark, mid and white tiles across a 3x3 grid
	let shades = [Color::new(0, 0, 0), Color::new(120, 130, 140), Color::new(255, 255, 255)];
	let buf = tiled(12, 4, |_, col| shades[col]);
	let config = MosaicConfig::new().image_size(12).block_size(4);
	let mosaic = tile_mosaic::gray_mosaic(&buf, &config).unwrap();

	assert_eq!(mosaic.stage(), Stage::Normalized);
	assert_eq!(mosaic.level_tiles().unwrap(), vec![0, 4, 8, 0, 4, 8, 0, 4, 8]);
	let hist = mosaic.histogram().unwrap();
	assert_eq!(hist.total(), 9);
	assert_eq!((hist.counts()[0], hist.counts()[130], hist.counts()[255]), (3, 3, 3));
}

#[test]
fn palette_mosaic_matches_image_palette() {
	let colors = [
		Color::new(250, 20, 20),
		Color::new(20, 250, 20),
		Color::new(20, 20, 250),
		Color::new(240, 240, 240),
	];
	let buf = tiled(8, 4, |row, col| colors[row * 2 + col]);
	let config = MosaicConfig::new().image_size(8).block_size(4).max_depth(2);
	let (mosaic, palette) = tile_mosaic::palette_mosaic(&buf, &config).unwrap();

	assert_eq!(palette.len(), 4);
	assert_eq!(palette.colors(), order_by_luminance(palette.colors()).as_slice());
	for a in mosaic.assignments() {
		let block = &mosaic.blocks()[a.block];
		assert_eq!(palette.get(a.palette_index), Some(block.dominant));
		assert_eq!(a.tile_number(), a.palette_index + 1);
	}
	// white is brightest, blue darkest
	assert_eq!(palette.get(0), Some(Color::new(240, 240, 240)));
	assert_eq!(palette.get(3), Some(Color::new(20, 20, 250)));
}

#[test]
fn direct_matching_against_fixed_palette() {
	let buf = tiled(8, 4, |row, col| if row == col { Color::new(30, 30, 30) } else { Color::new(220, 200, 210) });
	let config = MosaicConfig::new().image_size(8).block_size(4);
	let fixed = Palette::from_hex(&["#ffffff", "#000000", "#ffffff"]).unwrap();

	let mut mosaic = Mosaic::analyze(&buf, &config).unwrap();
	assert_eq!(mosaic.match_palette(&fixed), vec![
		MosaicAssignment { block: 0, palette_index: 1 },
		MosaicAssignment { block: 1, palette_index: 0 },
		MosaicAssignment { block: 2, palette_index: 0 },
		MosaicAssignment { block: 3, palette_index: 1 },
	]);
}

#[test]
fn switching_formula_is_idempotent() {
	let buf = tiled(8, 2, |row, col| Color::new((row * 60) as u8, (col * 60) as u8, 90));
	let config = MosaicConfig::new().image_size(8).block_size(2);
	let mut mosaic = Mosaic::analyze(&buf, &config).unwrap();
	mosaic.grayscale(Formula::Luminosity).unwrap();
	mosaic.normalize().unwrap();
	let first = mosaic.blocks().to_vec();
	let first_hist = mosaic.histogram().cloned();

	mosaic.grayscale(Formula::Lightness).unwrap();
	mosaic.grayscale(Formula::Luminosity).unwrap();
	assert_eq!(mosaic.blocks(), first.as_slice());
	assert_eq!(mosaic.histogram().cloned(), first_hist);
}

#[test]
fn histogram_conservation() {
	let values = (0..777).map(|i| (i as f64 * 0.33) % 255.).collect::<Vec<_>>();
	let hist = Histogram::build(&values).unwrap();
	assert_eq!(hist.total(), values.len() as u64);
}

#[test]
fn uniform_quantization_at_every_depth() {
	let c = Color::new(7, 77, 177);
	let samples = vec![c; 300];
	for depth in 0..=6 {
		let pal = quantize::quantize(&samples, depth).unwrap();
		assert_eq!(pal.len(), 1 << depth);
		assert!(pal.colors().iter().all(|&e| e == c));
	}
}

#[test]
fn tiny_image_still_yields_full_palette() {
	// 4 samples against 16 palette slots
	let buf = tiled(2, 1, |row, col| Color::new((row * 100) as u8, (col * 100) as u8, 0));
	let config = MosaicConfig::new().image_size(2).block_size(2).max_depth(4);
	let palette = tile_mosaic::extract_palette(&buf, &config).unwrap();
	assert_eq!(palette.len(), 16);
	for c in &[Color::new(0, 0, 0), Color::new(0, 100, 0), Color::new(100, 0, 0), Color::new(100, 100, 0)] {
		assert_eq!(palette.colors().iter().filter(|&e| e == c).count(), 4);
	}
}

#[test]
fn split_modes_differ_only_by_dropped_median() {
	let samples = (0..8).map(|i| Color::new(i * 10, 0, 0)).collect::<Vec<_>>();
	let corrected = MedianCut::new(1).quantize(&samples).unwrap();
	let reference = MedianCut::new(1).split(SplitMode::Reference).quantize(&samples).unwrap();
	// upper half 40..=70 vs 50..=70
	assert_eq!(corrected.colors(), &[Color::new(15, 0, 0), Color::new(55, 0, 0)]);
	assert_eq!(reference.colors(), &[Color::new(15, 0, 0), Color::new(60, 0, 0)]);
}

#[test]
fn reference_split_with_strict_policy_fails_on_small_tiles() {
	// a 2x2 tile has 4 samples: 4 -> [2] + [1] -> [1] + [] at depth 2
	let buf = tiled(2, 2, |_, _| Color::new(1, 1, 1));
	let config = MosaicConfig::new()
		.image_size(2)
		.block_size(2)
		.tile_depth(2)
		.split(SplitMode::Reference)
		.empty_bucket(EmptyBucketPolicy::Fail);
	assert_eq!(
		Mosaic::analyze(&buf, &config).unwrap_err(),
		PipelineError::Quantize(QuantizeError::EmptyBucket { depth: 2 })
	);
	let lenient = config.empty_bucket(EmptyBucketPolicy::ReuseParent);
	assert_eq!(Mosaic::analyze(&buf, &lenient).unwrap().dominant_colors(), vec![Color::new(1, 1, 1)]);
}

#[test]
fn structural_errors_are_typed() {
	let buf = tiled(8, 4, |_, _| Color::new(0, 0, 0));
	let config = MosaicConfig::new().image_size(8).block_size(4);
	assert_eq!(
		Mosaic::analyze(&buf[..buf.len() - 4], &config).unwrap_err(),
		PipelineError::Sample(SampleError::InvalidBuffer { len: 252, side: 8 })
	);
	assert_eq!(
		Mosaic::analyze(&buf, &config.block_size(5)).unwrap_err(),
		PipelineError::Sample(SampleError::InvalidGrid { image_size: 8, block_size: 5 })
	);
}

#[test]
fn achromatic_and_complement() {
	assert_eq!(rgb_to_hsl(Color::new(10, 10, 10)), None);
	let hsl = rgb_to_hsl(Color::new(200, 10, 10)).unwrap();
	assert!((hsl.h - 180.).abs() < 1e-9);
}

#[test]
fn canvas_feeds_pipeline() {
	let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([100, 150, 200, 255]));
	let buf = img.to_canvas(16);
	let config = MosaicConfig::new().image_size(16).block_size(4);
	let mosaic = Mosaic::analyze(&buf, &config).unwrap();
	assert_eq!(mosaic.blocks().len(), 16);
}
