pub mod palette;

use std::collections::HashMap;

use super::error::QuantizeError;
use palette::{Channel, Color, Palette};

/// Where the upper half of a bucket starts when it is cut in two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitMode {
	/// Halves are `[0, mid)` and `[mid, len)`; no sample is lost.
	Corrected,
	/// Halves are `[0, mid)` and `[mid + 1, len)`, dropping the median
	/// sample at every cut. Kept to reproduce older palettes exactly.
	Reference,
}

/// What a leaf with no samples turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyBucketPolicy {
	/// Every leaf below the empty bucket takes the mean color of the bucket
	/// it was cut from.
	ReuseParent,
	/// The whole quantization fails with `QuantizeError::EmptyBucket`.
	Fail,
}

/// Median cut quantizer settings.
#[derive(Clone, Copy, Debug)]
pub struct MedianCut {
	/// Recursion depth; the palette has up to `2^max_depth` entries.
	pub max_depth: u32,
	pub split: SplitMode,
	pub empty: EmptyBucketPolicy,
}

impl Default for MedianCut {
	fn default() -> Self {
		MedianCut {
			max_depth: 4,
			split: SplitMode::Corrected,
			empty: EmptyBucketPolicy::ReuseParent,
		}
	}
}

impl MedianCut {
	pub fn new(max_depth: u32) -> Self {
		MedianCut { max_depth, ..Default::default() }
	}

	pub fn split(mut self, split: SplitMode) -> Self {
		self.split = split;
		self
	}

	pub fn empty_buckets(mut self, policy: EmptyBucketPolicy) -> Self {
		self.empty = policy;
		self
	}

	/// Reduces `samples` to a palette of representative colors.
	///
	/// Under `EmptyBucketPolicy::ReuseParent` the result always has exactly
	/// `2^max_depth` entries. The sample slice is never reordered; cuts are
	/// done on an index array.
	pub fn quantize(&self, samples: &[Color]) -> Result<Palette, QuantizeError> {
		self.quantize_from(samples, 0)
	}

	/// Same as `quantize`, but starting the recursion at `start_depth`.
	/// Starting at `max_depth` averages the whole set into one color.
	pub fn quantize_from(&self, samples: &[Color], start_depth: u32) -> Result<Palette, QuantizeError> {
		if samples.is_empty() {
			return Err(QuantizeError::EmptyBucket { depth: start_depth });
		}
		let mut indices = (0..samples.len()).collect::<Vec<_>>();
		let mut out = Vec::with_capacity(1 << self.max_depth.saturating_sub(start_depth).min(16));
		self.cut(samples, &mut indices, start_depth, None, &mut out)?;
		// `out` holds at least one entry: a non-empty root always yields a leaf
		Palette::new(out).map_err(|_| QuantizeError::EmptyBucket { depth: start_depth })
	}

	fn cut(
		&self,
		samples: &[Color],
		bucket: &mut [usize],
		depth: u32,
		parent: Option<Color>,
		out: &mut Vec<Color>
	) -> Result<(), QuantizeError> {
		if bucket.is_empty() {
			return match (self.empty, parent) {
				(EmptyBucketPolicy::ReuseParent, Some(c)) => {
					// one copy per leaf of the missing subtree
					let leaves = 1usize << self.max_depth.saturating_sub(depth);
					tracing::trace!(depth, leaves, %c, "empty bucket reuses parent color");
					out.extend(std::iter::repeat(c).take(leaves));
					Ok(())
				}
				_ => Err(QuantizeError::EmptyBucket { depth }),
			};
		}
		let mean = mean_color(samples, bucket);
		if depth >= self.max_depth {
			out.push(mean);
			return Ok(());
		}

		let ch = widest_channel(samples, bucket);
		bucket.sort_by_key(|&i| samples[i].channel(ch));

		let mid = bucket.len() / 2;
		let (lower, upper) = bucket.split_at_mut(mid);
		let upper = match self.split {
			SplitMode::Corrected => upper,
			SplitMode::Reference => {
				let skip = upper.len().min(1);
				&mut upper[skip..]
			}
		};
		self.cut(samples, lower, depth + 1, Some(mean), out)?;
		self.cut(samples, upper, depth + 1, Some(mean), out)
	}
}

/// Median cut with the default settings at the given depth.
pub fn quantize(samples: &[Color], max_depth: u32) -> Result<Palette, QuantizeError> {
	MedianCut::new(max_depth).quantize(samples)
}

/// Channel with the largest `max - min` spread. Ties go to red, then green.
fn widest_channel(samples: &[Color], bucket: &[usize]) -> Channel {
	let range = |ch: Channel| {
		let (lo, hi) = bucket.iter()
			.map(|&i| samples[i].channel(ch))
			.fold((u8::MAX, u8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
		hi.saturating_sub(lo)
	};
	let (r, g, b) = (range(Channel::Red), range(Channel::Green), range(Channel::Blue));
	if r >= g && r >= b {
		Channel::Red
	} else if g >= b {
		Channel::Green
	} else {
		Channel::Blue
	}
}

/// Per-channel arithmetic mean, rounded half up. `bucket` must not be empty.
fn mean_color(samples: &[Color], bucket: &[usize]) -> Color {
	let sums = bucket.iter()
		.map(|&i| samples[i])
		.fold([0u64; 3], |s, c| [s[0] + c.r as u64, s[1] + c.g as u64, s[2] + c.b as u64]);
	let n = bucket.len() as u64;
	let avg = |s: u64| ((2 * s + n) / (2 * n)) as u8;
	Color::new(avg(sums[0]), avg(sums[1]), avg(sums[2]))
}

/// Squared Euclidean distance between two colors in RGB space.
pub fn color_distance(a: &Color, b: &Color) -> u32 {
	let d = |x: u8, y: u8| {
		let v = x as i32 - y as i32;
		(v * v) as u32
	};
	d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b)
}

/// Result of matching a color against a palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
	pub index: usize,
	pub distance: u32,
}

/// Finds the palette entry closest to `sample`. On equal distances the
/// entry that comes first in the palette wins.
pub fn nearest(sample: &Color, palette: &Palette) -> Match {
	let mut best = Match { index: 0, distance: u32::MAX };
	for (index, col) in palette.colors().iter().enumerate() {
		let distance = color_distance(sample, col);
		if distance < best.distance {
			best = Match { index, distance };
		}
	}
	best
}

/// Matches every color in `samples` against `palette`, returning the
/// chosen palette index for each one, in order.
pub fn quantize_to_palette(samples: &[Color], palette: &Palette) -> Vec<usize> {
	let mut quant_cache = HashMap::new();
	samples.iter()
		.map(|c| *quant_cache.entry(*c).or_insert_with(|| nearest(c, palette).index))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gradient(n: usize) -> Vec<Color> {
		(0..n).map(|i| Color::new((i * 255 / (n - 1)) as u8, 40, 90)).collect()
	}

	#[test]
	fn uniform_input_fills_palette() {
		let c = Color::new(100, 150, 200);
		let samples = vec![c; 64];
		for depth in 0..=4 {
			let pal = quantize(&samples, depth).unwrap();
			assert_eq!(pal.len(), 1 << depth);
			assert!(pal.colors().iter().all(|&e| e == c));
		}
	}

	#[test]
	fn few_samples_still_fill_palette() {
		let c = Color::new(3, 6, 9);
		for &n in &[1, 3] {
			for &depth in &[2, 4] {
				let pal = quantize(&vec![c; n], depth).unwrap();
				assert_eq!(pal.len(), 1 << depth, "{} samples at depth {}", n, depth);
				assert!(pal.colors().iter().all(|&e| e == c));
			}
		}
	}

	#[test]
	fn empty_subtree_repeats_parent_mean() {
		// [a, b] at depth 2: each half is one sample whose lower cut is empty
		let (a, b) = (Color::new(0, 0, 0), Color::new(200, 0, 0));
		let pal = quantize(&[a, b], 2).unwrap();
		assert_eq!(pal.colors(), &[a, a, b, b]);
	}

	#[test]
	fn start_at_max_depth_is_mean() {
		let samples = vec![Color::new(0, 0, 0), Color::new(255, 100, 3)];
		let pal = MedianCut::new(4).quantize_from(&samples, 4).unwrap();
		// 127.5 and 1.5 round up
		assert_eq!(pal.colors(), &[Color::new(128, 50, 2)]);
	}

	#[test]
	fn corrected_split_keeps_every_sample() {
		let samples = gradient(16);
		let pal = quantize(&samples, 4).unwrap();
		assert_eq!(pal.colors(), samples.as_slice());
	}

	#[test]
	fn reference_split_drops_median() {
		// [0,1,2,3] on red: lower [0,1], upper drops index 2 and keeps [3]
		let samples = vec![
			Color::new(30, 0, 0),
			Color::new(0, 0, 0),
			Color::new(20, 0, 0),
			Color::new(10, 0, 0),
		];
		let pal = MedianCut::new(1)
			.split(SplitMode::Reference)
			.quantize(&samples)
			.unwrap();
		assert_eq!(pal.colors(), &[Color::new(5, 0, 0), Color::new(30, 0, 0)]);

		let pal = MedianCut::new(1).quantize(&samples).unwrap();
		assert_eq!(pal.colors(), &[Color::new(5, 0, 0), Color::new(25, 0, 0)]);
	}

	#[test]
	fn reference_split_reuses_parent_for_empty_bucket() {
		// a single sample cut once: both halves are empty
		let c = Color::new(9, 8, 7);
		let pal = MedianCut::new(1).split(SplitMode::Reference).quantize(&[c]).unwrap();
		assert_eq!(pal.colors(), &[c, c]);
	}

	#[test]
	fn strict_policy_reports_empty_bucket() {
		let c = Color::new(9, 8, 7);
		let err = MedianCut::new(2)
			.split(SplitMode::Reference)
			.empty_buckets(EmptyBucketPolicy::Fail)
			.quantize(&[c, c, c])
			.unwrap_err();
		// [c,c,c] -> lower [c], upper [c]; then [c] -> lower [] at depth 2
		assert_eq!(err, QuantizeError::EmptyBucket { depth: 2 });
	}

	#[test]
	fn empty_input_is_an_error() {
		assert_eq!(quantize(&[], 3).unwrap_err(), QuantizeError::EmptyBucket { depth: 0 });
	}

	#[test]
	fn splits_on_widest_channel() {
		// green spread is widest; red spread is small
		let samples = vec![
			Color::new(10, 0, 5),
			Color::new(12, 200, 5),
			Color::new(11, 100, 5),
			Color::new(13, 250, 5),
		];
		let pal = quantize(&samples, 1).unwrap();
		assert_eq!(pal.colors(), &[Color::new(11, 50, 5), Color::new(13, 225, 5)]);
	}

	#[test]
	fn channel_ties_prefer_red() {
		let samples = vec![Color::new(0, 10, 0), Color::new(10, 0, 0)];
		let pal = quantize(&samples, 1).unwrap();
		assert_eq!(pal.colors(), &[Color::new(0, 10, 0), Color::new(10, 0, 0)]);
	}

	#[test]
	fn samples_are_not_reordered() {
		let samples = vec![Color::new(200, 0, 0), Color::new(0, 0, 0)];
		let before = samples.clone();
		quantize(&samples, 1).unwrap();
		assert_eq!(samples, before);
	}

	#[test]
	fn distance_is_squared() {
		assert_eq!(color_distance(&Color::new(0, 0, 0), &Color::new(3, 4, 0)), 25);
		assert_eq!(color_distance(&Color::new(255, 255, 255), &Color::new(0, 0, 0)), 3 * 255 * 255);
	}

	#[test]
	fn exact_match_picks_first_duplicate() {
		let k = Color::new(1, 2, 3);
		let pal = Palette::new(vec![Color::new(50, 50, 50), k, k]).unwrap();
		assert_eq!(nearest(&k, &pal), Match { index: 1, distance: 0 });
	}

	#[test]
	fn equidistant_picks_first() {
		let pal = Palette::new(vec![Color::new(0, 0, 0), Color::new(20, 0, 0)]).unwrap();
		assert_eq!(nearest(&Color::new(10, 0, 0), &pal), Match { index: 0, distance: 100 });
	}

	#[test]
	fn quantize_to_palette_maps_each_sample() {
		let pal = Palette::new(vec![Color::new(0, 0, 0), Color::new(255, 255, 255)]).unwrap();
		let samples = vec![Color::new(10, 10, 10), Color::new(250, 240, 230), Color::new(10, 10, 10)];
		assert_eq!(quantize_to_palette(&samples, &pal), vec![0, 1, 0]);
	}
}
