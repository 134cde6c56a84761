use super::error::{FormulaError, HistogramError, NormalizeError};
use super::quantize::palette::Color;

use std::str::FromStr;

/// Channel weights of `Formula::Luminosity`.
pub const LUMINOSITY_WEIGHTS: [f64; 3] = [0.21, 0.72, 0.07];

/// How a color is reduced to one gray value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formula {
	/// `(r + g + b) / 3`
	Average,
	/// `(max + min) / 2`
	Lightness,
	/// `0.21 r + 0.72 g + 0.07 b`
	Luminosity,
}

impl Default for Formula {
	fn default() -> Self {
		Formula::Average
	}
}

impl FromStr for Formula {
	type Err = FormulaError;

	/// Accepts the formula name (any case) or its selector index `0`..`2`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"0" | "average" => Ok(Formula::Average),
			"1" | "lightness" => Ok(Formula::Lightness),
			"2" | "luminosity" => Ok(Formula::Luminosity),
			_ => Err(FormulaError::Unknown(s.to_string())),
		}
	}
}

impl Formula {
	/// Parses a user-facing selector, falling back to `Average` for
	/// anything unrecognized.
	pub fn select(selector: &str) -> Formula {
		selector.parse().unwrap_or_else(|e: FormulaError| {
			tracing::warn!("{}, using average", e);
			Formula::Average
		})
	}

	/// Gray value of `c` in `0.0..=255.0`.
	pub fn to_gray(self, c: Color) -> f64 {
		let (r, g, b) = (c.r as f64, c.g as f64, c.b as f64);
		let gs = match self {
			Formula::Average => (r + g + b) / 3.,
			Formula::Lightness => (r.max(g).max(b) + r.min(g).min(b)) / 2.,
			Formula::Luminosity =>
				LUMINOSITY_WEIGHTS[0] * r + LUMINOSITY_WEIGHTS[1] * g + LUMINOSITY_WEIGHTS[2] * b,
		};
		gs.min(255.)
	}
}

/// Gray value of `c` under `formula`.
pub fn to_gray(c: Color, formula: Formula) -> f64 {
	formula.to_gray(c)
}

/// Counts of rounded gray values, one bucket per value `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
	buckets: [u32; 256],
}

impl Default for Histogram {
	fn default() -> Self {
		Histogram { buckets: [0; 256] }
	}
}

impl Histogram {
	/// Bins each value into the bucket it rounds to.
	pub fn build(values: &[f64]) -> Result<Histogram, HistogramError> {
		let mut hist = Histogram::default();
		for &v in values {
			let i = v.round();
			if !(0. ..=255.).contains(&i) {
				return Err(HistogramError::OutOfRange(v));
			}
			hist.buckets[i as usize] += 1;
		}
		Ok(hist)
	}

	pub fn counts(&self) -> &[u32; 256] {
		&self.buckets
	}

	pub fn total(&self) -> u64 {
		self.buckets.iter().map(|&n| n as u64).sum()
	}

	pub fn max(&self) -> u32 {
		self.buckets.iter().copied().max().unwrap_or(0)
	}

	/// Bar height of each bucket when the fullest one is `height` tall.
	pub fn bar_heights(&self, height: u32) -> Vec<u32> {
		let max = self.max();
		self.buckets.iter()
			.map(|&n| if max == 0 {
				0
			} else {
				(height as f64 * n as f64 / max as f64).round() as u32
			})
			.collect()
	}
}

/// A posterized gray value: the level it fell into and that level's gray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLevel {
	/// In `0..=levels`; the top of the range rounds up to `levels` itself.
	pub index: u32,
	pub value: f64,
}

/// Posterizes gray values into a fixed number of steps of `255 / levels`.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
	levels: u32,
	step: f64,
}

impl Normalizer {
	pub fn new(levels: u32) -> Result<Self, NormalizeError> {
		if levels == 0 {
			return Err(NormalizeError::ZeroLevels);
		}
		Ok(Normalizer { levels, step: 255. / levels as f64 })
	}

	pub fn levels(&self) -> u32 {
		self.levels
	}

	pub fn step(&self) -> f64 {
		self.step
	}

	pub fn level(&self, value: f64) -> NormalizedLevel {
		let index = (value / self.step).round().max(0.) as u32;
		NormalizedLevel { index, value: index as f64 * self.step }
	}

	pub fn normalize(&self, values: &[f64]) -> Vec<NormalizedLevel> {
		values.iter().map(|&v| self.level(v)).collect()
	}
}

impl Default for Normalizer {
	fn default() -> Self {
		Normalizer { levels: 8, step: 255. / 8. }
	}
}

/// Posterizes `values` into `levels` steps.
pub fn normalize(values: &[f64], levels: u32) -> Result<Vec<NormalizedLevel>, NormalizeError> {
	Ok(Normalizer::new(levels)?.normalize(values))
}

/// Quick preview gray: averages the channels and snaps them to a whole
/// step of `round(255 / levels)`, returning the gray as a color.
pub fn posterize_color(c: Color, levels: u32) -> Result<Color, NormalizeError> {
	if levels == 0 {
		return Err(NormalizeError::ZeroLevels);
	}
	let delta = (255. / levels as f64).round();
	let gs = (delta * (Formula::Average.to_gray(c) / delta).round()).min(255.) as u8;
	Ok(Color::new(gs, gs, gs))
}
