use super::super::error::PaletteError;

use std::fmt;

/// Weights for ordering palette entries by perceived brightness.
///
/// These are deliberately not the weights of `gray::Formula::Luminosity`;
/// the two measures are kept apart.
pub const LUMA_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// An opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

/// Which channel of a `Color` to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
	Red,
	Green,
	Blue,
}

impl Color {
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Color { r, g, b }
	}

	/// Builds a color from wider integer channels, failing if any of them
	/// lies outside `0..=255`.
	pub fn checked(r: i32, g: i32, b: i32) -> Result<Self, PaletteError> {
		let conv = |v: i32| {
			if (0..=255).contains(&v) {
				Ok(v as u8)
			} else {
				Err(PaletteError::ChannelOutOfRange(v))
			}
		};
		Ok(Color::new(conv(r)?, conv(g)?, conv(b)?))
	}

	pub fn channel(&self, ch: Channel) -> u8 {
		match ch {
			Channel::Red => self.r,
			Channel::Green => self.g,
			Channel::Blue => self.b,
		}
	}

	/// Packs the color as `0xRRGGBB`.
	pub fn to_int(&self) -> u32 {
		(self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
	}

	/// Unpacks a `0xRRGGBB` integer; bits above the low 24 are ignored.
	pub fn from_int(n: u32) -> Self {
		Color::new((n >> 16 & 0xff) as u8, (n >> 8 & 0xff) as u8, (n & 0xff) as u8)
	}

	/// Parses `#rrggbb` (the `#` is optional).
	pub fn from_hex(s: &str) -> Result<Self, PaletteError> {
		let digits = s.trim().trim_start_matches('#');
		if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(PaletteError::ParseColor(s.to_string()));
		}
		u32::from_str_radix(digits, 16)
			.map(Color::from_int)
			.map_err(|_| PaletteError::ParseColor(s.to_string()))
	}

	/// Weighted brightness used by `order_by_luminance`.
	pub fn luma(&self) -> f64 {
		LUMA_WEIGHTS[0] * self.r as f64 +
		LUMA_WEIGHTS[1] * self.g as f64 +
		LUMA_WEIGHTS[2] * self.b as f64
	}

	/// The color with its hue rotated half way around the wheel, or `None`
	/// for grays, which have no hue to rotate.
	pub fn complement(&self) -> Option<Color> {
		rgb_to_hsl(*self).map(hsl_to_rgb)
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&rgb_to_hex(*self))
	}
}

impl From<image::Rgb<u8>> for Color {
	fn from(p: image::Rgb<u8>) -> Self {
		Color::new(p.0[0], p.0[1], p.0[2])
	}
}

impl From<Color> for image::Rgba<u8> {
	fn from(c: Color) -> Self {
		image::Rgba([c.r, c.g, c.b, 255])
	}
}

/// An ordered, non-empty list of colors.
///
/// Entries are never modified once the palette exists; reordering produces
/// a new palette.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
	colors: Box<[Color]>,
}

impl Palette {
	pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
		if colors.is_empty() {
			return Err(PaletteError::Empty);
		}
		Ok(Palette { colors: colors.into_boxed_slice() })
	}

	/// Parses a list of `#rrggbb` strings.
	pub fn from_hex<S: AsRef<str>>(hexes: &[S]) -> Result<Self, PaletteError> {
		let colors = hexes.iter()
			.map(|h| Color::from_hex(h.as_ref()))
			.collect::<Result<Vec<_>, _>>()?;
		Palette::new(colors)
	}

	pub fn colors(&self) -> &[Color] {
		&self.colors
	}

	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn get(&self, index: usize) -> Option<Color> {
		self.colors.get(index).copied()
	}

	/// Copy of this palette sorted brightest first.
	pub fn by_luminance(&self) -> Palette {
		Palette { colors: order_by_luminance(&self.colors).into_boxed_slice() }
	}

	/// Complementary color for each entry; grays map to `None`.
	pub fn complementary(&self) -> Vec<Option<Color>> {
		self.colors.iter().map(Color::complement).collect()
	}

	pub fn to_hex(&self) -> Vec<String> {
		self.colors.iter().map(|c| rgb_to_hex(*c)).collect()
	}
}

/// Sorts colors by descending luma. Equal lumas keep their input order.
pub fn order_by_luminance(colors: &[Color]) -> Vec<Color> {
	let mut sorted = colors.to_vec();
	sorted.sort_by(|a, b| b.luma()
		.partial_cmp(&a.luma())
		.unwrap_or(std::cmp::Ordering::Equal));
	sorted
}

/// Hue in degrees `[0, 360)`, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
	pub h: f64,
	pub s: f64,
	pub l: f64,
}

pub fn rgb_to_hex(c: Color) -> String {
	format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

/// Converts to HSL with the hue turned by 180 degrees, so the result
/// describes the complementary color.
///
/// Achromatic input (`r == g == b`) has no hue and yields `None`.
pub fn rgb_to_hsl(c: Color) -> Option<Hsl> {
	if c.r == c.g && c.g == c.b {
		return None;
	}
	let (r, g, b) = (c.r as f64 / 255., c.g as f64 / 255., c.b as f64 / 255.);
	let max = r.max(g).max(b);
	let min = r.min(g).min(b);
	let delta = max - min;
	let l = (max + min) / 2.;
	let s = if l <= 0.5 {
		delta / (max + min)
	} else {
		delta / (2. - max - min)
	};
	let sector = if c.r >= c.g && c.r >= c.b {
		(g - b) / delta
	} else if c.g >= c.b {
		2. + (b - r) / delta
	} else {
		4. + (r - g) / delta
	};
	let hue = (sector * 60.).rem_euclid(360.);
	Some(Hsl {
		h: (hue + 180.) % 360.,
		s: s * 100.,
		l: l * 100.,
	})
}

pub fn hsl_to_rgb(hsl: Hsl) -> Color {
	let l = hsl.l / 100.;
	let a = hsl.s / 100. * l.min(1. - l);
	let f = |n: f64| {
		let k = (n + hsl.h / 30.) % 12.;
		let v = l - a * (k - 3.).min(9. - k).min(1.).max(-1.);
		(v * 255.).round().max(0.).min(255.) as u8
	};
	Color::new(f(0.), f(8.), f(4.))
}

pub fn hsl_to_hex(hsl: Hsl) -> String {
	rgb_to_hex(hsl_to_rgb(hsl))
}
