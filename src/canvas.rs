use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Something that can be turned into the fixed square RGBA buffer the mosaic
/// pipeline works on.
pub trait Canvas {
	/// Takes the centered square of the shorter edge and scales it to
	/// `side` pixels per edge. The result holds `side * side * 4` bytes.
	fn to_canvas(&self, side: u32) -> Vec<u8>;
}

impl Canvas for RgbaImage {
	fn to_canvas(&self, side: u32) -> Vec<u8> {
		let (width, height) = self.dimensions();
		let edge = width.min(height);
		if edge == 0 {
			return vec![0; side as usize * side as usize * 4];
		}
		// offsets round half up
		let x = (width - edge + 1) / 2;
		let y = (height - edge + 1) / 2;
		let square = imageops::crop_imm(self, x, y, edge, edge);
		if edge == side {
			square.to_image().into_raw()
		} else {
			imageops::resize(&square, side, side, FilterType::Triangle).into_raw()
		}
	}
}

impl Canvas for image::DynamicImage {
	fn to_canvas(&self, side: u32) -> Vec<u8> {
		self.to_rgba().to_canvas(side)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn crops_wide_image_to_center() {
		// columns are colored by their x coordinate
		let img = RgbaImage::from_fn(5, 2, |x, _| image::Rgba([x as u8, 0, 0, 255]));
		let canvas = img.to_canvas(2);
		assert_eq!(canvas.len(), 2 * 2 * 4);
		// (5 - 2) / 2 = 1.5 rounds to a left offset of 2
		assert_eq!(canvas[0], 2);
		assert_eq!(canvas[4], 3);
		assert_eq!(canvas[8], 2);
	}

	#[test]
	fn crops_tall_image_to_center() {
		let img = RgbaImage::from_fn(2, 4, |_, y| image::Rgba([0, y as u8, 0, 255]));
		let canvas = img.to_canvas(2);
		assert_eq!(canvas[1], 1);
		assert_eq!(canvas[9], 2);
	}

	#[test]
	fn scales_to_side() {
		let img = RgbaImage::from_pixel(10, 7, image::Rgba([9, 8, 7, 255]));
		let canvas = image::DynamicImage::ImageRgba8(img).to_canvas(16);
		assert_eq!(canvas.len(), 16 * 16 * 4);
		let near = |a: u8, b: u8| (a as i32 - b as i32).abs() <= 1;
		assert!(canvas.chunks_exact(4).all(|p| near(p[0], 9) && near(p[1], 8) && near(p[2], 7)));
	}
}
