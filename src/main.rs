use image::error::ImageError;

use tile_mosaic::Canvas;
use tile_mosaic::{Mosaic, MosaicConfig};
use tile_mosaic::error::PipelineError;
use tile_mosaic::gray::Formula;
use tile_mosaic::quantize::{EmptyBucketPolicy, SplitMode};
use tile_mosaic::quantize::palette::{Color, Palette};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

/// Parses an optional numeric argument, exiting with status 2 on garbage.
fn numeric_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str, default: &str) -> T {
	match matches.value_of(name).unwrap_or(default).parse() {
		Ok(n) => n,
		Err(_) => error_exit(&format!("Non-numeric value for {}", name), 2)
	}
}

/// Maps a pipeline failure to a message and exit status.
fn pipeline_exit(e: PipelineError) -> ! {
	let code = match e {
		PipelineError::Sample(_) | PipelineError::Normalize(_) | PipelineError::Palette(_) => 2,
		PipelineError::Quantize(_) | PipelineError::Histogram(_) => 4,
		PipelineError::StageNotReached { .. } => 10,
	};
	error_exit(&e.to_string(), code)
}

/// Fills each block of a `side` square with the color its block was given.
fn render(mosaic: &Mosaic, colors: &[Color]) -> image::RgbaImage {
	let grid = mosaic.grid();
	let size = grid.block_size as u32;
	let mut output = image::RgbaImage::new(grid.image_size as u32, grid.image_size as u32);
	for (block, color) in mosaic.blocks().iter().zip(colors) {
		image::imageops::replace(
			&mut output,
			&image::RgbaImage::from_pixel(size, size, (*color).into()),
			block.col as u32 * size,
			block.row as u32 * size,
		);
	}
	output
}

/// `clap`-based CLI for building tile mosaics out of images.
///
/// May exit process with status code if there are errors:
///
/// 1: `clap` error
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 10: other, potentially unknown error
fn main() {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "tile_mosaic=info".into()),
		)
		.with(tracing_subscriber::fmt::layer().without_time())
		.init();

	let clap_matches = clap::App::new("tile_mosaic")
		.version("0.1.0")
		.author("vkcz")
		.about("Reduces an image to a grid of tiles matched against a color palette or gray levels.")
		.arg_from_usage("-m, --mode=[MODE] 'palette or gray; defaults to palette'")
		.arg_from_usage("-s, --size=[N] 'Edge length the image is cropped and scaled to; defaults to 512'")
		.arg_from_usage("-b, --block=[N] 'Tile edge length; must divide --size; defaults to 8'")
		.arg_from_usage("-d, --depth=[N] 'Median cut depth of the image palette (2^N colors); defaults to 4'")
		.arg_from_usage("--tile-depth=[N] 'Median cut depth inside each tile; defaults to 0'")
		.arg_from_usage("-g, --grayscale=[FORMULA] 'average, lightness or luminosity (gray only); defaults to average'")
		.arg_from_usage("-l, --levels=[N] 'Number of gray levels (gray only); defaults to 8'")
		.arg_from_usage("-p, --palette=[COLORS] 'Comma-separated #rrggbb colors to match against instead of the image palette (palette only)'")
		.arg_from_usage("--reference-split 'Drop the median sample at every median cut'")
		.arg_from_usage("--strict 'Fail on empty median cut buckets instead of reusing the parent color'")
		.arg_from_usage("<INPUT> 'Path to input image'")
		.arg_from_usage("[OUTPUT] 'Path to output PNG; defaults to INPUT with a .mosaic.png extension'")
		.get_matches();

	let input_path = clap_matches.value_of("INPUT").unwrap_or_else(|| error_exit("Missing input", 2));
	let side: u32 = numeric_arg(&clap_matches, "size", "512");
	let config = MosaicConfig::new()
		.image_size(side as usize)
		.block_size(numeric_arg(&clap_matches, "block", "8"))
		.max_depth(numeric_arg(&clap_matches, "depth", "4"))
		.tile_depth(numeric_arg(&clap_matches, "tile-depth", "0"))
		.levels(numeric_arg(&clap_matches, "levels", "8"))
		.formula(Formula::select(clap_matches.value_of("grayscale").unwrap_or("average")))
		.split(if clap_matches.is_present("reference-split") {
			SplitMode::Reference
		} else {
			SplitMode::Corrected
		})
		.empty_bucket(if clap_matches.is_present("strict") {
			EmptyBucketPolicy::Fail
		} else {
			EmptyBucketPolicy::ReuseParent
		});
	if config.max_depth > 8 || config.tile_depth > 8 {
		error_exit("Median cut depth must be at most 8", 2)
	}

	let source = match image::open(input_path) {
		Ok(i) => i,
		Err(e) => {
			let (msg, code) = match e {
				ImageError::Decoding(_) => ("Invalid image data", 4),
				ImageError::Limits(_) => ("Computation limits exceeded", 4),
				ImageError::IoError(_) => ("File not found or could not be read", 3),
				_ => ("An error occurred", 10)
			};
			error_exit(msg, code)
		}
	};
	let buffer = source.to_canvas(side);
	tracing::info!(path = input_path, side, "image loaded");

	let (mosaic, colors) = match clap_matches.value_of("mode").unwrap_or("palette") {
		"palette" => {
			let palette = match clap_matches.value_of("palette") {
				Some(list) => Palette::from_hex(&list.split(',').collect::<Vec<_>>())
					.unwrap_or_else(|e| error_exit(&e.to_string(), 2)),
				None => tile_mosaic::extract_palette(&buffer, &config)
					.unwrap_or_else(|e| pipeline_exit(e)),
			};
			for (color, complement) in palette.colors().iter().zip(palette.complementary()) {
				match complement {
					Some(c) => println!("{} (complement {})", color, c),
					None => println!("{}", color),
				}
			}
			let mut mosaic = Mosaic::analyze(&buffer, &config).unwrap_or_else(|e| pipeline_exit(e));
			let colors = mosaic.match_palette(&palette).iter()
				.map(|a| palette.get(a.palette_index).unwrap_or_default())
				.collect::<Vec<_>>();
			(mosaic, colors)
		},
		"gray" => {
			let mosaic = tile_mosaic::gray_mosaic(&buffer, &config).unwrap_or_else(|e| pipeline_exit(e));
			if let Some(hist) = mosaic.histogram() {
				for (value, count) in hist.counts().iter().enumerate().filter(|&(_, &n)| n > 0) {
					println!("{:3} {}", value, count);
				}
			}
			let colors = mosaic.blocks().iter()
				.map(|b| {
					let gs = b.level.map(|l| l.value.round().min(255.) as u8).unwrap_or(0);
					Color::new(gs, gs, gs)
				})
				.collect::<Vec<_>>();
			(mosaic, colors)
		},
		other => error_exit(&format!("Unknown mode `{}`; use palette or gray", other), 2)
	};

	let output = render(&mosaic, &colors);
	let default_output = input_path.rsplitn(2, '.').last().unwrap_or(input_path).to_string() + ".mosaic.png";
	let output_path = clap_matches.value_of("OUTPUT").unwrap_or(&default_output);
	match output.save(output_path) {
		Ok(_) => tracing::info!(path = output_path, blocks = mosaic.blocks().len(), "mosaic written"),
		Err(_) => error_exit("Could not save output", 3)
	}
}
