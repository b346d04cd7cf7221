// ============================================================================
// scanfill CLI — headless flood fill over image files
// ============================================================================
//
// Usage examples:
//   scanfill -i photo.png --seed 20,10 --color ff0000 --threshold 10 -o out.png
//   scanfill -i scans/*.png --seed 0,0 --color ffffff --output-dir filled/
//   scanfill -i map.png --seed 5,5 --extent --spans -o map_mask.png
//   scanfill -i a.png b.png --seed 3,3 --rect 0,0,64,64 --difference euclidean
//
// Every input file gets its own fill engine; files are processed in parallel
// with rayon, each fill itself runs single-threaded.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::Rgba;
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use scanfill::{
    DifferenceKind, FillError, FillOptions, FillRegion, Point, Rect, ScanlineFill, Surface,
};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Flood-fill image files from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "scanfill",
    about = "Headless scanline flood fill",
    long_about = "Fill the 4-connected region around a seed pixel with a color, or\n\
                  export that region as a grayscale mask.\n\n\
                  Example:\n  \
                  scanfill -i photo.png --seed 20,10 --color ff0000 --threshold 10 -o out.png\n  \
                  scanfill -i *.png --seed 0,0 --extent --output-dir masks/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Seed pixel as X,Y.
    #[arg(long, value_parser = parse_point, value_name = "X,Y")]
    pub seed: Point,

    /// Fill color as RRGGBB or RRGGBBAA hex.
    #[arg(short, long, default_value = "000000ff", value_parser = parse_color, value_name = "HEX")]
    pub color: Rgba<u8>,

    /// Largest accepted color difference (0 = exact match, 255 = anything).
    #[arg(short, long, default_value_t = 0, value_name = "0-255")]
    pub threshold: u8,

    /// Color metric: max or euclidean.
    #[arg(long, default_value = "max", value_parser = parse_difference, value_name = "METRIC")]
    pub difference: DifferenceKind,

    /// Limit the fill to X,Y,W,H. Defaults to the whole image.
    #[arg(long, value_parser = parse_rect, value_name = "X,Y,W,H")]
    pub rect: Option<Rect>,

    /// Do not paint; write a mask of the region instead.
    #[arg(long)]
    pub extent: bool,

    /// Fail when the seed lies outside the fill rect instead of skipping.
    #[arg(long)]
    pub strict: bool,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also write the region's spans (bincode) next to each output as `.spans`.
    #[arg(long)]
    pub spans: bool,

    /// Print per-file timing and region statistics.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    fn options(&self) -> FillOptions {
        FillOptions {
            threshold: self.threshold,
            strict: self.strict,
            difference: self.difference,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("span dump failed: {0}")]
    Spans(#[from] bincode::Error),
    #[error("fill failed: {0}")]
    Fill(#[from] FillError),
}

/// What to do with every input file.
#[derive(Clone, Copy, Debug)]
struct FillJob {
    seed: Point,
    rect: Option<Rect>,
    color: Rgba<u8>,
    options: FillOptions,
    extent: bool,
    spans: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let job = FillJob {
        seed: args.seed,
        rect: args.rect,
        color: args.color,
        options: args.options(),
        extent: args.extent,
        spans: args.spans,
    };

    if let Some(path) = crate::logger::log_path() {
        info!("session log: {}", path.display());
    }

    let results: Vec<(PathBuf, Result<(PathBuf, FillRegion), CliError>, f64)> = inputs
        .par_iter()
        .map(|input| {
            let started = Instant::now();
            let result = build_output_path(
                input,
                args.output.as_deref(),
                args.output_dir.as_deref(),
                job.extent,
            )
            .ok_or_else(|| {
                CliError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "cannot determine output path",
                ))
            })
            .and_then(|output| run_one(input, &output, &job).map(|region| (output, region)));
            (input.clone(), result, started.elapsed().as_secs_f64() * 1000.0)
        })
        .collect();

    let total = results.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, (input, result, ms)) in results.into_iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input.display());
        }
        match result {
            Ok((output, region)) => {
                if region.is_empty() {
                    warn!("{}: seed matched nothing, output unchanged", input.display());
                }
                if args.verbose || multi {
                    println!(
                        "  → {} ({} px, {:?}, {:.0}ms)",
                        output.display(),
                        region.pixel_count(),
                        region.bounding_rect(),
                        ms
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, job: &FillJob) -> Result<FillRegion, CliError> {
    let mut img = image::open(input)?.into_rgba8();
    let image_rect = Surface::bounds(&img);
    let bounds = job.rect.unwrap_or(image_rect);

    let mut fill = ScanlineFill::with_options(&mut img, job.seed, bounds, job.options);
    let region = if job.extent {
        fill.fill_extent()?
    } else {
        fill.fill_color(job.color)?
    };

    if job.extent {
        region.to_mask(image_rect).save(output)?;
    } else {
        img.save(output)?;
    }

    if job.spans {
        let file = File::create(output.with_extension("spans"))?;
        bincode::serialize_into(BufWriter::new(file), &region)?;
    }

    Ok(region)
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths.  First occurrence wins, so the
/// order follows the command line.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    patterns
        .iter()
        .flat_map(|pattern| expand_pattern(pattern))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let literal = PathBuf::from(pattern);
    if literal.exists() {
        return vec![literal];
    }
    match glob::glob(pattern) {
        Ok(entries) => {
            let matched: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
            if matched.is_empty() {
                warn!("pattern '{}' matched no files", pattern);
            }
            matched
        }
        Err(e) => {
            warn!("invalid glob '{}': {}", pattern, e);
            Vec::new()
        }
    }
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input as `<stem>_filled.png` / `<stem>_mask.png`
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    extent: bool,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let suffix = if extent { "mask" } else { "filled" };
    let name = format!("{}_{}.png", stem, suffix);

    match output_dir {
        Some(dir) => Some(dir.join(name)),
        None => Some(input.parent().unwrap_or(Path::new(".")).join(name)),
    }
}

fn parse_ints<const N: usize>(s: &str) -> Result<[i32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma-separated integers, got '{}'", N, s));
    }
    let mut out = [0i32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid number '{}': {}", part, e))?;
    }
    Ok(out)
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_ints::<2>(s)?;
    Ok(Point::new(x, y))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let [x, y, w, h] = parse_ints::<4>(s)?;
    Ok(Rect::new(x, y, w, h))
}

fn parse_color(s: &str) -> Result<Rgba<u8>, String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return Err(format!("expected RRGGBB or RRGGBBAA, got '{}'", s));
    }
    let mut rgba = [0u8, 0, 0, 255];
    for (i, slot) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
        let byte = hex
            .get(i * 2..i * 2 + 2)
            .ok_or_else(|| format!("invalid hex color '{}'", s))?;
        *slot = u8::from_str_radix(byte, 16).map_err(|_| format!("invalid hex color '{}'", s))?;
    }
    Ok(Rgba(rgba))
}

fn parse_difference(s: &str) -> Result<DifferenceKind, String> {
    DifferenceKind::all()
        .iter()
        .copied()
        .find(|kind| kind.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown metric '{}', expected max or euclidean", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn parses_points_and_rects() {
        assert_eq!(parse_point("20, 10"), Ok(Point::new(20, 10)));
        assert_eq!(parse_point("-3,4"), Ok(Point::new(-3, 4)));
        assert!(parse_point("1,2,3").is_err());
        assert_eq!(parse_rect("0,0,64,32"), Ok(Rect::new(0, 0, 64, 32)));
        assert!(parse_rect("0,0,a,1").is_err());
    }

    #[test]
    fn parses_colors() {
        assert_eq!(parse_color("ff0000"), Ok(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("#10203040"), Ok(Rgba([0x10, 0x20, 0x30, 0x40])));
        assert!(parse_color("fff").is_err());
        assert!(parse_color("gg0000").is_err());
    }

    #[test]
    fn parses_metrics() {
        assert_eq!(parse_difference("max"), Ok(DifferenceKind::MaxChannel));
        assert_eq!(parse_difference("Euclidean"), Ok(DifferenceKind::Euclidean));
        assert!(parse_difference("cie76").is_err());
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/a.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), None, false),
            Some(PathBuf::from("x.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), true),
            Some(PathBuf::from("out/a_mask.png"))
        );
        assert_eq!(
            build_output_path(input, None, None, false),
            Some(PathBuf::from("shots/a_filled.png"))
        );
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// 4x3 white image split by a black wall in column 2.
    fn write_walled_png(dir: &Path, name: &str) -> PathBuf {
        let img = RgbaImage::from_fn(4, 3, |x, _| if x == 2 { BLACK } else { WHITE });
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    fn job(extent: bool, spans: bool) -> FillJob {
        FillJob {
            seed: Point::new(0, 0),
            rect: None,
            color: RED,
            options: FillOptions::default(),
            extent,
            spans,
        }
    }

    fn path_arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn fill_writes_painted_image() {
        let tmp = TempDir::new().unwrap();
        let input = write_walled_png(tmp.path(), "wall.png");
        let output = tmp.path().join("wall_filled.png");

        let region = run_one(&input, &output, &job(false, false)).unwrap();
        assert_eq!(region.pixel_count(), 6);
        assert_eq!(region.bounding_rect(), Rect::new(0, 0, 2, 3));

        let filled = image::open(&output).unwrap().into_rgba8();
        assert_eq!(*filled.get_pixel(0, 0), RED);
        assert_eq!(*filled.get_pixel(1, 2), RED);
        assert_eq!(*filled.get_pixel(2, 1), BLACK);
        assert_eq!(*filled.get_pixel(3, 1), WHITE);
        assert!(!output.with_extension("spans").exists());
    }

    #[test]
    fn extent_writes_mask_and_span_dump() {
        let tmp = TempDir::new().unwrap();
        let input = write_walled_png(tmp.path(), "wall.png");
        let output = tmp.path().join("wall_mask.png");

        let region = run_one(&input, &output, &job(true, true)).unwrap();

        let mask = image::open(&output).unwrap().into_luma8();
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(*mask.get_pixel(1, 1), Luma([255]));
        assert_eq!(*mask.get_pixel(2, 1), Luma([0]));
        assert_eq!(*mask.get_pixel(3, 1), Luma([0]));

        // The source image is left alone in extent mode.
        let source = image::open(&input).unwrap().into_rgba8();
        assert_eq!(*source.get_pixel(0, 0), WHITE);

        let dump = File::open(output.with_extension("spans")).unwrap();
        let loaded: FillRegion = bincode::deserialize_from(dump).unwrap();
        assert_eq!(loaded, region);
    }

    #[test]
    fn strict_seed_outside_rect_fails_the_file() {
        let tmp = TempDir::new().unwrap();
        let input = write_walled_png(tmp.path(), "wall.png");
        let output = tmp.path().join("out.png");
        let mut job = job(false, false);
        job.rect = Some(Rect::new(0, 0, 1, 1));
        job.seed = Point::new(3, 0);
        job.options.strict = true;

        let err = run_one(&input, &output, &job).unwrap_err();
        assert!(matches!(
            err,
            CliError::Fill(FillError::InvalidRegion { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn batch_exit_codes() {
        let tmp = TempDir::new().unwrap();
        write_walled_png(tmp.path(), "a.png");
        write_walled_png(tmp.path(), "b.png");
        let out_dir = tmp.path().join("out");
        let pattern = path_arg(&tmp.path().join("*.png"));

        let ok = CliArgs::try_parse_from([
            "scanfill",
            "-i",
            pattern.as_str(),
            "--seed",
            "3,0",
            "--output-dir",
            path_arg(&out_dir).as_str(),
        ])
        .unwrap();
        assert_eq!(run(ok), ExitCode::SUCCESS);
        assert!(out_dir.join("a_filled.png").exists());
        assert!(out_dir.join("b_filled.png").exists());

        let strict = CliArgs::try_parse_from([
            "scanfill",
            "-i",
            pattern.as_str(),
            "--seed",
            "3,0",
            "--rect",
            "0,0,2,2",
            "--strict",
            "--output-dir",
            path_arg(&out_dir).as_str(),
        ])
        .unwrap();
        assert_eq!(run(strict), ExitCode::FAILURE);
    }

    #[test]
    fn inputs_are_deduplicated_in_order() {
        let tmp = TempDir::new().unwrap();
        let b = write_walled_png(tmp.path(), "b.png");
        let a = write_walled_png(tmp.path(), "a.png");
        let patterns = vec![
            path_arg(&b),
            path_arg(&tmp.path().join("*.png")),
            path_arg(&b),
            path_arg(&tmp.path().join("missing_*.png")),
        ];
        assert_eq!(resolve_inputs(&patterns), vec![b, a]);
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();

        let args = CliArgs::try_parse_from([
            "scanfill", "-i", "a.png", "--seed", "1,2", "-t", "12", "--difference", "euclidean",
        ])
        .unwrap();
        assert_eq!(args.seed, Point::new(1, 2));
        assert_eq!(args.options().threshold, 12);
        assert_eq!(args.options().difference, DifferenceKind::Euclidean);
        assert_eq!(args.color, Rgba([0, 0, 0, 255]));
    }
}
