use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use seeded_watermark::{
    default_output_path, ProcessOptions, ProcessResult, Session, WatermarkCodec,
    WatermarkOptions, DEFAULT_SEED, DEFAULT_STRENGTH, DETECTION_THRESHOLD,
};

#[derive(Parser)]
#[command(
    name = "seeded-watermark",
    about = "Embed and detect a seeded, invisible watermark in grayscale images",
    version,
    after_help = "NOTE: The default strength (1) is below the detection threshold (15).\n\
                  Use --strength 16 or higher if the mark must be detectable."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Embed the watermark into an image file or every image in a directory
    Embed {
        /// Input image file or directory
        input: String,

        /// Output file or directory (default: {name}_watermarked.png)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Check whether a candidate differs from its original by more than the threshold
    Detect {
        /// Unmodified original image
        original: String,

        /// Image to test
        candidate: String,

        /// Absolute pixel difference treated as watermark signal
        #[arg(short, long, default_value_t = DETECTION_THRESHOLD)]
        threshold: u8,
    },
    /// Render the pattern for the given size as a black/white PNG
    Pattern {
        /// Pattern width in pixels
        width: u32,

        /// Pattern height in pixels
        height: u32,

        /// Output PNG path
        #[arg(short, long)]
        output: String,

        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Load, watermark, save, and self-test a single image
    Run {
        /// Input image file
        input: String,

        /// Output file (default: {name}_watermarked.png)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        pattern: PatternArgs,
    },
}

#[derive(Args)]
struct PatternArgs {
    /// Per-pixel perturbation magnitude (1-255)
    #[arg(short, long, default_value_t = DEFAULT_STRENGTH)]
    strength: u8,

    /// Pattern generator seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl PatternArgs {
    fn options(&self) -> WatermarkOptions {
        WatermarkOptions {
            strength: self.strength,
            seed: self.seed,
            ..WatermarkOptions::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "seeded_watermark=debug"
    } else {
        "seeded_watermark=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut opts = ProcessOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        ..ProcessOptions::default()
    };

    let results = match &cli.command {
        Command::Embed {
            input,
            output,
            pattern,
        } => {
            opts.watermark = pattern.options();
            embed(input, output.as_deref(), &opts)
        }
        Command::Detect {
            original,
            candidate,
            threshold,
        } => {
            opts.watermark.threshold = *threshold;
            let codec = WatermarkCodec::new(opts.watermark);
            vec![codec.detect_files(Path::new(original), Path::new(candidate))]
        }
        Command::Pattern {
            width,
            height,
            output,
            pattern,
        } => {
            opts.watermark = pattern.options();
            vec![render_pattern(*width, *height, Path::new(output), &opts)]
        }
        Command::Run {
            input,
            output,
            pattern,
        } => {
            opts.watermark = pattern.options();
            vec![run_session(input, output.as_deref(), &opts)]
        }
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn embed(input: &str, output: Option<&str>, opts: &ProcessOptions) -> Vec<ProcessResult> {
    let input_path = Path::new(input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {input}");
        process::exit(1);
    }

    if !opts.quiet && opts.watermark.strength <= opts.watermark.threshold {
        eprintln!(
            "WARNING: strength {} is not above the detection threshold {}; detection may miss it",
            opts.watermark.strength, opts.watermark.threshold
        );
    }

    let codec = WatermarkCodec::new(opts.watermark);
    if input_path.is_dir() {
        let Some(output_dir) = output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: seeded-watermark embed <input_dir> -o <output_dir>");
            process::exit(1);
        };
        codec.embed_directory(input_path, Path::new(output_dir))
    } else {
        let output_path = output.map_or_else(|| default_output_path(input_path), PathBuf::from);
        vec![codec.embed_file(input_path, &output_path)]
    }
}

fn render_pattern(width: u32, height: u32, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let codec = WatermarkCodec::new(opts.watermark);
    let mut result = ProcessResult {
        path: output.to_path_buf(),
        output: None,
        success: false,
        skipped: false,
        detection: None,
        message: String::new(),
    };

    match codec
        .generate_pattern(width, height)
        .and_then(|p| seeded_watermark::save_image(&p.to_image(), output))
    {
        Ok(()) => {
            result.success = true;
            result.output = Some(output.to_path_buf());
            result.message = format!("Pattern {width}x{height} written");
        }
        Err(e) => result.message = format!("Failed to render pattern: {e}"),
    }
    result
}

fn run_session(input: &str, output: Option<&str>, opts: &ProcessOptions) -> ProcessResult {
    let input_path = Path::new(input);
    let output_path = output.map_or_else(|| default_output_path(input_path), PathBuf::from);
    let mut result = ProcessResult {
        path: input_path.to_path_buf(),
        output: None,
        success: false,
        skipped: false,
        detection: None,
        message: String::new(),
    };

    let mut session = Session::new(WatermarkCodec::new(opts.watermark));
    let outcome = session
        .load(input_path)
        .and_then(|()| session.generate().map(|_| ()))
        .and_then(|()| session.save(&output_path))
        .and_then(|()| session.test());

    match outcome {
        Ok(detection) => {
            result.success = true;
            result.output = Some(output_path);
            result.message = detection.to_string();
            result.detection = Some(detection);
        }
        Err(e) => result.message = format!("Session stopped in state {:?}: {e}", session.state()),
    }
    result
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            match (&result.detection, &result.output) {
                (Some(d), _) => eprintln!(
                    "[OK] {filename}: {d} (max difference {}, {} pixel(s) above threshold)",
                    d.max_difference, d.outliers
                ),
                (None, Some(out)) => eprintln!("[OK] {filename} -> {}", out.display()),
                (None, None) => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
