use std::path::{Path, PathBuf};
use std::process::ExitCode;

use calib_sheets::aruco::{resolve_dictionary, DetectorParams, DictionaryError};
use calib_sheets::charuco::MarkerLayout;
use calib_sheets::detect::{detect_image_file, DetectError};
use calib_sheets::print::{
    export_marker_set, CharucoPrintConfig, CharucoPrintJob, MarkerGridConfig, MarkerGridJob,
    MarkerSetConfig, PrintError, VerifyError,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[cfg(feature = "tracing")]
use calib_sheets::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use calib_sheets::core::init_with_level;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Print(#[from] PrintError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Parser, Debug)]
#[command(
    name = "calib-sheets",
    version,
    about = "Generate printable ChArUco boards and ArUco marker sheets"
)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace. With the `tracing`
    /// feature a `RUST_LOG` filter takes precedence over this flag.
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a ChArUco board sized for a physical page.
    Charuco(CharucoArgs),
    /// Render a grid of numbered markers and check it decodes.
    Grid(GridArgs),
    /// Write one PNG per marker into a directory.
    Markers(MarkersArgs),
    /// Detect markers in an image file.
    Detect(DetectArgs),
}

#[derive(Args, Debug)]
struct CharucoArgs {
    /// Load the job from a JSON config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective config as JSON.
    #[arg(long)]
    write_config: Option<PathBuf>,
    #[arg(long)]
    squares_x: Option<u32>,
    #[arg(long)]
    squares_y: Option<u32>,
    /// Square side in meters.
    #[arg(long)]
    square_length: Option<f32>,
    /// Marker side in meters.
    #[arg(long)]
    marker_length: Option<f32>,
    #[arg(long)]
    dictionary: Option<String>,
    /// JSON code table for a dictionary that is not built in.
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
    /// Checkerboard phase; `legacy` puts marker 0 on the top-left square
    /// when the row count is even.
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    #[arg(long)]
    width_mm: Option<f64>,
    #[arg(long)]
    height_mm: Option<f64>,
    #[arg(long)]
    dpi: Option<u32>,
    #[arg(long)]
    margin_px: Option<usize>,
    #[arg(long)]
    border_bits: Option<usize>,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    /// OpenCV 4.7+: the top-left square is always black.
    Charuco,
    /// OpenCV before 4.7.
    Legacy,
}

impl From<LayoutArg> for MarkerLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Charuco => MarkerLayout::OpenCvCharuco,
            LayoutArg::Legacy => MarkerLayout::OpenCvLegacy,
        }
    }
}

impl CharucoArgs {
    fn resolve(self) -> Result<CharucoPrintConfig, PrintError> {
        let mut cfg = match &self.config {
            Some(path) => CharucoPrintConfig::load_json(path)?,
            None => CharucoPrintConfig::default(),
        };
        override_opt(&mut cfg.squares_x, self.squares_x);
        override_opt(&mut cfg.squares_y, self.squares_y);
        override_opt(&mut cfg.square_length, self.square_length);
        override_opt(&mut cfg.marker_length, self.marker_length);
        override_opt(&mut cfg.dictionary, self.dictionary);
        if self.dictionary_file.is_some() {
            cfg.dictionary_file = self.dictionary_file;
        }
        override_opt(&mut cfg.marker_layout, self.layout.map(MarkerLayout::from));
        override_opt(&mut cfg.width_mm, self.width_mm);
        override_opt(&mut cfg.height_mm, self.height_mm);
        override_opt(&mut cfg.dpi, self.dpi);
        override_opt(&mut cfg.margin_px, self.margin_px);
        override_opt(&mut cfg.border_bits, self.border_bits);
        override_opt(&mut cfg.output, self.output);
        if let Some(path) = &self.write_config {
            cfg.write_json(path)?;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Load the job from a JSON config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective config as JSON.
    #[arg(long)]
    write_config: Option<PathBuf>,
    #[arg(long)]
    dictionary: Option<String>,
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
    /// Marker side in pixels.
    #[arg(long)]
    size: Option<usize>,
    /// Gutter between markers in pixels.
    #[arg(long)]
    separation: Option<usize>,
    #[arg(long)]
    cols: Option<usize>,
    #[arg(long)]
    rows: Option<usize>,
    #[arg(long)]
    border_bits: Option<usize>,
    #[arg(long)]
    first_id: Option<u32>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Skip the detection self-check.
    #[arg(long)]
    no_verify: bool,
}

impl GridArgs {
    fn resolve(self) -> Result<MarkerGridConfig, PrintError> {
        let mut cfg = match &self.config {
            Some(path) => MarkerGridConfig::load_json(path)?,
            None => MarkerGridConfig::default(),
        };
        override_opt(&mut cfg.dictionary, self.dictionary);
        if self.dictionary_file.is_some() {
            cfg.dictionary_file = self.dictionary_file;
        }
        override_opt(&mut cfg.marker_size_px, self.size);
        override_opt(&mut cfg.separation_px, self.separation);
        override_opt(&mut cfg.cols, self.cols);
        override_opt(&mut cfg.rows, self.rows);
        override_opt(&mut cfg.border_bits, self.border_bits);
        override_opt(&mut cfg.first_id, self.first_id);
        override_opt(&mut cfg.output, self.output);
        if self.no_verify {
            cfg.verify = false;
        }
        if let Some(path) = &self.write_config {
            cfg.write_json(path)?;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
struct MarkersArgs {
    #[arg(long, default_value = "DICT_4X4_50")]
    dictionary: String,
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    first_id: u32,
    #[arg(long, default_value_t = 50)]
    count: u32,
    /// Marker side in pixels.
    #[arg(long, default_value_t = 400)]
    size: usize,
    #[arg(long, default_value_t = 1)]
    border_bits: usize,
    /// Output directory, created if missing.
    #[arg(long, default_value = "aruco_ex")]
    dir: PathBuf,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Image to scan.
    image: PathBuf,
    #[arg(long, default_value = "DICT_4X4_50")]
    dictionary: String,
    #[arg(long)]
    dictionary_file: Option<PathBuf>,
    /// Write a JSON report with every detection.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn override_opt<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    #[cfg(not(feature = "tracing"))]
    init_with_level(cli.log_level)?;
    #[cfg(feature = "tracing")]
    init_tracing(cli.log_level, false);

    match cli.command {
        Command::Charuco(args) => run_charuco(args),
        Command::Grid(args) => run_grid(args),
        Command::Markers(args) => run_markers(args),
        Command::Detect(args) => run_detect(args),
    }
}

fn run_charuco(args: CharucoArgs) -> Result<(), CliError> {
    let job = CharucoPrintJob::new(args.resolve()?)?;
    let (w, h) = job.pixel_size();
    log::info!(
        "{}x{} squares of {} on {w}x{h} px",
        job.config().squares_x,
        job.config().squares_y,
        job.config().dictionary
    );
    let sheet = job.run()?;
    println!("Board generated: {}", sheet.path.display());
    Ok(())
}

fn run_grid(args: GridArgs) -> Result<(), CliError> {
    let job = MarkerGridJob::new(args.resolve()?)?;
    let (sheet, canvas) = job.run()?;
    println!("Board generated: {}", sheet.path.display());

    if job.config().verify {
        let report = job.verify(&canvas);
        println!("Detected ids: {:?}", report.detected);
        report.ensure_complete()?;
    }
    Ok(())
}

fn run_markers(args: MarkersArgs) -> Result<(), CliError> {
    let cfg = MarkerSetConfig {
        dictionary: args.dictionary,
        dictionary_file: args.dictionary_file,
        first_id: args.first_id,
        count: args.count,
        marker_size_px: args.size,
        border_bits: args.border_bits,
        dir: args.dir,
    };
    let report = export_marker_set(&cfg)?;
    println!(
        "Markers written: {}, skipped: {} ({})",
        report.written.len(),
        report.skipped.len(),
        cfg.dir.display()
    );
    Ok(())
}

fn run_detect(args: DetectArgs) -> Result<(), CliError> {
    let dict = resolve_dictionary(&args.dictionary, args.dictionary_file.as_deref())?;
    let report = detect_image_file(&args.image, &dict, &DetectorParams::default())?;
    println!("Detected ids: {:?}", report.ids());
    if let Some(path) = args.report.as_deref() {
        write_report(&report, path)?;
    }
    Ok(())
}

fn write_report(report: &calib_sheets::detect::DetectReport, path: &Path) -> Result<(), CliError> {
    report.write_json(path)?;
    log::info!("report written to {}", path.display());
    Ok(())
}
