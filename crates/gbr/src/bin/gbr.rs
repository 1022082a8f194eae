//! gbr CLI: parameter files, synthetic boards, resizing and annotation export.

use clap::{Args, Parser, Subcommand};
use gbr::{AnnotationFormat, Board, BoardInfoImage, RenderOnlyEngine};
use std::path::PathBuf;
use std::process::ExitCode;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "gbr")]
#[command(about = "Go board recognition: board-info, parameters and annotations")]
#[command(version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or write the detection parameters.
    Params(ParamsArgs),

    /// Draw a synthetic board from a board-info file.
    Render(RenderArgs),

    /// Shrink an image, and its board info when given, to a maximum size.
    Resize(ResizeArgs),

    /// Write a dataset annotation for the image referenced by a board-info file.
    Annotate(AnnotateArgs),
}

#[derive(Debug, Clone, Args)]
struct ParamsArgs {
    /// Image whose sibling parameters file is merged over the defaults.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Write the parameters here instead of printing them.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Board-info (.jgf) file.
    #[arg(long)]
    jgf: PathBuf,

    /// Output image.
    #[arg(long)]
    out: PathBuf,

    /// Hide black stones.
    #[arg(long)]
    no_black: bool,

    /// Hide white stones.
    #[arg(long)]
    no_white: bool,

    /// Outline detection boxes.
    #[arg(long)]
    boxes: bool,
}

#[derive(Debug, Clone, Args)]
struct ResizeArgs {
    /// Image to resize.
    #[arg(long, required_unless_present = "jgf", conflicts_with = "jgf")]
    image: Option<PathBuf>,

    /// Board-info file; its image and results are resized together and the
    /// board info is rewritten next to the output image.
    #[arg(long)]
    jgf: Option<PathBuf>,

    /// Directory holding the image referenced by the board-info file.
    #[arg(long, requires = "jgf")]
    path_override: Option<PathBuf>,

    /// Maximum length of the longer side in pixels.
    #[arg(long)]
    max_size: u32,

    /// Output image.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct AnnotateArgs {
    /// Board-info (.jgf) file.
    #[arg(long)]
    jgf: PathBuf,

    /// Output annotation file.
    #[arg(long)]
    out: PathBuf,

    /// Annotation format.
    #[arg(long, default_value = "pascal")]
    format: AnnotationFormat,

    /// Directory holding the image referenced by the board-info file.
    #[arg(long)]
    path_override: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        gbr::core::init_tracing_with_level(false, level);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(e) = gbr::core::init_with_level(level) {
            eprintln!("logger already installed: {e}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let before = gbr::core::error_count();
    let result = match cli.command {
        Commands::Params(args) => run_params(&args),
        Commands::Render(args) => run_render(&args),
        Commands::Resize(args) => run_resize(&args),
        Commands::Annotate(args) => run_annotate(&args),
    };
    if let Err(e) = result {
        // board operations log their own failures
        if gbr::core::error_count() == before {
            gbr::core::note_error(format_args!("{e}"));
        }
    }

    let errors = gbr::core::error_count();
    if errors > 0 {
        log::debug!("{errors} error(s) logged");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_params(args: &ParamsArgs) -> CliResult<()> {
    let mut board = Board::new(RenderOnlyEngine);
    if let Some(image) = &args.image {
        let outcome = board.load_image(image, true, false)?;
        if outcome.params_applied.is_none() {
            log::info!("no parameters file next to {}", image.display());
        }
    }

    match &args.out {
        Some(out) => {
            board.params().write_json(out)?;
            log::info!("parameters written to {}", out.display());
        }
        None => println!(
            "{}",
            serde_json::to_string_pretty(&board.params().to_json_map())?
        ),
    }
    Ok(())
}

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let mut board = Board::new(RenderOnlyEngine);
    let results = board.load_board_info(&args.jgf, BoardInfoImage::Generated)?;
    let shape = board.board_shape().ok_or("board has no image")?;

    let shown = results.filtered(!args.no_black, !args.no_white);
    let img = gbr::render_board(shape, Some(&shown), args.boxes);
    img.save(&args.out)?;
    log::info!(
        "rendered {}x{} board to {}",
        shape.width,
        shape.height,
        args.out.display()
    );
    Ok(())
}

fn run_resize(args: &ResizeArgs) -> CliResult<()> {
    let mut board = Board::new(RenderOnlyEngine);
    match (&args.jgf, &args.image) {
        (Some(jgf), _) => {
            let image = BoardInfoImage::Original {
                path_override: args.path_override.clone(),
            };
            board.load_board_info(jgf, image)?;
            board.save(Some(args.out.as_path()), Some(args.max_size))?;
            board.save_board_info(None)?;
        }
        (None, Some(image)) => {
            board.load_image(image, false, false)?;
            board.save(Some(args.out.as_path()), Some(args.max_size))?;
        }
        (None, None) => return Err("either --image or --jgf is required".into()),
    }
    if let Some(shape) = board.board_shape() {
        log::info!(
            "{} is {}x{}",
            args.out.display(),
            shape.width,
            shape.height
        );
    }
    Ok(())
}

fn run_annotate(args: &AnnotateArgs) -> CliResult<()> {
    let mut board = Board::new(RenderOnlyEngine);
    let image = BoardInfoImage::Original {
        path_override: args.path_override.clone(),
    };
    board.load_board_info(&args.jgf, image)?;
    let written = board.save_annotation(&args.out, args.format)?;
    println!("{}", written.display());
    Ok(())
}
