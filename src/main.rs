use clap::{Parser, Subcommand};
use folio::config::{self, SiteConfig};
use folio::layout::base_row_height_for;
use folio::session::{BackendAspectSource, GallerySession};
use folio::{generate, output, scan, thumbs};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn version_string() -> &'static str {
    if env!("FOLIO_TAGGED") == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let revision = env!("FOLIO_REVISION");
        if revision.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{revision}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Thumbnails and justified layout for photo portfolios")]
#[command(long_about = "\
Thumbnails and justified layout for photo portfolios

Run without a command to build thumbnails with the default conventions:

  src/assets/                        # Source root (configurable)
  ├── hero.jpg                       # Category \"assets\"
  ├── landscapes/                    # Category \"landscapes\"
  │   └── 001-dawn.jpg
  └── street/
      └── corner.webp

  public/thumbnails/001-dawn-400.avif   # One file per width, never upscaled
  public/thumbnail-manifest.json        # Original URL → thumbnail + srcset

Set RUST_LOG=debug for detailed logs.
Run 'folio gen-config' to generate a documented folio.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (optional; stock defaults when absent)
    #[arg(long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate AVIF thumbnails and the thumbnail manifest (default)
    Thumbs,
    /// List discovered source images by category
    Scan,
    /// Print the justified rows for a container width
    Layout {
        /// Container width in px
        #[arg(long, default_value_t = 1200.0)]
        width: f64,
    },
    /// Render the static gallery page from the current manifest
    Generate,
    /// Run thumbs, then generate
    Build,
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

/// Upper bound on reading image headers for `folio layout`.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(120);

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Command::Thumbs);
    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let project_root = Path::new(".");
    let site_config = config::load_config(&cli.config)?;

    match command {
        Command::Thumbs => run_thumbs(project_root, &site_config)?,
        Command::Scan => {
            let items = scan::scan(project_root, &site_config.sources)?;
            output::print_scan_output(&items);
        }
        Command::Layout { width } => run_layout(project_root, &site_config, width)?,
        Command::Generate => {
            let summary = generate::generate(project_root, &site_config)?;
            output::print_generate_output(&summary);
        }
        Command::Build => {
            println!("==> Stage 1: Thumbnails");
            run_thumbs(project_root, &site_config)?;
            println!("==> Stage 2: Gallery page");
            let summary = generate::generate(project_root, &site_config)?;
            output::print_generate_output(&summary);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn run_thumbs(project_root: &Path, site_config: &SiteConfig) -> Result<(), thumbs::ThumbsError> {
    init_thread_pool(&site_config.processing);
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_thumb_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = thumbs::build_thumbnails(project_root, site_config, Some(tx));
    // The sender is dropped with the pipeline, so the printer drains and exits
    if printer.join().is_err() {
        log::warn!("progress printer panicked");
    }
    output::print_thumbs_summary(&result?);
    Ok(())
}

fn run_layout(
    project_root: &Path,
    site_config: &SiteConfig,
    width: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = scan::scan(project_root, &site_config.sources)?;
    let source = Arc::new(BackendAspectSource::new(project_root));
    let mut session = GallerySession::new(site_config.layout.clone(), source, width)?;
    session.set_items(items);
    if !session.wait(RESOLVE_TIMEOUT) {
        log::warn!(
            "{} image(s) unresolved after {:?}",
            session.pending_count(),
            RESOLVE_TIMEOUT
        );
        session.fail_pending();
    }
    let base = base_row_height_for(
        width,
        &site_config.layout.breakpoints,
        site_config.layout.default_row_height,
    );
    output::print_layout_output(session.placed(), session.rows(), width, base);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
