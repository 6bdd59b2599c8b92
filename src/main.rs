use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use vitrine::imaging::RustBackend;
use vitrine::pipeline::Pipeline;
use vitrine::tiling::VipsTiler;
use vitrine::{config, output};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Batch converter for catalog photographs")]
#[command(long_about = "\
Batch converter for catalog photographs

Source filenames carry the catalog identity: a numeric catalog id, a
double-underscore delimiter, and a pose token, with an optional modifier
segment:

  sources/
  ├── config.toml              # Tool config (optional)
  ├── 7__main.tif              # Catalog 7, pose \"main\"
  ├── 7__top.tif               # Catalog 7, pose \"top\"
  ├── 12__bottom.tif           # Catalog 12, pose \"bottom\"
  └── 112__profile__raw.tif    # Modifier segment ignored

Each catalog id becomes one artifact with three derivative sets plus a
manifest of source dimensions:

  output/
  ├── main/7.jpg               # Display image (longer edge ≤ 2000px)
  ├── thumbs/7.jpg             # Thumbnail (longer edge ≤ 500px)
  ├── tiles/7/main/...         # Deep-zoom pyramid, one per view
  └── manifest.yml             # Per-catalog pose dimensions

The display image derives from the \"main\" pose and the thumbnail from
\"top\"; artifacts without those poses are skipped for that derivative.
Tile pyramids are built for every view by the external deep-zoom tool
(vips dzsave by default; see config.toml).")]
#[command(version = version_string())]
struct Cli {
    /// Directory of source photographs named {catalogId}__{pose}.ext
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory to receive main/, thumbs/, tiles/ and manifest.yml
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (Some(input), Some(output_dir)) = (cli.input, cli.output) else {
        println!("must provide input and output directory (see --help)");
        return ExitCode::SUCCESS;
    };
    if !input.is_dir() {
        println!("invalid directory: {}", input.display());
        return ExitCode::SUCCESS;
    }

    let config = match config::load_config(&input) {
        Ok(c) => c,
        Err(e) => {
            println!("config error: {e}");
            return ExitCode::SUCCESS;
        }
    };

    init_thread_pool(&config.processing);

    let backend = RustBackend::new();
    let tiler = VipsTiler::new(config.tiles.program.as_str());

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });

    let result = {
        let mut pipeline =
            Pipeline::new(&backend, &tiler, &config, &input, &output_dir).with_events(tx);
        pipeline.run()
    };
    // Pipeline (and its sender) dropped: the printer drains and exits
    let _ = printer.join();

    match result {
        Ok(summary) => {
            println!();
            output::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
