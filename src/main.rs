use clap::{Parser, Subcommand};
use mrss_gen::feed::EntryOrder;
use mrss_gen::pipeline::{self, RunOptions};
use mrss_gen::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mrss-gen")]
#[command(about = "Generate MRSS feeds for the media files on a drive")]
#[command(long_about = "\
Generate MRSS feeds for the media files on a drive

Scans a folder and writes one feed for the folder itself plus one feed per
immediate subfolder. Feeds are written at the top of the folder:

  /media/usb0/
  ├── config.json      # Optional: {\"BASE_URL\": ..., \"MEDIA_EXTENSIONS\": [...]}
  ├── video1.mp4       # Listed in mrss.xml
  ├── mrss.xml         # Generated
  ├── promo.xml        # Generated
  └── promo/
      └── ad1.mov      # Listed in promo.xml

Every item links to <BASE_URL><path>?md5=<content hash>.

Run 'mrss-gen gen-config' to print the default config.json.")]
#[command(version)]
struct Cli {
    /// Folder containing the media files
    #[arg(long, default_value = "/var/www/html", global = true)]
    folder: PathBuf,

    /// Emit directories and files sorted by name instead of filesystem order
    #[arg(long, global = true)]
    sorted: bool,

    /// Log every fingerprint
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Regenerate every feed under the folder
    Build,
    /// Report what would be generated without writing anything
    Check,
    /// Print the default config.json
    GenConfig,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let order = if cli.sorted {
        EntryOrder::Name
    } else {
        EntryOrder::Filesystem
    };

    match cli.command {
        Command::Build | Command::Check => {
            let options = RunOptions {
                order,
                write: matches!(cli.command, Command::Build),
                ..RunOptions::default()
            };
            println!("==> Scanning {}", cli.folder.display());
            let report = pipeline::run(&cli.folder, &options)?;
            output::print_run_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_json()?);
        }
    }

    Ok(())
}
