use clap::{ArgAction, Parser};
use log::debug;
use make_thumbs_core::{Config, Size, ThumbnailMaker, Verbosity};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "make-thumbs")]
#[command(about = "Copy a directory tree full of images to a directory tree full of thumbnails")]
#[command(version)]
struct Cli {
    /// Directory full of images and videos to make thumbnails of [default: ./images]
    #[arg(short, long, value_name = "DIR")]
    root_dir: Option<PathBuf>,

    /// Directory to populate with a tree full of thumbnails [default: ./thumbs]
    #[arg(short, long, value_name = "DIR")]
    thumb_root_dir: Option<PathBuf>,

    /// Don't actually write any files
    #[arg(short, long)]
    dry_run: bool,

    /// Regenerate thumbnails that already exist
    #[arg(short, long)]
    force: bool,

    /// Directory/filename to exclude (repeat for more: -x one -x two)
    #[arg(short = 'x', long = "exclude", value_name = "PATH")]
    excludes: Vec<PathBuf>,

    /// File with one filename/dirname per line to be excluded
    #[arg(short = 'X', long, value_name = "FILE")]
    excludes_file: Option<PathBuf>,

    /// Record every (source, thumbnail) pair in this JSON file
    #[arg(short, long, value_name = "FILE")]
    json_log: Option<PathBuf>,

    /// Bounding box to generate, as WxH (repeat for more) [default: 100x100 300x300]
    #[arg(short, long = "size", value_name = "WxH")]
    sizes: Vec<Size>,

    /// JPEG quality of the thumbnails (1-100)
    #[arg(short, long, value_name = "N")]
    quality: Option<u8>,

    /// Program used to extract still frames from videos
    #[arg(long, value_name = "PROGRAM")]
    ffmpeg: Option<PathBuf>,

    /// Read settings from a JSON configuration file; flags override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the resulting configuration to this JSON file and exit without running
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Number of v's is level of verbosity (no -v is silent, -vvvv is super verbose)
    #[arg(short, long = "verbosity", action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Build the run configuration from the optional config file and the flags
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => {
                let cwd = std::env::current_dir()?;
                Config {
                    root_dir: cwd.join("images"),
                    thumb_root_dir: cwd.join("thumbs"),
                    ..Config::default()
                }
            }
        };

        // Override config with command line arguments
        if let Some(root_dir) = self.root_dir {
            config.root_dir = root_dir;
        }
        if let Some(thumb_root_dir) = self.thumb_root_dir {
            config.thumb_root_dir = thumb_root_dir;
        }
        if !self.sizes.is_empty() {
            config.sizes = self.sizes;
        }
        if let Some(quality) = self.quality {
            config.jpeg_quality = quality;
        }
        if let Some(ffmpeg) = self.ffmpeg {
            config.ffmpeg_program = ffmpeg;
        }
        if self.excludes_file.is_some() {
            config.excludes_file = self.excludes_file;
        }
        if self.json_log.is_some() {
            config.json_log = self.json_log;
        }
        config.excludes.extend(self.excludes);
        config.dry_run |= self.dry_run;
        config.force |= self.force;
        config.verbosity = config.verbosity.max(self.verbose);

        Ok(config)
    }
}

fn init_logger(verbosity: Verbosity) {
    env_logger::Builder::new()
        .filter_level(verbosity.level_filter())
        .parse_env("RUST_LOG")
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() -> Result<(), anyhow::Error> {
    // Parse command line arguments
    let mut cli = Cli::parse();
    let save_config = cli.save_config.take();
    let config = cli.into_config()?;

    if let Some(path) = save_config {
        config.save_to_file(&path)?;
        println!("Configuration file generated at: {}", path.display());
        return Ok(());
    }

    // Initialize logger
    init_logger(Verbosity(config.verbosity));
    debug!("Configuration: {:?}", config);

    // Configuration errors abort before any traversal and exit with status 1
    let mut maker = ThumbnailMaker::new(config)?;

    // Individual file failures are reported, never fatal
    maker.run()?;

    Ok(())
}
