use aspect_sort::engine::Classifier;
use aspect_sort::types::{ConflictResolution, OperationMode};
use aspect_sort::{config, logging, output, rules, scan};
use clap::{Parser, Subcommand};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

#[derive(Parser)]
#[command(name = "aspect-sort")]
#[command(about = "Sort photos and videos into folders by aspect ratio")]
#[command(long_about = "\
Sort photos and videos into folders by aspect ratio

Dimensions are read from file metadata (image headers, EXIF orientation,
ffprobe for videos) and matched against an ordered rule table. The first
matching rule names the destination folder; everything else goes to the
default folder.

  dest/
  ├── Square/              # 1:1
  ├── Landscape_16-9/      # 16:9
  ├── Landscape_4-3/       # 4:3
  ├── Portrait_9-16/       # 9:16
  ├── Portrait_3-4/        # 3:4
  └── Other/               # no rule matched

While classifying, type p, r or c followed by Enter to pause, resume or
cancel. Cancelling finishes the current file first.

Run 'aspect-sort gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ClassifyArgs {
    /// Directory containing the photos and videos to sort
    source: PathBuf,

    /// Directory the rule folders are created in
    #[arg(long)]
    dest: PathBuf,

    /// Include files in subfolders of SOURCE
    #[arg(short, long)]
    recursive: bool,

    /// copy, move or dry-run
    #[arg(long)]
    mode: Option<OperationMode>,

    /// What to do when the destination file exists: skip, rename or overwrite
    #[arg(long)]
    conflict: Option<ConflictResolution>,

    /// Folder for files no rule matched
    #[arg(long)]
    default_folder: Option<String>,

    /// Fail instead of creating missing destination folders
    #[arg(long)]
    no_subfolders: bool,

    /// Config file (see gen-config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify every media file in SOURCE into folders under --dest
    Classify(ClassifyArgs),
    /// List the media files that would be classified
    Scan {
        source: PathBuf,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print the effective rule table
    Rules {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(
        logging::level_for_verbosity(cli.verbose),
        cli.log_file.as_deref(),
    )?;

    match cli.command {
        Command::Classify(args) => classify(args)?,
        Command::Scan { source, recursive } => {
            let files = scan::scan(&source, recursive)?;
            output::print_scan_output(&files, &source);
        }
        Command::Rules { config } => {
            let config = config::load_config(config.as_deref())?;
            output::print_rules(&config.rule_set()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn classify(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(args.config.as_deref())?;
    let rule_set = config.rule_set()?;

    let mut options = config.classification_options();
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(conflict) = args.conflict {
        options.conflict_resolution = conflict;
    }
    if let Some(name) = args.default_folder {
        if !rules::is_folder_segment(&name) {
            return Err(format!("--default-folder must be a single folder name, got '{name}'").into());
        }
        options.default_folder_name = name;
    }
    if args.no_subfolders {
        options.create_subfolders = false;
    }
    let recursive = args.recursive || config.options.include_subfolders;

    let engine = Classifier::new();
    let control = engine.control();
    let mode = options.mode;

    if std::io::stdin().is_terminal() {
        eprintln!("Type p (pause), r (resume) or c (cancel) and press Enter");
        // Detached: it ends with the process.
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.trim() {
                    "p" if control.pause() => eprintln!("Paused"),
                    "r" if control.resume() => eprintln!("Resumed"),
                    "c" => {
                        control.cancel();
                        eprintln!("Cancelling after the current file");
                        break;
                    }
                    _ => {}
                }
            }
        });
    }

    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event, mode) {
                println!("{}", line);
            }
        }
    });

    let worker = thread::spawn(move || {
        engine.classify_directory(
            &args.source,
            recursive,
            &rule_set,
            &args.dest,
            &options,
            &tx,
        )
    });
    let summary = worker
        .join()
        .map_err(|_| "classification worker panicked")??;
    printer.join().map_err(|_| "output thread panicked")?;

    if let Some(report) = args.report {
        std::fs::write(&report, serde_json::to_string_pretty(&summary)?)?;
        println!("Report: {}", report.display());
    }

    Ok(())
}
