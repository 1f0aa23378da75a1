use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use wallet_guide::annotate::AnnotationEngine;
use wallet_guide::config;
use wallet_guide::docs;
use wallet_guide::driver::{DriverRegistry, MockFramebuffer};
use wallet_guide::project::WalletConfig;
use wallet_guide::session::Session;
use wallet_guide::workflow::{RunOptions, Workflow};

/// Wallet Guide - screenshot-driven user guides for desktop wallets
#[derive(Parser, Debug)]
#[command(
    name = "wallet-guide",
    about = "Drive a wallet app, capture and annotate screenshots, and generate Markdown guides",
    after_help = "ENVIRONMENT VARIABLES:\n\
        WALLET_GUIDE_OUTPUT_ROOT     Root for published and staged guides\n\
        WALLET_GUIDE_BACKEND         Backend used when the config names none\n\
        WALLET_GUIDE_DISPLAY_SCALE   Override automation.display_scale\n\
        WALLET_GUIDE_TEXT_SCALE      Glyph magnification for text annotations\n\
        RUST_LOG                     Log filter (default: info)"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a wallet's documentation workflow
    Run {
        /// Path to the wallet's config.yaml
        config: PathBuf,

        /// Automation backend: appium, pyautogui or mock (default: from config)
        #[arg(short, long)]
        backend: Option<String>,

        /// Only run these sections (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        sections: Vec<String>,

        /// Skip screenshot annotation
        #[arg(long)]
        no_annotate: bool,

        /// Skip documentation generation
        #[arg(long)]
        no_generate: bool,

        /// Execute steps without capturing screenshots
        #[arg(long)]
        no_screenshots: bool,

        /// Ignore configured waits
        #[arg(long)]
        fast: bool,

        /// Write straight to the published directory instead of staging
        #[arg(long)]
        production: bool,

        /// Output the run summary and workflow metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved steps of a config as JSON
    Steps {
        /// Path to the wallet's config.yaml
        config: PathBuf,

        /// Only this section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Re-annotate existing captures and regenerate the guide
    Annotate {
        /// Path to the wallet's config.yaml
        config: PathBuf,

        /// Workflow metadata exported by `run --json`; locates screenshots by step
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Only these sections (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        sections: Vec<String>,

        /// Use the published directory instead of staging
        #[arg(long)]
        production: bool,

        /// Skip documentation generation
        #[arg(long)]
        no_generate: bool,
    },

    /// List staged documentation or approve it for publication
    Review {
        /// Wallet directory name to approve (omit to list all)
        wallet: Option<String>,

        /// Staging directory (default: <output root>/staging)
        #[arg(long)]
        staging_dir: Option<PathBuf>,

        /// Published output directory (default: <output root>)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory with <wallet>/config.yaml files, used for the index
        #[arg(long, default_value = "wallets")]
        wallets_dir: PathBuf,

        /// Approve and publish the named wallet
        #[arg(long)]
        approve: bool,

        /// Approve all staged documentation
        #[arg(long)]
        approve_all: bool,
    },

    /// Create a mock framebuffer screenshot for testing
    Mock {
        /// Width in pixels
        #[arg(short = 'W', long, default_value = "800")]
        width: u32,

        /// Height in pixels
        #[arg(short = 'H', long, default_value = "600")]
        height: u32,

        /// Output file path
        #[arg(short, long, default_value = "./mock_screenshot.png")]
        output: PathBuf,

        /// Fill color as hex (e.g., "ff0000" for red)
        #[arg(short, long, default_value = "000000")]
        color: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Run {
            config,
            backend,
            sections,
            no_annotate,
            no_generate,
            no_screenshots,
            fast,
            production,
            json,
        }) => {
            let config = WalletConfig::from_yaml_file(&config)?;
            config.ensure_directories()?;
            let backend = backend.unwrap_or_else(|| config.automation.backend.clone());
            let mut driver = DriverRegistry::with_defaults().create_named(&backend, &config)?;

            let mut workflow = Workflow::from_config(config.clone());
            workflow.add_steps_from_config(None);

            let mut options = RunOptions::default()
                .staging(!production)
                .capture_screenshots(!no_screenshots);
            if !sections.is_empty() {
                options = options.sections(sections.iter().cloned());
            }
            if fast {
                options = options.without_pacing();
            }

            let summary = workflow.run(driver.as_mut(), options)?;

            let annotated = if no_annotate || no_screenshots {
                Vec::new()
            } else {
                AnnotationEngine::new(config.display_scale())
                    .batch_annotate(workflow.steps_mut(), &summary.screenshots_dir)
            };

            let guide = if no_generate {
                None
            } else {
                let only = (!sections.is_empty()).then_some(sections.as_slice());
                Some(docs::generate(
                    &config,
                    workflow.get_steps(false, None),
                    !production,
                    only,
                )?)
            };

            if json {
                let out = serde_json::json!({
                    "summary": summary,
                    "metadata": workflow.export_metadata(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Run completed: {} steps executed, {} failed",
                    summary.steps_executed, summary.steps_failed
                );
                println!("  Session: {}", summary.session_id);
                println!("  Screenshots: {}", summary.screenshots_dir.display());
                println!("  Annotated: {}", annotated.len());
                if let Some(guide) = guide {
                    println!("  Guide: {}", guide.display());
                }
                if !production {
                    println!("\nReview with: wallet-guide review");
                }
            }
        }

        Some(Commands::Steps { config, section }) => {
            let config = WalletConfig::from_yaml_file(&config)?;
            let steps = match section.as_deref() {
                Some(name) => config.section_steps(name),
                None => config.all_steps(),
            };
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }

        Some(Commands::Annotate {
            config,
            metadata,
            sections,
            production,
            no_generate,
        }) => {
            let config = WalletConfig::from_yaml_file(&config)?;
            let screenshots_dir = if production {
                config.screenshots_dir.clone()
            } else {
                config.staging_dir.join(docs::SCREENSHOTS_DIR)
            };

            let mut workflow = Workflow::from_config(config.clone());
            workflow.add_steps_from_config(None);

            let recorded = match &metadata {
                Some(path) => recorded_screenshots(path)?,
                None => HashMap::new(),
            };
            let filter = (!sections.is_empty()).then_some(sections.as_slice());
            let found = workflow.attach_captures(&screenshots_dir, &recorded, filter);

            let engine = AnnotationEngine::new(config.display_scale());
            let annotated = engine.batch_annotate(workflow.steps_mut(), &screenshots_dir);
            println!(
                "Annotated {} of {} captured screenshots",
                annotated.len(),
                found
            );

            if !no_generate {
                let steps = workflow.get_steps(false, filter);
                let guide = docs::generate(&config, steps, !production, filter)?;
                println!("Guide: {}", guide.display());
            }
        }

        Some(Commands::Review {
            wallet,
            staging_dir,
            output_dir,
            wallets_dir,
            approve,
            approve_all,
        }) => {
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config::get().output_root));
            let staging_dir = staging_dir.unwrap_or_else(|| output_dir.join("staging"));

            let staged = docs::list_staged(&staging_dir)?;
            if staged.is_empty() {
                println!("No documentation found in staging area.");
                return Ok(());
            }

            if approve_all {
                for dir in &staged {
                    if let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) {
                        print_report(&docs::approve(&name, &staging_dir, &output_dir)?);
                    }
                }
                regenerate_index(&output_dir, &wallets_dir)?;
                return Ok(());
            }

            match (wallet, approve) {
                (Some(name), true) => {
                    print_report(&docs::approve(&name, &staging_dir, &output_dir)?);
                    regenerate_index(&output_dir, &wallets_dir)?;
                }
                (wallet, _) => {
                    println!("Staged documentation:\n");
                    for (i, dir) in staged.iter().enumerate() {
                        let name = dir
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        if wallet.as_ref().is_some_and(|w| *w != name) {
                            continue;
                        }
                        let staged_guide = dir.join(docs::GUIDE_FILE);
                        println!("{}. {}", i + 1, name);
                        println!("   Path: {}", staged_guide.display());
                        let shots =
                            Session::new(dir.join(docs::SCREENSHOTS_DIR)).list_captures()?;
                        println!("   Screenshots: {}", shots.len());
                        print_size_diff(&staged_guide, &output_dir.join(&name).join(docs::GUIDE_FILE));
                    }
                    println!("\nTotal: {} wallet(s) in staging", staged.len());
                    println!("To approve a wallet: wallet-guide review <wallet> --approve");
                }
            }
        }

        Some(Commands::Mock {
            width,
            height,
            output,
            color,
        }) => {
            let color_bytes = parse_hex_color(&color)?;
            let mut fb = MockFramebuffer::with_color(width, height, color_bytes);
            fb.draw_text(10, 10, "Mock Wallet", [255, 255, 255], color_bytes);
            fs::write(&output, fb.to_png()?)?;
            println!("Created mock screenshot: {}", output.display());
            println!("  Size: {}x{}", fb.width(), fb.height());
        }

        None => {
            println!("Wallet Guide - screenshot-driven user guides for desktop wallets");
            println!();
            println!("Usage: wallet-guide <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run       Run a wallet's documentation workflow");
            println!("  steps     Print the resolved steps of a config as JSON");
            println!("  annotate  Re-annotate existing captures and regenerate the guide");
            println!("  review    List staged documentation or approve it");
            println!("  mock      Create a mock framebuffer screenshot for testing");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// `(section, name)` to screenshot path, from metadata exported by `run --json`
fn recorded_screenshots(
    path: &Path,
) -> Result<HashMap<(Option<String>, String), PathBuf>, Box<dyn Error>> {
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let root = raw.get("metadata").unwrap_or(&raw);
    let mut recorded = HashMap::new();
    for step in root["steps"].as_array().into_iter().flatten() {
        if let (Some(name), Some(shot)) = (step["name"].as_str(), step["screenshot"].as_str()) {
            let section = step["section"].as_str().map(str::to_string);
            recorded.insert((section, name.to_string()), PathBuf::from(shot));
        }
    }
    Ok(recorded)
}

fn print_report(report: &docs::PublishReport) {
    println!("Published: {}", report.wallet);
    println!("  From: {}", report.from.display());
    println!("  To: {}", report.to.display());
    println!(
        "  Screenshots: {} copied, {} skipped",
        report.screenshots_copied, report.screenshots_skipped
    );
}

fn print_size_diff(staged: &Path, published: &Path) {
    let (Ok(s), Ok(p)) = (fs::metadata(staged), fs::metadata(published)) else {
        println!("   No published version exists (new documentation)");
        return;
    };
    println!("   Staging size: {} bytes", s.len());
    println!("   Published size: {} bytes", p.len());
    if s.len() != p.len() {
        println!("   Files differ in size");
    }
}

fn regenerate_index(output_dir: &Path, wallets_dir: &Path) -> Result<(), Box<dyn Error>> {
    match docs::generate_index(output_dir, wallets_dir)? {
        Some(path) => println!("Updated index: {}", path.display()),
        None => println!("No wallet documentation found to index"),
    }
    Ok(())
}

fn parse_hex_color(hex: &str) -> Result<[u8; 3], Box<dyn Error>> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() || hex.len() != 6 {
        return Err("Color must be 6 hex digits (e.g., 'ff0000')".into());
    }
    let r = u8::from_str_radix(&hex[0..2], 16)?;
    let g = u8::from_str_radix(&hex[2..4], 16)?;
    let b = u8::from_str_radix(&hex[4..6], 16)?;
    Ok([r, g, b])
}
