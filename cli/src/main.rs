//! research-export CLI - export markdown reports to PDF, Word, HTML and PNG

mod http;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use research_export::{
    classify, CommandRasterizer, ExportCoordinator, ExportFormat, ExportStats, LocalImageSource,
};

use crate::http::HttpImageSource;

#[derive(Parser)]
#[command(name = "research-export")]
#[command(version)]
#[command(about = "Export markdown research reports to PDF, Word, HTML, PNG and Markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a report to one format
    Export {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format
        #[arg(short, long, value_enum)]
        format: FormatArg,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Document title
        #[arg(short, long, env = "RESEARCH_EXPORT_TITLE")]
        title: Option<String>,

        /// Directory for resolving relative image paths (defaults to the input's directory)
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        /// Timeout for remote images, in seconds
        #[arg(long, default_value = "15")]
        image_timeout: u64,
    },

    /// Export a report to every available format
    All {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Document title
        #[arg(short, long, env = "RESEARCH_EXPORT_TITLE")]
        title: Option<String>,
    },

    /// Print the classified block stream as JSON
    Blocks {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show report statistics
    Info {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Raw markdown
    #[value(alias = "md")]
    Markdown,
    /// Standalone HTML page
    Html,
    /// Paginated PDF
    Pdf,
    /// Word document
    #[value(alias = "docx")]
    Word,
    /// PNG image (needs wkhtmltoimage)
    #[value(alias = "png")]
    Image,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Html => ExportFormat::Html,
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Word => ExportFormat::Word,
            FormatArg::Image => ExportFormat::Image,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            input,
            format,
            output,
            title,
            base_dir,
            image_timeout,
        } => cmd_export(
            &input,
            format.into(),
            output.as_deref(),
            title.as_deref(),
            base_dir.as_deref(),
            Duration::from_secs(image_timeout),
        ),
        Commands::All {
            input,
            output,
            title,
        } => cmd_all(&input, output.as_deref(), title.as_deref()),
        Commands::Blocks { input, compact } => cmd_blocks(&input, compact),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Build a coordinator whose images resolve relative to `base_dir`.
fn build_coordinator(
    base_dir: &Path,
    image_timeout: Duration,
) -> Result<ExportCoordinator, Box<dyn std::error::Error>> {
    let local = LocalImageSource::new().with_base_dir(base_dir);
    let images = HttpImageSource::new(local, image_timeout)?;

    let mut coordinator = ExportCoordinator::new().with_image_source(Arc::new(images));
    if let Some(rasterizer) = CommandRasterizer::detect() {
        coordinator = coordinator.with_rasterizer(Arc::new(rasterizer));
    }
    Ok(coordinator)
}

fn input_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_title(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_degraded(stats: &ExportStats) {
    for d in &stats.degraded {
        println!(
            "  {} block {}: {:?}",
            "degraded".yellow(),
            d.block_index,
            d.kind
        );
    }
}

fn cmd_export(
    input: &Path,
    format: ExportFormat,
    output: Option<&Path>,
    title: Option<&str>,
    base_dir: Option<&Path>,
    image_timeout: Duration,
) -> CliResult {
    let content = fs::read_to_string(input)?;
    let base_dir = base_dir.map(Path::to_path_buf).unwrap_or_else(|| input_dir(input));
    let coordinator = build_coordinator(&base_dir, image_timeout)?;

    let title = title.map(str::to_string).unwrap_or_else(|| default_title(input));
    let artifact = coordinator.export(format, &content, &title)?;

    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;
    let path = output_dir.join(&artifact.filename);
    fs::write(&path, &artifact.bytes)?;

    println!(
        "{} {} ({}, {} bytes)",
        "Saved to".green(),
        path.display(),
        artifact.mime_type,
        artifact.len()
    );
    print_degraded(&artifact.stats);

    Ok(())
}

fn cmd_all(input: &Path, output: Option<&Path>, title: Option<&str>) -> CliResult {
    let content = fs::read_to_string(input)?;
    let coordinator = build_coordinator(&input_dir(input), Duration::from_secs(15))?;
    let title = title.map(str::to_string).unwrap_or_else(|| default_title(input));

    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_export", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(ExportFormat::ALL.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let mut written = Vec::new();
    let mut skipped = Vec::new();
    for format in ExportFormat::ALL {
        pb.set_message(format!("Exporting {}...", format));

        if !coordinator.is_available(format) {
            skipped.push(format);
            pb.inc(1);
            continue;
        }

        let artifact = coordinator.export(format, &content, &title)?;
        fs::write(output_dir.join(&artifact.filename), &artifact.bytes)?;
        written.push(artifact);
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    for (i, artifact) in written.iter().enumerate() {
        let branch = if i + 1 == written.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), artifact.filename);
    }
    for format in skipped {
        println!(
            "{} {} skipped: {} not found on PATH",
            "Note:".yellow(),
            format,
            CommandRasterizer::PROGRAM
        );
    }

    Ok(())
}

fn cmd_blocks(input: &Path, compact: bool) -> CliResult {
    let content = fs::read_to_string(input)?;
    let blocks = classify(&content);

    let json = if compact {
        serde_json::to_string(&blocks)?
    } else {
        serde_json::to_string_pretty(&blocks)?
    };
    println!("{}", json);

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let content = fs::read_to_string(input)?;
    let coordinator = ExportCoordinator::new()
        .with_image_source(Arc::new(LocalImageSource::new().with_base_dir(input_dir(input))));

    println!("{}", "Report Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Bytes".bold(), content.len());
    println!("{}: {}", "Words".bold(), content.split_whitespace().count());

    let artifact = match coordinator.export_report(ExportFormat::Pdf, Some(&content), "")? {
        Some(artifact) => artifact,
        None => {
            println!("{}", "Report is empty".yellow());
            return Ok(());
        }
    };
    let stats = &artifact.stats;

    println!();
    println!("{}", "Blocks".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Total".bold(), stats.block_count);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "List items".bold(), stats.list_item_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Images".bold(), stats.image_count);
    println!("{}: {}", "PDF pages".bold(), stats.page_count);
    print_degraded(stats);

    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "research-export".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Markdown research report exporter");
    println!();
    let rasterizer = match CommandRasterizer::detect() {
        Some(r) => r.program().display().to_string(),
        None => "not found".dimmed().to_string(),
    };
    println!("Rasterizer: {}", rasterizer);
    println!("License: MIT");
}
