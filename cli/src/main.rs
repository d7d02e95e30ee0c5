//! docextract CLI - PDF extraction and LLM task routing

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docextract::render::to_json;
use docextract::{
    DocumentExtractor, ExtractOptions, JsonFormat, LlmOptions, LlmRouter, ParseOptions,
    TaskType, VlmImageAnalyzer,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docextract")]
#[command(version)]
#[command(about = "Extract text, tables and analyzed images from PDF reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full extraction and print the result as JSON
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory for embedded images (image extraction is skipped without it)
        #[arg(long, value_name = "DIR", env = "DOCEXTRACT_IMAGE_DIR")]
        image_dir: Option<PathBuf>,

        /// Skip VLM analysis of extracted images
        #[arg(long)]
        no_analysis: bool,

        /// Maximum concurrent image analyses
        #[arg(long, default_value = "4", env = "DOCEXTRACT_CONCURRENCY")]
        concurrency: usize,

        /// Per-image analysis timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Deadline for the whole analysis phase in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Abort on the first page that fails to parse
        #[arg(long)]
        strict: bool,

        /// Parse pages sequentially
        #[arg(long)]
        sequential: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the page layout as JSON
    Scan {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Send a prompt to the provider serving a task type
    Route {
        /// Task type (generate, summarize, long_context, multimodal,
        /// realtime_search, reasoning, verification)
        #[arg(value_name = "TASK")]
        task: String,

        /// Prompt text
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Nucleus sampling cutoff
        #[arg(long)]
        top_p: Option<f32>,

        /// Print the full response (content, usage, model) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            image_dir,
            no_analysis,
            concurrency,
            timeout,
            deadline,
            strict,
            sequential,
            compact,
        } => {
            let mut parse = ParseOptions::new().with_parallel(!sequential);
            if strict {
                parse = parse.strict();
            }
            if let Some(dir) = image_dir {
                parse = parse.with_image_dir(dir);
            }
            let mut options = ExtractOptions::new()
                .with_parse_options(parse)
                .with_image_analysis(!no_analysis)
                .with_max_concurrent_analyses(concurrency)
                .with_analysis_timeout(Duration::from_secs(timeout));
            if let Some(secs) = deadline {
                options = options.with_deadline(Duration::from_secs(secs));
            }
            cmd_extract(&input, output.as_deref(), options, json_format(compact))
        }
        Commands::Scan { input, compact } => cmd_scan(&input, json_format(compact)),
        Commands::Info { input } => cmd_info(&input),
        Commands::Route {
            task,
            prompt,
            max_tokens,
            temperature,
            top_p,
            json,
        } => {
            let options = LlmOptions {
                max_tokens,
                temperature,
                top_p,
                stream: false,
            };
            cmd_route(&task, &prompt, &options, json)
        }
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

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    options: ExtractOptions,
    format: JsonFormat,
) -> CliResult {
    let mut extractor = DocumentExtractor::with_options(options.clone());
    if options.analyze_images && options.parse.image_dir.is_some() {
        let router = LlmRouter::from_env()?;
        if router.registry().is_empty() {
            log::warn!("No LLM provider configured; images will not be analyzed");
        }
        extractor = extractor.with_analyzer(VlmImageAnalyzer::new(router));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}...", input.display()));

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(extractor.extract(input));
    pb.finish_and_clear();
    let result = result?;

    let json = to_json(&result, format)?;
    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    eprintln!(
        "{} {} texts, {} tables, {} images",
        "Extracted".green().bold(),
        result.texts.len(),
        result.tables.len(),
        result.images.len()
    );
    for issue in &result.errors {
        eprintln!(
            "  {} page {}: {}",
            "warning".yellow(),
            issue.page_number,
            issue.message
        );
    }

    Ok(())
}

fn cmd_scan(input: &Path, format: JsonFormat) -> CliResult {
    let layout = docextract::scan_file(input)?;
    println!("{}", to_json(&layout, format)?);
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let pdf = docextract::detect_format_from_path(input)?;
    let layout = docextract::scan_file(input)?;
    let metadata = &layout.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), pdf.version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref created) = metadata.creation_date {
        println!("{}: {}", "Created".bold(), created);
    }

    println!();
    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in &layout.pages {
        let tables = page
            .elements_of(docextract::ElementType::Table)
            .count();
        let text = page.elements_of(docextract::ElementType::Text).count() > 0;
        println!(
            "{} {:>3}: {} {}",
            "Page".bold(),
            page.page_number,
            if text { "text" } else { "blank" },
            if tables > 0 {
                format!("+ {} table(s)", tables)
            } else {
                String::new()
            }
        );
    }

    Ok(())
}

fn cmd_route(task: &str, prompt: &str, options: &LlmOptions, json: bool) -> CliResult {
    let task = TaskType::parse(task);
    let router = LlmRouter::from_env()?;

    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(router.route(task, prompt, options))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.content);
        if let Some(usage) = response.usage {
            eprintln!(
                "{} {} prompt + {} completion tokens{}",
                "Usage:".dimmed(),
                usage.prompt_tokens,
                usage.completion_tokens,
                response
                    .model
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docextract".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF extraction with VLM image analysis and LLM task routing");
    println!();
    println!("License: MIT");
}
