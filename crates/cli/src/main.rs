//! CLI tool for translating PowerPoint presentations while keeping their formatting.

mod http;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pptrans_core::{
    translate_batch_files, BatchJob, MismatchPolicy, PresentationTranslator, TranslationEngine,
    TranslationResult, TranslatorConfig,
};
use pptrans_pptx::PptxLoader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Translate PowerPoint (.pptx) files, keeping bullets, colors and hyperlinks.
#[derive(Parser, Debug)]
#[command(name = "ppt-translate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate every slide of a presentation
    Translate {
        input: PathBuf,

        /// Output file (default: <input stem>_<language>.pptx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target language code
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Translate selected slides, e.g. "1,3,5-7"
    TranslateSlides {
        input: PathBuf,

        #[arg(short, long, value_parser = parse_slide_numbers)]
        slides: SlideNumbers,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show the slide count and a preview of the first slides
    Info {
        input: PathBuf,

        /// Number of slides to preview
        #[arg(long, default_value = "5")]
        max_slides: usize,

        /// Maximum preview length per slide
        #[arg(long, default_value = "100")]
        max_chars: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate every .pptx file in a folder
    Batch {
        input_dir: PathBuf,

        /// Output folder (default: <input_dir>_<language>)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[arg(short, long)]
        language: Option<String>,

        /// Include subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Number of files translated at the same time
        #[arg(short, long, default_value = "4")]
        workers: usize,
    },

    /// List supported language codes
    Languages,
}

/// Translator settings shared by all commands.
#[derive(Args, Debug, Clone)]
struct Settings {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model identifier sent to the translation service
    #[arg(long, global = true)]
    model: Option<String>,

    /// Translate literally instead of polishing the wording
    #[arg(long, global = true)]
    no_polish: bool,

    /// Maximum number of texts per batch request
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// What to do when a batch response has the wrong number of items
    #[arg(long, global = true, value_enum)]
    mismatch: Option<Mismatch>,

    /// Base URL of the OpenAI-compatible API
    #[arg(
        long,
        global = true,
        env = "PPT_TRANSLATE_API_BASE",
        default_value = http::DEFAULT_API_BASE
    )]
    api_base: String,

    #[arg(long, global = true, env = "PPT_TRANSLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "120")]
    timeout: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mismatch {
    Fallback,
    Repair,
}

impl From<Mismatch> for MismatchPolicy {
    fn from(value: Mismatch) -> Self {
        match value {
            Mismatch::Fallback => MismatchPolicy::Fallback,
            Mismatch::Repair => MismatchPolicy::Repair,
        }
    }
}

impl Settings {
    fn translator_config(&self) -> Result<TranslatorConfig> {
        let mut config = match &self.config {
            Some(path) => TranslatorConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TranslatorConfig::default(),
        };
        if let Some(model) = &self.model {
            config = config.with_model_id(model.clone());
        }
        if self.no_polish {
            config = config.with_polishing(false);
        }
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(mismatch) = self.mismatch {
            config = config.with_batch_mismatch(mismatch.into());
        }
        Ok(config)
    }

    fn translator(&self, config: TranslatorConfig) -> pptrans_core::Result<PresentationTranslator> {
        let service = http::ChatCompletionsService::new(
            &self.api_base,
            self.api_key.clone(),
            Duration::from_secs(self.timeout),
        )?;
        let engine = TranslationEngine::new(Box::new(service), config)?;
        Ok(PresentationTranslator::new(Box::new(PptxLoader), engine))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlideNumbers(Vec<usize>);

/// Parse "1,3,5-7" into slide numbers.
fn parse_slide_numbers(value: &str) -> std::result::Result<SlideNumbers, String> {
    let mut numbers = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_number(start)?;
                let end = parse_number(end)?;
                if start > end {
                    return Err(format!("Invalid range: {}", part));
                }
                numbers.extend(start..=end);
            }
            None => numbers.push(parse_number(part)?),
        }
    }
    if numbers.is_empty() {
        return Err("No slide numbers given".to_string());
    }
    Ok(SlideNumbers(numbers))
}

fn parse_number(value: &str) -> std::result::Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid slide number: {}", value.trim()))
}

fn default_output(input: &Path, language: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = format!("{}_{}.pptx", stem, language);
    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// `.pptx` files under `dir`, skipping Office lock files, in path order.
fn find_presentations(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir).max_depth(if recursive { usize::MAX } else { 1 });
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let is_pptx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
            let is_lock = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("~$"));
            is_pptx && !is_lock
        })
        .collect();
    files.sort();
    files
}

/// One job per file, mirroring the folder layout under `output_dir`.
fn batch_jobs(
    files: &[PathBuf],
    input_dir: &Path,
    output_dir: &Path,
    language: &str,
) -> Vec<BatchJob> {
    files
        .iter()
        .map(|file| {
            let relative = file.strip_prefix(input_dir).unwrap_or(file);
            let target_dir = match relative.parent() {
                Some(parent) => output_dir.join(parent),
                None => output_dir.to_path_buf(),
            };
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            BatchJob::new(
                file.clone(),
                target_dir.join(format!("{}_{}.pptx", stem, language)),
                language,
            )
        })
        .collect()
}

fn report(result: &TranslationResult, output: &Path) -> Result<()> {
    if !result.is_ok() {
        bail!("{}", result.errors.join("; "));
    }
    println!(
        "Translated {} texts and {} notes ({} shapes) -> {}",
        result.translated_count,
        result.translated_notes_count,
        result.total_shapes,
        output.display()
    );
    Ok(())
}

fn check_language(config: &TranslatorConfig, language: &str) {
    if !config.is_supported_language(language) {
        log::warn!(
            "Unknown language code '{}', it will be used as-is in prompts",
            language
        );
    }
}

#[derive(Serialize)]
struct SlideInfo {
    number: usize,
    preview: String,
}

#[derive(Serialize)]
struct PresentationInfo {
    path: PathBuf,
    slide_count: usize,
    slides: Vec<SlideInfo>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = cli.settings.translator_config()?;

    match cli.command {
        Command::Translate {
            input,
            output,
            language,
        } => {
            let language = language.unwrap_or_else(|| config.default_target_language.clone());
            check_language(&config, &language);
            let output = output.unwrap_or_else(|| default_output(&input, &language));
            let translator = cli.settings.translator(config)?;

            let result = translator
                .translate_presentation(&input, &output, &language)
                .with_context(|| format!("Failed to translate {}", input.display()))?;
            report(&result, &output)
        }
        Command::TranslateSlides {
            input,
            slides,
            output,
            language,
        } => {
            let language = language.unwrap_or_else(|| config.default_target_language.clone());
            check_language(&config, &language);
            let output = output.unwrap_or_else(|| default_output(&input, &language));
            let translator = cli.settings.translator(config)?;

            let result = translator
                .translate_specific_slides(&input, &output, &language, &slides.0)
                .with_context(|| format!("Failed to translate {}", input.display()))?;
            report(&result, &output)
        }
        Command::Info {
            input,
            max_slides,
            max_chars,
            json,
        } => {
            let translator = cli.settings.translator(config)?;
            let slide_count = translator
                .get_slide_count(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let slides = (1..=slide_count.min(max_slides))
                .map(|number| {
                    let preview = translator.get_slide_preview(&input, number, max_chars)?;
                    Ok(SlideInfo { number, preview })
                })
                .collect::<pptrans_core::Result<Vec<_>>>()?;
            let info = PresentationInfo {
                path: input,
                slide_count,
                slides,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}: {} slides", info.path.display(), info.slide_count);
                for slide in &info.slides {
                    println!("  [{}] {}", slide.number, slide.preview);
                }
            }
            Ok(())
        }
        Command::Batch {
            input_dir,
            output_dir,
            language,
            recursive,
            workers,
        } => {
            let language = language.unwrap_or_else(|| config.default_target_language.clone());
            check_language(&config, &language);
            if !input_dir.is_dir() {
                bail!("Not a folder: {}", input_dir.display());
            }
            let output_dir = output_dir.unwrap_or_else(|| {
                let name = input_dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("output");
                input_dir.with_file_name(format!("{}_{}", name, language))
            });

            let files = find_presentations(&input_dir, recursive);
            if files.is_empty() {
                println!("No .pptx files found in {}", input_dir.display());
                return Ok(());
            }
            let jobs = batch_jobs(&files, &input_dir, &output_dir, &language);
            for job in &jobs {
                if let Some(parent) = job.output.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }

            let settings = &cli.settings;
            let outcomes =
                translate_batch_files(jobs, workers, || settings.translator(config.clone()));

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(result) if result.is_ok() => println!(
                        "OK    {} ({} texts)",
                        outcome.job.input.display(),
                        result.translated_count
                    ),
                    Ok(result) => {
                        failed += 1;
                        println!(
                            "FAIL  {}: {}",
                            outcome.job.input.display(),
                            result.errors.join("; ")
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        println!("FAIL  {}: {}", outcome.job.input.display(), e);
                    }
                }
            }
            println!(
                "{} of {} files translated into {}",
                outcomes.len() - failed,
                outcomes.len(),
                output_dir.display()
            );
            if failed > 0 {
                bail!("{} files failed", failed);
            }
            Ok(())
        }
        Command::Languages => {
            for (code, name) in &config.languages {
                println!("{:<6} {}", code, name);
            }
            Ok(())
        }
    }
}
