// docmark CLI - summarize a document and highlight the summary in place
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docmark::{nlp, Pipeline, Settings, StructuralUnit};

#[derive(Parser, Debug)]
#[command(name = "docmark", author, version, about)]
struct Cli {
    /// Config file (defaults to DOCMARK_CONFIG, ./docmark.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a document and write a highlighted copy
    Highlight {
        file: PathBuf,
        /// Number of summary sentences
        #[arg(short = 'n', long)]
        sentences: Option<usize>,
        /// Output path, `-` for stdout (default: Highlighted_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the report; without a path it goes to Summary_<name>.txt
        #[arg(long, num_args = 0..=1)]
        summary_out: Option<Option<PathBuf>>,
        /// Treat the input as this extension instead of the file's own
        #[arg(long)]
        format: Option<String>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the summary sentences
    Summarize {
        file: PathBuf,
        #[arg(short = 'n', long)]
        sentences: Option<usize>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Print the extracted text
    Extract {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "docmark=debug" } else { "docmark=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = Settings::load(cli.config.as_deref())?;
    nlp::provision(&settings);
    let pipeline = Pipeline::new(settings);

    match cli.command {
        Commands::Highlight {
            file,
            sentences,
            output,
            summary_out,
            format,
            json,
        } => {
            let bytes = read_input(&file)?;
            let extension = extension_of(&file, format.as_deref());
            let count = sentences.unwrap_or(pipeline.settings().sentence_count);
            let outcome = pipeline
                .process(&bytes, &extension, count)
                .with_context(|| format!("processing {}", file.display()))?;

            let output = output.unwrap_or_else(|| sibling(&file, "Highlighted_", ""));
            if output == Path::new("-") {
                if atty::is(atty::Stream::Stdout) {
                    bail!("refusing to write a binary document to the terminal; redirect stdout or pass -o FILE");
                }
                io::stdout().write_all(&outcome.document)?;
            } else {
                fs::write(&output, &outcome.document)
                    .with_context(|| format!("writing {}", output.display()))?;
            }

            if let Some(path) = summary_out {
                let path = path.unwrap_or_else(|| sibling(&file, "Summary_", ".txt"));
                fs::write(&path, &outcome.report)
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            if json {
                let mut value = serde_json::to_value(&outcome)?;
                value["output"] = serde_json::Value::String(output.display().to_string());
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else if output != Path::new("-") {
                println!("{}", outcome.report);
                eprintln!(
                    "{} mark(s) -> {} ({})",
                    outcome.marks,
                    output.display(),
                    outcome.mime_type
                );
            }
        }
        Commands::Summarize {
            file,
            sentences,
            format,
        } => {
            let bytes = read_input(&file)?;
            let document = pipeline.extract(&bytes, &extension_of(&file, format.as_deref()))?;
            let count = sentences.unwrap_or(pipeline.settings().sentence_count);
            let summary = pipeline.summarize_text(&document.flat_text, count);
            if summary.is_insufficient() {
                println!("{}", docmark::report::NO_TEXT_MESSAGE);
            }
            for sentence in summary.sentences() {
                println!("{}", sentence);
            }
        }
        Commands::Extract { file, format } => {
            let bytes = read_input(&file)?;
            let document = pipeline.extract(&bytes, &extension_of(&file, format.as_deref()))?;
            println!("{}", document.flat_text);
            let (mut pages, mut paragraphs, mut slides) = (0, 0, 0);
            for unit in &document.units {
                match unit {
                    StructuralUnit::Page(_) => pages += 1,
                    StructuralUnit::Paragraph(_) => paragraphs += 1,
                    StructuralUnit::Slide(_) => slides += 1,
                }
            }
            eprintln!(
                "{}: {} page(s), {} paragraph(s), {} slide(s)",
                document.format, pages, paragraphs, slides
            );
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn extension_of(path: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(ext) => ext.to_string(),
        None => path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

// `<dir>/<prefix><file name><suffix>`
fn sibling(path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!("{}{}{}", prefix, name, suffix))
}
