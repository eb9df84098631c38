//! TitleScan command line.
//!
//! ```bash
//! titlescan process deed.pdf
//! titlescan upload deed.pdf
//! titlescan label deed.pdf
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;

use titlescan_lib::config::{self, CollaboratorConfig, PipelineConfig};
use titlescan_lib::intake::{FsObjectStore, IntakeService, LabelStudioClient, SqliteMetadataStore};
use titlescan_lib::pipeline::embedding::OnnxEmbedder;
use titlescan_lib::pipeline::extraction::pdfium::PdfiumPageSource;
use titlescan_lib::pipeline::extraction::TesseractEngine;
use titlescan_lib::pipeline::processor::DocumentProcessor;

/// Legal-document text recovery, classification and entity extraction
#[derive(Parser)]
#[command(name = "titlescan", version)]
struct Cli {
    /// Directory holding model.onnx and tokenizer.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Tesseract tessdata directory
    #[arg(long, global = true)]
    tessdata: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline and print the result as JSON
    Process { pdf: PathBuf },
    /// Process, store and log a PDF
    Upload { pdf: PathBuf },
    /// Send cleaned text to Label Studio as a labeling task
    Label { pdf: PathBuf },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn build_processor(cli: &Cli) -> CliResult<DocumentProcessor> {
    let model_dir = cli.model_dir.clone().unwrap_or_else(config::embedding_model_dir);
    let tessdata = cli.tessdata.clone().unwrap_or_else(config::tessdata_dir);
    let pipeline = PipelineConfig::default();

    let embedder = OnnxEmbedder::load(&model_dir)?;
    let ocr = TesseractEngine::new(&tessdata)?.with_languages(&pipeline.ocr_language);

    Ok(DocumentProcessor::new(
        Box::new(PdfiumPageSource::new()?),
        Box::new(ocr),
        Arc::new(embedder),
        &pipeline,
    ))
}

fn build_service(processor: DocumentProcessor) -> CliResult<IntakeService> {
    let collaborators = CollaboratorConfig::from_env();
    Ok(IntakeService::new(
        Arc::new(processor),
        Box::new(FsObjectStore::new(
            &collaborators.object_store_root,
            &collaborators.bucket,
        )),
        Box::new(SqliteMetadataStore::open(&collaborators.metadata_db_path)?),
        Box::new(LabelStudioClient::from_config(&collaborators)),
    ))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run(cli: Cli) -> CliResult<()> {
    let processor = build_processor(&cli)?;

    let json = match &cli.command {
        Command::Process { pdf } => {
            let bytes = std::fs::read(pdf)?;
            serde_json::to_string_pretty(&processor.process(&bytes)?)?
        }
        Command::Upload { pdf } => {
            let bytes = std::fs::read(pdf)?;
            let service = build_service(processor)?;
            serde_json::to_string_pretty(&service.upload(&file_name(pdf), None, &bytes)?)?
        }
        Command::Label { pdf } => {
            let bytes = std::fs::read(pdf)?;
            let service = build_service(processor)?;
            serde_json::to_string_pretty(&service.create_label_task(&file_name(pdf), &bytes)?)?
        }
    };

    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    titlescan_lib::init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
