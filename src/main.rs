use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use pagemark::AnnotationKind;
use pagemark::export::{AnnotationsExporter, ExportFormat};
use pagemark::store::{AnnotationStore, FileAnnotationStore};
use pagemark::thread_codec;

#[derive(Parser)]
#[command(
    name = "pagemark",
    about = "Inspect and export document annotations",
    version
)]
struct Cli {
    /// Write a debug log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Annotation store directory (defaults to PAGEMARK_ANNOTATIONS_DIR
    /// or .pagemark_annotations)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a per-page summary of a document's annotations
    List {
        /// Document identifier
        document_id: String,
    },
    /// Export a document's annotations to markdown or JSON
    Export {
        /// Document identifier
        document_id: String,

        /// Title used for headings and the output filename
        #[arg(long)]
        title: Option<String>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_file) = &cli.log_file {
        WriteLogger::init(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        )?;
    }

    let store_dir = cli.store_dir.as_deref();

    match cli.command {
        Commands::List { document_id } => {
            let store = FileAnnotationStore::open(&document_id, store_dir)?;
            list_annotations(&store);
        }
        Commands::Export {
            document_id,
            title,
            out_dir,
            json,
        } => {
            let store = FileAnnotationStore::open(&document_id, store_dir)?;
            let title = title.unwrap_or_else(|| document_id.clone());
            let format = if json {
                ExportFormat::Json
            } else {
                ExportFormat::Markdown
            };

            let exporter = AnnotationsExporter::new(&title, store.annotations());
            let path = exporter.export_to_dir(&out_dir, format)?;
            info!("export written to {}", path.display());
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn list_annotations(store: &FileAnnotationStore) {
    let annotations = store.annotations();
    if annotations.is_empty() {
        println!("no annotations for {}", store.document_id());
        return;
    }

    let mut last_page = None;
    for annotation in annotations {
        if last_page != Some(annotation.page_number) {
            println!("page {}", annotation.page_number);
            last_page = Some(annotation.page_number);
        }
        match annotation.kind {
            AnnotationKind::Note => {
                println!("  [note] {}", first_line(&annotation.content));
            }
            AnnotationKind::Highlight => {
                println!("  [highlight] {}", first_line(&annotation.content));
            }
            AnnotationKind::Comment => {
                let thread = thread_codec::decode(&annotation.content);
                println!(
                    "  [comment, {} replies] {}",
                    thread.reply_count(),
                    first_line(&thread.quoted_text)
                );
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
