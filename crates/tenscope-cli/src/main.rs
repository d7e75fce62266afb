//! Tenscope CLI - inspect safetensors model files.
//!
//! Thin presentation layer over `tenscope-viewer`: opens a session, renders
//! the overview, hierarchy outline, value pages, search results, and writes
//! the export snapshot to disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use tenscope_core::{human_size, ViewerConfig};
use tenscope_model::HierarchyNode;
use tenscope_viewer::{snapshot, Session};

#[derive(Parser)]
#[command(name = "tenscope")]
#[command(author, version, about = "Inspect safetensors model files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the file overview and global metadata
    Info {
        /// Path to a .safetensors file
        file: PathBuf,
    },
    /// Print the model hierarchy outline
    Tree {
        /// Path to a .safetensors file
        file: PathBuf,
    },
    /// Print a page of a tensor's flattened values
    Page {
        /// Path to a .safetensors file
        file: PathBuf,
        /// Tensor name
        tensor: String,
        /// Flat index of the first value
        #[arg(long, default_value = "0")]
        start: usize,
        /// Values per page (clamped to the configured bounds)
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Search tensor names by case-insensitive substring
    Search {
        /// Path to a .safetensors file
        file: PathBuf,
        /// Substring to look for
        query: String,
    },
    /// Write the structure snapshot as JSON
    Export {
        /// Path to a .safetensors file
        file: PathBuf,
        /// Output path (defaults to <file>_structure.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ViewerConfig::default();

    match cli.command {
        Commands::Info { file } => {
            let session = open(&file, config)?;
            print_info(&session);
        }
        Commands::Tree { file } => {
            let session = open(&file, config)?;
            print_outline(session.tree(), 0);
        }
        Commands::Page {
            file,
            tensor,
            start,
            page_size,
        } => {
            let page_size = page_size.unwrap_or(config.default_page);
            let session = open(&file, config)?;
            let page = session
                .view(&tensor, start, page_size)
                .with_context(|| format!("failed to read tensor {tensor}"))?;
            println!(
                "{}: values {}..{} of {}",
                page.name,
                page.start,
                page.start + page.len(),
                page.total
            );
            for (offset, value) in page.values.iter().enumerate() {
                println!("[{:>8}] {value}", page.start + offset);
            }
        }
        Commands::Search { file, query } => {
            let session = open(&file, config)?;
            let results = session.search(&query);
            let cap = session.config().search_cap;
            for hit in results.matches.iter().take(cap) {
                let dtype = hit.dtype.map_or_else(|| "?".to_string(), |d| d.to_string());
                println!("{}  {}  {:?}", hit.name, dtype, hit.shape);
            }
            if results.total > cap {
                println!("... {} matches total, showing first {cap}", results.total);
            } else {
                println!("{} matches", results.total);
            }
        }
        Commands::Export { file, output } => {
            let session = open(&file, config)?;
            let doc = snapshot(&session);
            let output = output.unwrap_or_else(|| default_export_path(&file));
            let json = serde_json::to_string_pretty(&doc)?;
            std::fs::write(&output, json)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "exported {} branches to {}",
                doc.structure.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn open(file: &Path, config: ViewerConfig) -> anyhow::Result<Session> {
    Session::open(file, config).with_context(|| format!("failed to open {}", file.display()))
}

fn print_info(session: &Session) {
    let catalog = session.catalog();
    println!("path:    {}", catalog.path.display());
    println!("size:    {}", human_size(catalog.file_size));
    println!("tensors: {}", catalog.len());
    let errored = catalog.len() - catalog.valid_records().count();
    if errored > 0 {
        println!("errored: {errored}");
    }
    let reduced = catalog.reduced_precision_count();
    if reduced > 0 {
        println!("reduced-precision tensors: {reduced} (shown as f32)");
    }
    if catalog.metadata.is_empty() {
        println!("metadata: none");
    } else {
        println!("metadata:");
        for (key, value) in &catalog.metadata {
            println!("  {key}: {value}");
        }
    }
}

fn print_outline(node: &HierarchyNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.tensor {
        Some(tensor) => println!("{indent}{} [{tensor}]", node.label),
        None => println!("{indent}{}", node.label),
    }
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}

fn default_export_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().into_owned());
    file.with_file_name(format!("{stem}_structure.json"))
}
