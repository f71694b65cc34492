mod chunker;
mod config;
mod embed;
mod error;
mod indexer;
mod llm;
mod pdf;
mod retriever;
mod session;
mod utils;
mod vector_db;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{Cli, Config};
use embed::{Embedder, MiniLmEmbedder};
use llm::{Answerer, ChatClient, CompletionClient};
use pdf::{LopdfExtractor, PdfExtractor};
use session::Session;
use vector_db::{VectorDB, VectorStore};

const HELP: &str = "\
Commands:
  /upload <path>   index a PDF
  /status          show session state
  /help            show this message
  /quit            exit
Anything else is asked as a question about the indexed PDF.";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_cli(cli)?;

    let client = ChatClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.api_url.clone(),
    )?;
    println!("Loading embedding model (first run downloads it)...");
    let embedder = MiniLmEmbedder::new()?;
    let store = VectorDB::open(&config.store_dir)?;
    info!(
        model = client.model(),
        embedder = embedder.model_name(),
        dimension = embedder.dimension(),
        "collaborators ready"
    );
    info!(
        chunk_size = config.chunker.max_len(),
        chunk_overlap = config.chunker.overlap(),
        top_k = config.retriever.top_k(),
        "pipeline configured"
    );

    let mut session = Session::new(
        LopdfExtractor,
        embedder,
        store,
        Answerer::new(client),
        config.chunker,
        config.retriever,
    );

    println!("PDF question answering. Type /help for commands.");
    if let Some(path) = &config.pdf {
        upload(&mut session, path);
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break; // EOF (Ctrl+D)
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit" | "/exit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/status", _) => println!(
                "state: {}, stored segments: {}",
                session.state(),
                session.store().len()
            ),
            ("/upload", "") => println!("usage: /upload <path>"),
            ("/upload", path) => upload(&mut session, Path::new(path.trim())),
            (command, _) if command.starts_with('/') => {
                println!("unknown command {command}; type /help")
            }
            _ => ask(&mut session, line),
        }
    }

    Ok(())
}

fn upload<X, E, S, C>(session: &mut Session<X, E, S, C>, path: &Path)
where
    X: PdfExtractor,
    E: Embedder,
    S: VectorStore,
    C: CompletionClient,
{
    let result = fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|bytes| Ok(session.upload(&bytes)?));

    match result {
        Ok(report) => {
            debug!(ids = ?report.ids, "stored segment ids");
            println!(
                "PDF processed successfully ({} pages, {} segments). Now you can ask questions.",
                report.pages, report.segments
            );
        }
        Err(e) => eprintln!("Error processing PDF: {e:?}"),
    }
}

fn ask<X, E, S, C>(session: &mut Session<X, E, S, C>, query: &str)
where
    X: PdfExtractor,
    E: Embedder,
    S: VectorStore,
    C: CompletionClient,
{
    if !session.is_indexed() {
        println!("Upload a PDF first with /upload <path>.");
        return;
    }

    match session.ask(query) {
        Ok(answer) => println!("\nAI Response:\n{answer}\n"),
        Err(e) => eprintln!("Error generating response: {:?}", anyhow::Error::from(e)),
    }
}
