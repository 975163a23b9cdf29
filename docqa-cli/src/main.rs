use std::sync::Arc;

use clap::Parser;
use docqa_cli::providers::{self, NoAnswerer};
use docqa_cli::{Args, Command, Session, output, repl};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter(args.env_filter()).with_writer(std::io::stderr).init();
    if let Some(path) = &args.env_file {
        providers::load_env_file(path)?;
    }

    let config = args.rag_config()?;
    let embedder = providers::build_embedder(args.embedder, &args.model_dir, args.timeout()).await?;
    let snapshot = args.snapshot.as_deref();

    match &args.command {
        Command::Ask { question, files } => {
            let answerer = providers::answerer_from_env(args.timeout())?;
            let session = Session::open(config, embedder, answerer, snapshot)?;
            session.ingest_files(files).await;
            println!("{}", session.qa.ask_with_defaults(question).await?);
        }
        Command::Chat { files } => {
            let answerer = providers::answerer_from_env(args.timeout())?;
            let session = Session::open(config, embedder, answerer, snapshot)?;
            session.ingest_files(files).await;
            repl::run(&session.qa).await?;
        }
        Command::Search { query, files } => {
            let k = config.retrieval_k;
            let session = Session::open(config, embedder, Arc::new(NoAnswerer), snapshot)?;
            session.ingest_files(files).await;
            for (rank, result) in session.qa.retrieve(query, k).await?.iter().enumerate() {
                println!("{}", output::format_result(rank + 1, result));
            }
        }
        Command::Index { output: path, files } => {
            let session = Session::open(config, embedder, Arc::new(NoAnswerer), snapshot)?;
            let report = session.ingest_files(files).await;
            session.save_snapshot(path).await?;
            println!(
                "Indexed {} segments from {} documents ({} skipped) into {}",
                report.segment_count(),
                report.ingest.outcomes.len(),
                report.ingest.failures().count(),
                path.display()
            );
        }
    }
    Ok(())
}
