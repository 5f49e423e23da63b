//! `hotel-ask`: ask questions about a hotel bookings CSV from the terminal.

mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotel_rag::ollama::{self, OllamaEmbeddingProvider, OllamaGenerator};
use hotel_rag::{
    AnswerOrchestrator, AskResponse, EmbeddingProvider, Generator, HotelRagConfig,
    HotelRagConfigBuilder, KnowledgeBase, Snapshot,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hotel-ask", version, about = "Question answering over hotel booking data")]
struct Cli {
    /// Cleaned bookings CSV.
    #[arg(long, global = true, default_value = "cleaned_hotel_bookings.csv")]
    data: PathBuf,
    /// JSON configuration file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Skip building the similarity index; prompts carry insights only.
    #[arg(long, global = true)]
    no_index: bool,
    /// Booking fragments retrieved per generated answer.
    #[arg(long, global = true)]
    top_k: Option<usize>,
    /// Ollama generation model.
    #[arg(long, global = true, default_value = ollama::DEFAULT_GENERATION_MODEL)]
    model: String,
    /// Ollama embedding model.
    #[arg(long, global = true, default_value = ollama::DEFAULT_EMBEDDING_MODEL)]
    embed_model: String,
    /// Ollama server address. Defaults to `OLLAMA_HOST` or localhost.
    #[arg(long, global = true)]
    ollama_url: Option<String>,
    /// Print answers and insights as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question and exit.
    Ask { question: String },
    /// Print the dataset insights and exit.
    Insights,
}

/// Everything needed to (re)build the knowledge base and answer questions.
pub(crate) struct App {
    data: PathBuf,
    config: HotelRagConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Arc<dyn Generator>,
}

impl App {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => HotelRagConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => HotelRagConfig::default(),
        };
        let mut builder = HotelRagConfigBuilder::from_config(file_config);
        if let Some(top_k) = cli.top_k {
            builder = builder.top_k(top_k);
        }
        let config = builder.build().context("invalid configuration")?;

        let base_url = cli.ollama_url.clone().unwrap_or_else(ollama::base_url_from_env);
        let embedder: Option<Arc<dyn EmbeddingProvider>> = if cli.no_index {
            None
        } else {
            Some(Arc::new(OllamaEmbeddingProvider::new(&base_url).with_model(&cli.embed_model)))
        };
        let generator = Arc::new(OllamaGenerator::new(&base_url).with_model(&cli.model));

        info!(%base_url, model = %cli.model, indexed = !cli.no_index, "configured Ollama");
        Ok(Self { data: cli.data.clone(), config, embedder, generator })
    }

    /// Load the dataset, summarize it and (unless disabled) embed every row.
    pub(crate) async fn load_knowledge(&self) -> Result<Arc<KnowledgeBase>> {
        let started = Instant::now();
        let knowledge =
            KnowledgeBase::load(&self.data, self.embedder.as_deref(), &self.config)
                .await
                .with_context(|| format!("failed to prepare {}", self.data.display()))?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "ready");
        Ok(Arc::new(knowledge))
    }

    fn orchestrator(&self, knowledge: Arc<KnowledgeBase>) -> Result<AnswerOrchestrator> {
        let mut builder = AnswerOrchestrator::builder()
            .config(self.config.clone())
            .knowledge(knowledge)
            .generator(Arc::clone(&self.generator));
        if let Some(embedder) = &self.embedder {
            builder = builder.embedding_provider(Arc::clone(embedder));
        }
        Ok(builder.build()?)
    }
}

/// The `insights` payload: total bookings plus the ordered facts.
#[derive(Serialize)]
struct InsightsReport<'a> {
    total_bookings: usize,
    insights: Vec<&'a str>,
}

pub(crate) fn print_insights(knowledge: &KnowledgeBase, json: bool) -> Result<()> {
    if json {
        let report = InsightsReport {
            total_bookings: knowledge.snapshot().row_count(),
            insights: knowledge.insights().lines(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", knowledge.insights());
    }
    Ok(())
}

pub(crate) fn print_response(response: &AskResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(response)?);
    } else {
        println!("{}", render_text(response));
    }
    Ok(())
}

/// Answers computed from the data print bare; anything else is tagged with
/// its source so generated text is never mistaken for a lookup.
fn render_text(response: &AskResponse) -> String {
    if response.source.is_deterministic() {
        response.text.clone()
    } else {
        format!("[{}] {}", response.source.as_str(), response.text)
    }
}

fn init_tracing(verbose: bool) {
    let default =
        if verbose { "hotel_rag=debug,hotel_ask=debug" } else { "hotel_rag=info,hotel_ask=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = App::from_cli(&cli)?;

    // Insights never need embeddings or generation.
    if let Some(Command::Insights) = &cli.command {
        let snapshot = Snapshot::load(&app.data)
            .with_context(|| format!("failed to load {}", app.data.display()))?;
        return print_insights(&KnowledgeBase::new(snapshot, None), cli.json);
    }

    let orchestrator = app.orchestrator(app.load_knowledge().await?)?;
    match &cli.command {
        Some(Command::Ask { question }) => {
            let response = orchestrator.ask(question).await;
            print_response(&response, cli.json)
        }
        _ => repl::run(&app, orchestrator, cli.json).await,
    }
}
