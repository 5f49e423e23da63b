//! Interactive question loop.

use anyhow::{Context, Result, anyhow};
use hotel_rag::AnswerOrchestrator;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use crate::{App, print_insights, print_response};

const BANNER: &str = "Ask about the hotel bookings. \
Commands: :insights, :reload, exit";

/// Read questions until `exit`, `quit` or end of input.
///
/// `:reload` rebuilds the knowledge base from disk and swaps it in only once
/// it is fully built; on failure the current one stays in service.
pub(crate) async fn run(
    app: &App,
    mut orchestrator: AnswerOrchestrator,
    json: bool,
) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    let config = orchestrator.config();
    info!(top_k = config.top_k, policy = ?config.context_policy, "interactive session started");
    println!("{BANNER}");

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        match line {
            _ if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") => break,
            ":insights" => print_insights(orchestrator.knowledge(), json)?,
            ":reload" => match app.load_knowledge().await {
                Ok(knowledge) => {
                    let rows = knowledge.snapshot().row_count();
                    orchestrator = orchestrator.with_knowledge(knowledge);
                    info!(rows, "reloaded knowledge base");
                    println!("Reloaded {rows} bookings.");
                }
                Err(e) => {
                    error!(error = %e, "reload failed; keeping current data");
                    eprintln!("Reload failed: {e:#}");
                }
            },
            question => {
                let response = orchestrator.ask(question).await;
                print_response(&response, json)?;
            }
        }
    }

    Ok(())
}
