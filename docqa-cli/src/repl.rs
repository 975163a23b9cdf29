//! Interactive chat loop over one session.

use anyhow::Result;
use docqa_rag::{QaOrchestrator, RagError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

use crate::output;

const PROMPT: &str = "docqa> ";

/// A parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    History,
    Reset,
    Help,
    Quit,
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/quit" | "/exit" | "exit" | "quit" => Self::Quit,
            "/history" => Self::History,
            "/reset" => Self::Reset,
            "/help" => Self::Help,
            question => Self::Ask(question.to_string()),
        }
    }
}

const HELP: &str = "Type a question, or one of:\n  \
                    /history  show previous questions and answers\n  \
                    /reset    empty the index (history is kept)\n  \
                    /quit     leave the session";

/// Run the loop until EOF, Ctrl-C or `/quit`.
pub async fn run(qa: &QaOrchestrator) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let command = ReplCommand::parse(&line);
        if let ReplCommand::Ask(question) = &command {
            let _ = editor.add_history_entry(question.as_str());
        }

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::History => {
                for (turn, record) in qa.history().await.iter().enumerate() {
                    println!("{}\n", output::format_record(turn + 1, record));
                }
            }
            ReplCommand::Reset => {
                qa.reset().await;
                println!("Index cleared.");
            }
            ReplCommand::Ask(question) => match qa.ask_with_defaults(&question).await {
                Ok(answer) => println!("{answer}\n"),
                Err(RagError::NotReady) => println!("No documents are indexed yet.\n"),
                Err(e) => {
                    error!(error = %e, "question failed");
                    println!("Error: {e}\n");
                }
            },
        }
    }
    Ok(())
}
