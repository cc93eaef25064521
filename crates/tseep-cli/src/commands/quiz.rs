//! The `tseep quiz` command: answer the questions one at a time.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use tseep_core::model::{AnswerSubmission, Question};
use tseep_core::traits::NavigatorObserver;
use tseep_core::{Advance, QuestionNavigator, QuizError};

use super::App;

/// Console progress reporter.
struct ConsoleObserver;

impl NavigatorObserver for ConsoleObserver {
    fn on_question_loaded(&self, question: &Question, total: u32) {
        tracing::debug!(index = question.index, total, "question loaded");
    }

    fn on_answer_submitted(&self, submission: &AnswerSubmission) {
        eprintln!(
            "  Saved answer {} for question {}",
            submission.selected_option, submission.index
        );
    }

    fn on_completed(&self, total: u32) {
        eprintln!("\nTest completed: {total} question(s) answered.");
    }

    fn on_error(&self, error: &QuizError) {
        tracing::debug!(error = %error, kind = ?error.kind(), "navigator error");
    }
}

const HELP: &str = "\
Commands:
  <number>   select that option
  n          submit the selected answer and go to the next question
  g <index>  jump to a question
  r          reload the current question
  q          quit (answers already submitted are kept)";

enum Step {
    Continue,
    Quit,
    Completed,
}

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path)?;
    let nav = QuestionNavigator::new(app.api(), app.session.as_ref(), app.config.navigator())?
        .with_observer(Arc::new(ConsoleObserver));

    nav.start().await?;
    println!("{HELP}");
    render(&nav);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle(&nav, line.trim()).await {
            Ok(Step::Continue) => render(&nav),
            Ok(Step::Quit) => return Ok(()),
            Ok(Step::Completed) => {
                println!();
                return super::result::show(&app).await;
            }
            // The session is gone, nothing more can be done here.
            Err(e) if e.is_auth() => return Err(e.into()),
            Err(e) => {
                eprintln!("{e}");
                render(&nav);
            }
        }
    }
    Ok(())
}

async fn handle(nav: &QuestionNavigator, input: &str) -> Result<Step, QuizError> {
    match input {
        "" => {}
        "q" | "quit" => return Ok(Step::Quit),
        "h" | "help" | "?" => println!("{HELP}"),
        "r" | "reload" => {
            nav.reload().await?;
        }
        "n" | "next" => {
            if nav.submit_and_advance().await? == Advance::Completed {
                return Ok(Step::Completed);
            }
        }
        _ => {
            if let Some(target) = input.strip_prefix('g').map(str::trim) {
                match target.parse::<u32>() {
                    Ok(index) => {
                        nav.go_to(index).await?;
                    }
                    Err(_) => eprintln!("usage: g <index>"),
                }
            } else if let Ok(position) = input.parse::<usize>() {
                let option = nav.select_position(position)?;
                println!("Selected: {option}");
                return Ok(Step::Continue);
            } else {
                eprintln!("unknown command '{input}', type h for help");
            }
        }
    }
    Ok(Step::Continue)
}

fn render(nav: &QuestionNavigator) {
    let Some(state) = nav.state() else {
        return;
    };

    let grid: Vec<String> = nav
        .question_grid()
        .iter()
        .map(|cell| match (cell.current, cell.answered) {
            (true, _) => format!("[{}]", cell.index),
            (false, true) => format!(" {}*", cell.index),
            (false, false) => format!(" {} ", cell.index),
        })
        .collect();
    println!("\n{}", grid.join(""));

    match nav.current_question() {
        Some(question) => {
            println!(
                "\nQuestion {} of {}: {}",
                state.current_index, state.total_questions, question.prompt
            );
            for (position, option) in question.options.iter().enumerate() {
                let marker = if state.selected_answer.as_deref() == Some(option.as_str()) {
                    ">"
                } else {
                    " "
                };
                println!(" {marker} {}. {option}", position + 1);
            }
        }
        None => println!(
            "\nQuestion {} of {} could not be loaded, type r to retry.",
            state.current_index, state.total_questions
        ),
    }
}
