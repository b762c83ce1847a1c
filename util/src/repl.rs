use std::path::Path;

use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Command failed: {0:?}")]
    CommandError(E),
}

/// A line-oriented interpreter driven by [`start_repl`].
///
/// A line ending with `\` is continued on the next line; the joined input is handed to
/// [`Repl::execute`] once complete.
pub trait Repl {
    type Error: std::fmt::Debug;
    fn prompt(&self) -> &str {
        ">> "
    }
    fn history(&self) -> Option<&Path> {
        None
    }
    fn execute(&mut self, input: String) -> Result<(), Self::Error>;
}

pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = repl.history() {
        if let Err(e) = editor.load_history(history) {
            debug!(path = %history.display(), "no history loaded: {e}");
        }
    }
    let mut input: Option<String> = None;
    loop {
        let prompt = if input.is_some() { ".. " } else { repl.prompt() };
        match editor.readline(prompt) {
            Ok(mut line) if line.ends_with('\\') => {
                line.pop();
                line.push('\n');
                if let Some(input) = input.as_mut() {
                    input.push_str(line.as_str());
                } else {
                    input = Some(line);
                }
            }
            Ok(line) => {
                let input = if let Some(mut input) = input.take() {
                    input.push_str(line.as_str());
                    input
                } else {
                    line
                };
                editor.add_history_entry(input.as_str());
                debug!(%input, "executing");
                repl.execute(input).map_err(Error::CommandError)?;
                if let Some(history) = repl.history() {
                    if let Err(e) = editor.save_history(history) {
                        warn!(path = %history.display(), "failed to save history: {e}");
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
