use std::path::{Path, PathBuf};

use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use chumsky::Parser as _;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use util::repl;

use lambda::{
    definitions::{Definitions, Globals},
    evaluator::{EvalError, Evaluator},
    parser::{self, Command},
    prelude::*,
    term::Term,
    typing::{self, TypeError},
};

#[derive(Parser, Debug)]
#[command(name = "lambda", about = "An interactive lambda calculus evaluator")]
struct Cli {
    /// Type-check every term against the simply-typed rules before evaluating it.
    #[arg(long)]
    typed: bool,
    /// Give up on a term after this many reduction steps.
    #[arg(long, value_name = "N")]
    step_limit: Option<usize>,
    #[arg(long, value_name = "PATH", default_value = "/tmp/lambda.history")]
    history: PathBuf,
    /// Start without the builtin definitions (`succ`, `pair`, `fst`, `snd`).
    #[arg(long)]
    no_prelude: bool,
}

fn build_report(e: Error<String>) -> Report<Span> {
    use chumsky::error::SimpleReason;
    let report = Report::build(ReportKind::Error, (), e.span().start);
    match e.reason() {
        SimpleReason::Unexpected => {
            let found = e.found().map(String::as_str).unwrap_or("end of the input");
            let expected = e
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of the input"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else"
            } else {
                &expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}"))
                .with_label(
                    Label::new(e.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message(format!("Opened here {}", delimiter.fg(Color::Yellow)))
                    .with_color(Color::Yellow),
            )
            .with_label(
                Label::new(e.span())
                    .with_message(format!(
                        "Must be closed before this {}",
                        e.found()
                            .map(String::as_str)
                            .unwrap_or("end of the input")
                            .fg(Color::Red)
                    ))
                    .with_color(Color::Red),
            ),
        SimpleReason::Custom(msg) => report.with_message(msg).with_label(
            Label::new(e.span())
                .with_message(format!("{}", msg.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

/// The normal form, preceded by the term as parsed when `echo` is set.
fn show_evaluation(term: &Term, evaluated: &Term, echo: bool) -> String {
    if echo {
        format!("{term}\n=> {evaluated}")
    } else {
        evaluated.to_string()
    }
}

enum Failure<'i> {
    Syntax(&'i str, Vec<Error<String>>),
    Type(TypeError),
    Eval(EvalError),
}
impl From<TypeError> for Failure<'_> {
    fn from(e: TypeError) -> Self {
        Failure::Type(e)
    }
}
impl From<EvalError> for Failure<'_> {
    fn from(e: EvalError) -> Self {
        Failure::Eval(e)
    }
}

type CommandResult<'a> = std::result::Result<(), Failure<'a>>;

struct Repl {
    globals: Globals,
    types: typing::Context,
    typed: bool,
    step_limit: Option<usize>,
    history: PathBuf,
}
impl Repl {
    fn new(cli: Cli) -> Self {
        let (globals, types) = if cli.no_prelude {
            (Globals::new(), typing::Context::new())
        } else {
            (Globals::with_prelude(), typing::Context::with_prelude())
        };
        Self {
            globals,
            types,
            typed: cli.typed,
            step_limit: cli.step_limit,
            history: cli.history,
        }
    }

    fn tokenize(input: &str) -> CommandResult {
        let tokens = parser::lexer()
            .parse(input)
            .map_err(|es| {
                Failure::Syntax(
                    input,
                    es.into_iter().map(|e| e.map(|e| e.to_string())).collect(),
                )
            })?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>();
        println!("{tokens:?}");
        Ok(())
    }

    fn parse(input: &str) -> CommandResult {
        let commands = parser::parse_commands(input).map_err(|es| Failure::Syntax(input, es))?;
        for command in commands {
            println!("{command}");
        }
        Ok(())
    }

    fn gettype<'i>(&self, input: &'i str) -> CommandResult<'i> {
        let term = parser::parse_term(input).map_err(|es| Failure::Syntax(input, es))?;
        let ty = typing::infer(&term, &self.types)?;
        println!("{ty}");
        Ok(())
    }

    fn evaluate<'i>(&mut self, input: &'i str, echo: bool) -> CommandResult<'i> {
        let commands = parser::parse_commands(input).map_err(|es| Failure::Syntax(input, es))?;
        for command in commands {
            match command {
                Command::Term(term) => {
                    debug!(%term, "parsed");
                    if self.typed {
                        let ty = typing::infer(&term, &self.types)?;
                        debug!(%term, %ty, "type checked");
                    }
                    let mut evaluator =
                        Evaluator::new(&self.globals).with_step_limit(self.step_limit);
                    let evaluated = evaluator.evaluate(&term);
                    debug!(steps = evaluator.steps(), "evaluated");
                    println!("{}", show_evaluation(&term, &evaluated?, echo));
                }
                Command::Let(name, term) => {
                    if self.typed {
                        let ty = typing::infer(&term, &self.types)?;
                        println!("{name} : {ty}");
                        self.types.insert(name.clone(), ty);
                    } else {
                        println!("{name} = {term}");
                    }
                    self.globals.set(name, term);
                }
            }
        }
        Ok(())
    }

    fn show_env(&self) {
        for (name, term) in self.globals.iter() {
            match self.types.lookup(name) {
                Some(ty) if self.typed => println!("{name} : {ty} = {term}"),
                _ => println!("{name} = {term}"),
            }
        }
    }

    fn show_help() {
        println!(
            "{}",
            r#"
term                -- show the normal form of the term
let name = term     -- define a global; several commands may be separated by `;`
:tokenize   term    -- show tokenized term
:parse      term    -- show parsed term
:typeof     term    -- show the type of the term
:evaluate   term    -- show the parsed term and its normal form
:env                -- list global definitions
:help               -- show this message
        "#
            .trim()
        );
    }

    fn handle_repl_input<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let (cmd, input) = if let Some(stripped) = input.strip_prefix(':') {
            stripped
                .trim_start()
                .split_once(' ')
                .unwrap_or((stripped, ""))
        } else {
            ("", input)
        };
        match cmd {
            "to" | "tokenize" => Self::tokenize(input)?,
            "p" | "parse" => Self::parse(input)?,
            "t" | "typeof" => self.gettype(input)?,
            "" => self.evaluate(input, false)?,
            "e" | "eval" | "evaluate" => self.evaluate(input, true)?,
            "env" => self.show_env(),
            "h" | "he" | "hel" | "help" => Self::show_help(),
            _ => {
                eprintln!("Unknown command {cmd}");
                Self::show_help();
            }
        }
        Ok(())
    }
}
impl repl::Repl for Repl {
    type Error = anyhow::Error;
    fn prompt(&self) -> &str {
        if self.typed {
            "typed> "
        } else {
            ">> "
        }
    }
    fn history(&self) -> Option<&Path> {
        Some(&self.history)
    }
    fn execute(&mut self, input: String) -> Result<(), Self::Error> {
        if input.trim().is_empty() {
            return Ok(());
        }
        match self.handle_repl_input(&input) {
            Ok(()) => {}
            Err(Failure::Syntax(input, es)) => {
                for e in es {
                    build_report(e).eprint(Source::from(input))?;
                }
            }
            Err(Failure::Type(e)) => eprintln!("Type error: {e}"),
            Err(Failure::Eval(e)) => eprintln!("{e}"),
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let repl = Repl::new(cli);
    info!(
        typed = repl.typed,
        step_limit = ?repl.step_limit,
        definitions = repl.globals.len(),
        "starting"
    );
    println!("Hi, this is a lambda calculus REPL. :h to show help");
    println!();
    repl::start_repl(repl)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_show_evaluation() {
        let term = parser::parse_term("(lambda x: x) 1").unwrap();
        let evaluated = lambda::evaluator::evaluate(&Globals::new(), &term);
        assert_eq!(show_evaluation(&term, &evaluated, false), "1");
        assert_eq!(
            show_evaluation(&term, &evaluated, true),
            "(lambda x: (x)) (1)\n=> 1"
        );
    }
}
