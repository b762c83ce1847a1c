use std::rc::Rc;

use chumsky::prelude::*;

use crate::{
    prelude::*,
    term::{Term, Type},
};

pub trait SimpleParser<I: Clone + std::hash::Hash, O>:
    Parser<I, O, Error = Error<I>> + Clone
{
    #[allow(clippy::type_complexity)]
    fn spanned(self) -> chumsky::combinator::MapWithSpan<Self, fn(O, Span) -> Spanned<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map_with_span(|value, span| Spanned { span, value })
    }
}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Error<I>> + Clone
{
}

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = ";")]
    Semicolon,
    #[display(fmt = ":")]
    Colon,
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "->")]
    Arrow,
    #[display(fmt = "lambda")]
    Lambda,
    #[display(fmt = "let")]
    Let,
    #[display(fmt = "{_0}")]
    Nat(Nat),
    #[display(fmt = "{_0}")]
    Ident(Identifier),
}

const BASE_TYPE: &str = "o";

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let symbols = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
        just(';').to(Token::Semicolon),
        just(':').to(Token::Colon),
        just('=').to(Token::Equal),
        just("->").to(Token::Arrow),
    ));
    let keywords = choice((
        text::keyword("lambda").to(Token::Lambda),
        text::keyword("let").to(Token::Let),
    ));
    let others = choice((
        text::int::<char, _>(10)
            .from_str()
            .try_map(|r, span| r.map_err(|e| Error::custom(span, format!("{e}"))))
            .map(Token::Nat),
        // Trailing apostrophes come from renamed binders.
        text::ident()
            .then(just('\'').repeated())
            .map(|(mut ident, primes): (String, Vec<char>)| {
                ident.extend(primes);
                Token::Ident(Identifier::new(ident))
            }),
    ));
    let token = choice((symbols, keywords, others));
    token.spanned().padded().repeated().then_ignore(end())
}

fn type_parser() -> impl SimpleParser<Token, Type> {
    recursive(|ty: Recursive<_, Type, _>| {
        let atom = choice((
            just(Token::Ident(Identifier::new(BASE_TYPE.to_string()))).to(Type::Base),
            ty.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));
        // Ty -> Ty
        atom.clone()
            .then_ignore(just(Token::Arrow))
            .repeated()
            .then(atom)
            .foldr(|lhs, rhs| Type::Arrow(lhs.into(), rhs.into()))
    })
    .labelled("type")
}

fn term_parser() -> impl SimpleParser<Token, Term> {
    recursive(|term: Recursive<_, Term, _>| {
        let ident = select! { Token::Ident(ident) => ident }.labelled("identifier");

        let atom = choice((
            select! { Token::Nat(n) => Term::Nat(n) },
            ident.clone().map(Term::Variable),
            term.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        // lambda x: Ty. term | lambda x: term
        let annotation = type_parser().then_ignore(just(Token::Dot));
        let abs = just(Token::Lambda)
            .ignore_then(ident)
            .then_ignore(just(Token::Colon))
            .then(annotation.or_not())
            .then(term)
            .map(|((param, ty), body)| Term::Abstract(param, ty.map(Rc::new), body.into()))
            .labelled("abstract");

        // term term ...
        let apply = atom
            .clone()
            .then(atom.repeated())
            .foldl(|lhs, rhs| Term::Apply(lhs.into(), rhs.into()))
            .labelled("apply");

        choice((abs, apply))
    })
    .labelled("term")
}

#[derive(Clone, derive_more::Display, Debug, PartialEq, Eq)]
pub enum Command {
    #[display(fmt = "{_0}")]
    Term(Term),
    #[display(fmt = "let {_0} = {_1}")]
    Let(Identifier, Term),
}

fn command_parser() -> impl SimpleParser<Token, Command> {
    let ident = select! { Token::Ident(ident) => ident };
    let term = term_parser().map(Command::Term);
    let let_binding = just(Token::Let)
        .ignore_then(ident)
        .then_ignore(just(Token::Equal))
        .then(term_parser())
        .map(|(name, term)| Command::Let(name, term));
    choice((let_binding, term))
}

fn commands_parser() -> impl SimpleParser<Token, Vec<Command>> {
    command_parser()
        .separated_by(just(Token::Semicolon))
        .allow_trailing()
}

fn parse_full<T>(s: &str, parser: impl SimpleParser<Token, T>) -> Result<T, Vec<Error<String>>> {
    let len = s.chars().count();
    let eoi = Span {
        start: len,
        end: len + 1,
    };
    let tokens = lexer().parse(s).map_err(|es| {
        es.into_iter()
            .map(|e| e.map(|e| e.to_string()))
            .collect::<Vec<_>>()
    })?;
    let value = parser
        .then_ignore(end())
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens
                .into_iter()
                .map(|Spanned { span, value }| (value, span)),
        ))
        .map_err(|es| {
            es.into_iter()
                .map(|e| e.map(|e| e.to_string()))
                .collect::<Vec<_>>()
        })?;
    Ok(value)
}

pub fn parse_term(s: &str) -> Result<Term, Vec<Error<String>>> {
    parse_full(s, term_parser())
}

pub fn parse_commands(s: &str) -> Result<Vec<Command>, Vec<Error<String>>> {
    parse_full(s, commands_parser())
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(s: &str) -> Result<Vec<Token>, Vec<Error<char>>> {
        Ok(lexer()
            .parse(s)?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>())
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Identifier::new(s.into()))
    }

    #[test]
    fn test_lexer() {
        assert_eq!(lex("lambdax").unwrap(), vec![ident("lambdax")]);
        assert_eq!(
            lex("lambda x: o -> o. (x')").unwrap(),
            vec![
                Token::Lambda,
                ident("x"),
                Token::Colon,
                ident("o"),
                Token::Arrow,
                ident("o"),
                Token::Dot,
                Token::LParen,
                ident("x'"),
                Token::RParen,
            ]
        );
        assert_eq!(
            lex("let two = succ 1").unwrap(),
            vec![
                Token::Let,
                ident("two"),
                Token::Equal,
                ident("succ"),
                Token::Nat(1)
            ]
        );
        assert!(lex("lambda x: #").is_err());
    }

    #[test]
    fn test_type_parser() {
        use chumsky::stream::Stream;
        fn parse(s: &str) -> Result<String, String> {
            let len = s.chars().count();
            let eoi = len..len + 1;
            let tokens = lexer().parse(s).map_err(|e| format!("{e:?}"))?;
            type_parser()
                .then_ignore(end())
                .parse(Stream::from_iter(
                    eoi,
                    tokens
                        .into_iter()
                        .map(|Spanned { span, value }| (value, span)),
                ))
                .map_err(|e| format!("{e:?}"))
                .map(|ty| format!("{ty}"))
        }

        assert_eq!(parse("o").unwrap(), "o".to_string());
        assert_eq!(
            parse("o -> o -> o").unwrap(),
            "(o -> (o -> o))".to_string()
        );
        assert_eq!(
            parse("(o -> o) -> o -> o").unwrap(),
            "((o -> o) -> (o -> o))".to_string()
        );
        assert!(parse("p -> o").is_err());
    }

    #[test]
    fn test_term_parser() {
        assert_eq!(
            parse_term("f x y").unwrap(),
            Term::apply(Term::apply(Term::var("f"), Term::var("x")), Term::var("y"))
        );
        assert_eq!(
            parse_term("lambda x: (x)").unwrap(),
            Term::lambda("x", Term::var("x"))
        );
        assert_eq!(
            parse_term("lambda x: o. x").unwrap(),
            Term::typed_lambda("x", Type::Base, Term::var("x"))
        );
        // Without a dot `o` is the body, not an annotation.
        assert_eq!(
            parse_term("lambda x: (o)").unwrap(),
            Term::lambda("x", Term::var("o"))
        );
        assert_eq!(
            parse_term("(succ) (41)").unwrap(),
            Term::apply(Term::var("succ"), Term::Nat(41))
        );
        assert!(parse_term("lambda : x").is_err());
        assert!(parse_term("(f x").is_err());
    }

    #[test]
    fn test_printed_terms_reparse() {
        let terms = [
            Term::apply(
                Term::lambda("x", Term::apply(Term::var("x"), Term::var("x"))),
                Term::lambda("y'", Term::apply(Term::Nat(3), Term::var("y'"))),
            ),
            Term::typed_lambda(
                "f",
                Type::arrow(Type::arrow(Type::Base, Type::Base), Type::Base),
                Term::apply(Term::var("f"), Term::lambda("z", Term::var("z"))),
            ),
        ];
        for term in terms {
            assert_eq!(parse_term(&term.to_string()).unwrap(), term);
        }
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_commands("let id = lambda x: x; id 1;").unwrap(),
            vec![
                Command::Let(
                    Identifier::new("id".into()),
                    Term::lambda("x", Term::var("x"))
                ),
                Command::Term(Term::apply(Term::var("id"), Term::Nat(1))),
            ]
        );
        assert!(parse_commands("let = 1").is_err());
    }
}
