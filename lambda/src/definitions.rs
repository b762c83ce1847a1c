use std::rc::Rc;

use rpds::HashTrieMap;
use tracing::debug;

use crate::{prelude::*, term::Term};

/// Named global definitions consulted when a variable is evaluated.
pub trait Definitions {
    fn get(&self, name: &Identifier) -> Option<Rc<Term>>;
    /// A later `get` of `name` observes `term`.
    fn set(&mut self, name: Identifier, term: Term);
}

#[derive(Default, Clone, Debug)]
pub struct Globals {
    terms: HashTrieMap<Identifier, Rc<Term>>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// `succ` together with the pair combinators `pair`, `fst` and `snd`.
    pub fn with_prelude() -> Self {
        let mut globals = Self::new();
        globals.define("succ", Term::Succ);
        globals.define(
            "pair",
            Term::lambda(
                "f",
                Term::lambda(
                    "s",
                    Term::lambda(
                        "b",
                        Term::apply(Term::apply(Term::var("b"), Term::var("f")), Term::var("s")),
                    ),
                ),
            ),
        );
        globals.define(
            "fst",
            Term::lambda(
                "p",
                Term::apply(
                    Term::var("p"),
                    Term::lambda("t", Term::lambda("f", Term::var("t"))),
                ),
            ),
        );
        globals.define(
            "snd",
            Term::lambda(
                "p",
                Term::apply(
                    Term::var("p"),
                    Term::lambda("t", Term::lambda("f", Term::var("f"))),
                ),
            ),
        );
        globals
    }

    fn define(&mut self, name: &str, term: Term) {
        self.set(Identifier::new(name.to_string()), term);
    }

    pub fn len(&self) -> usize {
        self.terms.size()
    }

    /// Entries ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Rc<Term>)> {
        let mut entries = self.terms.iter().collect::<Vec<_>>();
        entries.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        entries.into_iter()
    }
}

impl Definitions for Globals {
    fn get(&self, name: &Identifier) -> Option<Rc<Term>> {
        self.terms.get(name).cloned()
    }

    fn set(&mut self, name: Identifier, term: Term) {
        debug!(%name, %term, "define");
        self.terms = self.terms.insert(name, term.into());
    }
}
