use thiserror::Error;
use tracing::trace;

use crate::{
    definitions::Definitions,
    prelude::*,
    substitution::{fresh_name, occurs_free, substitute},
    term::Term,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Evaluation did not reach a normal form within {limit} steps")]
    StepLimitExceeded { limit: usize },
}
pub type Result<T> = std::result::Result<T, EvalError>;

/// Normalizes terms by call-by-name reduction, going under binders.
///
/// A step is a beta reduction, the expansion of a numeral applied to a term, a successor
/// reduction or the unfolding of a global definition.
pub struct Evaluator<'d, D: ?Sized> {
    definitions: &'d D,
    limit: Option<usize>,
    steps: usize,
}

impl<'d, D: Definitions + ?Sized> Evaluator<'d, D> {
    pub fn new(definitions: &'d D) -> Self {
        Self {
            definitions,
            limit: None,
            steps: 0,
        }
    }

    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn step(&mut self) -> Result<()> {
        self.steps += 1;
        match self.limit {
            Some(limit) if self.steps > limit => Err(EvalError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    pub fn evaluate(&mut self, term: &Term) -> Result<Term> {
        match term {
            Term::Variable(name) => match self.definitions.get(name) {
                Some(bound) => {
                    self.step()?;
                    trace!(%name, "unfold");
                    self.evaluate(&bound)
                }
                None => Ok(term.clone()),
            },
            Term::Abstract(param, ty, body) => Ok(Term::Abstract(
                param.clone(),
                ty.clone(),
                self.evaluate(body)?.into(),
            )),
            Term::Apply(function, argument) => self.evaluate_apply(function, argument),
            Term::Nat(_) | Term::Succ => Ok(term.clone()),
        }
    }

    fn evaluate_apply(&mut self, function: &Term, argument: &Term) -> Result<Term> {
        match self.evaluate(function)? {
            Term::Abstract(param, _, body) => {
                self.step()?;
                trace!(%param, %argument, "beta");
                // The argument is substituted unevaluated.
                self.evaluate(&substitute(&body, &param, argument))
            }
            Term::Nat(n) => {
                self.step()?;
                trace!(n, %argument, "numeral");
                let expanded = self.iterate(n, argument);
                self.evaluate(&expanded)
            }
            function => {
                let argument = self.evaluate(argument)?;
                match (function, argument) {
                    // `succ` on the largest literal stays stuck.
                    (Term::Succ, Term::Nat(m)) if m < Nat::MAX => {
                        self.step()?;
                        Ok(Term::Nat(m + 1))
                    }
                    (Term::Succ, numeral @ Term::Abstract(..)) => {
                        self.step()?;
                        trace!(%numeral, "symbolic succ");
                        let successor = self.church_successor(numeral);
                        self.evaluate(&successor)
                    }
                    (function, argument) => Ok(Term::Apply(function.into(), argument.into())),
                }
            }
        }
    }

    /// `lambda z. f (f (... (f z)))` with `f` applied `n` times.
    fn iterate(&self, n: Nat, f: &Term) -> Term {
        let z = self.bound_name("z", &[f]);
        let mut body = Term::Variable(z.clone());
        for _ in 0..n {
            body = Term::Apply(f.clone().into(), body.into());
        }
        Term::Abstract(z, None, body.into())
    }

    /// `lambda s. lambda z. n s (s z)`
    fn church_successor(&self, n: Term) -> Term {
        let s = self.bound_name("s", &[&n]);
        let z = self.bound_name("z", &[&n, &Term::Variable(s.clone())]);
        let s_var = || Term::Variable(s.clone());
        let body = Term::apply(
            Term::apply(n.clone(), s_var()),
            Term::apply(s_var(), Term::Variable(z.clone())),
        );
        Term::Abstract(s.clone(), None, Term::Abstract(z, None, body.into()).into())
    }

    /// `base`, or a primed variant of it when `base` is free in one of `terms` or names a
    /// definition.
    ///
    /// The construction is evaluated afterwards, so a binder named like a definition would be
    /// unfolded instead of staying bound.
    fn bound_name(&self, base: &str, terms: &[&Term]) -> Identifier {
        let taken = |name: &str| {
            terms.iter().any(|term| occurs_free(name, term))
                || self
                    .definitions
                    .get(&Identifier::new(name.to_string()))
                    .is_some()
        };
        if taken(base) {
            fresh_name(base, taken)
        } else {
            Identifier::new(base.to_string())
        }
    }
}

/// Evaluates without a step limit. Does not return if `term` has no normal form.
pub fn evaluate(definitions: &(impl Definitions + ?Sized), term: &Term) -> Term {
    match Evaluator::new(definitions).evaluate(term) {
        Ok(term) => term,
        Err(e) => unreachable!("Unbounded evaluation failed: {e}"),
    }
}
