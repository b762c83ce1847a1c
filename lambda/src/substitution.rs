use crate::{prelude::*, term::Term};

/// Variables occurring in `term` that are not bound by an enclosing abstraction.
///
/// A name occurs once per free occurrence; callers only ask for membership.
pub fn free_vars(term: &Term) -> Vec<Identifier> {
    fn rec(term: &Term, acc: &mut Vec<Identifier>) {
        match term {
            Term::Variable(name) => acc.push(name.clone()),
            Term::Abstract(param, _, body) => {
                let start = acc.len();
                rec(body, acc);
                let mut i = start;
                while i < acc.len() {
                    if acc[i] == *param {
                        acc.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            Term::Apply(lhs, rhs) => {
                rec(lhs, acc);
                rec(rhs, acc);
            }
            Term::Nat(_) | Term::Succ => {}
        }
    }
    let mut acc = vec![];
    rec(term, &mut acc);
    acc
}

pub fn occurs_free(name: &str, term: &Term) -> bool {
    match term {
        Term::Variable(v) => v.as_str() == name,
        Term::Abstract(param, _, body) => param.as_str() != name && occurs_free(name, body),
        Term::Apply(lhs, rhs) => occurs_free(name, lhs) || occurs_free(name, rhs),
        Term::Nat(_) | Term::Succ => false,
    }
}

/// Appends apostrophes to `base` until `taken` rejects the candidate no more.
///
/// `base` itself is never returned.
pub fn fresh_name(base: &str, mut taken: impl FnMut(&str) -> bool) -> Identifier {
    let mut candidate = format!("{base}'");
    while taken(&candidate) {
        candidate.push('\'');
    }
    Identifier::new(candidate)
}

/// Replaces every free occurrence of `name` in `term` with `replacement`.
///
/// Binders that would capture a free variable of `replacement` are renamed first.
pub fn substitute(term: &Term, name: &str, replacement: &Term) -> Term {
    match term {
        Term::Variable(v) if v.as_str() == name => replacement.clone(),
        Term::Variable(_) | Term::Nat(_) | Term::Succ => term.clone(),
        Term::Apply(lhs, rhs) => Term::Apply(
            substitute(lhs, name, replacement).into(),
            substitute(rhs, name, replacement).into(),
        ),
        Term::Abstract(param, _, _) if param.as_str() == name => term.clone(),
        // Nothing to replace, so nothing to rename either.
        Term::Abstract(_, _, body) if !occurs_free(name, body) => term.clone(),
        Term::Abstract(param, ty, body) if occurs_free(param, replacement) => {
            let taken = free_vars(replacement);
            let renamed = fresh_name(param, |candidate| {
                candidate == name
                    || taken.iter().any(|v| v.as_str() == candidate)
                    || occurs_free(candidate, body)
            });
            let body = substitute(body, param, &Term::Variable(renamed.clone()));
            substitute(
                &Term::Abstract(renamed, ty.clone(), body.into()),
                name,
                replacement,
            )
        }
        Term::Abstract(param, ty, body) => Term::Abstract(
            param.clone(),
            ty.clone(),
            substitute(body, name, replacement).into(),
        ),
    }
}
