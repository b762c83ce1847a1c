use std::rc::Rc;

use crate::prelude::*;

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Type {
    /// `o`, the only base type.
    Base,
    Arrow(Rc<Self>, Rc<Self>),
}

impl Type {
    pub fn arrow(lhs: impl Into<Rc<Self>>, rhs: impl Into<Rc<Self>>) -> Self {
        Type::Arrow(lhs.into(), rhs.into())
    }

    /// `(o -> o) -> o -> o`, the type of a Church numeral `lambda f. lambda z. f^n z`.
    pub fn church_numeral() -> Self {
        let endo = Rc::new(Type::arrow(Type::Base, Type::Base));
        Type::Arrow(endo.clone(), endo)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Base => f.write_str("o"),
            Type::Arrow(lhs, rhs) => f.write_fmt(format_args!("({lhs} -> {rhs})")),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    Variable(Identifier),
    /// The parameter type is only present in the typed variant.
    Abstract(Identifier, Option<Rc<Type>>, Rc<Self>),
    Apply(Rc<Self>, Rc<Self>),
    /// Literal Church numeral.
    Nat(Nat),
    Succ,
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(Identifier::new(name.into()))
    }

    pub fn lambda(param: impl Into<String>, body: impl Into<Rc<Self>>) -> Self {
        Term::Abstract(Identifier::new(param.into()), None, body.into())
    }

    pub fn typed_lambda(param: impl Into<String>, ty: Type, body: impl Into<Rc<Self>>) -> Self {
        Term::Abstract(Identifier::new(param.into()), Some(ty.into()), body.into())
    }

    pub fn apply(lhs: impl Into<Rc<Self>>, rhs: impl Into<Rc<Self>>) -> Self {
        Term::Apply(lhs.into(), rhs.into())
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(name) => f.write_str(name),
            Term::Abstract(param, None, body) => f.write_fmt(format_args!("lambda {param}: ({body})")),
            Term::Abstract(param, Some(ty), body) => {
                f.write_fmt(format_args!("lambda {param}: {ty}. ({body})"))
            }
            Term::Apply(lhs, rhs) => f.write_fmt(format_args!("({lhs}) ({rhs})")),
            Term::Nat(v) => f.write_fmt(format_args!("{v}")),
            Term::Succ => f.write_str("succ"),
        }
    }
}
