use std::rc::Rc;

use rpds::HashTrieMap;
use thiserror::Error;

use crate::{
    prelude::*,
    term::{Term, Type},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("Found a free variable `{name}` with no known type")]
    UnboundVariable { name: Identifier },
    #[error("The parameter `{param}` of `{term}` has no type annotation")]
    MissingAnnotation { param: Identifier, term: Term },
    #[error("Expected `{function}` to be a function, but it has type {ty}")]
    NotAFunction { function: Term, ty: Type },
    #[error("`{argument}` has type {found}, but `{function}` expects {expected}")]
    ArgumentMismatch {
        function: Term,
        argument: Term,
        expected: Type,
        found: Type,
    },
}
pub type Result<T> = std::result::Result<T, TypeError>;

/// Types of the variables in scope.
///
/// The map is persistent: extending it for an abstraction body leaves the caller's copy untouched.
#[derive(Default, Clone, Debug)]
pub struct Context {
    bindings: HashTrieMap<Identifier, Rc<Type>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `succ`, the only builtin with a type.
    pub fn with_prelude() -> Self {
        let mut context = Self::new();
        let nat = Rc::new(Type::church_numeral());
        context.insert(
            Identifier::new("succ".to_string()),
            Type::Arrow(nat.clone(), nat),
        );
        context
    }

    pub fn insert(&mut self, name: Identifier, ty: Type) {
        self.bindings = self.bindings.insert(name, ty.into());
    }

    pub fn lookup(&self, name: &Identifier) -> Option<Rc<Type>> {
        self.bindings.get(name).cloned()
    }

    fn extended(&self, name: Identifier, ty: Rc<Type>) -> Self {
        Self {
            bindings: self.bindings.insert(name, ty),
        }
    }
}

pub fn infer(term: &Term, context: &Context) -> Result<Type> {
    match term {
        Term::Variable(name) => context
            .lookup(name)
            .map(|ty| ty.as_ref().clone())
            .ok_or_else(|| TypeError::UnboundVariable { name: name.clone() }),
        Term::Abstract(param, None, _) => Err(TypeError::MissingAnnotation {
            param: param.clone(),
            term: term.clone(),
        }),
        Term::Abstract(param, Some(ty), body) => {
            let body_type = infer(body, &context.extended(param.clone(), ty.clone()))?;
            Ok(Type::Arrow(ty.clone(), body_type.into()))
        }
        Term::Apply(function, argument) => {
            let function_type = infer(function, context)?;
            let (expected, result) = match function_type {
                Type::Arrow(expected, result) => (expected, result),
                ty => {
                    return Err(TypeError::NotAFunction {
                        function: function.as_ref().clone(),
                        ty,
                    })
                }
            };
            let found = infer(argument, context)?;
            if expected.as_ref() != &found {
                return Err(TypeError::ArgumentMismatch {
                    function: function.as_ref().clone(),
                    argument: argument.as_ref().clone(),
                    expected: expected.as_ref().clone(),
                    found,
                });
            }
            Ok(result.as_ref().clone())
        }
        Term::Nat(_) => Ok(Type::church_numeral()),
        Term::Succ => {
            let nat = Rc::new(Type::church_numeral());
            Ok(Type::Arrow(nat.clone(), nat))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser;

    fn check(input: &str) -> Result<Type> {
        let term = parser::parse_term(input).expect("parse error");
        infer(&term, &Context::with_prelude())
    }

    fn o_to_o() -> Type {
        Type::arrow(Type::Base, Type::Base)
    }

    #[test]
    fn test_identity() {
        let term = Term::typed_lambda("x", Type::Base, Term::var("x"));
        assert_eq!(infer(&term, &Context::new()), Ok(o_to_o()));
    }

    #[test]
    fn test_application() {
        assert!(check("(lambda x: o. x) y").is_err());
        assert_eq!(
            check("lambda y: o. (lambda x: o. x) y"),
            Ok(o_to_o())
        );
        assert_eq!(
            check("lambda f: o -> o. lambda x: o. f (f x)").unwrap().to_string(),
            "((o -> o) -> (o -> o))"
        );
    }

    #[test]
    fn test_argument_mismatch() {
        let term = Term::apply(
            Term::typed_lambda("x", Type::Base, Term::var("x")),
            Term::typed_lambda("y", Type::Base, Term::var("y")),
        );
        assert_eq!(
            infer(&term, &Context::new()),
            Err(TypeError::ArgumentMismatch {
                function: Term::typed_lambda("x", Type::Base, Term::var("x")),
                argument: Term::typed_lambda("y", Type::Base, Term::var("y")),
                expected: Type::Base,
                found: o_to_o(),
            })
        );
    }

    #[test]
    fn test_not_a_function() {
        assert!(matches!(
            check("lambda x: o. x x"),
            Err(TypeError::NotAFunction { ty: Type::Base, .. })
        ));
    }

    #[test]
    fn test_unbound_variable() {
        assert!(matches!(
            check("lambda x: o. f x"),
            Err(TypeError::UnboundVariable { name }) if name.as_str() == "f"
        ));
    }

    #[test]
    fn test_missing_annotation() {
        assert!(matches!(
            check("lambda x: x"),
            Err(TypeError::MissingAnnotation { param, .. }) if param.as_str() == "x"
        ));
    }

    #[test]
    fn test_binders_do_not_leak_into_siblings() {
        // `x` is bound only inside the first abstraction.
        assert!(matches!(
            check("(lambda f: o -> o. f) (lambda x: o. x) x"),
            Err(TypeError::UnboundVariable { name }) if name.as_str() == "x"
        ));
        let mut context = Context::new();
        context.insert(Identifier::new("x".into()), o_to_o());
        let term = parser::parse_term("(lambda g: o -> o. g) (lambda x: o. x) x").unwrap();
        assert!(matches!(
            infer(&term, &context),
            Err(TypeError::ArgumentMismatch { .. })
        ));
        assert_eq!(context.lookup(&Identifier::new("x".into())), Some(o_to_o().into()));
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(
            check("lambda x: o -> o. lambda x: o. x").unwrap().to_string(),
            "((o -> o) -> (o -> o))"
        );
    }

    #[test]
    fn test_numerals() {
        let nat = Type::church_numeral();
        assert_eq!(check("3"), Ok(nat.clone()));
        assert_eq!(check("succ 3"), Ok(nat.clone()));
        assert_eq!(check("3 (lambda x: o. x)"), Ok(o_to_o()));
        assert!(check("succ (lambda x: o. x)").is_err());
    }
}
