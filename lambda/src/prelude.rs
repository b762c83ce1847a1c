use std::rc::Rc;

pub type Nat = u64;
pub type Identifier = Rc<String>;

pub type Span = std::ops::Range<usize>;

/// A token together with where it was read.
#[derive(Clone, Debug)]
pub struct Spanned<T> {
    pub span: Span,
    pub value: T,
}
impl<T> Spanned<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

pub use chumsky::error::Error as _;
pub type Error<I = String> = chumsky::error::Simple<I, Span>;
pub type Result<T, E = Error> = std::result::Result<T, E>;
