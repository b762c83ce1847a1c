pub mod definitions;
pub mod evaluator;
pub mod parser;
pub mod prelude;
pub mod substitution;
pub mod term;
pub mod typing;
