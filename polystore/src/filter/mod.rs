//! Conditions, predicates and their in-memory evaluation.
//!
//! A [`Condition`] is a tree of field tests joined by AND/OR. Conditions are
//! built with [`field`] and the combinators, validated at every store entry
//! point, and evaluated either through an index plan or by [`matches`].

mod condition;
mod evaluator;
mod fluent;
mod predicate;

pub use condition::*;
pub use evaluator::*;
pub use fluent::*;
pub use predicate::*;
