//! Values, comparison rules and shared utilities.
//!
//! [`compare_equals`] and [`compare_for_sort`] are the single source of
//! truth for how two [`Value`]s relate. The filter evaluator, the update
//! evaluator and the property index all defer to them; ORDER BY uses
//! [`compare_for_ordering`], which groups mixed kinds.

mod compare;
mod convertible;
mod lock;
mod sort_order;
mod util;
mod value;

pub use compare::*;
pub use convertible::*;
pub use lock::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
