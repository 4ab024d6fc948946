mod find_optimizer;
mod index_writer;
mod read_operations;
mod update_evaluator;

pub use find_optimizer::IndexPlan;
pub(crate) use find_optimizer::FindOptimizer;
pub(crate) use index_writer::*;
pub(crate) use read_operations::*;
pub(crate) use update_evaluator::*;
