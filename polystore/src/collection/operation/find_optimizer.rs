use crate::collection::DocPath;
use crate::filter::{and, Condition};
use crate::index::PropertyIndex;
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// How a condition will be resolved against one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexPlan {
    /// No index can narrow the condition; every document is evaluated.
    FullScan,
    /// Only `candidates` can match. Those left after evaluating `remaining`
    /// (when present) are the result.
    Indexed {
        candidates: HashSet<DocPath>,
        remaining: Option<Condition>,
    },
}

impl IndexPlan {
    pub fn is_full_scan(&self) -> bool {
        matches!(self, IndexPlan::FullScan)
    }

    fn resolved(candidates: HashSet<DocPath>) -> IndexPlan {
        IndexPlan::Indexed {
            candidates,
            remaining: None,
        }
    }
}

impl Display for IndexPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexPlan::FullScan => write!(f, "full scan"),
            IndexPlan::Indexed {
                candidates,
                remaining: None,
            } => write!(f, "index lookup ({} candidates)", candidates.len()),
            IndexPlan::Indexed {
                candidates,
                remaining: Some(remaining),
            } => write!(
                f,
                "index lookup ({} candidates) then filter {}",
                candidates.len(),
                remaining
            ),
        }
    }
}

/// Decides which parts of a condition tree the declared indexes can answer.
pub(crate) struct FindOptimizer<'a> {
    indexes: &'a DashMap<String, Arc<PropertyIndex>>,
}

impl<'a> FindOptimizer<'a> {
    pub fn new(indexes: &'a DashMap<String, Arc<PropertyIndex>>) -> Self {
        FindOptimizer { indexes }
    }

    pub fn create_plan(&self, condition: &Condition) -> IndexPlan {
        let plan = self.plan(condition);
        log::debug!("Plan for {}: {}", condition, plan);
        plan
    }

    fn plan(&self, condition: &Condition) -> IndexPlan {
        match condition {
            Condition::Field { path, predicate } => {
                let index = match self.indexes.get(path) {
                    Some(index) => index.value().clone(),
                    None => return IndexPlan::FullScan,
                };
                match index.try_query(predicate) {
                    Some(candidates) => IndexPlan::resolved(candidates),
                    None => IndexPlan::FullScan,
                }
            }
            Condition::And(children) => self.plan_and(children),
            Condition::Or(children) => self.plan_or(children),
        }
    }

    fn plan_and(&self, children: &[Condition]) -> IndexPlan {
        let mut candidates: Option<HashSet<DocPath>> = None;
        let mut remaining = Vec::new();

        for child in children {
            match self.plan(child) {
                IndexPlan::FullScan => remaining.push(child.clone()),
                IndexPlan::Indexed {
                    candidates: found,
                    remaining: rest,
                } => {
                    let narrowed = match candidates.take() {
                        None => found,
                        Some(mut acc) => {
                            acc.retain(|path| found.contains(path));
                            acc
                        }
                    };
                    if narrowed.is_empty() {
                        return IndexPlan::resolved(narrowed);
                    }
                    candidates = Some(narrowed);
                    remaining.extend(rest);
                }
            }
        }

        match candidates {
            None => IndexPlan::FullScan,
            Some(candidates) => IndexPlan::Indexed {
                candidates,
                remaining: if remaining.is_empty() {
                    None
                } else {
                    Some(and(remaining))
                },
            },
        }
    }

    // A branch the indexes cannot fully resolve could contribute documents
    // outside any index bucket, so the union is only taken when none exists.
    fn plan_or(&self, children: &[Condition]) -> IndexPlan {
        let mut union = HashSet::new();
        for child in children {
            match self.plan(child) {
                IndexPlan::Indexed {
                    candidates,
                    remaining: None,
                } => union.extend(candidates),
                _ => return IndexPlan::FullScan,
            }
        }
        IndexPlan::resolved(union)
    }
}
