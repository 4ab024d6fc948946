use crate::collection::{DocPath, Document, FindOptions};
use crate::common::{compare_for_ordering, SortOrder, Value};
use crate::errors::StoreResult;
use crate::filter::{matches, Condition};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// The in-memory query pipeline: WHERE, ORDER BY, SKIP, LIMIT.
///
/// Works over any owned `(path, document)` sequence, so a backend without
/// native querying can hand over its raw documents and get the same result
/// the in-memory store produces.
pub(crate) struct ReadOperations<'a> {
    separator: &'a str,
}

impl<'a> ReadOperations<'a> {
    pub fn new(separator: &'a str) -> Self {
        ReadOperations { separator }
    }

    pub fn execute<I>(&self, documents: I, options: &FindOptions) -> StoreResult<Vec<(DocPath, Document)>>
    where
        I: IntoIterator<Item = (DocPath, Document)>,
    {
        let mut documents = self.filter(documents, options.condition())?;
        self.sort(&mut documents, options.sort_keys());
        Ok(paginate(documents, options.skip_count(), options.limit_count()))
    }

    /// Keeps the documents matching `condition`; all of them when `None`.
    pub fn filter<I>(&self, documents: I, condition: Option<&Condition>) -> StoreResult<Vec<(DocPath, Document)>>
    where
        I: IntoIterator<Item = (DocPath, Document)>,
    {
        let documents = documents.into_iter();
        let condition = match condition {
            Some(condition) => condition,
            None => return Ok(documents.collect()),
        };

        let mut result = Vec::new();
        for (path, document) in documents {
            if matches(condition, &document, self.separator)? {
                result.push((path, document));
            }
        }
        Ok(result)
    }

    /// Stable multi-key sort. The first key is primary and each later key
    /// only breaks ties left by the ones before it.
    ///
    /// Numeric strings sort with the numbers only for keys that hold at
    /// least one number.
    pub fn sort(&self, documents: &mut [(DocPath, Document)], sort_keys: &[(String, SortOrder)]) {
        if sort_keys.is_empty() {
            return;
        }
        let numeric_text: Vec<bool> = sort_keys
            .iter()
            .map(|(field, _)| {
                documents.iter().any(|(_, document)| {
                    document
                        .get_path(field, self.separator)
                        .is_some_and(Value::is_number)
                })
            })
            .collect();

        documents.sort_by(|(_, a), (_, b)| {
            sort_keys
                .iter()
                .zip(&numeric_text)
                .fold(Ordering::Equal, |ordering, ((field, order), numeric_text)| {
                    ordering.then_with(|| {
                        let left = a.get_path(field, self.separator).unwrap_or(&NULL);
                        let right = b.get_path(field, self.separator).unwrap_or(&NULL);
                        order.apply(compare_for_ordering(left, right, *numeric_text))
                    })
                })
        });
    }
}

pub(crate) fn paginate<T>(items: Vec<T>, skip: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let skip = skip.unwrap_or(0);
    match limit {
        Some(limit) => items.into_iter().skip(skip).take(limit).collect(),
        None => items.into_iter().skip(skip).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::order_by;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::field;

    fn players() -> Vec<(DocPath, Document)> {
        vec![
            (DocPath::from("a"), doc! { "name": "anna", "level": 3, "team": "red" }),
            (DocPath::from("b"), doc! { "name": "bert", "level": 1, "team": "blue" }),
            (DocPath::from("c"), doc! { "name": "cleo", "level": 3, "team": "blue" }),
            (DocPath::from("d"), doc! { "name": "dora", "team": "red" }),
            (DocPath::from("e"), doc! { "name": "emil", "level": 2, "team": "red" }),
        ]
    }

    fn names(documents: &[(DocPath, Document)]) -> Vec<String> {
        documents
            .iter()
            .map(|(_, doc)| doc.get("name").map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_filter_without_condition_keeps_everything() {
        let reader = ReadOperations::new(".");
        let result = reader.filter(players(), None).unwrap();
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_filter_absent_field_reads_as_null() {
        let reader = ReadOperations::new(".");
        let result = reader.filter(players(), Some(&field("level").eq(Value::Null))).unwrap();
        assert_eq!(names(&result), vec!["dora"]);
    }

    #[test]
    fn test_type_mismatch_propagates() {
        let reader = ReadOperations::new(".");
        let err = reader
            .filter(players(), Some(&field("team").eq(true)))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_sort_ties_broken_by_second_key() {
        let reader = ReadOperations::new(".");
        let options = order_by("level", SortOrder::Ascending).sort_by("name", SortOrder::Descending);
        let result = reader.execute(players(), &options).unwrap();
        assert_eq!(names(&result), vec!["bert", "emil", "cleo", "anna", "dora"]);
    }

    #[test]
    fn test_descending_only_reverses_its_key() {
        let reader = ReadOperations::new(".");
        let options = order_by("team", SortOrder::Descending).sort_by("name", SortOrder::Ascending);
        let result = reader.execute(players(), &options).unwrap();
        assert_eq!(names(&result), vec!["anna", "dora", "emil", "bert", "cleo"]);
    }

    #[test]
    fn test_null_sorts_last_ascending() {
        let reader = ReadOperations::new(".");
        let result = reader
            .execute(players(), &order_by("level", SortOrder::Ascending))
            .unwrap();
        assert_eq!(names(&result).last().map(String::as_str), Some("dora"));
    }

    #[test]
    fn test_mixed_kind_key_sorts_in_groups() {
        let reader = ReadOperations::new(".");
        let mut documents = vec![
            (DocPath::from("a"), doc! { "v": "10a" }),
            (DocPath::from("b"), doc! { "v": 10 }),
            (DocPath::from("c"), doc! { "v": "9" }),
            (DocPath::from("d"), doc! { "w": 1 }),
            (DocPath::from("e"), doc! { "v": "abc" }),
        ];
        reader.sort(&mut documents, &[("v".to_string(), SortOrder::Ascending)]);
        let paths: Vec<&str> = documents.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["c", "b", "a", "e", "d"]);
    }

    #[test]
    fn test_text_only_key_sorts_lexically() {
        let reader = ReadOperations::new(".");
        let mut documents = vec![
            (DocPath::from("a"), doc! { "v": "9" }),
            (DocPath::from("b"), doc! { "v": "10" }),
        ];
        reader.sort(&mut documents, &[("v".to_string(), SortOrder::Ascending)]);
        assert_eq!(documents[0].0, DocPath::from("b"));
    }

    #[test]
    fn test_skip_and_limit_apply_after_sort() {
        let reader = ReadOperations::new(".");
        let options = FindOptions::new()
            .filter(field("team").eq("red"))
            .sort_by("name", SortOrder::Descending)
            .skip(1)
            .limit(1);
        let result = reader.execute(players(), &options).unwrap();
        assert_eq!(names(&result), vec!["dora"]);
    }

    #[test]
    fn test_paginate_bounds() {
        assert_eq!(paginate(vec![1, 2, 3], Some(5), None), Vec::<i32>::new());
        assert_eq!(paginate(vec![1, 2, 3], None, Some(0)), Vec::<i32>::new());
        assert_eq!(paginate(vec![1, 2, 3], Some(1), Some(10)), vec![2, 3]);
    }
}
