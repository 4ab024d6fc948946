use polystore::collection::{order_by, DocPath, Document, FindOptions};
use polystore::common::{compare_for_sort, SortOrder, Value};
use polystore::doc;
use polystore::filter::field;
use polystore_int_test::test_util::{
    cleanup, create_test_context, random_player, run_test, seed_players, seeded_rng, EVENTS, PLAYERS,
};
use rand::Rng;
use std::cmp::Ordering;

fn values(found: &[(DocPath, Document)], field: &str) -> Vec<Value> {
    found
        .iter()
        .map(|(_, document)| document.get_path(field, ".").cloned().unwrap_or_default())
        .collect()
}

fn is_sorted_by(values: &[Value], order: SortOrder) -> bool {
    values
        .windows(2)
        .all(|pair| order.apply(compare_for_sort(&pair[0], &pair[1])) != Ordering::Greater)
}

#[test]
fn test_sort_by_single_key() {
    run_test(
        create_test_context,
        |ctx| {
            seed_players(&ctx.stores(), PLAYERS, 80, 61, random_player)?;
            for store in ctx.stores() {
                for order in [SortOrder::Ascending, SortOrder::Descending] {
                    let found = store.find(PLAYERS, &order_by("stats.score", order))?;
                    assert_eq!(found.len(), 80);
                    assert!(is_sorted_by(&values(&found, "stats.score"), order));
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_later_keys_break_ties() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for seq in 0..30 {
                    let document = doc! { level: (seq % 3), seq: seq };
                    store.write(PLAYERS, &DocPath::from(format!("s{}", seq)), document)?;
                }

                let options = FindOptions::new()
                    .sort_by("level", SortOrder::Descending)
                    .sort_by("seq", SortOrder::Ascending);
                let found = store.find(PLAYERS, &options)?;
                let pairs: Vec<(i64, i64)> = found
                    .iter()
                    .filter_map(|(_, d)| Some((d.get("level")?.as_i64()?, d.get("seq")?.as_i64()?)))
                    .collect();

                let mut expected = pairs.clone();
                expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
                assert_eq!(pairs, expected);
                assert_eq!(pairs.first(), Some(&(2, 2)));
                assert_eq!(pairs.last(), Some(&(0, 27)));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_missing_sort_field_orders_last_ascending() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                store.write(PLAYERS, &DocPath::from("a"), doc! { level: 3 })?;
                store.write(PLAYERS, &DocPath::from("b"), doc! { name: "no level" })?;
                store.write(PLAYERS, &DocPath::from("c"), doc! { level: 1 })?;

                let found = store.find(PLAYERS, &order_by("level", SortOrder::Ascending))?;
                let paths: Vec<DocPath> = found.into_iter().map(|(p, _)| p).collect();
                assert_eq!(paths, vec![DocPath::from("c"), DocPath::from("a"), DocPath::from("b")]);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_filter_sort_skip_limit_pipeline() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for i in 0..50 {
                    store.write(PLAYERS, &DocPath::from(format!("x{}", i)), doc! { level: i, active: (i % 2 == 0) })?;
                }
                let options = FindOptions::new()
                    .filter(field("active").eq(true))
                    .sort_by("level", SortOrder::Descending)
                    .skip(3)
                    .limit(4);
                let found = store.find(PLAYERS, &options)?;
                assert_eq!(
                    values(&found, "level"),
                    vec![Value::I32(42), Value::I32(40), Value::I32(38), Value::I32(36)]
                );

                let past_end = store.find(PLAYERS, &FindOptions::new().skip(100))?;
                assert!(past_end.is_empty());

                let nothing = store.find(PLAYERS, &FindOptions::new().limit(0))?;
                assert!(nothing.is_empty());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_on_mixed_number_and_text_field() {
    run_test(
        create_test_context,
        |ctx| {
            let mut rng = seeded_rng(71);
            let documents: Vec<(DocPath, Document)> = (0..2000)
                .map(|i| {
                    let n = rng.random_range(0..100i32);
                    let value = match rng.random_range(0..3) {
                        0 => Value::I32(n),
                        1 => Value::from(n.to_string()),
                        _ => Value::from(format!("{}a", n)),
                    };
                    (DocPath::from(format!("m{:04}", i)), doc! { v: value })
                })
                .collect();

            let mut orders = Vec::new();
            for store in ctx.stores() {
                for (path, document) in &documents {
                    store.write(EVENTS, path, document.clone())?;
                }
                let options = order_by("v", SortOrder::Ascending);
                let first = store.find(EVENTS, &options)?;
                let second = store.find(EVENTS, &options)?;
                assert_eq!(first.len(), 2000);
                assert_eq!(values(&first, "v"), values(&second, "v"));

                let sorted = values(&first, "v");
                let split = sorted
                    .iter()
                    .position(|v| v.as_str().is_some_and(|text| text.ends_with('a')))
                    .unwrap_or(sorted.len());
                let (numeric, text) = sorted.split_at(split);

                let numbers: Vec<f64> = numeric
                    .iter()
                    .map(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok()).unwrap())
                    .collect();
                assert!(numbers.windows(2).all(|pair| pair[0] <= pair[1]));
                assert!(text.iter().all(|v| v.as_str().is_some_and(|t| t.ends_with('a'))));
                assert!(text.windows(2).all(|pair| pair[0].as_str() <= pair[1].as_str()));

                let descending = store.find(EVENTS, &order_by("v", SortOrder::Descending))?;
                let mut reversed = values(&descending, "v");
                reversed.reverse();
                let key = |items: &[Value]| items.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                let ascending_numbers: Vec<f64> = reversed[..split]
                    .iter()
                    .map(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok()).unwrap())
                    .collect();
                assert_eq!(ascending_numbers, numbers);
                assert_eq!(key(&reversed[split..]), key(text));

                orders.push(numbers);
            }
            assert_eq!(orders[0], orders[1]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_on_text_only_field_stays_lexical() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for (i, code) in ["9", "10", "abc", "100"].iter().enumerate() {
                    store.write(EVENTS, &DocPath::from(format!("c{}", i)), doc! { code: (*code) })?;
                }
                let found = store.find(EVENTS, &order_by("code", SortOrder::Ascending))?;
                assert_eq!(
                    values(&found, "code"),
                    vec![Value::from("10"), Value::from("100"), Value::from("9"), Value::from("abc")]
                );
            }
            Ok(())
        },
        cleanup,
    )
}
