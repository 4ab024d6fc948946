use polystore::collection::{DocPath, UpdateOperation};
use polystore::common::{compare_for_sort, Value};
use polystore::doc;
use polystore_int_test::test_util::{cleanup, create_test_context, field_value, run_test, seeded_rng, EVENTS};
use rand::Rng;
use std::cmp::Ordering;

#[test]
fn test_increment_then_multiply_in_one_batch() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("hero");
                store.write(EVENTS, &path, doc! { exp: 100 })?;
                let changed = store.update_one(
                    EVENTS,
                    &path,
                    &[UpdateOperation::increment("exp", 50), UpdateOperation::multiply("exp", 2)],
                )?;
                assert!(changed);
                assert_eq!(field_value(&store, EVENTS, &path, "exp")?, Value::F64(300.0));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_increment_widens_numeric_kind() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("counter");
                store.write(EVENTS, &path, doc! { small: 1, big: (i32::MAX), mixed: 2 })?;
                store.update_one(
                    EVENTS,
                    &path,
                    &[
                        UpdateOperation::increment("small", 1),
                        UpdateOperation::increment("big", 1),
                        UpdateOperation::increment("mixed", 0.5),
                        UpdateOperation::increment("fresh", 7i64),
                    ],
                )?;
                assert_eq!(field_value(&store, EVENTS, &path, "small")?, Value::I32(2));
                assert_eq!(field_value(&store, EVENTS, &path, "big")?, Value::I64(i32::MAX as i64 + 1));
                assert_eq!(field_value(&store, EVENTS, &path, "mixed")?, Value::F64(2.5));
                assert_eq!(field_value(&store, EVENTS, &path, "fresh")?, Value::I64(7));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_min_max_are_monotonic() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("bounds");
                store.write(EVENTS, &path, doc! {})?;
                let mut rng = seeded_rng(71);
                let mut low = Value::Null;
                let mut high = Value::Null;

                for _ in 0..100 {
                    let sample: i64 = rng.random_range(-1000..1000);
                    store.update_one(
                        EVENTS,
                        &path,
                        &[UpdateOperation::min("low", sample), UpdateOperation::max("high", sample)],
                    )?;

                    let next_low = field_value(&store, EVENTS, &path, "low")?;
                    let next_high = field_value(&store, EVENTS, &path, "high")?;
                    if !low.is_null() {
                        assert_ne!(compare_for_sort(&next_low, &low), Ordering::Greater);
                        assert_ne!(compare_for_sort(&next_high, &high), Ordering::Less);
                    }
                    assert_ne!(compare_for_sort(&next_low, &Value::I64(sample)), Ordering::Greater);
                    assert_ne!(compare_for_sort(&next_high, &Value::I64(sample)), Ordering::Less);
                    low = next_low;
                    high = next_high;
                }
            }
            Ok(())
        },
        cleanup,
    )
}
