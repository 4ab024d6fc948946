use polystore::collection::{filter_by, DocPath, UpdateOperation};
use polystore::common::Value;
use polystore::doc;
use polystore::filter::field;
use polystore_int_test::test_util::{cleanup, create_test_context, field_value, run_test, EVENTS, PLAYERS};

#[test]
fn test_pull_removes_every_occurrence() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("tagged");
                store.write(EVENTS, &path, doc! { tags: ["a", "b", "a"] })?;

                assert!(store.update_one(EVENTS, &path, &[UpdateOperation::pull("tags", "a")])?);
                assert_eq!(store.get(EVENTS, &path)?, Some(doc! { tags: ["b"] }));

                assert!(!store.update_one(EVENTS, &path, &[UpdateOperation::pull("tags", "a")])?);
                assert_eq!(store.get(EVENTS, &path)?, Some(doc! { tags: ["b"] }));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_add_to_set_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("badges");
                store.write(EVENTS, &path, doc! { badges: ["first_win"] })?;
                let operation = UpdateOperation::add_all_to_set("badges", vec!["first_win", "streak", "streak"]);

                assert!(store.update_one(EVENTS, &path, &[operation.clone()])?);
                let once = store.get(EVENTS, &path)?;
                assert!(!store.update_one(EVENTS, &path, &[operation])?);
                assert_eq!(store.get(EVENTS, &path)?, once);
                assert_eq!(
                    field_value(&store, EVENTS, &path, "badges")?,
                    Value::from_vec(vec!["first_win", "streak"])
                );
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_push_and_pop_keep_order() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("queue");
                store.write(EVENTS, &path, doc! { name: "jobs" })?;

                store.update_one(EVENTS, &path, &[UpdateOperation::push_all("items", vec![1, 2, 3, 4])])?;
                store.update_one(EVENTS, &path, &[UpdateOperation::pop_first("items")])?;
                store.update_one(EVENTS, &path, &[UpdateOperation::pop_last("items")])?;
                store.update_one(EVENTS, &path, &[UpdateOperation::push("items", 9)])?;
                assert_eq!(
                    field_value(&store, EVENTS, &path, "items")?,
                    Value::from_vec(vec![2, 3, 9])
                );

                store.update_one(EVENTS, &path, &[UpdateOperation::pull_all("items", vec![2, 9])])?;
                store.update_one(EVENTS, &path, &[UpdateOperation::pop_last("items")])?;
                assert!(!store.update_one(EVENTS, &path, &[UpdateOperation::pop_first("items")])?);
                assert_eq!(field_value(&store, EVENTS, &path, "items")?, Value::Array(vec![]));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_array_updates_keep_contains_queries_correct() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for i in 0..10 {
                    store.write(PLAYERS, &DocPath::from(format!("t{}", i)), doc! { level: i, tags: ["solo"] })?;
                }
                let changed = store.update(
                    PLAYERS,
                    &field("level").lt(4),
                    &[UpdateOperation::add_to_set("tags", "guild")],
                )?;
                assert_eq!(changed, 4);
                assert_eq!(store.find(PLAYERS, &filter_by(field("tags").contains("guild")))?.len(), 4);

                let changed = store.update(
                    PLAYERS,
                    &field("tags").contains("guild"),
                    &[UpdateOperation::pull("tags", "solo")],
                )?;
                assert_eq!(changed, 4);
                assert_eq!(store.find(PLAYERS, &filter_by(field("tags").contains("solo")))?.len(), 6);
            }
            Ok(())
        },
        cleanup,
    )
}
