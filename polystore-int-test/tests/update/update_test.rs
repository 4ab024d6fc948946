use chrono::DateTime;
use polystore::collection::{filter_by, DocPath, UpdateOperation};
use polystore::common::Value;
use polystore::doc;
use polystore::errors::ErrorKind;
use polystore::filter::field;
use polystore_int_test::test_util::{cleanup, create_test_context, field_value, run_test, EVENTS, PLAYERS};

#[test]
fn test_update_one_family() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("hero");
                store.write(PLAYERS, &path, doc! { name: "hero", level: 1 })?;

                assert!(store.update_one(PLAYERS, &path, &[UpdateOperation::set("level", 2)])?);
                assert!(!store.update_one(PLAYERS, &path, &[UpdateOperation::set("level", 2)])?);

                let before = store.get_and_update_one(PLAYERS, &path, &[UpdateOperation::increment("level", 3)])?;
                assert_eq!(before, Some(doc! { name: "hero", level: 2 }));

                let after = store.update_one_and_get(PLAYERS, &path, &[UpdateOperation::unset("name")])?;
                assert_eq!(after, Some(doc! { level: 5 }));

                let ghost = DocPath::from("ghost");
                assert!(!store.update_one(PLAYERS, &ghost, &[UpdateOperation::set("level", 1)])?);
                assert_eq!(store.update_one_and_get(PLAYERS, &ghost, &[UpdateOperation::set("level", 1)])?, None);
                assert!(!store.exists(PLAYERS, &ghost)?);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_by_condition_counts_changed_documents() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for i in 0..20 {
                    store.write(PLAYERS, &DocPath::from(format!("u{:02}", i)), doc! { level: i, active: false })?;
                }

                let changed = store.update(PLAYERS, &field("level").lt(10), &[UpdateOperation::set("active", true)])?;
                assert_eq!(changed, 10);

                let changed = store.update(PLAYERS, &field("level").lt(10), &[UpdateOperation::set("active", true)])?;
                assert_eq!(changed, 0);

                let changed = store.update(PLAYERS, &field("level").gte(100), &[UpdateOperation::set("active", true)])?;
                assert_eq!(changed, 0);

                let active = store.find(PLAYERS, &filter_by(field("active").eq(true)))?;
                assert_eq!(active.len(), 10);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_updated_fields_are_visible_to_indexed_queries() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.indexed();
            for i in 0..30 {
                store.write(PLAYERS, &DocPath::from(format!("r{:02}", i)), doc! { level: i, stats: { score: 0 } })?;
            }

            store.update(PLAYERS, &field("level").gte(25), &[UpdateOperation::set("stats.score", 900)])?;
            let condition = field("stats.score").gt(500);
            assert!(!ctx.memory().explain(PLAYERS, &condition)?.is_full_scan());
            assert_eq!(store.find(PLAYERS, &filter_by(condition))?.len(), 5);

            store.update(PLAYERS, &field("level").eq(29), &[UpdateOperation::unset("stats.score")])?;
            assert_eq!(store.find(PLAYERS, &filter_by(field("stats.score").gt(500)))?.len(), 4);

            store.update(PLAYERS, &field("level").eq(28), &[UpdateOperation::set("stats", "hidden")])?;
            assert_eq!(store.find(PLAYERS, &filter_by(field("stats.score").gt(500)))?.len(), 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_batches_change_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("acct");
                store.write(EVENTS, &path, doc! { balance: 10, history: "none" })?;

                let err = store.update_one(
                    EVENTS,
                    &path,
                    &[UpdateOperation::increment("balance", 1), UpdateOperation::multiply("balance", 2)],
                );
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::InvalidOperation);

                let err = store.update_one(EVENTS, &path, &[UpdateOperation::increment("balance", "one")]);
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::InvalidDataType);

                let err = store.update_one(EVENTS, &path, &[UpdateOperation::set("", 1)]);
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::InvalidOperation);

                let err = store.update_one(
                    EVENTS,
                    &path,
                    &[UpdateOperation::increment("balance", 5), UpdateOperation::push("history", "deposit")],
                );
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::InvalidDataType);

                assert_eq!(store.get(EVENTS, &path)?, Some(doc! { balance: 10, history: "none" }));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_current_date_and_set_on_nested_path() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                let path = DocPath::from("session");
                store.write(EVENTS, &path, doc! { user: "kim" })?;
                store.update_one(
                    EVENTS,
                    &path,
                    &[
                        UpdateOperation::current_date("audit.touched_at"),
                        UpdateOperation::set("audit.by", "system"),
                    ],
                )?;

                let stamp = field_value(&store, EVENTS, &path, "audit.touched_at")?;
                let parsed = stamp.as_str().map(DateTime::parse_from_rfc3339);
                assert!(matches!(parsed, Some(Ok(_))));
                assert_eq!(field_value(&store, EVENTS, &path, "audit.by")?, Value::from("system"));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_by_and_delete_all() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                for i in 0..12 {
                    store.write(PLAYERS, &DocPath::from(format!("d{:02}", i)), doc! { level: (i % 4) })?;
                }
                assert_eq!(store.delete_by(PLAYERS, &field("level").eq(0))?, 3);
                assert_eq!(store.delete_by(PLAYERS, &field("level").eq(0))?, 0);
                assert_eq!(store.count(PLAYERS)?, 9);
                assert!(!store.exists(PLAYERS, &DocPath::from("d04"))?);

                assert_eq!(store.delete_all(PLAYERS)?, 9);
                assert_eq!(store.count(PLAYERS)?, 0);
                assert!(store.find(PLAYERS, &filter_by(field("level").gte(0)))?.is_empty());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_deleted_documents_release_their_locks() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.indexed();
            for i in 0..10 {
                let path = DocPath::from(format!("l{}", i));
                store.write(PLAYERS, &path, doc! { level: i })?;
                store.update_one(PLAYERS, &path, &[UpdateOperation::increment("level", 1)])?;
            }
            store.delete_by(PLAYERS, &field("level").lte(5))?;
            for i in 5..10 {
                store.delete(PLAYERS, &DocPath::from(format!("l{}", i)))?;
            }
            assert!(!store.update_one(PLAYERS, &DocPath::from("l3"), &[UpdateOperation::set("level", 0)])?);
            assert_eq!(store.count(PLAYERS)?, 0);
            assert_eq!(ctx.memory().lock_count(PLAYERS)?, 0);
            Ok(())
        },
        cleanup,
    )
}
