use polystore::collection::{filter_by, DocPath, FindOptions, IndexPlan};
use polystore::common::Value;
use polystore::doc;
use polystore::errors::ErrorKind;
use polystore::filter::{and, field, or, Condition};
use polystore::store::DocumentStore;
use polystore_int_test::test_util::{
    cleanup, create_test_context, player_path, random_player, run_test, seed_players, sorted_paths, EVENTS,
    PLAYERS,
};

fn insert_levels(store: &DocumentStore) -> polystore::errors::StoreResult<()> {
    for i in 0..100 {
        let document = doc! {
            level: (i as i32),
            active: (i == 15 || i == 85),
            description: (format!("desc_{}", i)),
        };
        store.write(PLAYERS, &player_path(i), document)?;
    }
    Ok(())
}

#[test]
fn test_find_by_indexed_and_unindexed_fields() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                insert_levels(&store)?;

                let found = store.find(PLAYERS, &filter_by(field("level").eq(15).and(field("active").eq(true))))?;
                assert_eq!(sorted_paths(found), vec![player_path(15)]);

                let found = store.find(PLAYERS, &filter_by(field("level").eq(15).or(field("active").eq(true))))?;
                assert_eq!(sorted_paths(found), vec![player_path(15), player_path(85)]);

                let found = store.find(PLAYERS, &filter_by(field("description").eq("desc_7")))?;
                assert_eq!(sorted_paths(found), vec![player_path(7)]);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explain_reports_the_chosen_path() {
    run_test(
        create_test_context,
        |ctx| {
            insert_levels(&ctx.indexed())?;
            let memory = ctx.memory();

            let plan = memory.explain(PLAYERS, &field("level").eq(15).and(field("active").eq(true)))?;
            match plan {
                IndexPlan::Indexed { candidates, remaining } => {
                    assert_eq!(candidates.len(), 1);
                    assert!(candidates.contains(&player_path(15)));
                    assert!(remaining.is_none());
                }
                IndexPlan::FullScan => panic!("expected an index lookup"),
            }

            let plan = memory.explain(PLAYERS, &field("level").eq(15).or(field("active").eq(true)))?;
            assert!(!plan.is_full_scan());

            let plan = memory.explain(PLAYERS, &field("level").lt(10).and(field("description").eq("desc_3")))?;
            match plan {
                IndexPlan::Indexed { candidates, remaining } => {
                    assert_eq!(candidates.len(), 10);
                    assert_eq!(remaining, Some(field("description").eq("desc_3")));
                }
                IndexPlan::FullScan => panic!("expected an index lookup"),
            }

            let plan = memory.explain(PLAYERS, &field("description").eq("desc_7"))?;
            assert!(plan.is_full_scan());
            assert_eq!(plan.to_string(), "full scan");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_or_with_unindexed_branch_falls_back_to_scan() {
    run_test(
        create_test_context,
        |ctx| {
            insert_levels(&ctx.indexed())?;
            let condition = field("level").eq(3).or(field("description").eq("desc_42"));
            assert!(ctx.memory().explain(PLAYERS, &condition)?.is_full_scan());

            let found = ctx.indexed().find(PLAYERS, &filter_by(condition))?;
            assert_eq!(sorted_paths(found), vec![player_path(3), player_path(42)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_intersection_returns_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                insert_levels(&store)?;
                let condition = and(vec![
                    field("level").eq(15),
                    field("level").eq(16),
                    field("description").eq("desc_15"),
                ]);
                assert!(store.find(PLAYERS, &filter_by(condition))?.is_empty());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_on_nested_indexed_field() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                store.write(PLAYERS, &DocPath::from("a"), doc! { stats: { score: 10 } })?;
                store.write(PLAYERS, &DocPath::from("b"), doc! { stats: { score: 250 } })?;
                store.write(PLAYERS, &DocPath::from("c"), doc! { stats: { rank: 1 } })?;
                store.write(PLAYERS, &DocPath::from("d"), doc! { stats: "none" })?;

                let found = store.find(PLAYERS, &filter_by(field("stats.score").gte(100)))?;
                assert_eq!(sorted_paths(found), vec![DocPath::from("b")]);

                let found = store.find(PLAYERS, &filter_by(field("stats.score").eq(Value::Null)))?;
                assert_eq!(sorted_paths(found), vec![DocPath::from("c"), DocPath::from("d")]);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_all_without_condition() {
    run_test(
        create_test_context,
        |ctx| {
            let written = seed_players(&ctx.stores(), PLAYERS, 25, 7, random_player)?;
            for store in ctx.stores() {
                let found = store.find(PLAYERS, &FindOptions::new())?;
                assert_eq!(found.len(), written.len());
                for (path, document) in found {
                    let expected = written.iter().find(|(p, _)| *p == path).map(|(_, d)| d);
                    assert_eq!(expected, Some(&document));
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_late_index_answers_existing_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.indexed();
            insert_levels(&store)?;
            let condition = field("description").in_array(vec!["desc_1", "desc_99", "desc_500"]);
            assert!(ctx.memory().explain(PLAYERS, &condition)?.is_full_scan());

            store.register_collection(PLAYERS, &["description"])?;
            assert!(!ctx.memory().explain(PLAYERS, &condition)?.is_full_scan());

            let found = store.find(PLAYERS, &filter_by(condition))?;
            assert_eq!(sorted_paths(found), vec![player_path(1), player_path(99)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_queries_are_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            for store in ctx.stores() {
                store.write(EVENTS, &DocPath::from("e1"), doc! { kind: "login" })?;

                let err = store.find(EVENTS, &filter_by(Condition::And(vec![field("kind").eq("login")])));
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::FilterError);

                let err = store.find(EVENTS, &filter_by(or(vec![])));
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::FilterError);

                let err = store.find(EVENTS, &filter_by(field("kind").regex("[unclosed")));
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::FilterError);

                let err = store.find(EVENTS, &filter_by(field("kind").eq(true)));
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::TypeMismatch);

                let err = store.find("missing", &FindOptions::new());
                assert_eq!(err.unwrap_err().kind(), &ErrorKind::CollectionNotFound);
            }
            Ok(())
        },
        cleanup,
    )
}
