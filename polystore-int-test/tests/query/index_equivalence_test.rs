use polystore::collection::{filter_by, DocPath, Document, UpdateOperation};
use polystore::errors::StoreResult;
use polystore::filter::{field, matches, Condition};
use polystore_int_test::test_util::{
    cleanup, create_test_context, player_path, random_condition, random_irregular_player, random_player, run_test,
    seed_players, seeded_rng, sorted_paths, TestContext, PLAYERS,
};
use rand::Rng;

fn expected_paths(written: &[(DocPath, Document)], condition: &Condition) -> StoreResult<Vec<DocPath>> {
    let mut paths = Vec::new();
    for (path, document) in written {
        if matches(condition, document, ".")? {
            paths.push(path.clone());
        }
    }
    paths.sort();
    Ok(paths)
}

fn assert_backends_agree(ctx: &TestContext, condition: &Condition, expected: &[DocPath]) -> StoreResult<()> {
    for store in ctx.stores() {
        let found = sorted_paths(store.find(PLAYERS, &filter_by(condition.clone()))?);
        assert_eq!(found, expected, "{} on {}", condition, store.capabilities());
    }
    Ok(())
}

#[test]
fn test_random_conditions_on_regular_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let written = seed_players(&ctx.stores(), PLAYERS, 200, 11, random_player)?;
            let mut rng = seeded_rng(12);
            let mut indexed_plans = 0;
            for _ in 0..150 {
                let condition = random_condition(&mut rng, 3);
                if !ctx.memory().explain(PLAYERS, &condition)?.is_full_scan() {
                    indexed_plans += 1;
                }
                let expected = expected_paths(&written, &condition)?;
                assert_backends_agree(&ctx, &condition, &expected)?;
            }
            assert!(indexed_plans > 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_random_conditions_on_irregular_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let written = seed_players(&ctx.stores(), PLAYERS, 200, 21, random_irregular_player)?;
            let mut rng = seeded_rng(22);
            for _ in 0..150 {
                let condition = random_condition(&mut rng, 3);
                let expected = expected_paths(&written, &condition)?;
                assert_backends_agree(&ctx, &condition, &expected)?;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_follows_writes_updates_and_deletes() {
    run_test(
        create_test_context,
        |ctx| {
            let mut written = seed_players(&ctx.stores(), PLAYERS, 120, 31, random_player)?;
            let mut rng = seeded_rng(32);

            for round in 0..200 {
                let i = rng.random_range(0..written.len());
                let path = written[i].0.clone();
                match round % 4 {
                    0 => {
                        let document = random_player(&mut rng);
                        for store in ctx.stores() {
                            store.write(PLAYERS, &path, document.clone())?;
                        }
                        written[i].1 = document;
                    }
                    1 => {
                        let operations = [UpdateOperation::increment("level", rng.random_range(-3..4))];
                        for store in ctx.stores() {
                            store.update_one(PLAYERS, &path, &operations)?;
                        }
                        let stored = ctx.fallback().get(PLAYERS, &path)?;
                        if let Some(document) = stored {
                            written[i].1 = document;
                        }
                    }
                    2 => {
                        let operations = [
                            UpdateOperation::set("stats.score", rng.random_range(0..1000i64)),
                            UpdateOperation::set("active", rng.random_bool(0.5)),
                        ];
                        for store in ctx.stores() {
                            store.update_one(PLAYERS, &path, &operations)?;
                        }
                        let stored = ctx.fallback().get(PLAYERS, &path)?;
                        if let Some(document) = stored {
                            written[i].1 = document;
                        }
                    }
                    _ => {
                        for store in ctx.stores() {
                            store.delete(PLAYERS, &path)?;
                        }
                        written.remove(i);
                        let replacement = player_path(1000 + round);
                        let document = random_player(&mut rng);
                        for store in ctx.stores() {
                            store.write(PLAYERS, &replacement, document.clone())?;
                        }
                        written.push((replacement, document));
                    }
                }
            }

            for _ in 0..100 {
                let condition = random_condition(&mut rng, 2);
                let expected = expected_paths(&written, &condition)?;
                assert_backends_agree(&ctx, &condition, &expected)?;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_or_union_is_sound() {
    run_test(
        create_test_context,
        |ctx| {
            let written = seed_players(&ctx.stores(), PLAYERS, 150, 41, random_irregular_player)?;
            let mut rng = seeded_rng(42);
            for _ in 0..50 {
                let left = random_condition(&mut rng, 1);
                let right = random_condition(&mut rng, 1);
                let condition = left.clone().or(right.clone());

                let mut union = expected_paths(&written, &left)?;
                union.extend(expected_paths(&written, &right)?);
                union.sort();
                union.dedup();

                assert_eq!(expected_paths(&written, &condition)?, union);
                assert_backends_agree(&ctx, &condition, &union)?;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_range_scan_boundaries() {
    run_test(
        create_test_context,
        |ctx| {
            let written = seed_players(&ctx.stores(), PLAYERS, 100, 51, random_player)?;
            for level in [0, 1, 10, 18, 19, 20] {
                for condition in [
                    field("level").gt(level),
                    field("level").gte(level),
                    field("level").lt(level),
                    field("level").lte(level),
                    field("level").between_inclusive(level, level + 2, false),
                    field("level").between(level - 1, level + 1),
                ] {
                    let expected = expected_paths(&written, &condition)?;
                    assert_backends_agree(&ctx, &condition, &expected)?;
                }
            }
            Ok(())
        },
        cleanup,
    )
}
