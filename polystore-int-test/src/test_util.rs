use fake::faker::name::en::Name;
use fake::Fake;
use polystore::collection::{DocPath, Document};
use polystore::common::Value;
use polystore::doc;
use polystore::errors::{ErrorKind, StoreError, StoreResult};
use polystore::filter::{and, field, or, Condition};
use polystore::store::{DocumentStore, InMemoryStore, KeyValueStore, StoreProvider};
use polystore::store_builder::StoreBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::backtrace::Backtrace;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const PLAYERS: &str = "players";
pub const EVENTS: &str = "events";
pub const PLAYER_INDEXES: [&str; 4] = ["level", "active", "name", "stats.score"];

/// Runs a test with retry logic and error handling.
/// The test body runs on the current thread; `after` runs even when the
/// body returns an error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StoreResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx).map_err(|e| {
                        (format!("After run failed: {:?}", e), backtrace.to_string())
                    }),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    log::warn!("Retrying after attempt {} failed: {}", attempt, e);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                let message = format!("Panic: {}", err_msg);
                last_backtrace = Some(Backtrace::capture().to_string());

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("{}", message);
                    log::warn!("Retrying after attempt {} panicked: {}", attempt, message);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
                last_error = Some(message);
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// The same collections opened on two backends: the indexed in-memory store
/// and a key-value store that answers everything through the fallback path.
#[derive(Clone)]
pub struct TestContext {
    memory: InMemoryStore,
    indexed: DocumentStore,
    fallback: DocumentStore,
}

impl TestContext {
    pub fn new(memory: InMemoryStore, fallback: DocumentStore) -> Self {
        Self {
            indexed: DocumentStore::from(memory.clone()),
            memory,
            fallback,
        }
    }

    /// The native backend, for inherent diagnostics like `explain`.
    pub fn memory(&self) -> InMemoryStore {
        self.memory.clone()
    }

    /// The native backend behind the facade.
    pub fn indexed(&self) -> DocumentStore {
        self.indexed.clone()
    }

    /// The capability-less backend behind the facade.
    pub fn fallback(&self) -> DocumentStore {
        self.fallback.clone()
    }

    pub fn stores(&self) -> [DocumentStore; 2] {
        [self.indexed(), self.fallback()]
    }
}

fn builder() -> StoreBuilder {
    StoreBuilder::new()
        .collection(PLAYERS, &PLAYER_INDEXES)
        .collection(EVENTS, &[])
}

pub fn create_test_context() -> StoreResult<TestContext> {
    let memory = builder().open()?;
    let fallback = builder().open_with(KeyValueStore::new)?;
    Ok(TestContext::new(memory, fallback))
}

pub fn cleanup(ctx: TestContext) -> StoreResult<()> {
    for store in ctx.stores() {
        for collection in store.list_collections()? {
            store.delete_all(&collection)?;
            if store.count(&collection)? != 0 {
                return Err(StoreError::new(
                    &format!("Collection {} not empty after cleanup", collection),
                    ErrorKind::InternalError,
                ));
            }
        }
    }
    Ok(())
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn player_path(i: usize) -> DocPath {
    DocPath::from(format!("p{:04}", i))
}

/// A player with a level in `0..20`, a random active flag, a score in
/// `0..1000`, a couple of tags and an account id.
pub fn random_player(rng: &mut StdRng) -> Document {
    let name: String = Name().fake_with_rng(rng);
    let tags: Vec<&str> = ["pvp", "pve", "guild", "solo"]
        .into_iter()
        .filter(|_| rng.random_bool(0.4))
        .collect();
    doc! {
        name: name,
        level: (rng.random_range(0..20i32)),
        active: (rng.random_bool(0.5)),
        stats: { score: (rng.random_range(0..1000i64)) },
        tags: tags,
        account: (Value::Id(Uuid::from_u128(rng.random()))),
    }
}

/// Like [random_player] but some documents miss fields or carry values of an
/// unexpected type, which leaves the affected indexes unable to answer.
pub fn random_irregular_player(rng: &mut StdRng) -> Document {
    let mut document = random_player(rng);
    match rng.random_range(0..10) {
        0 => {
            document.remove("level");
        }
        1 => {
            document.put("level", "unranked");
        }
        2 => {
            document.put("level", rng.random_range(0..20i32) as f64 + 0.5);
        }
        3 => {
            document.remove("stats");
        }
        _ => {}
    }
    document
}

/// Writes `count` generated players to `collection` of every store given;
/// each store receives identical documents.
pub fn seed_players(
    stores: &[DocumentStore],
    collection: &str,
    count: usize,
    seed: u64,
    generator: fn(&mut StdRng) -> Document,
) -> StoreResult<Vec<(DocPath, Document)>> {
    let mut rng = seeded_rng(seed);
    let mut written = Vec::with_capacity(count);
    for i in 0..count {
        let path = player_path(i);
        let document = generator(&mut rng);
        for store in stores {
            store.write(collection, &path, document.clone())?;
        }
        written.push((path, document));
    }
    Ok(written)
}

/// A random condition tree of at most `depth` combinator levels over the
/// generated player fields.
pub fn random_condition(rng: &mut StdRng, depth: usize) -> Condition {
    if depth == 0 || rng.random_bool(0.35) {
        return random_leaf(rng);
    }
    let width = rng.random_range(2..4);
    let children = (0..width).map(|_| random_condition(rng, depth - 1)).collect();
    if rng.random_bool(0.5) {
        and(children)
    } else {
        or(children)
    }
}

fn random_leaf(rng: &mut StdRng) -> Condition {
    let level: i32 = rng.random_range(0..20);
    match rng.random_range(0..11) {
        0 => field("level").eq(level),
        1 => field("level").gt(level),
        2 => field("level").gte(level),
        3 => field("level").lt(level),
        4 => field("level").lte(level),
        5 => field("level").between(level, level + rng.random_range(0..6)),
        6 => field("level").in_array(vec![level, (level + 7) % 20, (level + 13) % 20]),
        7 => field("active").eq(rng.random_bool(0.5)),
        8 => field("stats.score").lt(rng.random_range(0..1000i64)),
        9 => field("tags").contains("guild"),
        _ => {
            let initial = ['A', 'C', 'J', 'M', 'S'][rng.random_range(0..5)];
            field("name").starts_with(&initial.to_string())
        }
    }
}

/// Result paths in path order, for comparing backends.
pub fn sorted_paths(results: Vec<(DocPath, Document)>) -> Vec<DocPath> {
    let mut paths: Vec<DocPath> = results.into_iter().map(|(path, _)| path).collect();
    paths.sort();
    paths
}

/// Reads one field of a stored document.
pub fn field_value(store: &DocumentStore, collection: &str, path: &DocPath, field: &str) -> StoreResult<Value> {
    let separator = store.provider().field_separator().to_string();
    Ok(store
        .get(collection, path)?
        .and_then(|document| document.get_path(field, &separator).cloned())
        .unwrap_or_default())
}
