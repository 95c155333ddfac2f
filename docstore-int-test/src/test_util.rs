use docstore::collection::{Collection, Document};
use docstore::errors::DocStoreResult;
use docstore::session::{Database, Session};
use docstore::{doc, Instance};
use std::backtrace::Backtrace;
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

static INSTANCE: LazyLock<Instance> =
    LazyLock::new(|| Instance::new().expect("the test process creates a single instance"));

/// The instance shared by every test of the process.
pub fn instance() -> &'static Instance {
    &INSTANCE
}

/// Runs a test with retry logic and error handling.
/// `after` runs even when the test fails, so its deployment is always released.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocStoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> DocStoreResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DocStoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            let ctx = before().map_err(|e| (format!("Before run failed: {:?}", e), backtrace.to_string()))?;
            match test(ctx.clone()) {
                Ok(_) => after(ctx).map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            }
        });

        let elapsed = start_time.elapsed();
        let failure = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_backtrace = Some(bt);
                e
            }
            Err(panic_err) => {
                last_backtrace = Some(Backtrace::capture().to_string());
                if let Some(s) = panic_err.downcast_ref::<&str>() {
                    format!("Panic: {}", s)
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    format!("Panic: {}", s)
                } else {
                    "Panic: unknown payload".to_string()
                }
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("{}", failure);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(failure);
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

/// A session on a deployment of its own, with a database to work in.
#[derive(Clone)]
pub struct TestContext {
    uri: String,
    session: Session,
    database: Database,
}

impl TestContext {
    pub fn new(uri: String, session: Session, database: Database) -> Self {
        Self {
            uri,
            session,
            database,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn session(&self) -> Session {
        self.session.clone()
    }

    pub fn db(&self) -> Database {
        self.database.clone()
    }

    pub fn collection(&self, name: &str) -> DocStoreResult<Collection> {
        self.database.collection(name)
    }
}

/// A `memory://` uri on a host no other test uses.
pub fn random_uri() -> String {
    format!("memory://{}:27017", uuid::Uuid::new_v4())
}

pub fn create_test_context() -> DocStoreResult<TestContext> {
    let uri = random_uri();
    let session = Session::builder()
        .uri(&uri)
        .app_name("docstore-int-test")
        .connect(instance())?;
    let database = session.database("test_db")?;
    Ok(TestContext::new(uri, session, database))
}

pub fn cleanup(ctx: TestContext) -> DocStoreResult<()> {
    if ctx.session().is_connected() {
        for name in ctx.db().list_collection_names()? {
            ctx.collection(&name)?.drop()?;
        }
    }
    ctx.session().close()
}

pub fn create_test_docs() -> Vec<Document> {
    let doc1 = doc! {
        first_name: "fn1",
        last_name: "ln1",
        age: 32,
        arr: [1, 2, 3],
        list: ["one", "two", "three"],
        address: { city: "Kolkata", zip: 700001 },
        body: "a quick brown fox jump over the lazy dog",
    };

    let doc2 = doc! {
        first_name: "fn2",
        last_name: "ln2",
        age: 45,
        arr: [3, 4, 3],
        list: ["three", "four", "five"],
        address: { city: "Mumbai", zip: 400001 },
        body: "quick hello world from docstore",
    };

    let doc3 = doc! {
        first_name: "fn3",
        last_name: "ln2",
        age: 28,
        arr: [9, 4, 8],
        address: { city: "Kolkata", zip: 700019 },
        body: "Lorem ipsum dolor sit amet, consectetur \
        adipiscing elit. Sed nunc mi, mattis ullamcorper \
        dignissim vitae, condimentum non lorem.",
    };

    vec![doc1, doc2, doc3]
}

pub fn insert_test_documents(collection: &Collection) -> DocStoreResult<()> {
    collection.insert_many(&create_test_docs())?;
    Ok(())
}

/// `{i: n}` for every `n` in `0..count`.
pub fn create_numbered_docs(count: i32) -> Vec<Document> {
    (0..count).map(|n| doc! { i: n }).collect()
}

pub fn is_sorted<T: PartialOrd>(iterable: impl IntoIterator<Item = T>, ascending: bool) -> bool {
    let mut iter = iterable.into_iter();
    if let Some(mut prev) = iter.next() {
        for current in iter {
            if ascending && prev > current || !ascending && prev < current {
                return false;
            }
            prev = current;
        }
    }
    true
}
