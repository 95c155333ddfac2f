use docstore::doc;
use docstore::errors::DocStoreResult;
use docstore::index::IndexModel;
use docstore_int_test::test_util::{cleanup, create_test_context};

fn main() -> DocStoreResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let collection = ctx.collection("stress")?;

    let count = 100_000;
    let start = std::time::Instant::now();
    for _ in 0..count {
        collection.insert_one(&doc! {
            first_name: (uuid::Uuid::new_v4().to_string()),
            last_name: (uuid::Uuid::new_v4().to_string()),
            processed: false,
            failed: false,
        })?;
    }
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut processed = 0;
    for record in collection.find(&doc! { failed: false })? {
        if !record?.get_bool("processed")? {
            processed += 1;
        }
    }
    println!("Scanned {} records in {:?}", processed, start.elapsed());

    let start = std::time::Instant::now();
    let result = collection.update_many(&doc! {}, &doc! { "$set": { processed: true } })?;
    println!("Updated {} records in {:?}", result.modified_count, start.elapsed());

    let start = std::time::Instant::now();
    collection.create_index(&IndexModel::from_keys(doc! { first_name: 1 }))?;
    println!("Indexed first_name in {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let counted = collection.count_documents(&doc! { processed: true })?;
    println!("Counted {} processed records in {:?}", counted, start.elapsed());

    cleanup(ctx)
}
