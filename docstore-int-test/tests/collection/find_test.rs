use docstore::collection::{limit_to, order_by, Document, FindOptions};
use docstore::doc;
use docstore::errors::{DocStoreResult, ErrorKind};
use docstore_int_test::test_util::{
    cleanup, create_numbered_docs, create_test_context, insert_test_documents, is_sorted, run_test,
};

fn numbers(documents: Vec<Document>) -> DocStoreResult<Vec<i32>> {
    documents.iter().map(|d| d.get_i32("i")).collect()
}

#[test]
fn test_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let documents = collection.find(&doc! {})?.collect_documents()?;
            assert_eq!(documents.len(), 3);
            let names: Vec<&str> = documents
                .iter()
                .map(|d| d.get_str("first_name"))
                .collect::<DocStoreResult<_>>()?;
            assert_eq!(names, vec!["fn1", "fn2", "fn3"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_on_missing_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("missing")?;
            assert!(collection.find_one(&doc! {})?.is_none());
            assert_eq!(collection.find(&doc! {})?.count(), 0);
            assert_eq!(collection.count_documents(&doc! {})?, 0);
            assert!(ctx.db().list_collection_names()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_point_query() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(100))?;

            let found = collection.find_one(&doc! { i: 71 })?.expect("i = 71 exists");
            assert_eq!(found.get_i32("i")?, 71);
            assert!(collection.find_one(&doc! { i: 171 })?.is_none());

            // natural order
            let first = collection.find_one(&doc! {})?.expect("collection is not empty");
            assert_eq!(first.get_i32("i")?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_range() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(100))?;

            let found = numbers(
                collection
                    .find(&doc! { i: { "$gt": 50, "$lte": 100 } })?
                    .collect_documents()?,
            )?;
            assert_eq!(found, (51..100).collect::<Vec<i32>>());

            let outside = numbers(
                collection
                    .find(&doc! { "$or": [{ i: { "$lte": 50 } }, { i: { "$gt": 100 } }] })?
                    .collect_documents()?,
            )?;
            assert_eq!(outside.len() + found.len(), 100);
            assert!(outside.iter().all(|i| !(50 < *i && *i <= 100)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_by_nested_field() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            assert_eq!(collection.count_documents(&doc! { "address.city": "Kolkata" })?, 2);
            assert_eq!(collection.count_documents(&doc! { "address.zip": { "$gte": 700000 } })?, 2);
            assert_eq!(collection.count_documents(&doc! { "address.country": { "$exists": false } })?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            assert_eq!(collection.count_documents(&doc! { last_name: "ln2" })?, 2);
            assert_eq!(collection.count_documents(&doc! { last_name: { "$ne": "ln2" } })?, 1);
            assert_eq!(collection.count_documents(&doc! { age: { "$in": [28, 45] } })?, 2);
            assert_eq!(collection.count_documents(&doc! { age: { "$nin": [28, 45] } })?, 1);
            assert_eq!(collection.count_documents(&doc! { list: { "$exists": true } })?, 2);
            assert_eq!(collection.count_documents(&doc! { body: { "$regex": "^quick" } })?, 1);
            assert_eq!(
                collection.count_documents(&doc! { body: { "$regex": "LOREM", "$options": "i" } })?,
                1
            );
            assert_eq!(
                collection.count_documents(&doc! { "$and": [{ last_name: "ln2" }, { age: { "$lt": 30 } }] })?,
                1
            );
            assert_eq!(
                collection.count_documents(&doc! { "$nor": [{ first_name: "fn1" }, { first_name: "fn2" }] })?,
                1
            );
            assert_eq!(collection.count_documents(&doc! { age: { "$not": { "$gt": 30 } } })?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_array_elements() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            // a scalar condition matches any element of an array field
            assert_eq!(collection.count_documents(&doc! { arr: 3 })?, 2);
            assert_eq!(collection.count_documents(&doc! { list: "three" })?, 2);
            assert_eq!(collection.count_documents(&doc! { arr: { "$gt": 8 } })?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_sort_skip_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(20))?;

            let descending = numbers(
                collection
                    .find_with_options(&doc! {}, &order_by(doc! { i: -1 }))?
                    .collect_documents()?,
            )?;
            assert_eq!(descending.len(), 20);
            assert!(is_sorted(descending.iter(), false));

            let page = numbers(
                collection
                    .find_with_options(
                        &doc! { i: { "$gte": 5 } },
                        &FindOptions::new().sort(doc! { i: 1 }).skip(3).limit(4),
                    )?
                    .collect_documents()?,
            )?;
            assert_eq!(page, vec![8, 9, 10, 11]);

            let limited = collection.find_with_options(&doc! {}, &limit_to(5))?.collect_documents()?;
            assert_eq!(limited.len(), 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_projection() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let options = FindOptions::new()
                .sort(doc! { age: 1 })
                .projection(doc! { _id: 0, first_name: 1, age: 1 });
            let documents = collection.find_with_options(&doc! {}, &options)?.collect_documents()?;
            assert_eq!(documents[0], doc! { first_name: "fn3", age: 28 });
            assert!(documents.iter().all(|d| d.len() == 2));

            let options = FindOptions::new().projection(doc! { body: 0, list: 0 });
            let first = collection
                .find_with_options(&doc! { first_name: "fn1" }, &options)?
                .collect_documents()?;
            assert!(!first[0].contains_key("body"));
            assert!(!first[0].contains_key("list"));
            assert!(first[0].contains_key("_id"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_invalid_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection.find(&doc! { age: { "$between": [1, 2] } }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            let err = collection.count_documents(&doc! { "$or": [] }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            let err = collection.find(&doc! { body: { "$regex": "(" } }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cursor_survives_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(10))?;

            let mut cursor = collection.find(&doc! {})?;
            let first = cursor.next().expect("ten documents")?;
            collection.delete_many(&doc! {})?;

            assert_eq!(first.get_i32("i")?, 0);
            assert_eq!(cursor.count(), 9);
            assert_eq!(collection.count_documents(&doc! {})?, 0);
            Ok(())
        },
        cleanup,
    )
}
