use docstore::collection::upsert;
use docstore::common::Value;
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore_int_test::test_util::{
    cleanup, create_numbered_docs, create_test_context, insert_test_documents, run_test,
};

#[test]
fn test_update_one() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(100))?;

            let result = collection.update_one(&doc! { i: 10 }, &doc! { "$set": { i: 110 } })?;
            assert!(result.acknowledged);
            assert_eq!(result.matched_count, 1);
            assert_eq!(result.modified_count, 1);
            assert!(result.upserted_id.is_none());

            assert!(collection.find_one(&doc! { i: 10 })?.is_none());
            assert!(collection.find_one(&doc! { i: 110 })?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_one_touches_first_match_only() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let result = collection.update_one(&doc! { last_name: "ln2" }, &doc! { "$set": { flagged: true } })?;
            assert_eq!(result.matched_count, 1);
            assert_eq!(collection.count_documents(&doc! { flagged: true })?, 1);

            let flagged = collection.find_one(&doc! { flagged: true })?.expect("one flagged document");
            assert_eq!(flagged.get_str("first_name")?, "fn2");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many_inc() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(150))?;
            let before: Vec<(Value, i32)> = collection
                .find(&doc! {})?
                .collect_documents()?
                .iter()
                .map(|d| Ok((d.get("_id").cloned().unwrap_or(Value::Null), d.get_i32("i")?)))
                .collect::<docstore::DocStoreResult<_>>()?;

            let result = collection.update_many(&doc! { i: { "$lt": 100 } }, &doc! { "$inc": { i: 100 } })?;
            assert_eq!(result.matched_count, 100);
            assert_eq!(result.modified_count, 100);

            for (id, old) in before {
                let document = collection.find_one(&doc! { _id: id })?.expect("no document was removed");
                let new = document.get_i32("i")?;
                if old < 100 {
                    assert_eq!(new, old + 100);
                } else {
                    assert_eq!(new, old);
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_operators() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            collection.update_one(
                &doc! { first_name: "fn1" },
                &doc! {
                    "$set": { "address.country": "India" },
                    "$unset": { body: "" },
                    "$mul": { age: 2 },
                    "$push": { list: "four" },
                },
            )?;

            let updated = collection.find_one(&doc! { first_name: "fn1" })?.expect("fn1 exists");
            assert_eq!(updated.get_document("address")?.get_str("country")?, "India");
            assert_eq!(updated.get_document("address")?.get_str("city")?, "Kolkata");
            assert!(!updated.contains_key("body"));
            assert_eq!(updated.get_i32("age")?, 64);
            assert_eq!(updated.get_array("list")?.len(), 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_without_change() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let result = collection.update_many(&doc! { last_name: "ln2" }, &doc! { "$set": { last_name: "ln2" } })?;
            assert_eq!(result.matched_count, 2);
            assert_eq!(result.modified_count, 0);

            let result = collection.update_many(&doc! { last_name: "ln9" }, &doc! { "$set": { age: 1 } })?;
            assert_eq!(result.matched_count, 0);
            assert_eq!(result.modified_count, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(3))?;

            let result = collection.update_one_with_options(
                &doc! { i: 42 },
                &doc! { "$set": { tag: "new" } },
                &upsert(),
            )?;
            assert_eq!(result.matched_count, 0);
            let upserted = result.upserted_id.expect("the upsert inserted a document");
            assert!(upserted.as_object_id().is_some());

            let inserted = collection.find_one(&doc! { _id: upserted })?.expect("upserted document");
            assert_eq!(inserted.get_i32("i")?, 42);
            assert_eq!(inserted.get_str("tag")?, "new");

            // a match updates instead of inserting
            let result = collection.update_many_with_options(
                &doc! { i: { "$lt": 3 } },
                &doc! { "$set": { tag: "old" } },
                &upsert(),
            )?;
            assert_eq!(result.matched_count, 3);
            assert!(result.upserted_id.is_none());
            assert_eq!(collection.count_documents(&doc! {})?, 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_updates() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection.update_one(&doc! {}, &doc! { first_name: "replaced" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UpdateError);
            assert!(err.is_write_error());

            let err = collection.update_many(&doc! {}, &doc! { "$set": { _id: 1 } }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UpdateError);

            let err = collection.update_many(&doc! {}, &doc! { "$inc": { first_name: 1 } }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UpdateError);

            // the rejected updates left every document as it was
            assert_eq!(collection.count_documents(&doc! { first_name: { "$in": ["fn1", "fn2", "fn3"] } })?, 3);
            Ok(())
        },
        cleanup,
    )
}
