use docstore::doc;
use docstore::errors::ErrorKind;
use docstore_int_test::test_util::{
    cleanup, create_numbered_docs, create_test_context, insert_test_documents, run_test,
};

#[test]
fn test_delete_one() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let result = collection.delete_one(&doc! { last_name: "ln2" })?;
            assert!(result.acknowledged);
            assert_eq!(result.deleted_count, 1);

            let remaining = collection.find(&doc! { last_name: "ln2" })?.collect_documents()?;
            assert_eq!(remaining.len(), 1);
            assert_eq!(remaining[0].get_str("first_name")?, "fn3");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_many_gte() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(200))?;
            let expected = collection.count_documents(&doc! { i: { "$gte": 100 } })?;

            let result = collection.delete_many(&doc! { i: { "$gte": 100 } })?;
            assert_eq!(result.deleted_count, expected);
            assert_eq!(result.deleted_count, 100);

            assert_eq!(collection.count_documents(&doc! { i: { "$gte": 100 } })?, 0);
            assert_eq!(collection.count_documents(&doc! { i: { "$lt": 100 } })?, 100);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_no_match() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            assert_eq!(collection.delete_one(&doc! { first_name: "fn9" })?.deleted_count, 0);
            assert_eq!(collection.delete_many(&doc! { age: { "$gt": 99 } })?.deleted_count, 0);
            assert_eq!(collection.count_documents(&doc! {})?, 3);

            // nothing to delete in a collection that was never written
            let missing = ctx.collection("missing")?;
            assert_eq!(missing.delete_many(&doc! {})?.deleted_count, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_all_then_reinsert() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&[doc! { _id: 1 }, doc! { _id: 2 }])?;

            assert_eq!(collection.delete_many(&doc! {})?.deleted_count, 2);
            assert_eq!(collection.count_documents(&doc! {})?, 0);

            // the ids are free again
            collection.insert_one(&doc! { _id: 1 })?;
            assert_eq!(collection.count_documents(&doc! {})?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_invalid_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection.delete_many(&doc! { "$where": "true" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            assert_eq!(collection.count_documents(&doc! {})?, 3);
            Ok(())
        },
        cleanup,
    )
}
