use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::index::{non_unique_index, unique_index, IndexModel, IndexOptions};
use docstore_int_test::test_util::{
    cleanup, create_numbered_docs, create_test_context, insert_test_documents, run_test,
};

#[test]
fn test_create_index() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            collection.insert_many(&create_numbered_docs(10))?;

            let name = collection.create_index(&IndexModel::from_keys(doc! { i: 1 }))?;
            assert_eq!(name, "i_1");

            let indexes = collection.list_indexes()?;
            let names: Vec<String> = indexes.iter().map(|index| index.name()).collect();
            assert_eq!(names, vec!["_id_".to_string(), "i_1".to_string()]);
            assert!(indexes[0].is_unique());
            assert!(!indexes[1].is_unique());

            // queries are unaffected
            assert_eq!(collection.count_documents(&doc! { i: { "$gte": 5 } })?, 5);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_create_index_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let model = IndexModel::new(doc! { last_name: 1, age: -1 }, non_unique_index());
            assert_eq!(collection.create_index(&model)?, "last_name_1_age_-1");
            assert_eq!(collection.create_index(&model)?, "last_name_1_age_-1");
            assert_eq!(collection.list_indexes()?.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_create_named_index() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let options = IndexOptions::new(Some("by_city"), false);
            let name = collection.create_index(&IndexModel::new(doc! { "address.city": 1 }, options))?;
            assert_eq!(name, "by_city");

            // same name, other keys
            let err = collection
                .create_index(&IndexModel::new(doc! { age: 1 }, non_unique_index().with_name("by_city")))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);

            // same keys, other name
            let err = collection
                .create_index(&IndexModel::from_keys(doc! { "address.city": 1 }))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_rejects_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index(&IndexModel::new(doc! { first_name: 1 }, unique_index()))?;

            let err = collection.insert_one(&doc! { first_name: "fn1" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert!(err.message().contains("E11000"));

            let err = collection
                .update_one(&doc! { first_name: "fn2" }, &doc! { "$set": { first_name: "fn3" } })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            // freeing a key makes it available again
            collection.delete_one(&doc! { first_name: "fn1" })?;
            collection.insert_one(&doc! { first_name: "fn1" })?;
            assert_eq!(collection.count_documents(&doc! {})?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_over_existing_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection
                .create_index(&IndexModel::new(doc! { last_name: 1 }, unique_index()))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(collection.list_indexes()?.len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_index_keys() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let err = collection.create_index(&IndexModel::from_keys(doc! {})).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);
            let err = collection.create_index(&IndexModel::from_keys(doc! { i: 2 })).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);
            let err = collection.create_index(&IndexModel::from_keys(doc! { i: "text" })).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_drop_removes_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index(&IndexModel::new(doc! { first_name: 1 }, unique_index()))?;

            collection.drop()?;
            assert!(collection.list_indexes()?.is_empty());
            assert_eq!(collection.count_documents(&doc! {})?, 0);

            // recreated without the unique index
            insert_test_documents(&collection)?;
            insert_test_documents(&collection)?;
            assert_eq!(collection.count_documents(&doc! { first_name: "fn1" })?, 2);
            Ok(())
        },
        cleanup,
    )
}
