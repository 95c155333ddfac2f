use docstore::collection::InsertOneResult;
use docstore::common::{Value, ValueType};
use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::session::{Session, WriteConcern};
use docstore_int_test::test_util::{
    cleanup, create_numbered_docs, create_test_context, create_test_docs, instance, random_uri, run_test,
};

#[test]
fn test_insert() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let document = doc! {
                name: "MongoDB",
                "type": "database",
                count: 1,
                versions: ["v3.2", "v3.0", "v2.6"],
                info: { x: 203, y: 102 },
            };

            let result = collection.insert_one(&document)?;
            assert!(result.is_acknowledged());
            let id = result.object_id().expect("generated id is an object id");

            let found = collection.find_one(&doc! {})?.expect("one document");
            assert_eq!(found.get_str("name")?, "MongoDB");
            assert_eq!(found.get_object_id("_id")?, id);
            assert_eq!(found.get_array("versions")?.len(), 3);
            assert_eq!(found.get_document("info")?.get_i32("x")?, 203);

            // the caller's document is left untouched
            assert!(document.id().is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_ids_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let result = collection.insert_many(&create_numbered_docs(100))?;
            assert!(result.acknowledged);
            assert_eq!(result.len(), 100);
            assert!(result
                .inserted_ids
                .iter()
                .all(|id| id.value_type() == ValueType::ObjectId));

            let stored: Vec<(Value, i32)> = collection
                .find(&doc! {})?
                .map(|d| {
                    let d = d?;
                    Ok((d.get("_id").cloned().unwrap_or(Value::Null), d.get_i32("i")?))
                })
                .collect::<Result<_, docstore::DocStoreError>>()?;
            let ids: Vec<Value> = stored.iter().map(|(id, _)| id.clone()).collect();
            let numbers: Vec<i32> = stored.iter().map(|(_, i)| *i).collect();

            assert_eq!(ids, result.inserted_ids);
            assert_eq!(numbers, (0..100).collect::<Vec<i32>>());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_batch_hetero_docs() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let mut docs = create_test_docs();
            docs.push(doc! { test: "docstore test" });
            let result = collection.insert_many(&docs)?;
            assert_eq!(result.len(), 4);

            assert_eq!(collection.count_documents(&doc! {})?, 4);
            assert_eq!(collection.count_documents(&doc! { test: { "$exists": true } })?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_with_caller_id() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let result = collection.insert_one(&doc! { _id: "order-1", total: 10 })?;
            assert_eq!(
                result,
                InsertOneResult::AcknowledgedWithoutObjectId {
                    inserted_id: Value::from("order-1")
                }
            );
            assert!(result.object_id().is_none());
            assert_eq!(result.inserted_id(), Some(Value::from("order-1")));

            let err = collection.insert_one(&doc! { _id: "order-1" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert!(err.is_write_error());
            assert_eq!(collection.count_documents(&doc! {})?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_stops_at_duplicate() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;

            let docs = vec![doc! { _id: 1 }, doc! { _id: 2 }, doc! { _id: 1 }, doc! { _id: 3 }];
            let err = collection.insert_many(&docs).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            // ordered: the documents before the failure stay inserted
            assert_eq!(collection.count_documents(&doc! {})?, 2);
            assert!(collection.find_one(&doc! { _id: 3 })?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_empty_batch() {
    run_test(
        create_test_context,
        |ctx| {
            let err = ctx.collection("test")?.insert_many(&[]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_unacknowledged() {
    let session = Session::builder()
        .uri(&random_uri())
        .write_concern(WriteConcern::Unacknowledged)
        .connect(instance())
        .unwrap();
    let collection = session.database("test_db").unwrap().collection("test").unwrap();

    let result = collection.insert_one(&doc! { name: "MongoDB" }).unwrap();
    assert_eq!(result, InsertOneResult::Unacknowledged);
    assert!(result.inserted_id().is_none());

    let result = collection.insert_many(&create_numbered_docs(3)).unwrap();
    assert!(!result.acknowledged);
    assert!(result.is_empty());

    // applied, just not confirmed
    assert_eq!(collection.count_documents(&doc! {}).unwrap(), 4);
    session.close().unwrap();
}

#[test]
fn test_insert_unacknowledged_from_uri() {
    let session = Session::connect(instance(), &format!("{}/?w=0", random_uri())).unwrap();
    assert_eq!(session.config().write_concern(), WriteConcern::Unacknowledged);

    let collection = session.database("test_db").unwrap().collection("test").unwrap();
    let result = collection.insert_one(&doc! { _id: 1 }).unwrap();
    assert!(!result.is_acknowledged());

    // the duplicate fails in the store but the caller is not told
    let result = collection.insert_one(&doc! { _id: 1 }).unwrap();
    assert!(!result.is_acknowledged());
    assert_eq!(collection.count_documents(&doc! {}).unwrap(), 1);
}

#[test]
fn test_insert_after_close() {
    run_test(
        create_test_context,
        |ctx| {
            let collection = ctx.collection("test")?;
            ctx.session().close()?;

            let err = collection.insert_one(&doc! { a: 1 }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ConnectionError);
            assert!(err.is_connection_error());
            Ok(())
        },
        cleanup,
    )
}
