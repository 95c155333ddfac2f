use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::session::{Session, WriteConcern};
use docstore_int_test::test_util::{cleanup, create_test_context, instance, random_uri, run_test};

#[test]
fn test_end_to_end() {
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
            assert!(result.object_id().is_some());

            let found = collection.find_one(&doc! {})?.expect("the inserted document");
            assert_eq!(found.get_str("name")?, "MongoDB");
            assert_eq!(found.get_str("count").unwrap_err().kind(), &ErrorKind::TypeMismatch);
            assert_eq!(found.get_i64("count").unwrap_err().kind(), &ErrorKind::TypeMismatch);
            assert_eq!(found.get_str("missing").unwrap_err().kind(), &ErrorKind::NotFound);

            let json = found.to_json()?;
            assert!(json.contains("\"$oid\""));
            assert!(json.contains("\"name\":\"MongoDB\""));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sessions_share_a_deployment() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.collection("test")?.insert_one(&doc! { a: 1 })?;

            let other = Session::connect(instance(), ctx.uri())?;
            let seen = other.database("test_db")?.collection("test")?;
            assert_eq!(seen.count_documents(&doc! { a: 1 })?, 1);

            // a different host is a different deployment
            let elsewhere = Session::connect(instance(), &random_uri())?;
            assert!(elsewhere.list_database_names()?.is_empty());

            other.close()?;
            elsewhere.close()?;
            assert!(ctx.session().is_connected());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_list_names() {
    run_test(
        create_test_context,
        |ctx| {
            assert!(ctx.session().list_database_names()?.is_empty());

            ctx.collection("users")?.insert_one(&doc! { a: 1 })?;
            ctx.collection("orders")?.insert_one(&doc! { a: 1 })?;
            ctx.session().database("reports")?.collection("daily")?.insert_one(&doc! { a: 1 })?;

            assert_eq!(ctx.session().list_database_names()?, vec!["reports", "test_db"]);
            assert_eq!(ctx.db().list_collection_names()?, vec!["orders", "users"]);

            ctx.collection("users")?.drop()?;
            assert_eq!(ctx.db().list_collection_names()?, vec!["orders"]);
            ctx.session().database("reports")?.collection("daily")?.drop()?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_names() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            for name in ["", "a.b", "a b", "a$b", "a/b"] {
                let err = session.database(name).err().expect("invalid database name");
                assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            }
            for name in ["", "system.users", "a$b"] {
                let err = ctx.collection(name).err().expect("invalid collection name");
                assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            }
            assert!(ctx.collection("a.b")?.name() == "a.b");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_closed_session() {
    run_test(
        create_test_context,
        |ctx| {
            let session = ctx.session();
            let collection = ctx.collection("test")?;
            session.ping()?;

            session.close()?;
            session.close()?;
            assert!(!session.is_connected());

            assert_eq!(session.ping().unwrap_err().kind(), &ErrorKind::ConnectionError);
            assert_eq!(
                session.list_database_names().unwrap_err().kind(),
                &ErrorKind::ConnectionError
            );
            assert_eq!(
                collection.find_one(&doc! {}).unwrap_err().kind(),
                &ErrorKind::ConnectionError
            );
            assert_eq!(
                collection.delete_many(&doc! {}).unwrap_err().kind(),
                &ErrorKind::ConnectionError
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_uri() {
    for uri in [
        "localhost:27017",
        "http://localhost:27017",
        "memory://localhost:0",
        "memory://localhost:port",
        "memory://localhost:27017/?w=some",
        "mongodb+srv://a.example.com:27017",
    ] {
        let err = Session::connect(instance(), uri).err().expect("invalid uri");
        assert_eq!(err.kind(), &ErrorKind::InvalidUri, "{}", uri);
        assert!(err.is_connection_error());
    }
}

#[test]
fn test_builder_configuration() {
    let uri = format!("{}/inventory?w=majority&appName=from-uri", random_uri());
    let session = Session::builder().uri(&uri).connect(instance()).unwrap();
    let config = session.config();
    assert_eq!(config.write_concern(), WriteConcern::Majority);
    assert_eq!(config.app_name(), Some("from-uri"));
    assert_eq!(config.default_database(), Some("inventory"));
    assert_eq!(session.default_database().unwrap().name(), "inventory");

    // explicit settings win over the uri
    let session = Session::builder()
        .uri(&uri)
        .app_name("explicit")
        .write_concern(WriteConcern::Nodes(2))
        .default_database("other")
        .connect(instance())
        .unwrap();
    assert_eq!(session.config().app_name(), Some("explicit"));
    assert_eq!(session.config().write_concern(), WriteConcern::Nodes(2));
    assert_eq!(session.default_database().unwrap().name(), "other");

    let err = Session::builder().app_name("").connect(instance()).err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
}

#[test]
fn test_no_default_database() {
    let session = Session::connect(instance(), &random_uri()).unwrap();
    assert_eq!(session.config().write_concern(), WriteConcern::Nodes(1));
    let err = session.default_database().err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
}

#[cfg(not(feature = "mongodb"))]
#[test]
fn test_mongodb_without_feature() {
    let err = Session::connect(instance(), "mongodb://localhost:27017").err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::ConnectionError);
}
