use docstore::errors::ErrorKind;
use docstore::session::Session;
use docstore::Instance;
use docstore_int_test::test_util::{instance, random_uri};

#[test]
fn test_second_instance_fails() {
    let shared = instance();

    let err = Instance::new().err().expect("a second instance is refused");
    assert_eq!(err.kind(), &ErrorKind::InstanceAlreadyExists);
    assert!(!err.is_connection_error());

    // the first instance keeps working
    let session = Session::connect(shared, &random_uri()).unwrap();
    session.ping().unwrap();
    session.close().unwrap();
}

#[test]
fn test_instance_tracks_memory_deployments() {
    let uri = random_uri();
    let session = Session::connect(instance(), &uri).unwrap();

    let address = uri.trim_start_matches("memory://");
    assert!(instance().memory_addresses().iter().any(|a| a == address));
    session.close().unwrap();
}
