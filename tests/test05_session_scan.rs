use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use cql_middleware::prelude::*;
use cql_middleware::test_utils::MemoryEngine;
use cql_middleware::{LibraryError, ServerError};
use uuid::Uuid;

const SELECT_USERS: &str = "SELECT id, name, avatar, joined FROM users";
const INSERT_USER: &str = "INSERT INTO users (id, name, avatar) VALUES (?, ?, ?)";

fn user_engine() -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new());
    engine.add_table(
        SELECT_USERS,
        vec![
            ColumnSpec::new("id", ValueType::Uuid),
            ColumnSpec::new("name", ValueType::Varchar),
            ColumnSpec::new("avatar", ValueType::Blob),
            ColumnSpec::new("joined", ValueType::Timestamp),
        ],
        vec![
            vec![
                CqlValue::Uuid(Uuid::from_u128(1)),
                CqlValue::Text("ada".into()),
                CqlValue::Blob(vec![0x89, 0x50]),
                CqlValue::Timestamp(Utc.timestamp_millis_opt(1_000).unwrap()),
            ],
            vec![
                CqlValue::Uuid(Uuid::from_u128(2)),
                CqlValue::Text(String::new()),
                CqlValue::Null,
                CqlValue::Null,
            ],
        ],
    );
    engine.declare_prepared(
        INSERT_USER,
        vec![ValueType::Uuid, ValueType::Text, ValueType::Blob],
    );
    engine
}

fn connect(engine: Arc<MemoryEngine>) -> Session {
    let config = ClusterConfig::builder()
        .contact_points("127.0.0.1")
        .build()
        .unwrap();
    Cluster::new(config, engine).connect().session().unwrap()
}

#[test]
fn scan_decodes_every_column_in_order() {
    let session = connect(user_engine());
    let mut result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    assert_eq!(result.column_count(), 4);
    assert_eq!(result.column_name(1), Some("name"));
    assert_eq!(result.column_index("joined"), Some(3));

    let mut id = Uuid::nil();
    let mut name = String::from("unset");
    let mut avatar: Option<Vec<u8>> = None;
    let mut joined: Option<DateTime<Utc>> = None;

    assert!(result.next());
    result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined])
        .unwrap();
    assert_eq!(id, Uuid::from_u128(1));
    assert_eq!(name, "ada");
    assert_eq!(avatar.as_deref(), Some(&[0x89, 0x50][..]));
    assert_eq!(joined, Some(Utc.timestamp_millis_opt(1_000).unwrap()));

    assert!(result.next());
    result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined])
        .unwrap();
    assert_eq!(name, "");
    assert_eq!(avatar, None);
    assert_eq!(joined, None);

    assert!(!result.next());
    assert!(!result.next());
}

#[test]
fn scan_count_must_match_columns() {
    let session = connect(user_engine());
    let mut result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    assert!(result.next());

    let mut id = Uuid::nil();
    let mut name = String::new();
    let err = result.scan(&mut [&mut id, &mut name]).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::ArgumentCountMismatch {
            expected: 4,
            actual: 2
        }
    ));
    // Nothing was written before the count check failed.
    assert_eq!(id, Uuid::nil());

    let mut avatar: Option<Vec<u8>> = None;
    let mut joined: Option<DateTime<Utc>> = None;
    let mut extra = 0_i32;
    let err = result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined, &mut extra])
        .unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::ArgumentCountMismatch {
            expected: 4,
            actual: 5
        }
    ));
}

#[test]
fn scan_into_wrong_kind_is_a_type_mismatch() {
    let session = connect(user_engine());
    let mut result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    assert!(result.next());

    let row = result.row().unwrap();
    let err = row.get::<i32>(2).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::TypeMismatch {
            expected: "int",
            actual: "blob"
        }
    ));

    // Null into a non-optional destination.
    assert!(result.next());
    let err = result.row().unwrap().get::<Vec<u8>>(2).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::TypeMismatch { actual: "null", .. }
    ));
}

#[test]
fn failed_scan_writes_no_destination() {
    let session = connect(user_engine());
    let mut result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    assert!(result.next());

    let mut id = Uuid::nil();
    let mut name = String::from("unset");
    let mut avatar = 0_i32;
    let mut joined: Option<DateTime<Utc>> = None;
    let err = result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined])
        .unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::TypeMismatch {
            expected: "int",
            actual: "blob"
        }
    ));
    assert_eq!(id, Uuid::nil());
    assert_eq!(name, "unset");

    // Second row has a null avatar, which a plain Vec<u8> cannot hold.
    assert!(result.next());
    let mut avatar: Vec<u8> = Vec::new();
    let err = result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined])
        .unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::TypeMismatch { actual: "null", .. }
    ));
    assert_eq!(id, Uuid::nil());
    assert_eq!(name, "unset");
}

#[test]
fn scan_before_next_reports_no_current_row() {
    let session = connect(user_engine());
    let mut result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    let mut id = Uuid::nil();
    let mut name = String::new();
    let mut avatar: Option<Vec<u8>> = None;
    let mut joined: Option<DateTime<Utc>> = None;
    let err = result
        .scan(&mut [&mut id, &mut name, &mut avatar, &mut joined])
        .unwrap_err();
    assert!(matches!(err, CqlMiddlewareDbError::NoCurrentRow));

    while result.next() {}
    assert!(result.row().is_none());
}

#[test]
fn rows_are_addressable_by_name() {
    let session = connect(user_engine());
    let result = session.query(SELECT_USERS, &[]).unwrap().result().unwrap();
    let names: Vec<String> = result
        .rows()
        .map(|row| row.get_by_name::<String>("name").unwrap())
        .collect();
    assert_eq!(names, vec!["ada".to_string(), String::new()]);

    let row = result.rows().next().unwrap();
    assert!(matches!(
        row.get_by_name::<String>("email"),
        Err(CqlMiddlewareDbError::UnknownColumn(name)) if name == "email"
    ));
    assert!(matches!(
        row.get::<String>(9),
        Err(CqlMiddlewareDbError::IndexOutOfBounds { index: 9, len: 4 })
    ));
}

#[test]
fn prepared_binds_are_checked_against_declared_types() {
    let engine = user_engine();
    let session = connect(Arc::clone(&engine));
    let prepared = session.prepare(INSERT_USER).prepared().unwrap();
    assert_eq!(prepared.param_types().len(), 3);

    let mut stmt = prepared.bind();
    assert_eq!(stmt.param_count(), 3);
    stmt.bind(0, &Uuid::from_u128(7)).unwrap();
    stmt.bind(1, "grace").unwrap();

    let err = stmt.bind(2, &5_i64).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::TypeMismatch {
            expected: "blob",
            actual: "bigint"
        }
    ));
    assert!(!stmt.is_bound(2));

    let err = stmt.bind(3, &[1_u8][..]).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::IndexOutOfBounds { index: 3, len: 3 }
    ));

    // Unbound position goes out as null.
    session.execute(&stmt).result().unwrap();
    let request = engine.requests().pop().unwrap();
    assert_eq!(request.prepared_id.as_deref(), Some(prepared.id()));
    assert_eq!(request.values[2], CqlValue::Null);
}

#[test]
fn statements_can_be_rebound_after_execute() {
    let engine = user_engine();
    let session = connect(Arc::clone(&engine));
    let mut stmt = Statement::new("UPDATE counters SET n = n + ? WHERE k = ?", 2);

    stmt.bind_all(&[&1_i64, &"a"]).unwrap();
    let first = session.execute(&stmt);
    stmt.bind_all(&[&2_i64, &"b"]).unwrap();
    let second = session.execute(&stmt);
    first.result().unwrap();
    second.result().unwrap();

    let values: Vec<_> = engine.requests().into_iter().map(|r| r.values).collect();
    assert_eq!(
        values,
        vec![
            vec![CqlValue::BigInt(1), CqlValue::Text("a".into())],
            vec![CqlValue::BigInt(2), CqlValue::Text("b".into())],
        ]
    );
}

#[test]
fn too_many_arguments_fail_before_sending() {
    let engine = user_engine();
    let _session = connect(Arc::clone(&engine));
    let mut stmt = Statement::new("SELECT * FROM t WHERE k = ?", 1);
    let err = stmt.bind_all(&[&1_i32, &2_i32]).unwrap_err();
    assert!(matches!(
        err,
        CqlMiddlewareDbError::ArgumentCountMismatch {
            expected: 1,
            actual: 2
        }
    ));
    assert_eq!(engine.execution_count(), 0);
}

#[test]
fn runtime_typed_binding() {
    let mut stmt = Statement::new("INSERT INTO t (a, b, c) VALUES (?, ?, ?)", 3);
    stmt.bind_dyn(0, &42_i32).unwrap();
    stmt.bind_dyn(1, &serde_json::json!("x")).unwrap();
    stmt.bind_null(2).unwrap();
    assert_eq!(
        stmt.values(),
        vec![CqlValue::Int(42), CqlValue::Text("x".into()), CqlValue::Null]
    );
    assert!(stmt.is_bound(2));

    assert!(matches!(
        stmt.bind_dyn(0, &3_u8),
        Err(CqlMiddlewareDbError::UnsupportedType(_))
    ));
    assert_eq!(stmt.values()[0], CqlValue::Int(42));
}

#[test]
fn unknown_prepare_fails_with_server_code() {
    let session = connect(user_engine());
    let future = session.prepare("SELECT nope FROM nowhere");
    future.wait();
    assert_eq!(future.state(), FutureState::Failure);
    assert_eq!(future.error_source(), ErrorSource::Server);
    assert_eq!(
        future.error_code(),
        ErrorCode::Server(ServerError::InvalidQuery)
    );
}

#[test]
fn invalid_config_fails_the_connect_future() {
    let engine = Arc::new(MemoryEngine::new());
    let config = ClusterConfig::builder()
        .contact_points("127.0.0.1")
        .core_connections_per_host(4)
        .max_connections_per_host(2)
        .finish();
    let future = Cluster::new(config, engine).connect();
    assert!(future.ready());
    assert_eq!(
        future.error_code(),
        ErrorCode::Library(LibraryError::BadParams)
    );
}

#[test]
fn engine_connect_failure_surfaces_raw_code() {
    let engine = Arc::new(MemoryEngine::new());
    engine.fail_connect(
        ErrorCode::Library(LibraryError::NoHostsAvailable).to_raw(),
        "all hosts down",
    );
    let config = ClusterConfig::builder()
        .contact_points("10.1.1.1")
        .build()
        .unwrap();
    let err = Cluster::new(config, engine).connect().session().unwrap_err();
    let driver = err.as_driver_error().unwrap();
    assert!(driver.is_unavailable());
    assert_eq!(driver.message(), "all hosts down");
}

#[test]
fn config_loads_from_json_with_defaults() {
    let config = ClusterConfig::from_json(r#"{"contact_points": ["a", "b"], "port": 19042}"#).unwrap();
    assert_eq!(config.contact_points, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(config.port, 19042);
    assert_eq!(config.num_threads_io, 1);
    assert_eq!(config.connect_timeout().as_millis(), 5000);

    assert!(matches!(
        ClusterConfig::from_json("{\"port\": 0, \"contact_points\": [\"a\"]}"),
        Err(CqlMiddlewareDbError::ConfigError(_))
    ));
}

#[test]
fn close_settles() {
    let session = connect(user_engine());
    let future = session.close();
    future.wait();
    assert_eq!(future.state(), FutureState::Success);
}
