use std::sync::Arc;

use cql_middleware::prelude::*;
use cql_middleware::test_utils::MemoryEngine;
use cql_middleware::{ErrorCode, ServerError};

const SELECT_IDS: &str = "SELECT id FROM t";
const SELECT_BY_BUCKET: &str = "SELECT id FROM events WHERE bucket = ?";

fn engine_with_ids(query: &str, count: i32) -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new());
    engine.add_table(
        query,
        vec![ColumnSpec::new("id", ValueType::Int)],
        (1..=count).map(|i| vec![CqlValue::Int(i)]).collect(),
    );
    engine
}

fn connect(engine: &Arc<MemoryEngine>) -> Session {
    let config = ClusterConfig::builder()
        .contact_points("10.0.0.1, 10.0.0.2")
        .build()
        .unwrap();
    Cluster::new(config, Arc::clone(engine) as Arc<dyn cql_middleware::Engine>)
        .connect()
        .session()
        .unwrap()
}

#[test]
fn five_rows_in_pages_of_two() {
    let engine = engine_with_ids(SELECT_IDS, 5);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_page_size(2);

    let mut ids = Vec::new();
    let mut sizes = Vec::new();
    loop {
        let mut page = session.execute(&stmt).result().unwrap();
        sizes.push(page.row_count());
        while page.next() {
            let mut id = 0_i32;
            page.scan(&mut [&mut id]).unwrap();
            ids.push(id);
        }
        if !page.has_more_pages() {
            break;
        }
        assert!(stmt.set_paging_state_from(&page));
    }

    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(engine.execution_count(), 3);
}

#[test]
fn full_pages_plus_partial_page_take_one_extra_execution() {
    for (rows, page_size, expected) in [(10, 3, 4), (9, 3, 3), (1, 5, 1), (0, 4, 1)] {
        let engine = engine_with_ids(SELECT_IDS, rows);
        let session = connect(&engine);
        let mut stmt = Statement::new(SELECT_IDS, 0);
        stmt.set_page_size(page_size);

        let ids: Vec<i32> = session.pages(&mut stmt).rows_collect().unwrap();
        assert_eq!(ids, (1..=rows).collect::<Vec<_>>());
        assert_eq!(engine.execution_count(), expected, "rows={rows} page={page_size}");
    }
}

#[test]
fn bound_values_survive_every_page() {
    let engine = engine_with_ids(SELECT_BY_BUCKET, 7);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_BY_BUCKET, 1);
    stmt.bind(0, "2024-01").unwrap();
    stmt.set_page_size(3);

    let mut pages = session.pages(&mut stmt);
    while let Some(page) = pages.next_page() {
        page.unwrap();
    }
    assert_eq!(pages.pages_fetched(), 3);
    assert!(pages.is_finished());

    let requests = engine.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.values, vec![CqlValue::Text("2024-01".into())]);
        assert_eq!(request.page_size, Some(3));
    }
    assert!(requests[0].paging_state.is_none());
    assert!(requests[1..].iter().all(|r| r.paging_state.is_some()));
}

#[test]
fn paging_state_is_forwarded_byte_for_byte() {
    let engine = engine_with_ids(SELECT_IDS, 4);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_page_size(2);
    let first = session.execute(&stmt).result().unwrap();
    let token = first.paging_state().unwrap().clone();

    // Persist and rehydrate, as a stateless API would between requests.
    let stored = token.as_bytes().to_vec();
    let mut resumed = Statement::new(SELECT_IDS, 0);
    resumed.set_page_size(2);
    resumed.set_paging_state(PagingState::from_bytes(stored));

    let second = session.execute(&resumed).result().unwrap();
    let ids: Vec<i32> = second.rows().map(|r| r.get::<i32>(0).unwrap()).collect();
    assert_eq!(ids, vec![3, 4]);
    assert!(!second.has_more_pages());

    let sent = engine.requests()[1].paging_state.clone().unwrap();
    assert_eq!(sent.as_bytes(), token.as_bytes());
    assert_eq!(sent, token);
}

#[test]
fn final_page_clears_the_stored_token() {
    let engine = engine_with_ids(SELECT_IDS, 2);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_paging_state(PagingState::from_bytes(&b"stale"[..]));
    stmt.clear_paging_state();
    let page = session.execute(&stmt).result().unwrap();
    assert!(!stmt.set_paging_state_from(&page));
    assert!(stmt.paging_state().is_none());
}

#[test]
fn statement_can_be_paged_again_after_a_full_run() {
    let engine = engine_with_ids(SELECT_IDS, 5);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_page_size(2);

    let first: Vec<i32> = session.pages(&mut stmt).rows_collect().unwrap();
    assert!(stmt.paging_state().is_none());
    let second: Vec<i32> = session.pages(&mut stmt).rows_collect().unwrap();
    assert_eq!(first, vec![1, 2, 3, 4, 5]);
    assert_eq!(second, first);

    let page = session.execute(&stmt).result().unwrap();
    let ids: Vec<i32> = page.rows().map(|r| r.get::<i32>(0).unwrap()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(engine.execution_count(), 7);
}

#[test]
fn paging_resumes_from_a_stored_token() {
    let engine = engine_with_ids(SELECT_IDS, 5);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_page_size(2);
    let first = session.execute(&stmt).result().unwrap();
    stmt.set_paging_state(first.paging_state().unwrap().clone());

    let rest: Vec<i32> = session.pages(&mut stmt).rows_collect().unwrap();
    assert_eq!(rest, vec![3, 4, 5]);
    assert!(stmt.paging_state().is_none());
}

#[test]
fn foreign_token_fails_without_retry() {
    let engine = engine_with_ids(SELECT_IDS, 4);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    stmt.set_page_size(2);
    stmt.set_paging_state(PagingState::from_bytes(&b"garbage"[..]));

    let mut pages = session.pages(&mut stmt);
    let err = pages.next_page().unwrap().unwrap_err();
    assert_eq!(
        err.as_driver_error().unwrap().code(),
        ErrorCode::Server(ServerError::ProtocolError)
    );
    assert!(pages.next_page().is_none());
    assert_eq!(engine.execution_count(), 1);
}

#[test]
fn unpaged_statement_returns_everything_at_once() {
    let engine = engine_with_ids(SELECT_IDS, 25);
    let session = connect(&engine);

    let mut stmt = Statement::new(SELECT_IDS, 0);
    let pages: Vec<_> = session
        .pages(&mut stmt)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].row_count(), 25);
}
