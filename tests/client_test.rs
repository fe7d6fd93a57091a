//! Content client integration tests
//!
//! Batching is driven with paused tokio time: the runtime jumps straight to
//! the next timer whenever every task is idle.

use djedi_client::{ClientError, ClientOptions, ContentClient, MockTransport, Node};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

const TITLE: &str = "i18n://en-us@home/title.txt";
const BODY: &str = "i18n://en-us@home/body.md";

fn site() -> MockTransport {
    MockTransport::new()
        .with_node(TITLE, "Welcome")
        .with_node(BODY, "Hello **world**")
}

fn client_for(transport: &Arc<MockTransport>) -> ContentClient {
    ContentClient::with_transport(ClientOptions::default(), transport.clone())
}

#[tokio::test]
async fn test_cached_get_is_synchronous() {
    let transport = Arc::new(site());
    let client = client_for(&transport);

    client.get("home/title").await.unwrap();
    assert_eq!(transport.call_count(), 1);

    let node = client
        .get("home/title")
        .now_or_never()
        .expect("cache hit should not suspend")
        .unwrap();
    assert_eq!(node.value.as_deref(), Some("Welcome"));

    let node = client
        .get_batched("i18n://en-us@home/title.txt")
        .now_or_never()
        .expect("cache hit should not suspend")
        .unwrap();
    assert_eq!(node.uri, TITLE);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_batched_lookups_share_one_request() {
    let transport = Arc::new(site());
    let client = client_for(&transport);

    let (title, body, again) = tokio::join!(
        client.get_batched("home/title"),
        client.get_batched("home/body.md"),
        client.get_batched(Node::with_default("home/title", "ignored default")),
    );

    assert_eq!(title.unwrap().value.as_deref(), Some("Welcome"));
    assert_eq!(body.unwrap().value.as_deref(), Some("Hello **world**"));
    assert_eq!(again.unwrap().value.as_deref(), Some("Welcome"));

    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.requests()[0].uris(), vec![BODY, TITLE]);
}

#[tokio::test(start_paused = true)]
async fn test_partial_batch_reports_missing_per_uri() {
    let transport = Arc::new(site());
    let client = client_for(&transport);

    let (title, gone) = tokio::join!(client.get_batched("home/title"), client.get_batched("home/gone"));

    assert!(title.is_ok());
    let err = gone.unwrap_err();
    assert_eq!(err, ClientError::Missing { uri: "i18n://en-us@home/gone.txt".into() });
    assert_eq!(client.render_result(&Err(err)), None);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lookup_during_flight_starts_new_batch() {
    let transport = Arc::new(site().with_gate());
    let client = client_for(&transport);

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.get_batched("home/title").await }
    });

    // Timer fires, request goes out and waits at the gate
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.call_count(), 1);

    let second = tokio::spawn({
        let client = client.clone();
        async move { client.get_batched("home/body.md").await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.call_count(), 2);

    transport.release(2);
    assert_eq!(first.await.unwrap().unwrap().uri, TITLE);
    assert_eq!(second.await.unwrap().unwrap().uri, BODY);

    let requests = transport.requests();
    assert_eq!(requests[0].uris(), vec![TITLE]);
    assert_eq!(requests[1].uris(), vec![BODY]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_delivers_same_error_to_all() {
    let transport = Arc::new(site());
    transport.fail_network("connection reset by peer");
    let client = client_for(&transport);

    let (a, b, c) = tokio::join!(
        client.get_batched("home/title"),
        client.get_batched("home/title"),
        client.get_batched("home/body.md"),
    );

    let a = a.unwrap_err();
    assert!(matches!(a, ClientError::Transport { .. }));
    assert_eq!(a.status(), -1);
    assert_eq!(b.unwrap_err(), a);
    assert_eq!(c.unwrap_err(), a);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_batching_disabled_sends_each_lookup() {
    let transport = Arc::new(site());
    let client = ContentClient::with_transport(
        ClientOptions::default().without_batching(),
        transport.clone(),
    );

    let (title, body) = tokio::join!(client.get_batched("home/title"), client.get_batched("home/body.md"));
    assert!(title.is_ok());
    assert!(body.is_ok());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_reset_nodes_forces_refetch() {
    let transport = Arc::new(site());
    let client = client_for(&transport);

    client.get("home/title").await.unwrap();
    client.reset_nodes();
    assert!(client.get_cached("home/title").is_none());

    client.get("home/title").await.unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_pending_batch() {
    let transport = Arc::new(site());
    let client = client_for(&transport);

    let pending = client.get_batched("home/title");
    tokio::pin!(pending);
    assert!(futures::poll!(&mut pending).is_pending());

    client.reset_nodes();
    let err = pending.await.unwrap_err();
    assert_eq!(err, ClientError::Cancelled { uri: TITLE.into() });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reset_does_not_cancel_request_in_flight() {
    let transport = Arc::new(site().with_gate());
    let client = client_for(&transport);

    let in_flight = tokio::spawn({
        let client = client.clone();
        async move { client.get_batched("home/title").await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.call_count(), 1);

    client.reset_nodes();
    transport.release(1);

    let node = in_flight.await.unwrap().unwrap();
    assert_eq!(node.value.as_deref(), Some("Welcome"));
    // The late answer lands in the cache as it is after the reset
    assert!(client.get_cached("home/title").is_some());
}

#[tokio::test]
async fn test_rendered_nodes_are_reference_counted() {
    let client = client_for(&Arc::new(site()));
    let mut overlay = client.subscribe_rendered();

    client.report_rendered_node(Node::with_default("home/title#3", "Welcome"));
    client.report_rendered_node(Node::with_default("i18n://en-us@home/title.txt", "Welcome"));
    assert!(overlay.has_changed().unwrap());
    assert_eq!(
        overlay.borrow_and_update().get(TITLE),
        Some(&Some("Welcome".to_string()))
    );

    client.report_removed_node("home/title");
    assert!(client.rendered_nodes().contains_key(TITLE));

    client.report_removed_node(TITLE);
    assert!(client.rendered_nodes().is_empty());
    assert!(overlay.borrow_and_update().is_empty());
}

#[tokio::test]
async fn test_rendered_node_keeps_first_default() {
    let client = client_for(&Arc::new(site()));

    client.report_rendered_node(Node::with_default("home/title", "First"));
    client.report_rendered_node(Node::with_default("home/title", "Second"));

    assert_eq!(
        client.rendered_nodes().get(TITLE),
        Some(&Some("First".to_string()))
    );
}

#[tokio::test]
async fn test_reset_nodes_republishes_empty_map() {
    let client = client_for(&Arc::new(site()));
    let mut overlay = client.subscribe_rendered();

    client.report_rendered_node("home/title");
    overlay.borrow_and_update();

    client.reset_nodes();
    assert!(overlay.has_changed().unwrap());
    assert!(overlay.borrow_and_update().is_empty());

    // Counts start over after a reset
    client.report_rendered_node("home/title");
    client.report_removed_node("home/title");
    assert!(client.rendered_nodes().is_empty());
}

#[tokio::test]
async fn test_server_render_then_client_hydration() {
    let transport = Arc::new(site());
    let server = client_for(&transport);

    server.report_prefetchable_node("home/title");
    server.report_prefetchable_node("home/body.md");
    server.prefetch(&[]).await.unwrap();
    assert_eq!(transport.call_count(), 1);
    server.reset_nodes();

    let browser = client_for(&transport);
    browser.load_by_prefix(&["i18n://en-us@home/"]).await.unwrap();
    assert_eq!(transport.call_count(), 2);

    let title = browser.get("home/title").now_or_never().unwrap().unwrap();
    assert_eq!(title.value.as_deref(), Some("Welcome"));
    assert_eq!(transport.call_count(), 2);
}
