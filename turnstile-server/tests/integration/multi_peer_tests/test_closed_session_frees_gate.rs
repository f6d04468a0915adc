use turnstile_core::{CloseReason, StatusFrame};
use turnstile_server::{ClientExit, ConnectionState, SessionEvent, TrackKind};

use crate::integration::{create_test_gateway, init_tracing, test_config};
use crate::utils::{MockEngine, connect};

#[tokio::test]
async fn test_closed_session_lets_next_client_in() {
    init_tracing();

    let engine = MockEngine::new();
    let gateway = create_test_gateway(test_config(3), engine.clone());
    let mut gate_changes = gateway.gate().subscribe();

    let (mut a, a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    let (mut b, _b_handle) = connect(&gateway, "198.51.100.2");
    b.expect_status(StatusFrame::Waiting(1)).await.expect("B at 1");

    a.send_offer("OFFER_A", "none").await.expect("Offer sent");
    a.expect_answer().await.expect("A answered");
    a.expect_close(CloseReason::Negotiated).await.expect("A closed");
    assert_eq!(a_handle.await.unwrap(), ClientExit::Negotiated);

    // B heads the queue but the session is still live.
    b.wait_for_status(StatusFrame::Waiting(0))
        .await
        .expect("B waits at the head");
    assert!(gateway.gate().is_held());

    let session = engine.wait_for_sessions(1, 1000).await.expect("Session");
    session.emit_state(ConnectionState::Connecting).await;
    session.emit_state(ConnectionState::Connected).await;
    session.emit_state(ConnectionState::Closed).await;

    b.wait_for_status(StatusFrame::Eligible)
        .await
        .expect("B eligible once the session closed");

    // Gate went free and was taken again by B.
    assert!(gate_changes.has_changed().unwrap());
    assert!(*gate_changes.borrow_and_update());
}

#[tokio::test]
async fn test_video_track_is_relayed_with_requested_transform() {
    init_tracing();

    let engine = MockEngine::new();
    let gateway = create_test_gateway(test_config(3), engine.clone());

    let (mut a, _a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    a.send_offer("OFFER_A", "edges").await.expect("Offer sent");
    a.expect_answer().await.expect("A answered");

    let session = engine.wait_for_sessions(1, 1000).await.expect("Session");
    session.emit_video_track("video-0").await;
    session
        .emit(SessionEvent::TrackEnded {
            track_id: "video-0".to_owned(),
            kind: TrackKind::Video,
        })
        .await;

    let mut gate = gateway.gate().subscribe();
    gate.wait_for(|held| !held).await.expect("Gate released");
    let calls = session.calls();
    assert!(calls.contains(&"relay_track video-0 edges".to_owned()));
    assert_eq!(calls.last().map(String::as_str), Some("close"));
}
