use turnstile_core::StatusFrame;
use turnstile_server::ClientExit;

use crate::integration::{create_test_gateway, init_tracing, test_config};
use crate::utils::{MockEngine, connect};

#[tokio::test]
async fn test_positions_follow_arrival_order() {
    init_tracing();

    let gateway = create_test_gateway(test_config(3), MockEngine::new());

    let (mut a, a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    let (mut b, _b_handle) = connect(&gateway, "198.51.100.2");
    b.expect_status(StatusFrame::Waiting(1)).await.expect("B at 1");
    let (mut c, _c_handle) = connect(&gateway, "198.51.100.3");
    c.expect_status(StatusFrame::Waiting(2)).await.expect("C at 2");

    a.disconnect().await;
    assert_eq!(a_handle.await.unwrap(), ClientExit::Disconnected);

    b.wait_for_status(StatusFrame::Eligible)
        .await
        .expect("B becomes eligible once A leaves");
    c.wait_for_status(StatusFrame::Waiting(1))
        .await
        .expect("C moves up");
    assert_eq!(gateway.queue().snapshot(), vec![b.id, c.id]);
}

#[tokio::test]
async fn test_waiting_client_leaving_shifts_positions() {
    init_tracing();

    let gateway = create_test_gateway(test_config(3), MockEngine::new());

    let (mut a, _a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    let (mut b, b_handle) = connect(&gateway, "198.51.100.2");
    b.expect_status(StatusFrame::Waiting(1)).await.expect("B at 1");
    let (mut c, _c_handle) = connect(&gateway, "198.51.100.3");
    c.expect_status(StatusFrame::Waiting(2)).await.expect("C at 2");

    b.disconnect().await;
    assert_eq!(b_handle.await.unwrap(), ClientExit::Disconnected);

    c.wait_for_status(StatusFrame::Waiting(1))
        .await
        .expect("C takes B's place");
    assert!(gateway.gate().is_held(), "A is still eligible");
}
