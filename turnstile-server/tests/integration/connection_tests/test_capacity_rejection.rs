use turnstile_core::{CloseReason, StatusFrame};
use turnstile_server::ClientExit;

use crate::integration::{create_test_gateway, init_tracing, test_config};
use crate::utils::{MockEngine, connect};

#[tokio::test]
async fn test_fourth_client_is_rejected() {
    init_tracing();

    let gateway = create_test_gateway(test_config(3), MockEngine::new());

    let (mut a, _a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    let (mut b, _b_handle) = connect(&gateway, "198.51.100.2");
    b.expect_status(StatusFrame::Waiting(1)).await.expect("B waiting");
    let (mut c, _c_handle) = connect(&gateway, "198.51.100.3");
    c.expect_status(StatusFrame::Waiting(2)).await.expect("C waiting");

    let (mut d, d_handle) = connect(&gateway, "198.51.100.4");
    d.expect_close(CloseReason::CapacityExceeded)
        .await
        .expect("D should be turned away");
    assert_eq!(d_handle.await.unwrap(), ClientExit::Rejected);

    assert_eq!(gateway.queue().len(), 3);
    assert!(!gateway.queue().snapshot().contains(&d.id));
    assert_eq!(gateway.queue().position(&d.id), None);

    // A free slot lets a new client in at the back.
    a.disconnect().await;
    b.wait_for_status(StatusFrame::Eligible).await.expect("B promoted");

    let (mut e, _e_handle) = connect(&gateway, "198.51.100.5");
    e.expect_status(StatusFrame::Waiting(2)).await.expect("E admitted");
}
