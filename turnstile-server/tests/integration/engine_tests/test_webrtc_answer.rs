use std::time::Duration;
use turnstile_core::{CloseReason, SdpType, StatusFrame};
use turnstile_server::{ClientExit, TransformRegistry, WebRtcEngine};

use crate::integration::{create_test_gateway, init_tracing, test_config};
use crate::utils::{TestClient, connect};

#[tokio::test]
async fn test_real_engine_answers_video_offer() {
    init_tracing();

    let engine = WebRtcEngine::new(TransformRegistry::new(), Duration::from_secs(2));
    let gateway = create_test_gateway(test_config(3), engine);

    let client = TestClient::new().await.expect("Failed to create test client");
    let offer = client.create_offer().await.expect("Failed to create offer");
    assert!(offer.contains("m=video"));

    let (mut peer, handle) = connect(&gateway, "127.0.0.1");
    peer.expect_status(StatusFrame::Eligible).await.expect("Eligible");
    peer.send_offer(&offer, "none").await.expect("Offer sent");

    let answer = peer.expect_answer().await.expect("No answer");
    assert_eq!(answer.description().sdp_type, SdpType::Answer);
    assert!(answer.description().sdp.contains("m=video"));
    peer.expect_close(CloseReason::Negotiated).await.expect("Closed");
    assert_eq!(handle.await.unwrap(), ClientExit::Negotiated);

    client
        .set_remote_answer(answer.description().sdp.clone())
        .await
        .expect("Client accepts the answer");
    assert!(gateway.gate().is_held());

    client.close().await.expect("Failed to close client");
}
