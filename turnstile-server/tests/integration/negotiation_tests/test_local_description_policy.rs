use turnstile_core::{CloseReason, SdpType, StatusFrame};
use turnstile_server::{ClientExit, GatewayConfig, LocalDescriptionPolicy};

use crate::integration::{create_test_gateway, init_tracing, test_config};
use crate::utils::{MockBehavior, MockEngine, connect};

fn rejecting_engine() -> MockEngine {
    MockEngine::with_behavior(MockBehavior {
        fail_local_description: true,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_strict_policy_fails_negotiation() {
    init_tracing();

    let engine = rejecting_engine();
    let gateway = create_test_gateway(test_config(3), engine.clone());

    let (mut a, a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    a.send_offer("OFFER_A", "none").await.expect("Offer sent");

    a.expect_close(CloseReason::NegotiationFailed)
        .await
        .expect("Strict policy refuses to answer");
    assert_eq!(a_handle.await.unwrap(), ClientExit::Failed);
    assert!(!gateway.gate().is_held());

    let session = engine.sessions().pop().expect("Session created");
    assert_eq!(session.calls().last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn test_lenient_policy_answers_anyway() {
    init_tracing();

    let engine = rejecting_engine();
    let config = GatewayConfig {
        local_description_policy: LocalDescriptionPolicy::Lenient,
        ..test_config(3)
    };
    let gateway = create_test_gateway(config, engine.clone());

    let (mut a, a_handle) = connect(&gateway, "198.51.100.1");
    a.expect_status(StatusFrame::Eligible).await.expect("A eligible");
    a.send_offer("OFFER_A", "none").await.expect("Offer sent");

    let answer = a.expect_answer().await.expect("Lenient policy answers");
    assert_eq!(answer.description().sdp_type, SdpType::Answer);
    a.expect_close(CloseReason::Negotiated).await.expect("Normal close");
    assert_eq!(a_handle.await.unwrap(), ClientExit::Negotiated);
    assert!(gateway.gate().is_held(), "Session supervisor owns the gate");
}
