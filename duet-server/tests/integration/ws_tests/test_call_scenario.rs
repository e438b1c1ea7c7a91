use duet_core::{ServerEvent, SessionDescription, SignalingMessage};

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_server};

#[tokio::test]
async fn test_pair_exchanges_call_offer_and_answer() {
    init_tracing();
    let addr = spawn_server().await;

    let mut a = TestClient::connect(addr).await.expect("connect A");
    let (a_id, members) = a.join_and_identify("r1").await.expect("A joins");
    assert_eq!(members, vec![a_id]);

    let mut b = TestClient::connect(addr).await.expect("connect B");
    let (b_id, members) = b.join_and_identify("r1").await.expect("B joins");
    assert_eq!(members, vec![b_id, a_id]);

    assert_eq!(
        a.recv().await.expect("peer-present"),
        ServerEvent::PeerPresent { peer_id: b_id }
    );

    let offer = SignalingMessage::CallOffer {
        description: SessionDescription::offer("descA"),
    };
    a.relay(b_id, offer.clone()).await.expect("relay offer");
    assert_eq!(
        b.recv().await.expect("relay-in offer"),
        ServerEvent::RelayIn {
            from: a_id,
            message: offer,
        }
    );

    let answer = SignalingMessage::CallAnswer {
        description: SessionDescription::answer("descB"),
    };
    b.relay(a_id, answer.clone()).await.expect("relay answer");
    assert_eq!(
        a.recv().await.expect("relay-in answer"),
        ServerEvent::RelayIn {
            from: b_id,
            message: answer,
        }
    );

    a.close().await.expect("close A");
    b.close().await.expect("close B");
}

#[tokio::test]
async fn test_malformed_frame_is_reported_not_fatal() {
    init_tracing();
    let addr = spawn_server().await;

    let mut a = TestClient::connect(addr).await.expect("connect");
    a.send_raw("{\"op\":\"dance\"}".to_owned())
        .await
        .expect("send garbage");

    assert!(matches!(
        a.recv().await.expect("error event"),
        ServerEvent::Error {
            code: duet_core::ErrorCode::Malformed,
            ..
        }
    ));

    let (_, members) = a.join_and_identify("still-alive").await.expect("join");
    assert_eq!(members.len(), 1);
}
