use duet_client::TransportEvent;
use duet_core::{IceCandidate, SessionDescription, SignalingMessage};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{ServerPair, TrackedMediaSource, manual_pair, next_envelope};

fn candidate(n: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{} 1 udp 2122260223 10.0.0.{} 50000 typ host", n, n),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
    }
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_remote_candidates_wait_for_description() {
    init_tracing();
    let (a, b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    b.handle
        .deliver(a.id, SignalingMessage::Candidate { candidate: candidate(1) })
        .expect("deliver");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(b.transport.remote_candidates().is_empty());

    b.handle
        .deliver(
            a.id,
            SignalingMessage::CallOffer {
                description: SessionDescription::offer("from-a"),
            },
        )
        .expect("deliver");

    let answer = next_envelope(&mut rx).await;
    assert!(matches!(answer.message, SignalingMessage::CallAnswer { .. }));
    assert_eq!(b.transport.remote_candidates(), vec![candidate(1)]);

    b.handle
        .deliver(a.id, SignalingMessage::Candidate { candidate: candidate(2) })
        .expect("deliver");
    assert!(eventually(|| b.transport.remote_candidates().len() == 2).await);
}

#[tokio::test]
async fn test_local_candidates_reach_peer() {
    init_tracing();
    let pair = ServerPair::new("r1");

    pair.a.handle.initiate_call().await.expect("call starts");
    pair.a.settled().await;
    pair.b.settled().await;

    pair.a
        .transport
        .emit(TransportEvent::LocalCandidate(candidate(7)));

    assert!(eventually(|| pair.b.transport.remote_candidates() == vec![candidate(7)]).await);
}
