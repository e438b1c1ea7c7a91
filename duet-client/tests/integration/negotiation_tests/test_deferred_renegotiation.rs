use duet_client::{NegotiationState, TransportEvent};
use duet_core::SignalingMessage;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    TrackedMediaSource, manual_pair, next_envelope, route, route_until_settled, stays_quiet,
};

#[tokio::test]
async fn test_negotiation_needed_while_idle_is_ignored() {
    init_tracing();
    let (a, _b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    a.transport.emit(TransportEvent::NegotiationNeeded);

    assert!(stays_quiet(&mut rx, Duration::from_millis(150)).await);
    let snapshot = a.handle.snapshot();
    assert_eq!(snapshot.state, NegotiationState::Idle);
    assert!(!snapshot.renegotiation_pending);
}

#[tokio::test]
async fn test_deferred_triggers_replay_once_on_stable() {
    init_tracing();
    let (a, b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    a.handle.initiate_call().await.expect("call starts");
    let offer = next_envelope(&mut rx).await;

    // Two triggers while the call offer is unanswered.
    a.transport.emit(TransportEvent::NegotiationNeeded);
    a.transport.emit(TransportEvent::NegotiationNeeded);
    tokio::time::timeout(
        Duration::from_secs(2),
        a.handle.wait_until(|s| s.renegotiation_pending),
    )
    .await
    .expect("Timeout waiting for deferral")
    .expect("coordinator is running");

    assert_eq!(a.handle.state(), NegotiationState::OfferSent);
    assert!(stays_quiet(&mut rx, Duration::from_millis(100)).await);

    route(offer, &[&a.handle, &b.handle]);
    let routed = route_until_settled(&mut rx, &a.handle, &b.handle).await;

    let replays = routed
        .iter()
        .filter(|e| e.from == a.id)
        .filter(|e| matches!(e.message, SignalingMessage::NegotiationOffer { .. }))
        .count();
    assert_eq!(replays, 1);
    assert_eq!(b.transport.applied_offers(), 2);
}
