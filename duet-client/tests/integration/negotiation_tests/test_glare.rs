use duet_client::{MediaTrack, OfferKind, TrackKind};
use duet_core::SignalingMessage;

use crate::integration::init_tracing;
use crate::utils::{
    Side, TrackedMediaSource, manual_pair, next_envelope, route, route_until_settled,
};

async fn wait_outstanding(side: &Side) {
    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        side.handle
            .wait_until(|s| s.outstanding == Some(OfferKind::Renegotiation)),
    )
    .await
    .expect("Timeout waiting for renegotiation offer")
    .expect("coordinator is running");
}

#[tokio::test]
async fn test_crossing_renegotiation_offers_converge() {
    init_tracing();
    let (a, b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    a.handle.initiate_call().await.expect("call starts");
    route_until_settled(&mut rx, &a.handle, &b.handle).await;

    let a_offers_before = a.transport.applied_offers();
    let b_offers_before = b.transport.applied_offers();

    // Both sides add a track before either renegotiation offer is delivered.
    a.handle
        .add_track(MediaTrack::new("screen-a", TrackKind::Video))
        .await
        .expect("A adds track");
    b.handle
        .add_track(MediaTrack::new("screen-b", TrackKind::Video))
        .await
        .expect("B adds track");
    wait_outstanding(&a).await;
    wait_outstanding(&b).await;

    let routed = route_until_settled(&mut rx, &a.handle, &b.handle).await;

    assert_eq!(a.transport.applied_offers() - a_offers_before, 1);
    assert_eq!(b.transport.applied_offers() - b_offers_before, 1);

    let (polite, impolite) = if a.id < b.id { (&a, &b) } else { (&b, &a) };
    assert_eq!(polite.transport.rollbacks(), 1);
    assert_eq!(impolite.transport.rollbacks(), 0);

    // The polite side offers twice (the rolled back one and the replay).
    let offers_from = |id| {
        routed
            .iter()
            .filter(|e| e.from == id)
            .filter(|e| matches!(e.message, SignalingMessage::NegotiationOffer { .. }))
            .count()
    };
    assert_eq!(offers_from(polite.id), 2);
    assert_eq!(offers_from(impolite.id), 1);

    for side in [&a, &b] {
        let snapshot = side.handle.snapshot();
        assert!(snapshot.is_settled(), "not settled: {:?}", snapshot);
    }
}

#[tokio::test]
async fn test_renegotiation_without_collision() {
    init_tracing();
    let (a, b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    a.handle.initiate_call().await.expect("call starts");
    route_until_settled(&mut rx, &a.handle, &b.handle).await;

    b.handle
        .add_track(MediaTrack::new("screen-b", TrackKind::Video))
        .await
        .expect("B adds track");
    let routed = route_until_settled(&mut rx, &a.handle, &b.handle).await;

    let names = routed.iter().map(|e| e.message.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["negotiation-offer", "negotiation-answer"]);
    assert_eq!(a.transport.applied_offers(), 1);
    assert_eq!(a.transport.rollbacks() + b.transport.rollbacks(), 0);
}

#[tokio::test]
async fn test_polite_side_replays_after_failing_to_answer() {
    init_tracing();
    let (a, b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::granted());

    a.handle.initiate_call().await.expect("call starts");
    route_until_settled(&mut rx, &a.handle, &b.handle).await;

    a.handle
        .add_track(MediaTrack::new("screen-a", TrackKind::Video))
        .await
        .expect("A adds track");
    b.handle
        .add_track(MediaTrack::new("screen-b", TrackKind::Video))
        .await
        .expect("B adds track");
    wait_outstanding(&a).await;
    wait_outstanding(&b).await;

    let (polite, impolite) = if a.id < b.id { (&a, &b) } else { (&b, &a) };
    let first = next_envelope(&mut rx).await;
    let second = next_envelope(&mut rx).await;
    let theirs = if first.from == impolite.id { first } else { second };
    assert!(matches!(theirs.message, SignalingMessage::NegotiationOffer { .. }));

    // The polite side rolls back, then cannot apply the remote offer.
    polite.transport.reject_next_remote();
    route(theirs, &[&a.handle, &b.handle]);

    let replay = next_envelope(&mut rx).await;
    assert_eq!(replay.from, polite.id);
    assert!(matches!(replay.message, SignalingMessage::NegotiationOffer { .. }));

    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        polite.handle.wait_until(|s| {
            s.outstanding == Some(OfferKind::Renegotiation) && !s.renegotiation_pending
        }),
    )
    .await
    .expect("Timeout waiting for replayed offer")
    .expect("coordinator is running");
    assert_eq!(polite.transport.rollbacks(), 1);
}
