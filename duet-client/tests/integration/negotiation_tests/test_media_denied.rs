use duet_client::{CoordinatorEvent, MediaError, NegotiationError, NegotiationState};
use duet_core::{SessionDescription, SignalingMessage};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{TrackedMediaSource, manual_pair, stays_quiet};

#[tokio::test]
async fn test_caller_without_media_stays_idle() {
    init_tracing();
    let (mut a, _b, mut rx) = manual_pair(TrackedMediaSource::denied(), TrackedMediaSource::granted());

    let err = a.handle.initiate_call().await.unwrap_err();
    assert_eq!(err, NegotiationError::Media(MediaError::PermissionDenied));

    assert_eq!(
        a.expect_event(|e| matches!(e, CoordinatorEvent::MediaUnavailable(_)))
            .await,
        CoordinatorEvent::MediaUnavailable(MediaError::PermissionDenied)
    );
    assert_eq!(a.handle.state(), NegotiationState::Idle);
    assert!(a.transport.local_tracks().is_empty());
    assert!(stays_quiet(&mut rx, Duration::from_millis(150)).await);
}

#[tokio::test]
async fn test_callee_without_media_sends_nothing() {
    init_tracing();
    let (a, mut b, mut rx) = manual_pair(TrackedMediaSource::granted(), TrackedMediaSource::denied());

    b.handle
        .deliver(
            a.id,
            SignalingMessage::CallOffer {
                description: SessionDescription::offer("from-a"),
            },
        )
        .expect("deliver");

    b.expect_event(|e| matches!(e, CoordinatorEvent::MediaUnavailable(_)))
        .await;
    assert_eq!(b.handle.state(), NegotiationState::Idle);
    assert_eq!(b.transport.applied_offers(), 0);
    assert!(stays_quiet(&mut rx, Duration::from_millis(150)).await);
}
