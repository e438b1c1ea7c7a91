use duet_core::{ParticipantId, ServerEvent};
use duet_server::{SignalingError, SignalingService};
use std::sync::Barrier;
use std::thread;

use crate::integration::init_tracing;
use crate::utils::MockParticipant;

#[test]
fn test_two_racing_joins_form_one_room() {
    init_tracing();
    let service = SignalingService::new();

    for round in 0..200 {
        let room = format!("race-{}", round);
        let a = MockParticipant::connect(&service);
        let b = MockParticipant::connect(&service);
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            for id in [a.id, b.id] {
                let (service, barrier, room) = (&service, &barrier, room.clone());
                scope.spawn(move || {
                    barrier.wait();
                    service.rooms().join(room.into(), id).unwrap();
                });
            }
        });

        let mut members = service.rooms().members(&room.clone().into());
        members.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(members, expected, "round {}", round);
        assert_eq!(service.rooms().peer_of(&a.id), Some(b.id));
        assert_eq!(service.rooms().peer_of(&b.id), Some(a.id));
    }

    assert_eq!(service.rooms().room_count(), 200);
}

#[test]
fn test_many_racing_joins_never_overfill() {
    init_tracing();
    let service = SignalingService::new();
    let ids: Vec<ParticipantId> = (0..8)
        .map(|_| MockParticipant::connect(&service).id)
        .collect();
    let barrier = Barrier::new(ids.len());

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let (service, barrier, id) = (&service, &barrier, *id);
                scope.spawn(move || {
                    barrier.wait();
                    service.rooms().join("crowded".into(), id)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(SignalingError::RoomFull(_))))
        .count();

    assert_eq!(accepted, 2);
    assert_eq!(refused, ids.len() - 2);
    assert_eq!(service.rooms().members(&"crowded".into()).len(), 2);
}

#[test]
fn test_join_racing_disconnect_keeps_notifications_ordered() {
    init_tracing();
    let service = SignalingService::new();

    for round in 0..300 {
        let room = format!("leaving-{}", round);
        let mut a = MockParticipant::connect(&service);
        let mut b = MockParticipant::connect(&service);
        service.rooms().join(room.clone().into(), a.id).unwrap();
        a.drain();
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            let (service, barrier) = (&service, &barrier);
            let (a_id, b_id) = (a.id, b.id);
            let room = room.clone();
            scope.spawn(move || {
                barrier.wait();
                service.rooms().join(room.into(), b_id).unwrap();
            });
            scope.spawn(move || {
                barrier.wait();
                service.disconnect(&a_id);
            });
        });

        let events = b.drain();
        let Some(ServerEvent::Joined { members, .. }) = events.first() else {
            panic!("round {}: joined was not first: {:?}", round, events);
        };
        if members.contains(&a.id) {
            assert_eq!(
                events[1..],
                [ServerEvent::PeerLeft { peer_id: a.id }],
                "round {}",
                round
            );
        } else {
            assert_eq!(members, &vec![b.id], "round {}", round);
            assert_eq!(events.len(), 1, "round {}: {:?}", round, events);
        }
        assert_eq!(service.rooms().members(&room.into()), vec![b.id]);
    }
}
