//! End-to-end session behavior over the in-memory transport: one scripted
//! peer endpoint, one session under test.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;

use crowdplay_session::transport::memory::{MemoryTransport, duplex};
use crowdplay_session::transport::{FrameSink, FrameSource};
use crowdplay_session::{
    CloseReason, MethodPacket, Packet, PacketId, ReplyPacket, Session, SessionConfig,
    SessionError, SessionEvent, WireError, decode, encode,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Boot a session wired to a scripted peer endpoint.
fn boot() -> (Session, MemoryTransport) {
    let (client, peer) = duplex(32);
    let session = Session::attach(client.sink, client.source, SessionConfig::default());
    (session, peer)
}

/// Read and decode the next method packet the session wrote.
async fn next_method(peer: &mut MemoryTransport) -> MethodPacket {
    let frame = timeout(RECV_TIMEOUT, peer.source.next_frame())
        .await
        .expect("peer read timed out")
        .expect("transport ended")
        .expect("transport errored");
    match decode(&frame).expect("session wrote an undecodable frame") {
        Packet::Method(packet) => packet,
        Packet::Reply(_) => panic!("session wrote a reply"),
    }
}

/// Inject a packet into the session's receive path.
async fn inject(peer: &mut MemoryTransport, packet: Packet) {
    peer.sink.send(encode(&packet)).await.expect("inject failed");
}

fn push(id: u32, method: &str, params: Value, seq: u64) -> Packet {
    let mut packet = MethodPacket::fire(PacketId::new(id), method, params);
    packet.seq = Some(seq);
    Packet::Method(packet)
}

#[tokio::test]
async fn call_resolves_with_the_matching_reply() {
    let (session, mut peer) = boot();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getTime", json!({})).await }
    });

    let request = next_method(&mut peer).await;
    assert_eq!(request.method, "getTime");
    assert!(!request.discard);

    let payload = json!({"time": 1_700_000_000_000_u64});
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, payload.clone())),
    )
    .await;

    assert_eq!(call.await.unwrap().unwrap(), payload);
    assert_eq!(session.pending_calls(), 0);
}

#[tokio::test]
async fn error_reply_surfaces_as_remote_failure() {
    let (session, mut peer) = boot();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("deleteScene", json!({"sceneID": "x"})).await }
    });

    let request = next_method(&mut peer).await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::failure(
            request.id,
            crowdplay_session::ReplyError::new(4010, "Unknown scene."),
        )),
    )
    .await;

    let err = call.await.unwrap().unwrap_err();
    match err {
        SessionError::Remote { method, code, message, .. } => {
            assert_eq!(method, "deleteScene");
            assert_eq!(code, 4010);
            assert_eq!(message, "Unknown scene.");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn silent_peer_times_out_and_clears_the_record() {
    let (session, mut peer) = boot();

    let started = tokio::time::Instant::now();
    let err = session
        .call_with_timeout::<Value>("getScenes", json!({}), Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Timeout { .. }));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(1));
    assert_eq!(session.pending_calls(), 0);

    // The late reply finds no record and changes nothing.
    let request = next_method(&mut peer).await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!({"scenes": []}))),
    )
    .await;

    // The session is still perfectly usable afterwards.
    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getGroups", json!({})).await }
    });
    let retry = next_method(&mut peer).await;
    assert!(retry.id > request.id);
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(retry.id, json!({"groups": []}))),
    )
    .await;
    assert_eq!(call.await.unwrap().unwrap(), json!({"groups": []}));
}

#[tokio::test]
async fn unmatched_reply_leaves_pending_calls_alone() {
    let (session, mut peer) = boot();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getMemoryStats", Value::Null).await }
    });

    let request = next_method(&mut peer).await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(PacketId::new(9999), json!(0))),
    )
    .await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!({"usedBytes": 1}))),
    )
    .await;

    assert_eq!(call.await.unwrap().unwrap(), json!({"usedBytes": 1}));
}

#[tokio::test]
async fn out_of_order_replies_resolve_their_own_calls() {
    let (session, mut peer) = boot();

    // Burn ids 1 and 2 so the in-flight pair lands on 3 and 4.
    session.fire("ready", json!({"isReady": false})).await.unwrap();
    session.fire("ready", json!({"isReady": true})).await.unwrap();
    let _ = next_method(&mut peer).await;
    let _ = next_method(&mut peer).await;

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getGroups", Value::Null).await }
    });
    let request_first = next_method(&mut peer).await;

    let second = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getScenes", Value::Null).await }
    });
    let request_second = next_method(&mut peer).await;

    assert_eq!(request_first.id, PacketId::new(3));
    assert_eq!(request_second.id, PacketId::new(4));

    // Newest first: resolving 4 must not touch 3.
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request_second.id, json!("scenes"))),
    )
    .await;
    assert_eq!(second.await.unwrap().unwrap(), json!("scenes"));
    assert_eq!(session.pending_calls(), 1);

    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request_first.id, json!("groups"))),
    )
    .await;
    assert_eq!(first.await.unwrap().unwrap(), json!("groups"));
    assert_eq!(session.pending_calls(), 0);
}

#[tokio::test]
async fn peer_close_fails_every_pending_call_once() {
    let (session, mut peer) = boot();
    let mut events = session.subscribe();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getScenes", Value::Null).await }
    });
    let _ = next_method(&mut peer).await;
    let second = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getGroups", Value::Null).await }
    });
    let _ = next_method(&mut peer).await;

    drop(peer);

    for handle in [first, second] {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            SessionError::ConnectionClosed {
                reason: CloseReason::PeerClosed
            }
        ));
    }
    assert!(session.is_closed());
    assert_eq!(session.pending_calls(), 0);

    // Exactly one closure event, and nothing after it.
    assert_eq!(
        events.recv().await,
        Some(SessionEvent::Closed(CloseReason::PeerClosed))
    );
    session.shutdown();
    assert!(
        timeout(Duration::from_millis(50), events.recv())
            .await
            .is_err()
    );

    // New calls are refused outright.
    let err = session.call::<Value>("getTime", Value::Null).await.unwrap_err();
    assert!(matches!(err, SessionError::ConnectionClosed { .. }));
}

#[tokio::test]
async fn local_shutdown_fails_pending_calls_and_notifies() {
    let (session, mut peer) = boot();
    let mut events = session.subscribe();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getAllParticipants", json!({"from": 0})).await }
    });
    let _ = next_method(&mut peer).await;

    session.shutdown();

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        SessionError::ConnectionClosed {
            reason: CloseReason::LocalShutdown
        }
    ));
    assert_eq!(
        events.recv().await,
        Some(SessionEvent::Closed(CloseReason::LocalShutdown))
    );

    let err = session.fire("ready", json!({"isReady": false})).await.unwrap_err();
    assert!(matches!(err, SessionError::ConnectionClosed { .. }));
}

#[tokio::test]
async fn pushes_fan_out_in_arrival_order() {
    let (session, mut peer) = boot();
    let mut events = session.subscribe();

    let join = push(201, "onParticipantJoin", json!({"participants": []}), 1);
    let input = push(202, "giveInput", json!({"participantID": "p1"}), 2);
    inject(&mut peer, join.clone()).await;
    inject(&mut peer, input.clone()).await;

    let Packet::Method(join) = join else { unreachable!() };
    let Packet::Method(input) = input else { unreachable!() };
    assert_eq!(events.recv().await, Some(SessionEvent::Method(join)));
    assert_eq!(events.recv().await, Some(SessionEvent::Method(input)));
    assert_eq!(session.dropped_events(), 0);
}

#[tokio::test]
async fn undecodable_frames_are_reported_and_skipped() {
    let (session, mut peer) = boot();
    let mut events = session.subscribe();

    peer.sink.send("{not json".to_owned()).await.unwrap();
    peer.sink
        .send(r#"{"type":"announce","id":1}"#.to_owned())
        .await
        .unwrap();

    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::ProtocolError(WireError::MalformedFrame { .. }))
    ));
    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::ProtocolError(WireError::UnknownPacketKind { kind })) if kind == "announce"
    ));
    assert!(!session.is_closed());

    // The loop survived: a call still round-trips.
    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getTime", json!({})).await }
    });
    let request = next_method(&mut peer).await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!({"time": 1}))),
    )
    .await;
    assert_eq!(call.await.unwrap().unwrap(), json!({"time": 1}));
}

#[tokio::test]
async fn duplicate_reply_resolves_once_and_is_observed_twice() {
    let (session, mut peer) = boot();
    let mut events = session.subscribe();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getThrottleState", Value::Null).await }
    });
    let request = next_method(&mut peer).await;

    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!("first"))),
    )
    .await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!("second"))),
    )
    .await;

    assert_eq!(call.await.unwrap().unwrap(), json!("first"));
    assert_eq!(session.pending_calls(), 0);

    // Observers see both frames; correlation consumed only the first.
    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::Reply(reply)) if reply.result == Some(json!("first"))
    ));
    assert!(matches!(
        events.recv().await,
        Some(SessionEvent::Reply(reply)) if reply.result == Some(json!("second"))
    ));
}

#[tokio::test]
async fn fire_sends_discard_without_registering() {
    let (session, mut peer) = boot();

    session.fire("ready", json!({"isReady": true})).await.unwrap();

    let packet = next_method(&mut peer).await;
    assert_eq!(packet.method, "ready");
    assert!(packet.discard);
    assert_eq!(packet.params, json!({"isReady": true}));
    assert_eq!(session.pending_calls(), 0);
}

#[tokio::test]
async fn ids_increase_across_calls_and_fires() {
    let (session, mut peer) = boot();

    session.fire("ready", json!({"isReady": true})).await.unwrap();
    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getTime", json!({})).await }
    });

    let first = next_method(&mut peer).await;
    let second = next_method(&mut peer).await;
    assert_eq!(first.id, PacketId::new(1));
    assert_eq!(second.id, PacketId::new(2));

    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(second.id, json!({"time": 0}))),
    )
    .await;
    let _ = call.await.unwrap().unwrap();

    session.fire("ready", json!({"isReady": false})).await.unwrap();
    let third = next_method(&mut peer).await;
    assert_eq!(third.id, PacketId::new(3));
}

#[tokio::test]
async fn dropping_the_subscription_stops_delivery() {
    let (session, mut peer) = boot();

    let events = session.subscribe();
    drop(events);

    inject(&mut peer, push(301, "onReady", json!({"isReady": true}), 1)).await;

    // Delivery to zero subscribers drops nothing and loses nothing it owes.
    let call = tokio::spawn({
        let session = session.clone();
        async move { session.call::<Value>("getTime", json!({})).await }
    });
    let request = next_method(&mut peer).await;
    inject(
        &mut peer,
        Packet::Reply(ReplyPacket::success(request.id, json!({"time": 2}))),
    )
    .await;
    assert_eq!(call.await.unwrap().unwrap(), json!({"time": 2}));
    assert_eq!(session.dropped_events(), 0);
}
