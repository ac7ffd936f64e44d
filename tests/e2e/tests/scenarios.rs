//! Checker scenarios against mock switches over loopback TCP

use checker_config::ReceivePolicy;
use codec::{CodecRegistry, FrameCodec};
use network::{OfpChecker, TransportError, PLACEHOLDER_DPID};
use ofp_e2e_tests::{init_tracing, loopback_config, MockSwitch, MockSwitchConfig, PACKET_IN};
use std::sync::Arc;
use std::time::{Duration, Instant};
use types::{
    Action, Body, FlowMod, FlowStats, FlowStatsRequest, Instruction, Match, Message,
    MessageKind, MultipartReply, MultipartRequest,
};

const WAIT: Duration = Duration::from_secs(5);

async fn connected(dpids: &[u64], switches: Vec<MockSwitchConfig>) -> (OfpChecker, Vec<MockSwitch>) {
    init_tracing();
    connected_with(OfpChecker::new(loopback_config(dpids)), dpids, switches).await
}

async fn connected_with(
    mut checker: OfpChecker,
    dpids: &[u64],
    switches: Vec<MockSwitchConfig>,
) -> (OfpChecker, Vec<MockSwitch>) {
    let addr = checker.listen().await.unwrap();
    let switches = switches
        .into_iter()
        .map(|config| MockSwitch::connect(addr, config))
        .collect();
    checker.start(dpids, WAIT).await.unwrap();
    (checker, switches)
}

fn forwarding_rule() -> FlowMod {
    FlowMod {
        priority: 10,
        match_: Match::new().in_port(1),
        instructions: vec![Instruction::ApplyActions(vec![Action::output(2)])],
        ..FlowMod::add()
    }
}

fn flow_stats_request() -> Message {
    Message::new(Body::MultipartRequest(MultipartRequest::flow(
        FlowStatsRequest::default(),
    )))
}

async fn barrier(checker: &OfpChecker, dpid: u64) -> Result<Message, TransportError> {
    let sent = checker.send_msg(dpid, Message::barrier_request(), WAIT).await?;
    let (_, reply) = checker
        .recv_msg(
            dpid,
            Message::new(Body::BarrierReply),
            Some(["msg_type", "xid"].into()),
            sent.xid,
            0,
            WAIT,
        )
        .await?;
    Ok(reply)
}

#[tokio::test]
async fn test_handshake_rekeys_session_under_learned_dpid() {
    let (mut checker, _switches) = connected(&[7], vec![MockSwitchConfig::new(7)]).await;

    assert_eq!(checker.identifiers(), vec![7]);
    assert!(matches!(
        checker.session(PLACEHOLDER_DPID),
        Err(TransportError::UnknownPeer { dpid: PLACEHOLDER_DPID })
    ));
    let session = checker.session(7).unwrap();
    assert_eq!(session.lock().await.dpid(), 7);

    checker.close().await;
    assert!(checker.identifiers().is_empty());
}

#[tokio::test]
async fn test_installed_flow_is_reported_in_flow_stats() {
    let switch = MockSwitchConfig::new(1).with_flow_duration(42);
    let (mut checker, switches) = connected(&[1], vec![switch]).await;

    checker
        .send(1, Message::new(Body::FlowMod(forwarding_rule())), WAIT)
        .await
        .unwrap();
    barrier(&checker, 1).await.unwrap();
    assert_eq!(switches[0].flows(), vec![forwarding_rule()]);

    let request = checker.send_msg(1, flow_stats_request(), WAIT).await.unwrap();

    // 48 fixed + 16 match + 24 apply-actions
    let entry = FlowStats {
        length: 88,
        priority: 10,
        match_: Match::new().in_port(1),
        instructions: vec![Instruction::ApplyActions(vec![Action::output(2)])],
        ..FlowStats::default()
    }
    .with_targets(["length", "priority", "match", "instructions"]);
    let expected = Message::new(Body::MultipartReply(MultipartReply::flow(vec![entry])));

    let (expected, actual) = checker
        .recv_msg(1, expected, None, request.xid, 104, WAIT)
        .await
        .unwrap();
    assert_eq!(expected.xid, request.xid);
    assert_eq!(actual.msg_len, 104);
    match actual.body {
        Body::MultipartReply(reply) => match reply.body {
            types::MultipartReplyBody::Flow(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].duration_sec, 42);
            }
            other => panic!("unexpected multipart body {:?}", other),
        },
        other => panic!("unexpected body {:?}", other),
    }

    checker.close().await;
}

#[tokio::test]
async fn test_flow_stats_mismatch_is_reported() {
    let (mut checker, _switches) = connected(&[1], vec![MockSwitchConfig::new(1)]).await;

    checker
        .send(1, Message::new(Body::FlowMod(forwarding_rule())), WAIT)
        .await
        .unwrap();
    let request = checker.send_msg(1, flow_stats_request(), WAIT).await.unwrap();

    let entry = FlowStats {
        priority: 20,
        ..FlowStats::default()
    }
    .with_targets(["priority"]);
    let err = checker
        .recv_msg(
            1,
            Message::new(Body::MultipartReply(MultipartReply::flow(vec![entry]))),
            Some(["msg_type", "xid", "body"].into()),
            request.xid,
            0,
            WAIT,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::ComparisonMismatch { .. }));
    assert_eq!(err.category(), "mismatch");

    // a failed comparison leaves the session usable
    barrier(&checker, 1).await.unwrap();
    checker.close().await;
}

#[tokio::test]
async fn test_echo_reply_matches_pinned_xid() {
    let (mut checker, _switches) = connected(&[3], vec![MockSwitchConfig::new(3)]).await;

    let request = checker
        .send_msg(3, Message::echo_request(b"ping".to_vec()).with_xid(0x1234), WAIT)
        .await
        .unwrap();
    assert_eq!(request.xid, Some(0x1234));

    let (_, reply) = checker
        .recv_msg(
            3,
            Message::new(Body::EchoReply(types::Echo::new(b"ping".to_vec()))),
            Some(["msg_type", "xid", "data"].into()),
            Some(0x1234),
            0,
            WAIT,
        )
        .await
        .unwrap();
    assert_eq!(reply.kind(), MessageKind::EchoReply);

    checker.close().await;
}

#[tokio::test]
async fn test_receive_times_out_on_silent_switch() {
    let (mut checker, _switches) = connected(&[5], vec![MockSwitchConfig::new(5).silent()]).await;

    checker.send(5, Message::barrier_request(), WAIT).await.unwrap();
    let started = Instant::now();
    let err = checker
        .receive(5, Some(&Message::new(Body::BarrierReply)), Duration::from_secs(1))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, TransportError::Timeout { .. }));
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3));

    // a timeout is not fatal
    let session = checker.session(5).unwrap();
    assert!(!session.lock().await.is_closed());
    checker.close().await;
}

#[tokio::test]
async fn test_default_policy_skips_unsolicited_messages() {
    let switch = MockSwitchConfig::new(2).with_chatter();
    let (mut checker, _switches) = connected(&[2], vec![switch]).await;

    let reply = barrier(&checker, 2).await.unwrap();
    assert_eq!(reply.kind(), MessageKind::BarrierReply);

    checker.close().await;
}

#[tokio::test]
async fn test_strict_policy_rejects_other_kinds() {
    init_tracing();
    let mut config = loopback_config(&[2]);
    config.receive_policy = ReceivePolicy::Strict;
    let (mut checker, _switches) = connected_with(
        OfpChecker::new(config),
        &[2],
        vec![MockSwitchConfig::new(2).with_chatter()],
    )
    .await;

    let err = barrier(&checker, 2).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::UnexpectedKind {
            expected: MessageKind::BarrierReply,
            actual: MessageKind::EchoRequest,
        }
    ));

    checker.close().await;
}

#[tokio::test]
async fn test_packet_in_ahead_of_reply_is_skipped() {
    let switch = MockSwitchConfig::new(2).with_packet_in().with_chatter();
    let (mut checker, _switches) = connected(&[2], vec![switch]).await;

    let reply = barrier(&checker, 2).await.unwrap();
    assert_eq!(reply.kind(), MessageKind::BarrierReply);
    // the session survives the frame nobody can decode
    barrier(&checker, 2).await.unwrap();

    checker.close().await;
}

#[tokio::test]
async fn test_strict_policy_rejects_packet_in() {
    init_tracing();
    let mut config = loopback_config(&[2]);
    config.receive_policy = ReceivePolicy::Strict;
    let (mut checker, _switches) = connected_with(
        OfpChecker::new(config),
        &[2],
        vec![MockSwitchConfig::new(2).with_packet_in()],
    )
    .await;

    let err = barrier(&checker, 2).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::UnexpectedKind {
            expected: MessageKind::BarrierReply,
            actual: MessageKind::PacketIn,
        }
    ));
    let session = checker.session(2).unwrap();
    assert!(!session.lock().await.is_closed());

    checker.close().await;
}

#[tokio::test]
async fn test_custom_codec_receives_packet_in_as_opaque() {
    init_tracing();
    let mut registry = CodecRegistry::builtin();
    registry.register_opaque(MessageKind::PacketIn);
    let checker = OfpChecker::new(loopback_config(&[2]))
        .with_codec(FrameCodec::new(Arc::new(registry)));
    let (mut checker, _switches) =
        connected_with(checker, &[2], vec![MockSwitchConfig::new(2).with_packet_in()]).await;

    let sent = checker.send_msg(2, Message::barrier_request(), WAIT).await.unwrap();
    let packet_in = checker.receive(2, None, WAIT).await.unwrap();
    match packet_in.body {
        Body::Opaque(body) => {
            assert_eq!(body.kind, MessageKind::PacketIn);
            assert_eq!(body.data, PACKET_IN[8..].to_vec());
        }
        other => panic!("unexpected body {:?}", other),
    }

    let reply = checker.receive(2, None, WAIT).await.unwrap();
    assert_eq!(reply.kind(), MessageKind::BarrierReply);
    assert_eq!(reply.xid, sent.xid);

    checker.close().await;
}

#[tokio::test]
async fn test_reserved_dpid_is_rejected() {
    init_tracing();
    let mut checker = OfpChecker::new(loopback_config(&[1]));
    let err = checker.start(&[PLACEHOLDER_DPID], WAIT).await.unwrap_err();
    assert!(matches!(err, TransportError::Configuration { .. }));
    assert!(checker.local_addr().is_none());
}

#[tokio::test]
async fn test_start_times_out_without_switches() {
    init_tracing();
    let mut checker = OfpChecker::new(loopback_config(&[1]));
    let err = checker
        .start(&[1], Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout { .. }));
    assert!(checker.identifiers().is_empty());
}

#[tokio::test]
async fn test_two_switches_are_addressed_independently() {
    let (mut checker, switches) = connected(
        &[1, 2],
        vec![MockSwitchConfig::new(1), MockSwitchConfig::new(2)],
    )
    .await;
    assert_eq!(checker.identifiers(), vec![1, 2]);

    checker
        .send(2, Message::new(Body::FlowMod(forwarding_rule())), WAIT)
        .await
        .unwrap();
    barrier(&checker, 2).await.unwrap();
    barrier(&checker, 1).await.unwrap();

    let by_dpid = |dpid: u64| {
        switches
            .iter()
            .find(|switch| switch.dpid() == dpid)
            .map(MockSwitch::flows)
            .unwrap()
    };
    assert!(by_dpid(1).is_empty());
    assert_eq!(by_dpid(2).len(), 1);

    checker.close().await;
    for switch in switches {
        switch.join().await.unwrap();
    }
}

#[tokio::test]
async fn test_unexpected_dpid_is_dropped() {
    init_tracing();
    let mut checker = OfpChecker::new(loopback_config(&[1]));
    let addr = checker.listen().await.unwrap();

    let stranger = MockSwitch::connect(addr, MockSwitchConfig::new(9));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _expected = MockSwitch::connect(addr, MockSwitchConfig::new(1));

    checker.start(&[1], WAIT).await.unwrap();
    assert_eq!(checker.identifiers(), vec![1]);
    assert!(matches!(
        checker.session(9),
        Err(TransportError::UnknownPeer { dpid: 9 })
    ));

    // the stranger sees its connection closed
    tokio::time::timeout(WAIT, stranger.join())
        .await
        .unwrap()
        .unwrap();
    checker.close().await;
}

#[tokio::test]
async fn test_operations_after_close_fail() {
    let (mut checker, _switches) = connected(&[4], vec![MockSwitchConfig::new(4)]).await;
    checker.close().await;

    let err = checker
        .send(4, Message::barrier_request(), WAIT)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::UnknownPeer { dpid: 4 }));
    assert!(checker.local_addr().is_none());
}
