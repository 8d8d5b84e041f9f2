//! The full session story, driven through the public API only.

use crate::harness::{guest_origin, Harness};
use embed_host::{EmbedSessionApi, ErrorCause, SessionNotice, SessionState};
use shared_types::{ChannelMessage, MessageKind, MessagePayload};
use std::sync::atomic::Ordering;
use url::Url;

#[tokio::test]
async fn full_session_lifecycle() {
    let h = Harness::new("a1");

    // Launch: one trust-server call, guest mounted at the augmented URL.
    h.service.start().await.unwrap();
    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.start_calls(), 1);
    let mounts = h.channel.mounts();
    assert_eq!(mounts.len(), 1);
    assert!(mounts[0].query().unwrap().contains("appId=a1"));

    // Guest announces readiness; host relays exactly one fresh ticket.
    let ready = h.guest_frame(&ChannelMessage::embed_ready(h.nonce()));
    h.service.on_frame(ready).await;
    assert_eq!(h.service.state(), SessionState::Active);
    assert_eq!(h.trust.ticket_requests(), vec![("a1".to_string(), h.nonce())]);

    let deliveries = h.channel.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, guest_origin());
    match &deliveries[0].1.payload {
        MessagePayload::SsoTicket(p) => assert_eq!(p.app_id, "a1"),
        other => panic!("expected ticket payload, got {other:?}"),
    }

    // Guest exercises its capabilities.
    let target = Url::parse("https://docs.example/report").unwrap();
    let open = h.guest_frame(&ChannelMessage::open_link(h.nonce(), target.clone()));
    h.service.on_frame(open).await;
    assert_eq!(h.links.opened(), vec![target]);

    // Guest asks to close; teardown is complete and final.
    let close = h.guest_frame(&ChannelMessage::close(h.nonce()));
    h.service.on_frame(close).await;
    assert_eq!(h.service.state(), SessionState::Closed);
    assert!(h.channel.is_torn_down());
    assert!(h.service.session_config().is_none());
    assert!(h.service.take_notices().contains(&SessionNotice::Closed));
}

#[tokio::test]
async fn launch_failure_requires_fresh_relaunch() {
    let h = Harness::new("a1");
    h.trust.fail_start.store(true, Ordering::SeqCst);

    assert!(h.service.start().await.is_err());
    assert_eq!(
        h.service.state(),
        SessionState::Errored {
            cause: ErrorCause::Launch
        }
    );
    assert!(matches!(
        h.service.take_notices().as_slice(),
        [SessionNotice::LaunchFailed { .. }]
    ));

    // No silent retry: the trust server saw exactly one start.
    assert_eq!(h.trust.start_calls(), 1);

    // The only exit is close, which always succeeds.
    h.service.close().await;
    assert_eq!(h.service.state(), SessionState::Closed);
}

#[tokio::test]
async fn auth_failure_recovers_through_reauth() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();
    h.trust.fail_tickets.store(true, Ordering::SeqCst);

    let ready = h.guest_frame(&ChannelMessage::embed_ready(h.nonce()));
    h.service.on_frame(ready).await;
    assert_eq!(
        h.service.state(),
        SessionState::Errored {
            cause: ErrorCause::Authentication
        }
    );

    // Session config survives the failure; a later re-auth succeeds.
    assert!(h.service.session_config().is_some());
    h.trust.fail_tickets.store(false, Ordering::SeqCst);
    let reauth = h.guest_frame(&ChannelMessage::request_reauth(h.nonce()));
    h.service.on_frame(reauth).await;
    assert_eq!(h.service.state(), SessionState::Active);
}

#[tokio::test]
async fn consecutive_reauths_always_fetch_fresh_tickets() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    let ready = h.guest_frame(&ChannelMessage::embed_ready(h.nonce()));
    h.service.on_frame(ready).await;
    for _ in 0..2 {
        let reauth = h.guest_frame(&ChannelMessage::request_reauth(h.nonce()));
        h.service.on_frame(reauth).await;
    }

    // Three requests, three fetches, three distinct tickets.
    assert_eq!(h.trust.ticket_calls(), 3);
    let mut tickets: Vec<String> = h
        .channel
        .deliveries()
        .iter()
        .filter_map(|(_, m)| match &m.payload {
            MessagePayload::SsoTicket(p) => Some(p.ticket.clone()),
            _ => None,
        })
        .collect();
    let before = tickets.len();
    tickets.dedup();
    assert_eq!(tickets.len(), before);
}

#[tokio::test]
async fn every_delivery_is_targeted_at_the_guest_origin() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    let ready = h.guest_frame(&ChannelMessage::embed_ready(h.nonce()));
    h.service.on_frame(ready).await;
    let reauth = h.guest_frame(&ChannelMessage::request_reauth(h.nonce()));
    h.service.on_frame(reauth).await;

    for (target, message) in h.channel.deliveries() {
        assert_eq!(target, guest_origin());
        assert_eq!(message.kind, MessageKind::SsoTicket);
    }
}

#[tokio::test]
async fn close_honored_after_auth_failure() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();
    h.trust.fail_tickets.store(true, Ordering::SeqCst);

    // Push the session into the auth-errored corner, then close.
    let ready = h.guest_frame(&ChannelMessage::embed_ready(h.nonce()));
    h.service.on_frame(ready).await;
    h.service.close().await;
    assert_eq!(h.service.state(), SessionState::Closed);
    assert!(h.channel.is_torn_down());
}

#[tokio::test]
async fn independent_sessions_share_nothing() {
    let a = Harness::new("a1");
    let b = Harness::new("b2");
    a.service.start().await.unwrap();
    b.service.start().await.unwrap();

    // A frame for session A, replayed against session B, dies on the
    // channel check (different context) and the nonce check alike.
    let ready_for_a = a.guest_frame(&ChannelMessage::embed_ready(a.nonce()));
    b.service.on_frame(ready_for_a).await;

    assert_eq!(b.service.state(), SessionState::Ready);
    assert_eq!(b.trust.ticket_calls(), 0);

    // Session A is unaffected by B's traffic.
    assert_eq!(a.service.state(), SessionState::Ready);
    a.service.close().await;
    assert_eq!(b.service.state(), SessionState::Ready);
}
