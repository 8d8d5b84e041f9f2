//! Hostile traffic against the message guard: impersonation, origin
//! spoofing, replay, and probe attempts. Every attack must be absorbed
//! silently — no state change, no user-visible reaction.

use crate::harness::{guest_origin, Harness};
use embed_host::{ChannelId, EmbedSessionApi, GuestChannel, InboundFrame, SessionState};
use shared_types::{ChannelMessage, SessionNonce, WebOrigin};
use serde_json::json;
use url::Url;

fn evil_origin() -> WebOrigin {
    WebOrigin::parse("https://evil.example").unwrap()
}

#[tokio::test]
async fn impersonating_context_rejected_with_perfect_credentials() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    // The attacker controls a second embedded context and has somehow
    // learned the real origin and nonce. The channel check alone must
    // stop this.
    let frame = InboundFrame::new(
        ChannelId::mint(),
        guest_origin(),
        ChannelMessage::embed_ready(h.nonce()).to_value(),
    );
    h.service.on_frame(frame).await;

    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.ticket_calls(), 0);
    assert!(h.service.take_notices().is_empty());
}

#[tokio::test]
async fn unlisted_origin_rejected_with_correct_nonce() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    let frame = InboundFrame::new(
        h.channel.id(),
        evil_origin(),
        ChannelMessage::embed_ready(h.nonce()).to_value(),
    );
    h.service.on_frame(frame).await;

    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.ticket_calls(), 0);
}

#[tokio::test]
async fn stale_nonce_rejected_from_correct_context_and_origin() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    // A nonce from a torn-down prior session.
    let stale = SessionNonce::mint();
    let frame = h.guest_frame(&ChannelMessage::embed_ready(stale));
    h.service.on_frame(frame).await;

    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.ticket_calls(), 0);
}

#[tokio::test]
async fn forged_close_cannot_tear_down_session() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    // CLOSE is unconditional once guarded, so the guard is all that
    // stands between an attacker and a denial-of-service teardown.
    let forged = InboundFrame::new(
        h.channel.id(),
        evil_origin(),
        ChannelMessage::close(h.nonce()).to_value(),
    );
    h.service.on_frame(forged).await;
    assert_eq!(h.service.state(), SessionState::Ready);
    assert!(!h.channel.is_torn_down());

    let replayed = h.guest_frame(&ChannelMessage::close(SessionNonce::mint()));
    h.service.on_frame(replayed).await;
    assert_eq!(h.service.state(), SessionState::Ready);
}

#[tokio::test]
async fn open_link_probe_before_auth_is_ignored() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    // Correctly guarded but premature: capabilities exist only once the
    // session is active.
    let probe = h.guest_frame(&ChannelMessage::open_link(
        h.nonce(),
        Url::parse("https://phish.example/login").unwrap(),
    ));
    h.service.on_frame(probe).await;

    assert!(h.links.opened().is_empty());
    assert_eq!(h.service.state(), SessionState::Ready);
}

#[tokio::test]
async fn malformed_garbage_is_absorbed() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    let bodies = vec![
        json!(null),
        json!(42),
        json!("EMBED_READY"),
        json!([1, 2, 3]),
        json!({}),
        json!({ "type": 7 }),
        json!({ "type": "EMBED_READY" }),
        json!({ "type": "NOT_A_REAL_KIND", "version": 1, "sessionNonce": h.nonce() }),
        json!({ "type": "EMBED_READY", "version": 9000, "sessionNonce": h.nonce() }),
        json!({ "type": "OPEN_LINK", "version": 1, "sessionNonce": h.nonce(), "payload": {} }),
    ];
    for body in bodies {
        let frame = InboundFrame::new(h.channel.id(), guest_origin(), body);
        h.service.on_frame(frame).await;
    }

    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.ticket_calls(), 0);
    assert!(h.service.take_notices().is_empty());
}

#[tokio::test]
async fn echoed_ticket_message_is_not_honored() {
    let h = Harness::new("a1");
    h.service.start().await.unwrap();

    // A guest reflecting the host-to-guest kind back over a valid
    // channel must not move the state machine.
    let echo = h.guest_frame(&ChannelMessage::sso_ticket(
        h.nonce(),
        "stolen".to_string(),
        "a1".to_string(),
    ));
    h.service.on_frame(echo).await;

    assert_eq!(h.service.state(), SessionState::Ready);
    assert_eq!(h.trust.ticket_calls(), 0);
}

#[tokio::test]
async fn sibling_origin_delegation_is_honored() {
    // The allow-list may be wider than the guest origin itself; a
    // delegated sibling must pass while strangers still fail.
    let mut grant = crate::harness::grant_for("a1");
    let sibling = WebOrigin::parse("https://cdn.guest.example").unwrap();
    grant.allowed_post_message_origins.push(sibling.clone());

    let h = Harness::with_grant("a1", grant);
    h.service.start().await.unwrap();

    let from_sibling = InboundFrame::new(
        h.channel.id(),
        sibling,
        ChannelMessage::embed_ready(h.nonce()).to_value(),
    );
    h.service.on_frame(from_sibling).await;
    assert_eq!(h.service.state(), SessionState::Active);

    // Ticket delivery still targets the guest origin, not the sibling.
    assert_eq!(h.channel.deliveries()[0].0, guest_origin());
}
