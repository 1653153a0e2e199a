//! End-to-end coordination flow: a producer enqueues typed requests against a
//! surface queue, the presentation layer filters by support, user interaction
//! comes back as dispatched and completion responses.

use std::cell::RefCell;
use std::rc::Rc;

use scrim_core::overlays::{
    ConfirmationAction, ConfirmationConfig, ConfirmationResponse, HttpAuthConfig, HttpAuthResponse,
};
use scrim_core::support::{self, AggregateSupport};
use scrim_core::{OverlayRequest, OverlayResponse, RequestQueue};
use url::Url;

/// Interim info dispatched while an auth dialog is up.
#[derive(Debug, PartialEq)]
struct UsernameEdited(String);

fn auth_request() -> OverlayRequest {
    let url = Url::parse("https://example.com/wp-admin").expect("static url parses");
    OverlayRequest::with_config(HttpAuthConfig::new(url, "Site says: restricted", "guest"))
}

#[test]
fn auth_overlay_full_lifecycle() {
    let mut queue = RequestQueue::new();
    let events = Rc::new(RefCell::new(Vec::<String>::new()));

    // Producer enqueues and wires its callbacks up front.
    let log = Rc::clone(&events);
    let manager = queue.push_back(auth_request());
    manager.add_dispatch_callback::<UsernameEdited>(move |edit| {
        log.borrow_mut().push(format!("edited:{}", edit.0));
    });
    let log = Rc::clone(&events);
    manager.add_completion_callback(move |response| {
        let summary = response
            .and_then(|r| r.info::<HttpAuthResponse>())
            .map(|info| format!("submitted:{}", info.username()))
            .unwrap_or_else(|| "cancelled".to_owned());
        log.borrow_mut().push(summary);
    });

    // The surface only shows overlays it supports.
    let surface_support = AggregateSupport::new(vec![
        HttpAuthConfig::request_support(),
        ConfirmationConfig::request_support(),
    ]);
    let front = queue.front_supported(&surface_support).expect("auth overlay is supported");
    let config = front.config::<HttpAuthConfig>().expect("configured with http auth");
    assert_eq!(config.default_username(), "guest");

    // Simulated interaction: two edits, then submission.
    let callbacks = queue.front_callbacks().expect("front entry exists");
    callbacks.dispatch_response(OverlayResponse::with_info(UsernameEdited("g".to_owned())));
    callbacks.dispatch_response(OverlayResponse::with_info(UsernameEdited("gu".to_owned())));
    queue.pop_front(Some(OverlayResponse::with_info(HttpAuthResponse::new("gu", "sekrit"))));

    assert_eq!(*events.borrow(), vec!["edited:g", "edited:gu", "submitted:gu"]);
    assert!(queue.is_empty());
}

#[test]
fn unsupported_front_request_is_not_offered() {
    let mut queue = RequestQueue::new();
    queue.push_back(OverlayRequest::with_config(ConfirmationConfig::new("t", "m")));

    assert!(queue.front_supported(HttpAuthConfig::request_support()).is_none());
    assert!(queue.front_supported(support::all()).is_some());
    assert!(queue.front_supported(support::none()).is_none());
}

#[test]
fn surface_teardown_cancels_pending_overlays() {
    let mut queue = RequestQueue::new();
    let outcomes = Rc::new(RefCell::new(Vec::<Option<bool>>::new()));

    for _ in 0..2 {
        let log = Rc::clone(&outcomes);
        queue
            .push_back(OverlayRequest::with_config(ConfirmationConfig::new("Leave page?", "")))
            .add_completion_callback(move |response| {
                let action = response
                    .and_then(|r| r.info::<ConfirmationResponse>())
                    .map(|info| info.confirmed());
                log.borrow_mut().push(action);
            });
    }

    // The first alert resolves; the surface then goes away with one pending.
    queue.pop_front(Some(OverlayResponse::with_info(ConfirmationResponse::new(
        ConfirmationAction::Confirmed,
    ))));
    queue.cancel_all();

    assert_eq!(*outcomes.borrow(), vec![Some(true), None]);
}
