//! Cross-frame messaging for self-serve forms embedded in another site.
//!
//! Inside an iframe the wait modal would open at the top of the frame, which
//! may be scrolled out of view on the host page. Before submitting we ask the
//! parent where the visible top is, move the modal there, then submit.

use std::cell::RefCell;
use std::collections::BTreeMap;

use deca_protocol::{FrameRequest, FrameResponse, GET_TOP_RESPONSE};
use serde::{Deserialize, Serialize};

/// How long a request to the parent may stay unanswered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTimeout {
    /// Wait forever; a silent parent leaves the submission pending.
    #[default]
    Never,
    AfterMs(u64),
}

/// Host-page messaging bridge (iframe-resizer's `window.parentIFrame`).
pub trait FrameBridge {
    fn is_available(&self) -> bool;

    fn send_message(&self, payload: &str);
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingRequest {
    sent_at_ms: u64,
}

/// Outstanding requests keyed by `responseID`.
#[derive(Debug, Default)]
pub struct FrameMessenger {
    pending: BTreeMap<String, PendingRequest>,
    timeout: FrameTimeout,
}

impl FrameMessenger {
    pub fn new(timeout: FrameTimeout) -> Self {
        Self {
            pending: BTreeMap::new(),
            timeout,
        }
    }

    /// Register a `get-top` request and return the JSON to post to the parent.
    pub fn request_top(&mut self, response_id: &str, now_ms: u64) -> String {
        self.pending
            .insert(response_id.to_owned(), PendingRequest { sent_at_ms: now_ms });
        // Serializing two strings can't fail.
        serde_json::to_string(&FrameRequest::get_top(response_id)).unwrap_or_default()
    }

    pub fn is_pending(&self, response_id: &str) -> bool {
        self.pending.contains_key(response_id)
    }

    /// Parse an inbound `message` payload. Returns the resolved request id and
    /// the parent's top offset; anything unparseable, unsolicited or for
    /// another flow yields `None`.
    pub fn handle_message(&mut self, raw: &str) -> Option<(String, f64)> {
        let response: FrameResponse = match serde_json::from_str(raw) {
            Ok(response) => response,
            Err(_) => {
                log::trace!("ignoring non-JSON window message");
                return None;
            }
        };
        let response_id = response.response_id?;
        if response.message.as_deref() != Some(GET_TOP_RESPONSE) {
            return None;
        }
        if self.pending.remove(&response_id).is_none() {
            log::debug!("ignoring frame response for `{response_id}` without a pending request");
            return None;
        }
        Some((response_id, response.value.unwrap_or_default()))
    }

    /// Drop requests older than the timeout, returning their ids.
    pub fn expire(&mut self, now_ms: u64) -> Vec<String> {
        let FrameTimeout::AfterMs(limit) = self.timeout else {
            return Vec::new();
        };
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, request)| now_ms.saturating_sub(request.sent_at_ms) >= limit)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.pending.remove(id);
        }
        expired
    }
}

/// What the submit button handler should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStep {
    SubmitNow,
    AwaitParent,
}

/// One self-serve form's side of the protocol.
pub struct SelfServeFlow<B> {
    flow_id: String,
    framed: bool,
    bridge: B,
    messenger: RefCell<FrameMessenger>,
}

impl<B: FrameBridge> SelfServeFlow<B> {
    pub fn new(flow_id: impl Into<String>, framed: bool, bridge: B, timeout: FrameTimeout) -> Self {
        Self {
            flow_id: flow_id.into(),
            framed,
            bridge,
            messenger: RefCell::new(FrameMessenger::new(timeout)),
        }
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn on_submit_click(&self, now_ms: u64) -> FlowStep {
        if !self.framed || !self.bridge.is_available() {
            return FlowStep::SubmitNow;
        }
        let payload = self.messenger.borrow_mut().request_top(&self.flow_id, now_ms);
        self.bridge.send_message(&payload);
        FlowStep::AwaitParent
    }

    /// Top offset (clamped to ≥ 0) when `raw` answers this flow's request.
    pub fn on_message(&self, raw: &str) -> Option<f64> {
        let (response_id, top) = self.messenger.borrow_mut().handle_message(raw)?;
        debug_assert_eq!(response_id, self.flow_id);
        Some(top.max(0.0))
    }

    /// `true` when the outstanding request just timed out and the caller
    /// should submit without repositioning.
    pub fn on_tick(&self, now_ms: u64) -> bool {
        let expired = self.messenger.borrow_mut().expire(now_ms);
        if expired.is_empty() {
            return false;
        }
        log::warn!("parent frame did not answer `{}`; submitting anyway", self.flow_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    struct FakeBridge {
        available: Cell<bool>,
        sent: RefCell<Vec<String>>,
    }

    impl FrameBridge for &FakeBridge {
        fn is_available(&self) -> bool {
            self.available.get()
        }

        fn send_message(&self, payload: &str) {
            self.sent.borrow_mut().push(payload.to_owned());
        }
    }

    fn bridge() -> FakeBridge {
        let bridge = FakeBridge::default();
        bridge.available.set(true);
        bridge
    }

    #[test]
    fn not_framed_submits_immediately() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", false, &bridge, FrameTimeout::Never);
        assert_eq!(flow.on_submit_click(0), FlowStep::SubmitNow);
        assert!(bridge.sent.borrow().is_empty());
    }

    #[test]
    fn missing_bridge_submits_immediately() {
        let bridge = FakeBridge::default();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        assert_eq!(flow.on_submit_click(0), FlowStep::SubmitNow);
    }

    #[test]
    fn framed_flow_asks_parent_for_top() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        assert_eq!(flow.on_submit_click(0), FlowStep::AwaitParent);
        assert_eq!(
            bridge.sent.borrow()[0],
            r#"{"action":"get-top","responseID":"self-serve-join"}"#
        );
    }

    #[test]
    fn negative_top_clamps_to_zero() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        flow.on_submit_click(0);
        let top = flow.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":-50}"#);
        assert_eq!(top, Some(0.0));
    }

    #[test]
    fn positive_top_is_kept() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        flow.on_submit_click(0);
        let top = flow.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":120}"#);
        assert_eq!(top, Some(120.0));
    }

    #[test]
    fn foreign_and_malformed_messages_are_ignored() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        flow.on_submit_click(0);
        assert_eq!(flow.on_message("not json"), None);
        assert_eq!(flow.on_message(r#"[iFrameSizer]message"#), None);
        assert_eq!(
            flow.on_message(r#"{"responseID":"self-serve-volunteer","message":"get-top-response","value":5}"#),
            None
        );
        assert_eq!(flow.on_message(r#"{"responseID":"self-serve-join","message":"other","value":5}"#), None);
        // Still pending: the real answer is accepted.
        assert_eq!(
            flow.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":5}"#),
            Some(5.0)
        );
        // A duplicate answer has nothing left to resolve.
        assert_eq!(
            flow.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":5}"#),
            None
        );
    }

    #[test]
    fn default_policy_waits_forever() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::Never);
        flow.on_submit_click(0);
        assert!(!flow.on_tick(u64::MAX));
    }

    #[test]
    fn bounded_policy_expires_request() {
        let bridge = bridge();
        let flow = SelfServeFlow::new("self-serve-join", true, &bridge, FrameTimeout::AfterMs(3000));
        flow.on_submit_click(1000);
        assert!(!flow.on_tick(3999));
        assert!(flow.on_tick(4000));
        assert!(!flow.on_tick(9000));
        assert_eq!(
            flow.on_message(r#"{"responseID":"self-serve-join","message":"get-top-response","value":5}"#),
            None
        );
    }
}
