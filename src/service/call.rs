//! Call lifecycle coordination and signaling relay.
//!
//! One call at a time per participant, enforced when the call starts: a
//! target that is unknown, already in a call, or the caller themself
//! yields a targeted `callBusy` and nothing else. Lifecycle transitions
//! (`accept`, `reject`, `end`) are guarded so racing frames cannot drive
//! the state machine anywhere illegal; every guard failure is a silent
//! no-op on the wire, surfaced only as a typed error to the dispatch
//! layer. The ring timeout is a spawned task per ringing call; the
//! coordinator itself is passive with respect to time.

use std::sync::Arc;

use chrono::Utc;

use super::{RelayService, RelayState};
use crate::domain::{Call, CallId, CallStatus, ClientId, ServerEvent, SignalKind};
use crate::error::GatewayError;

impl RelayService {
    /// Starts a call from `caller` to `target` and returns the call id.
    ///
    /// On success the call enters `ringing`, the caller's current-call and
    /// in-call flag are set, the target receives a targeted
    /// `incomingCall`, everyone receives a `callStarted` broadcast, and
    /// the ring timeout is armed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] if the caller is
    /// unknown, or [`GatewayError::TargetBusy`] if the target is unknown,
    /// already in a call, the caller themself, or the caller is already in
    /// a call. In the busy cases the caller has been sent the `callBusy`
    /// notification and the live-call set is untouched.
    pub async fn start_call(
        self: &Arc<Self>,
        caller: ClientId,
        target: ClientId,
    ) -> Result<CallId, GatewayError> {
        let mut state = self.state().write().await;

        let Some(caller_entry) = state.registry.get(caller) else {
            return Err(GatewayError::ParticipantNotFound(caller));
        };
        let caller_name = caller_entry.username.clone();
        let caller_busy = caller_entry.in_call;
        let target_free = state.registry.get(target).is_some_and(|p| !p.in_call);

        if caller == target || caller_busy || !target_free {
            state.send_to(
                caller,
                &ServerEvent::CallBusy {
                    target_user_id: target,
                    timestamp: Utc::now(),
                },
            );
            return Err(GatewayError::TargetBusy(target));
        }

        let call = Call::ringing(caller, target);
        let call_id = call.id;
        let started_at = call.started_at;
        if let Some(participant) = state.registry.get_mut(caller) {
            participant.join_call(call_id);
        }
        state.calls.insert(call);

        state.send_to(
            target,
            &ServerEvent::IncomingCall {
                call_id,
                caller_id: caller,
                caller_name,
                timestamp: started_at,
            },
        );
        state.broadcast(
            &ServerEvent::CallStarted {
                call_id,
                caller_id: caller,
                target_user_id: target,
                timestamp: started_at,
            },
            None,
        );
        drop(state);

        self.arm_ring_timer(call_id, target);
        tracing::info!(%call_id, caller_id = %caller, target_id = %target, "call ringing");
        Ok(call_id)
    }

    /// Accepts a ringing call on behalf of its target.
    ///
    /// Transitions the call to `active`, stamps the accept time, sets the
    /// accepter's current-call and in-call flag, disarms the ring timeout,
    /// notifies the caller directly, and broadcasts the acceptance to
    /// everyone else.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CallNotFound`] for an unknown call,
    /// [`GatewayError::NotCallMember`] when `accepter` is not the rung
    /// target, or [`GatewayError::InvalidTransition`] when the call is no
    /// longer ringing. All are silent no-ops on the wire.
    pub async fn accept_call(
        &self,
        accepter: ClientId,
        call_id: CallId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state().write().await;

        let Some(call) = state.calls.get_mut(call_id) else {
            return Err(GatewayError::CallNotFound(call_id));
        };
        if call.target != accepter {
            return Err(GatewayError::NotCallMember(accepter));
        }
        if !call.accept() {
            return Err(GatewayError::InvalidTransition(call.status));
        }
        let caller = call.caller;
        let accepted_at = call.accepted_at.unwrap_or_else(Utc::now);

        if let Some(participant) = state.registry.get_mut(accepter) {
            participant.join_call(call_id);
        }
        self.disarm_ring_timer(call_id);

        let event = ServerEvent::CallAccepted {
            call_id,
            accepter_id: accepter,
            timestamp: accepted_at,
        };
        state.send_to(caller, &event);
        state.broadcast(&event, Some(caller));

        tracing::info!(%call_id, accepter_id = %accepter, "call accepted");
        Ok(())
    }

    /// Rejects a ringing call on behalf of its target.
    ///
    /// The call never reaches `active`: the caller is notified directly
    /// and has their call state cleared, the call is removed from the live
    /// set, the timeout is disarmed, and the rejection is broadcast to
    /// everyone else. Also invoked by the ring timer when the target lets
    /// the call ring out.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CallNotFound`] for an unknown call,
    /// [`GatewayError::NotCallMember`] when `rejecter` is not the rung
    /// target, or [`GatewayError::InvalidTransition`] when the call is no
    /// longer ringing. All are silent no-ops on the wire.
    pub async fn reject_call(
        &self,
        rejecter: ClientId,
        call_id: CallId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state().write().await;

        let Some(call) = state.calls.get(call_id) else {
            return Err(GatewayError::CallNotFound(call_id));
        };
        if call.status != CallStatus::Ringing {
            return Err(GatewayError::InvalidTransition(call.status));
        }
        if call.target != rejecter {
            return Err(GatewayError::NotCallMember(rejecter));
        }
        let caller = call.caller;

        let _ = state.calls.remove(call_id);
        if let Some(participant) = state.registry.get_mut(caller)
            && participant.current_call == Some(call_id)
        {
            participant.leave_call();
        }
        self.disarm_ring_timer(call_id);

        let event = ServerEvent::CallRejected {
            call_id,
            rejecter_id: rejecter,
            timestamp: Utc::now(),
        };
        state.send_to(caller, &event);
        state.broadcast(&event, Some(caller));

        tracing::info!(%call_id, rejecter_id = %rejecter, "call rejected");
        Ok(())
    }

    /// Ends a live call (ringing or active) on behalf of either member.
    ///
    /// Clears call state and in-call flags on both members (whichever are
    /// still registered), notifies both directly, removes the call from
    /// the live set, and broadcasts `callEnded` to everyone else.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CallNotFound`] for an unknown call or
    /// [`GatewayError::NotCallMember`] when `ended_by` is neither member.
    /// Both are silent no-ops on the wire.
    pub async fn end_call(&self, ended_by: ClientId, call_id: CallId) -> Result<(), GatewayError> {
        let mut state = self.state().write().await;

        let Some(call) = state.calls.get(call_id) else {
            return Err(GatewayError::CallNotFound(call_id));
        };
        if !call.is_member(ended_by) {
            return Err(GatewayError::NotCallMember(ended_by));
        }

        self.finish_call_locked(&mut state, call_id, ended_by);
        Ok(())
    }

    /// Forwards an opaque signaling payload to the other call member.
    ///
    /// The browser client omits `targetUserId` on offers and ICE
    /// candidates; a `None` target resolves to the peer of the sender's
    /// live call. The payload is never validated or interpreted. Only the
    /// read lock is taken; relaying mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ParticipantNotFound`] for an unknown target
    /// or [`GatewayError::NotCallMember`] when the two parties do not
    /// share a live call. Both are silent no-ops on the wire.
    pub async fn relay_signal(
        &self,
        from: ClientId,
        target: Option<ClientId>,
        action: SignalKind,
        data: serde_json::Value,
    ) -> Result<(), GatewayError> {
        let state = self.state().read().await;

        let target = match target {
            Some(explicit) => explicit,
            None => state
                .calls
                .call_for(from)
                .and_then(|call| call.peer_of(from))
                .ok_or(GatewayError::NotCallMember(from))?,
        };
        if state.registry.get(target).is_none() {
            return Err(GatewayError::ParticipantNotFound(target));
        }
        if !state.calls.share_call(from, target) {
            return Err(GatewayError::NotCallMember(from));
        }

        state.send_to(
            target,
            &ServerEvent::Webrtc {
                action,
                data,
                from_user_id: from,
            },
        );
        Ok(())
    }

    /// Tears down a live call while already holding the state write lock.
    ///
    /// Shared by [`RelayService::end_call`] and the disconnect path so the
    /// teardown is atomic with deregistration. A member's call state is
    /// only cleared when it actually references this call: a target still
    /// ringing carries no reference, and must not lose the state of some
    /// other call it may have since joined.
    pub(super) fn finish_call_locked(
        &self,
        state: &mut RelayState,
        call_id: CallId,
        ended_by: ClientId,
    ) {
        let Some(mut call) = state.calls.remove(call_id) else {
            return;
        };
        call.end();

        for member in [call.caller, call.target] {
            if let Some(participant) = state.registry.get_mut(member)
                && participant.current_call == Some(call_id)
            {
                participant.leave_call();
            }
        }
        self.disarm_ring_timer(call_id);

        let event = ServerEvent::CallEnded {
            call_id,
            ended_by,
            timestamp: Utc::now(),
        };
        state.send_to(call.caller, &event);
        state.send_to(call.target, &event);
        state.broadcast_except(&event, &[call.caller, call.target]);

        tracing::info!(%call_id, ended_by = %ended_by, "call ended");
    }

    fn arm_ring_timer(self: &Arc<Self>, call_id: CallId, target: ClientId) {
        let service = Arc::clone(self);
        let timeout = self.ring_timeout();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            match service.reject_call(target, call_id).await {
                Ok(()) => {
                    tracing::info!(%call_id, "ringing timed out; rejected on behalf of the target");
                }
                Err(err) => {
                    tracing::debug!(%call_id, error = %err, "ring timer fired for a settled call");
                }
            }
        });
        self.store_ring_timer(call_id, handle.abort_handle());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const SHORT_RING: Duration = Duration::from_millis(50);

    async fn join(service: &Arc<RelayService>) -> (ClientId, UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = service.connect(sender).await;
        (id, receiver)
    }

    fn next(rx: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
        rx.try_recv().ok().unwrap_or_else(|| {
            panic!("expected a pending event");
        })
    }

    /// Drains everything currently queued, returning the event types.
    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<&'static str> {
        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type_str());
        }
        types
    }

    async fn in_call_flag(service: &Arc<RelayService>, id: ClientId) -> bool {
        let state = service.state().read().await;
        state.registry.get(id).is_some_and(|p| p.in_call)
    }

    fn make_service(ring: Duration) -> Arc<RelayService> {
        Arc::new(RelayService::new(100, ring))
    }

    #[tokio::test]
    async fn full_lifecycle_start_accept_end() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        // start: target gets incomingCall, everyone gets callStarted
        let call_id = service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        let ServerEvent::IncomingCall { caller_id, .. } = next(&mut rx_b) else {
            panic!("expected incomingCall first");
        };
        assert_eq!(caller_id, a);
        assert_eq!(next(&mut rx_b).event_type_str(), "callStarted");
        assert_eq!(next(&mut rx_a).event_type_str(), "callStarted");
        assert!(in_call_flag(&service, a).await);
        assert!(!in_call_flag(&service, b).await); // target not busy until accept

        // accept: caller notified, both flags set
        service.accept_call(b, call_id).await.ok().unwrap_or_else(|| {
            panic!("accept failed");
        });
        let ServerEvent::CallAccepted { accepter_id, .. } = next(&mut rx_a) else {
            panic!("expected callAccepted");
        };
        assert_eq!(accepter_id, b);
        assert!(in_call_flag(&service, a).await);
        assert!(in_call_flag(&service, b).await);

        // end by either member: both notified, flags reset, call removed
        service.end_call(a, call_id).await.ok().unwrap_or_else(|| {
            panic!("end failed");
        });
        assert!(drain(&mut rx_a).contains(&"callEnded"));
        assert!(drain(&mut rx_b).contains(&"callEnded"));
        assert!(!in_call_flag(&service, a).await);
        assert!(!in_call_flag(&service, b).await);
        assert_eq!(service.stats().await.live_calls, 0);
    }

    #[tokio::test]
    async fn busy_target_yields_one_call_busy_and_no_call() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        let (c, mut rx_c) = join(&service).await;
        let call_id = service.start_call(b, c).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        service.accept_call(c, call_id).await.ok().unwrap_or_else(|| {
            panic!("accept failed");
        });
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        let result = service.start_call(a, b).await;
        assert!(matches!(result, Err(GatewayError::TargetBusy(_))));

        assert_eq!(drain(&mut rx_a), ["callBusy"]);
        assert!(drain(&mut rx_b).is_empty());
        assert!(drain(&mut rx_c).is_empty());
        assert_eq!(service.stats().await.live_calls, 1);
    }

    #[tokio::test]
    async fn dialing_yourself_is_busy() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        drain(&mut rx_a);

        let result = service.start_call(a, a).await;
        assert!(matches!(result, Err(GatewayError::TargetBusy(_))));
        assert_eq!(drain(&mut rx_a), ["callBusy"]);
    }

    #[tokio::test]
    async fn unknown_target_is_busy_not_silent() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        drain(&mut rx_a);

        let result = service.start_call(a, ClientId::new()).await;
        assert!(matches!(result, Err(GatewayError::TargetBusy(_))));
        assert_eq!(drain(&mut rx_a), ["callBusy"]);
        assert_eq!(service.stats().await.live_calls, 0);
    }

    #[tokio::test]
    async fn accept_by_non_target_is_refused() {
        let service = make_service(Duration::from_secs(30));
        let (a, _rx_a) = join(&service).await;
        let (b, _rx_b) = join(&service).await;
        let (c, _rx_c) = join(&service).await;
        let call_id = service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });

        let result = service.accept_call(c, call_id).await;
        assert!(matches!(result, Err(GatewayError::NotCallMember(_))));
        let result = service.accept_call(a, call_id).await;
        assert!(matches!(result, Err(GatewayError::NotCallMember(_))));
    }

    #[tokio::test]
    async fn unknown_call_operations_are_noops() {
        let service = make_service(Duration::from_secs(30));
        let (a, _rx_a) = join(&service).await;

        let ghost = CallId::new();
        assert!(matches!(
            service.accept_call(a, ghost).await,
            Err(GatewayError::CallNotFound(_))
        ));
        assert!(matches!(
            service.reject_call(a, ghost).await,
            Err(GatewayError::CallNotFound(_))
        ));
        assert!(matches!(
            service.end_call(a, ghost).await,
            Err(GatewayError::CallNotFound(_))
        ));
    }

    #[tokio::test]
    async fn reject_clears_caller_and_removes_call() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        let call_id = service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        drain(&mut rx_a);
        drain(&mut rx_b);

        service.reject_call(b, call_id).await.ok().unwrap_or_else(|| {
            panic!("reject failed");
        });

        assert_eq!(drain(&mut rx_a), ["callRejected"]);
        assert!(!in_call_flag(&service, a).await);
        assert_eq!(service.stats().await.live_calls, 0);

        // A rejected call is gone; accepting it now is a no-op.
        assert!(matches!(
            service.accept_call(b, call_id).await,
            Err(GatewayError::CallNotFound(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_mid_ringing_ends_call_and_resets_peer() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });

        // The rung target disconnects without ever accepting.
        service.disconnect(b).await;
        assert_eq!(service.stats().await.live_calls, 0);
        assert!(!in_call_flag(&service, a).await);
        let types = drain(&mut rx_a);
        assert!(types.contains(&"callEnded"));
        assert!(types.contains(&"userLeft"));
    }

    #[tokio::test]
    async fn disconnect_of_caller_mid_active_ends_call() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        let call_id = service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        service.accept_call(b, call_id).await.ok().unwrap_or_else(|| {
            panic!("accept failed");
        });
        drain(&mut rx_a);
        drain(&mut rx_b);

        service.disconnect(a).await;
        assert_eq!(service.stats().await.live_calls, 0);
        assert!(!in_call_flag(&service, b).await);
        let types = drain(&mut rx_b);
        assert!(types.contains(&"callEnded"));
        assert!(types.contains(&"userLeft"));
    }

    #[tokio::test]
    async fn ringing_times_out_into_rejection() {
        let service = make_service(SHORT_RING);
        let (a, mut rx_a) = join(&service).await;
        let (b, _rx_b) = join(&service).await;
        drain(&mut rx_a);

        service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        tokio::time::sleep(SHORT_RING * 3).await;

        assert_eq!(service.stats().await.live_calls, 0);
        assert!(!in_call_flag(&service, a).await);
        assert!(drain(&mut rx_a).contains(&"callRejected"));
    }

    #[tokio::test]
    async fn accept_disarms_the_ring_timer() {
        let service = make_service(SHORT_RING);
        let (a, _rx_a) = join(&service).await;
        let (b, _rx_b) = join(&service).await;

        let call_id = service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        service.accept_call(b, call_id).await.ok().unwrap_or_else(|| {
            panic!("accept failed");
        });
        tokio::time::sleep(SHORT_RING * 3).await;

        // Still active: the timer never fired.
        assert_eq!(service.stats().await.live_calls, 1);
        assert!(in_call_flag(&service, a).await);
        assert!(in_call_flag(&service, b).await);
    }

    #[tokio::test]
    async fn signal_relay_reaches_target_only() {
        let service = make_service(Duration::from_secs(30));
        let (a, mut rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        let (c, mut rx_c) = join(&service).await;
        service.start_call(a, b).await.ok().unwrap_or_else(|| {
            panic!("start failed");
        });
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        let payload = serde_json::json!({"sdp": "v=0"});
        service
            .relay_signal(a, Some(b), SignalKind::Offer, payload.clone())
            .await
            .ok()
            .unwrap_or_else(|| panic!("relay failed"));

        let ServerEvent::Webrtc { action, data, from_user_id } = next(&mut rx_b) else {
            panic!("expected webrtc event");
        };
        assert_eq!(action, SignalKind::Offer);
        assert_eq!(data, payload);
        assert_eq!(from_user_id, a);
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_c).is_empty());

        // An omitted target resolves to the call peer.
        service
            .relay_signal(b, None, SignalKind::IceCandidate, serde_json::json!({"candidate": "c"}))
            .await
            .ok()
            .unwrap_or_else(|| panic!("peer-resolved relay failed"));
        let ServerEvent::Webrtc { from_user_id, .. } = next(&mut rx_a) else {
            panic!("expected webrtc event for the caller");
        };
        assert_eq!(from_user_id, b);
    }

    #[tokio::test]
    async fn signal_relay_requires_a_shared_call() {
        let service = make_service(Duration::from_secs(30));
        let (a, _rx_a) = join(&service).await;
        let (b, mut rx_b) = join(&service).await;
        drain(&mut rx_b);

        let result = service
            .relay_signal(a, Some(b), SignalKind::Answer, serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(GatewayError::NotCallMember(_))));
        assert!(drain(&mut rx_b).is_empty());

        let result = service
            .relay_signal(a, Some(ClientId::new()), SignalKind::Offer, serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(GatewayError::ParticipantNotFound(_))));

        // No explicit target and no live call either.
        let result = service
            .relay_signal(a, None, SignalKind::Offer, serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(GatewayError::NotCallMember(_))));
    }
}
