//! Per-connection WebSocket session actor.
//!
//! Keeps framing and liveness at the edge and defers match semantics to the
//! swipe engine. One actor per connection; a reconnect is a brand-new actor.

use crate::core::{SwipeEngine, SwipeError};
use crate::models::SwipeSubmission;
use crate::ws::broadcaster::EventBroadcaster;
use crate::ws::messages::{ClientMessage, ServerEvent};
use crate::ws::registry::{ConnectionEntry, ConnectionRegistry};
use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, Handler, Running, StreamHandler, WrapFuture};
use actix_web_actors::ws::{self, CloseCode, CloseReason, Message, ProtocolError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct WsSession {
    conn_id: Uuid,
    /// None for anonymously admitted connections (pre-profile flows)
    user_id: Option<String>,
    /// Cached at handshake time, not live-refreshed
    partner_id: Option<String>,
    /// Reset by each monitor tick, set true by any pong or inbound traffic
    alive: bool,
    ping_interval: Duration,
    registry: Arc<ConnectionRegistry>,
    broadcaster: EventBroadcaster,
    engine: Arc<SwipeEngine>,
}

impl WsSession {
    pub fn new(
        user_id: Option<String>,
        partner_id: Option<String>,
        ping_interval: Duration,
        registry: Arc<ConnectionRegistry>,
        broadcaster: EventBroadcaster,
        engine: Arc<SwipeEngine>,
    ) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            user_id,
            partner_id,
            alive: true,
            ping_interval,
            registry,
            broadcaster,
            engine,
        }
    }

    fn send_json<T: serde::Serialize>(&self, ctx: &mut ws::WebsocketContext<Self>, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(body) => ctx.text(body),
            Err(err) => warn!(error = %err, "Failed to serialize channel payload"),
        }
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Ping => {
                self.alive = true;
                self.send_json(ctx, &ServerEvent::Pong);
            }
            ClientMessage::Swipe(submission) => self.handle_swipe(submission, ctx),
            ClientMessage::Activity { recipe_id, action } => {
                if let Some(partner_id) = self.partner_id.as_deref() {
                    self.broadcaster
                        .send_to(partner_id, &ServerEvent::PartnerSwiping { recipe_id, action });
                }
            }
        }
    }

    fn handle_swipe(&mut self, submission: SwipeSubmission, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(user_id) = self.user_id.clone() else {
            self.send_json(
                ctx,
                &ServerEvent::error("unauthenticated", "swiping requires an authenticated connection"),
            );
            return;
        };

        if let Err(errors) = submission.validate() {
            self.send_json(ctx, &ServerEvent::error("invalidPayload", errors.to_string()));
            return;
        }

        let engine = Arc::clone(&self.engine);
        let fut = async move {
            engine
                .record_swipe(&user_id, &submission.recipe_id, submission.liked)
                .await
        }
        .into_actor(self)
        .map(|result, act, ctx| match result {
            Ok(outcome) => {
                // A completed match is already pushed to both sides by the
                // engine; nothing further to send here.
                debug!(
                    "Swipe applied on connection {}: matched={}",
                    act.conn_id, outcome.matched
                );
            }
            Err(SwipeError::AlreadySwiped(recipe_id)) => {
                act.send_json(
                    ctx,
                    &ServerEvent::error(
                        "duplicateSwipe",
                        format!("recipe already swiped: {}", recipe_id),
                    ),
                );
            }
            Err(err) => {
                warn!("Swipe failed on connection {}: {}", act.conn_id, err);
                act.send_json(
                    ctx,
                    &ServerEvent::error("swipeFailed", "temporary failure, resubmit the swipe"),
                );
            }
        });
        ctx.spawn(fut);
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        if let Some(user_id) = self.user_id.clone() {
            self.registry.register(
                &user_id,
                ConnectionEntry {
                    conn_id: self.conn_id,
                    recipient: ctx.address().recipient(),
                    partner_id: self.partner_id.clone(),
                },
            );
            info!("Channel established for {} ({})", user_id, self.conn_id);

            if let Some(partner_id) = self.partner_id.as_deref() {
                self.broadcaster.send_to(partner_id, &ServerEvent::PartnerOnline);
            }
        } else {
            debug!("Anonymous channel established ({})", self.conn_id);
        }

        self.send_json(
            ctx,
            &ServerEvent::Connected {
                user_id: self.user_id.clone(),
            },
        );

        // Liveness monitor: a connection that missed the previous ping is
        // evicted on this tick, everyone else gets pinged again.
        ctx.run_interval(self.ping_interval, |actor, ctx| {
            if !actor.alive {
                warn!("Connection {} failed liveness check, closing", actor.conn_id);
                ctx.close(Some(CloseReason {
                    code: CloseCode::Normal,
                    description: Some("liveness timeout".into()),
                }));
                ctx.stop();
                return;
            }
            actor.alive = false;
            ctx.ping(b"");
        });
    }

    // Teardown is a guaranteed-cleanup obligation: it runs on explicit close,
    // protocol error, and liveness eviction alike.
    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if let Some(user_id) = self.user_id.as_deref() {
            let removed = self.registry.deregister(user_id, self.conn_id);
            if removed {
                info!("Channel closed for {} ({})", user_id, self.conn_id);
                if let Some(partner_id) = self.partner_id.as_deref() {
                    self.broadcaster.send_to(partner_id, &ServerEvent::PartnerOffline);
                }
            }
        }
        Running::Stop
    }
}

/// Directed delivery from the registry/broadcaster path
impl Handler<ServerEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, event: ServerEvent, ctx: &mut Self::Context) {
        self.send_json(ctx, &event);
    }
}

impl StreamHandler<Result<Message, ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<Message, ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(Message::Ping(payload)) => {
                self.alive = true;
                ctx.pong(&payload);
            }
            Ok(Message::Pong(_)) => {
                self.alive = true;
            }
            Ok(Message::Text(text)) => {
                self.alive = true;
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => self.handle_client_message(msg, ctx),
                    Err(error) => {
                        warn!(error = %error, "Rejected malformed channel payload");
                        self.send_json(ctx, &ServerEvent::error("invalidPayload", error.to_string()));
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                self.alive = true;
            }
            Ok(Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(Message::Nop) | Ok(Message::Continuation(_)) => {}
            Err(err) => {
                warn!(error = %err, "Channel protocol error");
                ctx.stop();
            }
        }
    }
}
