//! WebSocket transport for the Event Stream (§4.E, §6: "implementations
//! may choose any transport that preserves ordering"). Grounded on the
//! teacher's `realtime_sync::server::WsSession` actor shape
//! (heartbeat via `ctx.run_interval`, one actor per connection).

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web::{web, Error as ActixError, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use crate::model::TaskId;

use super::auth::AuthManager;
use super::stream::EventStream;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub token: String,
    pub last_seq: Option<u64>,
}

pub struct EventStreamSession {
    task_id: TaskId,
    last_seq: Option<u64>,
    events: Arc<EventStream>,
    hb: Instant,
}

impl EventStreamSession {
    fn new(task_id: TaskId, last_seq: Option<u64>, events: Arc<EventStream>) -> Self {
        Self { task_id, last_seq, events, hb: Instant::now() }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for EventStreamSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        let (backlog, mut receiver) = self.events.subscribe(self.task_id, self.last_seq);
        for event in backlog {
            if let Ok(payload) = serde_json::to_string(&event) {
                ctx.text(payload);
            }
        }

        let addr = ctx.address();
        actix::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                if let Ok(payload) = serde_json::to_string(&event) {
                    addr.do_send(ForwardEvent(payload));
                }
            }
        });
    }
}

struct ForwardEvent(String);

impl actix::Message for ForwardEvent {
    type Result = ();
}

impl actix::Handler<ForwardEvent> for EventStreamSession {
    type Result = ();

    fn handle(&mut self, msg: ForwardEvent, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<std::result::Result<ws::Message, ws::ProtocolError>> for EventStreamSession {
    fn handle(&mut self, msg: std::result::Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            // The event stream is uni-directional server-to-client push
            // (§4.E); clients only send protocol frames, no payloads.
            _ => {}
        }
    }
}

/// `GET /tasks/{task_id}/events?token=...&last_seq=...` upgrade handler.
pub async fn subscribe(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    query: web::Query<SubscribeQuery>,
    auth: web::Data<AuthManager>,
    events: web::Data<Arc<EventStream>>,
) -> std::result::Result<HttpResponse, ActixError> {
    let claims = auth
        .verify(&query.token)
        .map_err(actix_web::error::ErrorUnauthorized)?;

    let task_id = TaskId::from_str(&path)
        .map_err(|_| actix_web::error::ErrorBadRequest("invalid task id"))?;

    if claims.task_id != path.as_str() {
        return Err(actix_web::error::ErrorForbidden("token not valid for this task"));
    }

    let session = EventStreamSession::new(task_id, query.last_seq, events.get_ref().clone());
    ws::start(session, &req, stream)
}
