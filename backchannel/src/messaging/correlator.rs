//! Query/answer correlation.
//!
//! Every outbound query gets a fresh correlation id and a pending entry
//! holding its continuation and its timer. Whichever of answer and
//! timer comes first settles the entry; the loser finds nothing to do.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::envelope::{AnswerEnvelope, TAG_QUERY, TAG_QUERY_ANSWER};
use crate::error::{ProtocolError, ProtocolResult};
use crate::host::MemberId;

use super::channel::HiddenChannel;

struct PendingQuery {
    query: String,
    target: MemberId,
    settle: oneshot::Sender<ProtocolResult<Value>>,
    timer: AbortHandle,
}

type PendingMap = Arc<Mutex<HashMap<String, PendingQuery>>>;

pub struct Correlator {
    channel: Arc<HiddenChannel>,
    default_timeout: Duration,
    verify_origin: bool,
    pending: PendingMap,
}

impl Correlator {
    pub fn new(channel: Arc<HiddenChannel>, default_timeout: Duration, verify_origin: bool) -> Self {
        Self {
            channel,
            default_timeout,
            verify_origin,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn channel(&self) -> &Arc<HiddenChannel> {
        &self.channel
    }

    pub async fn send_query(
        &self,
        query: &str,
        data: Value,
        target: MemberId,
    ) -> ProtocolResult<Value> {
        self.send_query_with_timeout(query, data, target, self.default_timeout)
            .await
    }

    pub async fn send_query_with_timeout(
        &self,
        query: &str,
        data: Value,
        target: MemberId,
        timeout: Duration,
    ) -> ProtocolResult<Value> {
        let lifecycle = self.channel.lifecycle();
        if lifecycle.is_unloading() {
            return Err(ProtocolError::Unloaded);
        }
        if !lifecycle.is_initialized() {
            return Err(ProtocolError::NotInitialized);
        }

        let id = Uuid::new_v4().to_string();
        let (settle, settled) = oneshot::channel();
        {
            let mut pending = lock(&self.pending);
            let timer = tokio::spawn(expire(self.pending.clone(), id.clone(), timeout));
            pending.insert(
                id.clone(),
                PendingQuery {
                    query: query.to_string(),
                    target,
                    settle,
                    timer: timer.abort_handle(),
                },
            );
        }

        debug!("[Correlator] query '{}' ({}) -> {}", query, id, target);
        self.channel.send_hidden_message(
            TAG_QUERY,
            json!({ "id": id, "query": query, "data": data }),
            Some(target),
        );

        settled.await.unwrap_or(Err(ProtocolError::Unloaded))
    }

    /// Settle the pending query an inbound answer refers to.
    pub fn handle_answer(&self, sender: MemberId, message: Value) {
        let answer: AnswerEnvelope = match serde_json::from_value(message) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("[Correlator] malformed answer from {}: {}", sender, e);
                return;
            }
        };

        let entry = {
            let mut pending = lock(&self.pending);
            let target = match pending.get(&answer.id) {
                Some(entry) => entry.target,
                None => {
                    warn!(
                        "[Correlator] discarding answer {} from {}: no pending query",
                        answer.id, sender
                    );
                    return;
                }
            };
            if self.verify_origin && target != sender {
                warn!(
                    "[Correlator] discarding answer {} from {}: query was sent to {}",
                    answer.id, sender, target
                );
                return;
            }
            pending.remove(&answer.id)
        };
        let Some(entry) = entry else {
            return;
        };

        entry.timer.abort();
        let result = if answer.ok {
            Ok(answer.data.unwrap_or(Value::Null))
        } else {
            Err(ProtocolError::Rejected {
                query: entry.query,
                error: answer.error.or(answer.data),
            })
        };
        let _ = entry.settle.send(result);
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Reject every pending query with `Unloaded` and cancel their timers.
    pub fn reject_all(&self) {
        let drained: Vec<PendingQuery> = lock(&self.pending).drain().map(|(_, q)| q).collect();
        if !drained.is_empty() {
            debug!("[Correlator] rejecting {} pending queries", drained.len());
        }
        for entry in drained {
            entry.timer.abort();
            let _ = entry.settle.send(Err(ProtocolError::Unloaded));
        }
    }
}

async fn expire(pending: PendingMap, id: String, after: Duration) {
    tokio::time::sleep(after).await;
    let entry = lock(&pending).remove(&id);
    if let Some(entry) = entry {
        warn!(
            "[Correlator] query '{}' ({}) to {} timed out",
            entry.query, id, entry.target
        );
        let _ = entry.settle.send(Err(ProtocolError::Timeout {
            query: entry.query,
            target: entry.target,
        }));
    }
}

fn lock(pending: &PendingMap) -> std::sync::MutexGuard<'_, HashMap<String, PendingQuery>> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Reply continuation handed to a query handler.
///
/// Consumed by [`QueryReply::ok`], [`QueryReply::fail`] or
/// [`QueryReply::reply`]. Dropping it unanswered sends a failure so the
/// asking peer is never left waiting for its deadline.
pub struct QueryReply {
    id: String,
    query: String,
    target: MemberId,
    channel: Arc<HiddenChannel>,
    answered: bool,
}

impl QueryReply {
    pub(crate) fn new(id: String, query: String, target: MemberId, channel: Arc<HiddenChannel>) -> Self {
        Self {
            id,
            query,
            target,
            channel,
            answered: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn ok(mut self, data: Value) {
        self.send(AnswerEnvelope::success(self.id.clone(), data));
    }

    pub fn fail(mut self, error: Option<Value>) {
        self.send(AnswerEnvelope::failure(self.id.clone(), error));
    }

    pub fn reply(self, ok: bool, data: Value) {
        if ok {
            self.ok(data)
        } else {
            self.fail(Some(data).filter(|v| !v.is_null()))
        }
    }

    fn send(&mut self, answer: AnswerEnvelope) {
        self.answered = true;
        match serde_json::to_value(&answer) {
            Ok(message) => {
                self.channel
                    .send_hidden_message(TAG_QUERY_ANSWER, message, Some(self.target))
            }
            Err(e) => warn!("[Correlator] failed to encode answer {}: {}", self.id, e),
        }
    }
}

impl Drop for QueryReply {
    fn drop(&mut self) {
        if !self.answered {
            warn!(
                "[Correlator] handler for '{}' dropped query {} without replying",
                self.query, self.id
            );
            self.send(AnswerEnvelope::failure(self.id.clone(), None));
        }
    }
}
