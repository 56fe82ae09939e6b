//! HTTP dispatch to the remote workflow-service backend (§4.A, §6:
//! `remote_skill_service`). A call submits the skill invocation as a
//! workflow task, polls its status at a configurable interval up to a
//! bounded number of attempts, and aggregates the task's final output
//! nodes into the JSON value the skill returns. Three consecutive
//! network errors mark the backend unavailable; callers then fail the
//! in-flight skill call rather than queuing further attempts against it.
//! Calls are also throttled per target so a single runaway clause loop
//! can't flood a remote backend (§5).

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use governor::{state::keyed::DefaultKeyedStateStore, clock::DefaultClock, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::RemoteSkillServiceConfig;
use crate::error::{Error, Result};

use super::types::RemoteSkillTarget;

const CONSECUTIVE_FAILURE_LIMIT: u32 = 3;
const DEFAULT_POLL_INTERVAL_S: u64 = 2;
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum WorkflowTaskStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: WorkflowTaskStatus,
    /// Output value per workflow node id, present once `status` is
    /// `Complete`.
    #[serde(default)]
    outputs: HashMap<String, Value>,
    /// Ids of the workflow's sink nodes -- the ones whose outputs are
    /// aggregated into the skill's result. Empty means every entry in
    /// `outputs` is final.
    #[serde(default)]
    final_nodes: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Tracks consecutive network failures against one remote target so the
/// dispatcher can stop hammering a backend that's down (§4.A), rate
/// limits calls per target base url (§5), and holds the poll policy used
/// to drive a submitted workflow task to completion.
pub struct RemoteSkillClient {
    client: Client,
    consecutive_failures: AtomicU32,
    limiter: KeyedLimiter,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl RemoteSkillClient {
    /// `calls_per_second` bounds how many requests this client sends to
    /// any single remote target per second, with bursting up to that
    /// same quota. Polling uses the §6 defaults (2 s interval, 30
    /// attempts); use [`Self::with_policy`] to override them from config.
    pub fn with_rate_limit(calls_per_second: u32) -> Self {
        Self::with_policy(calls_per_second, Duration::from_secs(DEFAULT_POLL_INTERVAL_S), DEFAULT_MAX_POLL_ATTEMPTS)
    }

    pub fn with_policy(calls_per_second: u32, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(calls_per_second.max(1)).unwrap());
        Self {
            client: Client::new(),
            consecutive_failures: AtomicU32::new(0),
            limiter: RateLimiter::keyed(quota),
            poll_interval,
            max_poll_attempts: max_poll_attempts.max(1),
        }
    }

    /// Builds a client whose poll interval/attempt bound come from
    /// `remote_skill_service` (§6); `timeout_s`/`enabled`/`base_url`/
    /// `api_key` are consumed by whatever constructs the per-target
    /// [`RemoteSkillTarget`]s, not by the client itself.
    pub fn from_config(config: &RemoteSkillServiceConfig) -> Self {
        Self::with_policy(10, Duration::from_secs(config.poll_interval_s), config.max_poll_attempts)
    }

    pub fn new() -> Self {
        Self::with_rate_limit(10)
    }

    pub fn is_unavailable(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) >= CONSECUTIVE_FAILURE_LIMIT
    }

    /// Submits `skill_id`'s invocation to the workflow service, then polls
    /// until the task reaches a terminal status, aggregating its final
    /// output nodes into one JSON object (§4.A).
    pub async fn call(
        &self,
        target: &RemoteSkillTarget,
        skill_id: &str,
        input: Value,
        timeout: Duration,
    ) -> Result<Value> {
        if self.is_unavailable() {
            return Err(Error::BackendUnavailable(format!(
                "{} marked unavailable after {} consecutive failures",
                target.base_url, CONSECUTIVE_FAILURE_LIMIT
            )));
        }

        if self.limiter.check_key(&target.base_url).is_err() {
            return Err(Error::RateLimited(target.base_url.clone()));
        }

        let task_id = self.submit(target, skill_id, input, timeout).await?;
        self.poll_until_terminal(target, skill_id, &task_id, timeout).await
    }

    async fn submit(&self, target: &RemoteSkillTarget, skill_id: &str, input: Value, timeout: Duration) -> Result<String> {
        let url = format!("{}{}", target.base_url, target.route);
        let result = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&serde_json::json!({ "skill_id": skill_id, "input": input }))
            .send()
            .await;

        match result {
            Ok(response) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::SkillExecutionFailed(format!(
                        "{skill_id}: remote backend returned {status} submitting task"
                    )));
                }
                let submitted: SubmitResponse = response.json().await.map_err(Error::from)?;
                Ok(submitted.task_id)
            }
            Err(err) if err.is_timeout() => Err(Error::SkillTimeout(skill_id.to_string())),
            Err(err) => {
                self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                Err(Error::from(err))
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        target: &RemoteSkillTarget,
        skill_id: &str,
        task_id: &str,
        timeout: Duration,
    ) -> Result<Value> {
        let poll_url = format!("{}/workflow-tasks/{task_id}", target.base_url);

        for _ in 0..self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let result = self.client.get(&poll_url).timeout(timeout).send().await;
            let response = match result {
                Ok(response) => {
                    self.consecutive_failures.store(0, Ordering::Relaxed);
                    response
                }
                Err(err) if err.is_timeout() => return Err(Error::SkillTimeout(skill_id.to_string())),
                Err(err) => {
                    self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(Error::from(err));
                }
            };

            let status = response.status();
            if !status.is_success() {
                return Err(Error::SkillExecutionFailed(format!(
                    "{skill_id}: remote backend returned {status} polling task {task_id}"
                )));
            }

            let poll: PollResponse = response.json().await.map_err(Error::from)?;
            match poll.status {
                WorkflowTaskStatus::Complete => return Ok(aggregate_final_outputs(poll)),
                WorkflowTaskStatus::Failed => {
                    return Err(Error::SkillExecutionFailed(format!(
                        "{skill_id}: remote task {task_id} failed: {}",
                        poll.error.unwrap_or_else(|| "no error detail".into())
                    )))
                }
                WorkflowTaskStatus::Pending | WorkflowTaskStatus::Running => continue,
            }
        }

        Err(Error::SkillTimeout(format!(
            "{skill_id}: task {task_id} did not complete within {} poll attempts",
            self.max_poll_attempts
        )))
    }
}

/// Collects the output of each final (sink) node into one JSON object.
/// `final_nodes` empty means every output node is treated as final.
fn aggregate_final_outputs(poll: PollResponse) -> Value {
    let final_ids: Vec<&String> = if poll.final_nodes.is_empty() {
        poll.outputs.keys().collect()
    } else {
        poll.final_nodes.iter().collect()
    };
    let aggregated: serde_json::Map<String, Value> = final_ids
        .into_iter()
        .filter_map(|id| poll.outputs.get(id).map(|value| (id.clone(), value.clone())))
        .collect();
    Value::Object(aggregated)
}

impl Default for RemoteSkillClient {
    fn default() -> Self {
        Self::new()
    }
}
