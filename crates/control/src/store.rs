// Copyright 2026 The Gough Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single in-memory aggregate `control` keeps for every entity named in
//! §3: machines, jobs, boot events, workers, agents, enrollment keys, the
//! egg/group catalog, boot images/configs, and team resource assignments.
//! Guarded by one `RwLock`, per SPEC_FULL §D: reads never block each other,
//! writes are short and synchronous, and nothing ever holds the guard
//! across an `.await`. A durable backend can replace this wholesale behind
//! the same inherent methods without touching a caller.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use egg_engine::{EggCatalog, InMemoryCatalog};
use gough_core::model::{
    Agent, AgentStatus, BootConfig, BootEvent, BootImage, DeploymentJob, DeploymentStatus, Egg, EggGroup,
    EnrollmentKey, Machine, MachineStatus, QuickStats, ResourceAssignment, Worker,
};
use gough_core::Classified;

use control_machine::{transition, Trigger};
use deployment_orchestrator::{BootEventSource, Phase, ProgressSink, RollbackActions, VerificationProbe};

#[derive(Debug, Default)]
struct StoreInner {
    machines: HashMap<String, Machine>,
    mac_index: HashMap<String, String>,
    jobs: HashMap<String, DeploymentJob>,
    active_job_by_machine: HashMap<String, String>,
    boot_events: Vec<BootEvent>,
    workers: HashMap<String, Worker>,
    enrollment_keys: HashMap<String, EnrollmentKey>,
    agents: HashMap<String, Agent>,
    eggs: InMemoryCatalog,
    boot_images: HashMap<String, BootImage>,
    boot_configs: HashMap<String, BootConfig>,
    resource_assignments: Vec<ResourceAssignment>,
    reimage_requested: HashSet<String>,
}

/// The store. Every inherent method takes the lock, does its work, and
/// returns owned data — never a guard — so it is always safe to call from
/// async handlers.
#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- machines -----------------------------------------------------

    pub fn machine(&self, system_id: &str) -> Option<Machine> {
        self.inner.read().unwrap().machines.get(system_id).cloned()
    }

    pub fn machine_by_mac(&self, mac: &str) -> Option<Machine> {
        let normalized = Machine::normalize_mac(mac);
        let inner = self.inner.read().unwrap();
        let system_id = inner.mac_index.get(&normalized)?;
        inner.machines.get(system_id).cloned()
    }

    pub fn list_machines(&self) -> Vec<Machine> {
        let mut machines: Vec<_> = self.inner.read().unwrap().machines.values().cloned().collect();
        machines.sort_by(|a, b| a.system_id.cmp(&b.system_id));
        machines
    }

    /// Finds the machine with this MAC, discovering a new one (§4.1
    /// operation 1) if none is known yet. Always refreshes `last_seen_at`.
    pub fn discover_or_touch(&self, mac: &str, now: DateTime<Utc>) -> Machine {
        let normalized = Machine::normalize_mac(mac);
        let mut inner = self.inner.write().unwrap();
        if let Some(system_id) = inner.mac_index.get(&normalized).cloned() {
            let machine = inner.machines.get_mut(&system_id).expect("mac index is consistent");
            machine.last_seen_at = Some(now);
            machine.updated_at = now;
            return machine.clone();
        }
        let system_id = uuid::Uuid::new_v4().to_string();
        let machine = Machine::new_discovered(system_id.clone(), normalized.clone(), now);
        inner.mac_index.insert(normalized, system_id.clone());
        inner.machines.insert(system_id, machine.clone());
        machine
    }

    pub fn upsert_machine(&self, machine: Machine) {
        let mut inner = self.inner.write().unwrap();
        inner.mac_index.insert(machine.mac_address.clone(), machine.system_id.clone());
        inner.machines.insert(machine.system_id.clone(), machine);
    }

    /// Drives the machine state machine per §4.2's transition table,
    /// persisting the result on success.
    pub fn transition_machine(
        &self,
        system_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<Machine, Classified> {
        let mut inner = self.inner.write().unwrap();
        let has_active_job = inner.active_job_by_machine.contains_key(system_id);
        let machine = inner
            .machines
            .get_mut(system_id)
            .ok_or_else(|| Classified::not_found(format!("machine {system_id} not found")))?;
        let next = transition(machine.status, &trigger, has_active_job).map_err(|e| Classified::conflict(e.to_string()))?;
        machine.status = next;
        machine.updated_at = now;
        if next == MachineStatus::Deployed {
            machine.deployed_at = Some(now);
        }
        Ok(machine.clone())
    }

    pub fn request_reimage(&self, system_id: &str) {
        self.inner.write().unwrap().reimage_requested.insert(system_id.to_string());
    }

    pub fn clear_reimage(&self, system_id: &str) {
        self.inner.write().unwrap().reimage_requested.remove(system_id);
    }

    pub fn reimage_requested(&self, system_id: &str) -> bool {
        self.inner.read().unwrap().reimage_requested.contains(system_id)
    }

    // ---- deployment jobs ------------------------------------------------

    pub fn job(&self, job_id: &str) -> Option<DeploymentJob> {
        self.inner.read().unwrap().jobs.get(job_id).cloned()
    }

    pub fn list_jobs(&self) -> Vec<DeploymentJob> {
        let mut jobs: Vec<_> = self.inner.read().unwrap().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        jobs
    }

    pub fn active_job_for_machine(&self, system_id: &str) -> Option<DeploymentJob> {
        let inner = self.inner.read().unwrap();
        let job_id = inner.active_job_by_machine.get(system_id)?;
        inner.jobs.get(job_id).cloned()
    }

    pub fn create_job(&self, job: DeploymentJob) {
        let mut inner = self.inner.write().unwrap();
        inner.active_job_by_machine.insert(job.machine_id.clone(), job.job_id.clone());
        inner.jobs.insert(job.job_id.clone(), job);
    }

    pub fn update_job<F: FnOnce(&mut DeploymentJob)>(&self, job_id: &str, f: F) -> Result<DeploymentJob, Classified> {
        let mut inner = self.inner.write().unwrap();
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| Classified::not_found(format!("job {job_id} not found")))?;
        f(job);
        let finished = job.status.is_terminal();
        let machine_id = job.machine_id.clone();
        let result = job.clone();
        if finished {
            inner.active_job_by_machine.remove(&machine_id);
        }
        Ok(result)
    }

    // ---- boot events ----------------------------------------------------

    pub fn append_event(&self, event: BootEvent) {
        self.inner.write().unwrap().boot_events.push(event);
    }

    fn events_since_sync(&self, mac: &str, since: DateTime<Utc>) -> Vec<BootEvent> {
        let normalized = Machine::normalize_mac(mac);
        self.inner
            .read()
            .unwrap()
            .boot_events
            .iter()
            .filter(|e| Machine::normalize_mac(&e.mac) == normalized && e.timestamp > since)
            .cloned()
            .collect()
    }

    // ---- workers --------------------------------------------------------

    pub fn worker(&self, worker_id: &str) -> Option<Worker> {
        self.inner.read().unwrap().workers.get(worker_id).cloned()
    }

    pub fn upsert_worker(&self, worker: Worker) {
        self.inner.write().unwrap().workers.insert(worker.worker_id.clone(), worker);
    }

    pub fn record_worker_heartbeat(&self, worker_id: &str, now: DateTime<Utc>) -> Result<Worker, Classified> {
        let mut inner = self.inner.write().unwrap();
        let worker = inner
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| Classified::not_found(format!("worker {worker_id} not found")))?;
        worker.last_heartbeat_at = Some(now);
        worker.consecutive_missed_heartbeats = 0;
        worker.suspect = false;
        Ok(worker.clone())
    }

    pub fn list_workers(&self) -> Vec<Worker> {
        self.inner.read().unwrap().workers.values().cloned().collect()
    }

    /// Recomputes `consecutive_missed_heartbeats`/`suspect` for every worker
    /// against `now`, for the periodic liveness sweep (§3, §4.5). Returns the
    /// workers that flipped suspect this pass, so the sweep can log them.
    pub fn sweep_worker_heartbeats(&self, interval: chrono::Duration, threshold: u32, now: DateTime<Utc>) -> Vec<Worker> {
        let mut inner = self.inner.write().unwrap();
        let mut newly_suspect = Vec::new();
        for worker in inner.workers.values_mut() {
            let missed = agent_protocol::heartbeat::missed_count(worker.last_heartbeat_at, interval, now);
            worker.consecutive_missed_heartbeats = missed;
            let was_suspect = worker.suspect;
            worker.suspect = agent_protocol::heartbeat::is_down(missed, threshold);
            if worker.suspect && !was_suspect {
                newly_suspect.push(worker.clone());
            }
        }
        newly_suspect
    }

    /// Same as [`Store::sweep_worker_heartbeats`] but for agents, flipping
    /// `AgentStatus::Online` to `AgentStatus::Offline`. Suspended agents are
    /// left alone: suspension is an operator action, not a liveness state.
    pub fn sweep_agent_heartbeats(&self, interval: chrono::Duration, threshold: u32, now: DateTime<Utc>) -> Vec<Agent> {
        let mut inner = self.inner.write().unwrap();
        let mut newly_offline = Vec::new();
        for agent in inner.agents.values_mut() {
            if agent.status == AgentStatus::Suspended {
                continue;
            }
            let missed = agent_protocol::heartbeat::missed_count(agent.last_heartbeat_at, interval, now);
            agent.consecutive_missed_heartbeats = missed;
            if agent_protocol::heartbeat::is_down(missed, threshold) && agent.status == AgentStatus::Online {
                agent.status = AgentStatus::Offline;
                newly_offline.push(agent.clone());
            }
        }
        newly_offline
    }

    // ---- enrollment keys -------------------------------------------------

    pub fn create_enrollment_key(&self, key: EnrollmentKey) {
        self.inner.write().unwrap().enrollment_keys.insert(key.key_id.clone(), key);
    }

    pub fn enrollment_key(&self, key_id: &str) -> Option<EnrollmentKey> {
        self.inner.read().unwrap().enrollment_keys.get(key_id).cloned()
    }

    pub fn consume_enrollment_key(&self, key_id: &str, now: DateTime<Utc>) {
        if let Some(key) = self.inner.write().unwrap().enrollment_keys.get_mut(key_id) {
            key.consumed_at = Some(now);
        }
    }

    // ---- agents -----------------------------------------------------------

    pub fn agent(&self, agent_id: &str) -> Option<Agent> {
        self.inner.read().unwrap().agents.get(agent_id).cloned()
    }

    pub fn upsert_agent(&self, agent: Agent) {
        self.inner.write().unwrap().agents.insert(agent.agent_id.clone(), agent);
    }

    pub fn list_agents(&self, status: Option<AgentStatus>) -> Vec<Agent> {
        self.inner
            .read()
            .unwrap()
            .agents
            .values()
            .filter(|a| status.map(|s| a.status == s).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Finds the agent whose stored token hash matches `token_hash`, the
    /// only index we keep on agent bearer tokens (§4.5).
    pub fn agent_by_token_hash(&self, token_hash: &str) -> Option<Agent> {
        self.inner
            .read()
            .unwrap()
            .agents
            .values()
            .find(|a| a.token_hash == token_hash)
            .cloned()
    }

    pub fn record_agent_heartbeat(
        &self,
        agent_id: &str,
        now: DateTime<Utc>,
        stats: QuickStats,
    ) -> Result<Agent, Classified> {
        let mut inner = self.inner.write().unwrap();
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| Classified::not_found(format!("agent {agent_id} not found")))?;
        agent.last_heartbeat_at = Some(now);
        agent.consecutive_missed_heartbeats = 0;
        agent.quick_stats = stats;
        if agent.status == AgentStatus::Offline {
            agent.status = AgentStatus::Online;
        }
        Ok(agent.clone())
    }

    pub fn suspend_agent(&self, agent_id: &str, reason: String) -> Result<Agent, Classified> {
        let mut inner = self.inner.write().unwrap();
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| Classified::not_found(format!("agent {agent_id} not found")))?;
        agent.status = AgentStatus::Suspended;
        agent.suspend_reason = Some(reason);
        Ok(agent.clone())
    }

    // ---- eggs / groups ---------------------------------------------------

    pub fn upsert_egg(&self, egg: Egg) {
        self.inner.write().unwrap().eggs.eggs.insert(egg.name.clone(), egg);
    }

    pub fn delete_egg(&self, name: &str) -> bool {
        self.inner.write().unwrap().eggs.eggs.remove(name).is_some()
    }

    pub fn egg(&self, name: &str) -> Option<Egg> {
        self.inner.read().unwrap().eggs.egg(name).cloned()
    }

    pub fn list_eggs(&self) -> Vec<Egg> {
        let mut eggs: Vec<_> = self.inner.read().unwrap().eggs.eggs.values().cloned().collect();
        eggs.sort_by(|a, b| a.name.cmp(&b.name));
        eggs
    }

    pub fn upsert_group(&self, group: EggGroup) {
        self.inner.write().unwrap().eggs.groups.insert(group.name.clone(), group);
    }

    pub fn delete_group(&self, name: &str) -> bool {
        self.inner.write().unwrap().eggs.groups.remove(name).is_some()
    }

    pub fn group(&self, name: &str) -> Option<EggGroup> {
        self.inner.read().unwrap().eggs.group(name).cloned()
    }

    pub fn list_groups(&self) -> Vec<EggGroup> {
        let mut groups: Vec<_> = self.inner.read().unwrap().eggs.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    /// A point-in-time clone of the catalog, suitable for `egg_engine::resolve`
    /// without holding the store lock across the resolution work.
    pub fn egg_catalog_snapshot(&self) -> InMemoryCatalog {
        self.inner.read().unwrap().eggs.clone()
    }

    // ---- boot images / configs -------------------------------------------

    pub fn upsert_boot_image(&self, image: BootImage) {
        self.inner.write().unwrap().boot_images.insert(image.name.clone(), image);
    }

    pub fn boot_image(&self, name: &str) -> Option<BootImage> {
        self.inner.read().unwrap().boot_images.get(name).cloned()
    }

    pub fn list_boot_images(&self) -> Vec<BootImage> {
        self.inner.read().unwrap().boot_images.values().cloned().collect()
    }

    pub fn upsert_boot_config(&self, config: BootConfig) {
        self.inner.write().unwrap().boot_configs.insert(config.name.clone(), config);
    }

    pub fn boot_config(&self, name: &str) -> Option<BootConfig> {
        self.inner.read().unwrap().boot_configs.get(name).cloned()
    }

    // ---- team resource assignments ---------------------------------------

    pub fn upsert_assignment(&self, assignment: ResourceAssignment) {
        let mut inner = self.inner.write().unwrap();
        inner.resource_assignments.retain(|a| {
            !(a.team_id == assignment.team_id
                && a.resource_type == assignment.resource_type
                && a.resource_id == assignment.resource_id)
        });
        inner.resource_assignments.push(assignment);
    }

    pub fn assignments_for(&self, resource_type: &str, resource_id: &str) -> Vec<ResourceAssignment> {
        self.inner
            .read()
            .unwrap()
            .resource_assignments
            .iter()
            .filter(|a| a.resource_type == resource_type && a.resource_id == resource_id)
            .cloned()
            .collect()
    }
}

// ---- deployment-orchestrator collaborator traits -------------------------

#[async_trait]
impl BootEventSource for Store {
    async fn events_since(&self, mac: &str, since: DateTime<Utc>) -> Result<Vec<BootEvent>, Classified> {
        Ok(self.events_since_sync(mac, since))
    }
}

#[async_trait]
impl VerificationProbe for Store {
    async fn has_heartbeat_since(&self, machine_id: &str, since: DateTime<Utc>) -> Result<bool, Classified> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .agents
            .values()
            .filter(|a| a.machine_id == machine_id)
            .any(|a| a.last_heartbeat_at.map(|t| t > since).unwrap_or(false)))
    }

    /// No separate health-probe channel exists yet; an agent reporting
    /// plausible stats counts as green. See DESIGN.md for this stand-in.
    async fn probes_green(&self, machine_id: &str) -> Result<bool, Classified> {
        let inner = self.inner.read().unwrap();
        Ok(inner.agents.values().filter(|a| a.machine_id == machine_id).any(|a| {
            a.status == AgentStatus::Online
                && a.quick_stats.cpu_percent <= 100.0
                && a.quick_stats.mem_percent <= 100.0
                && a.quick_stats.disk_percent <= 100.0
        }))
    }
}

#[async_trait]
impl ProgressSink for Store {
    async fn record_progress(&self, job_id: &str, phase: Phase, percent: u8) -> Result<(), Classified> {
        self.update_job(job_id, |job| {
            if percent >= job.progress_percent {
                job.progress_percent = percent;
            }
            job.status = phase.status();
            job.current_phase = phase.label().to_string();
            job.log_output.push(format!("{}: {percent}%", phase.label()));
        })
        .map(|_| ())
    }
}

#[async_trait]
impl RollbackActions for Store {
    async fn stop_services(&self, machine_id: &str) -> Result<(), Classified> {
        log::info!(target: "control::store", "rollback: stopping services on {machine_id}");
        Ok(())
    }

    async fn remove_egg(&self, machine_id: &str, egg_name: &str) -> Result<(), Classified> {
        let mut inner = self.inner.write().unwrap();
        let machine = inner
            .machines
            .get_mut(machine_id)
            .ok_or_else(|| Classified::not_found(format!("machine {machine_id} not found")))?;
        machine.assigned_eggs.retain(|e| e != egg_name);
        Ok(())
    }

    async fn restore_default_boot_config(&self, machine_id: &str) -> Result<(), Classified> {
        let mut inner = self.inner.write().unwrap();
        let machine = inner
            .machines
            .get_mut(machine_id)
            .ok_or_else(|| Classified::not_found(format!("machine {machine_id} not found")))?;
        machine.boot_config = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_or_touch_creates_then_reuses_the_same_machine() {
        let store = Store::new();
        let now = Utc::now();
        let first = store.discover_or_touch("AA:BB:CC:11:22:33", now);
        let second = store.discover_or_touch("aa-bb-cc-11-22-33", now + chrono::Duration::seconds(5));
        assert_eq!(first.system_id, second.system_id);
        assert_eq!(second.last_seen_at, Some(now + chrono::Duration::seconds(5)));
    }

    #[test]
    fn transition_machine_rejects_unknown_edge() {
        let store = Store::new();
        let now = Utc::now();
        let machine = store.discover_or_touch("aabbcc112233", now);
        let err = store.transition_machine(&machine.system_id, Trigger::Deploy, now).unwrap_err();
        assert!(matches!(err, Classified::Conflict(_)));
    }

    #[test]
    fn job_lifecycle_tracks_active_job_by_machine() {
        let store = Store::new();
        let now = Utc::now();
        let machine = store.discover_or_touch("aabbcc112233", now);
        let job = DeploymentJob {
            job_id: "job-1".into(),
            machine_id: machine.system_id.clone(),
            image_id: "ubuntu-24.04".into(),
            eggs_to_deploy: vec![],
            rendered_cloud_init: None,
            status: DeploymentStatus::Pending,
            progress_percent: 0,
            current_phase: "pending".into(),
            log_output: vec![],
            error_message: None,
            skipped_eggs: vec![],
            started_at: now,
            completed_at: None,
        };
        store.create_job(job);
        assert!(store.active_job_for_machine(&machine.system_id).is_some());

        store
            .update_job("job-1", |j| j.status = DeploymentStatus::Complete)
            .unwrap();
        assert!(store.active_job_for_machine(&machine.system_id).is_none());
    }
}
