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

//! `POST /deployments`, `GET /deployments/{id}`, `POST
//! /deployments/{id}/cancel`, `POST /deployments/{id}/retry`, per §4.4/§6.
//! Creating a job resolves the egg selector, renders the cloud-init
//! document once up front (§4.3), transitions the machine into `deploying`,
//! and spawns the actual phase run on the runtime rather than blocking the
//! request on it; everything past that point is observed through
//! `GET /deployments/{id}` or the boot-event/heartbeat side channels that
//! feed the orchestrator's polling loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use deployment_orchestrator::{EggExpectation, JobInputs, JobOutcome, RollbackRunner};
use egg_engine::resolve::MachineProfile;
use egg_engine::{render_cloud_init, resolve};
use gough_core::model::{DeploymentJob, DeploymentStatus, Machine, PowerType};
use gough_core::Classified;
use log::{info, warn};
use power_driver::BmcCredentials;
use serde::Deserialize;
use uuid::Uuid;

use control_machine::Trigger;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::CreateDeploymentRequest;
use crate::state::AppState;

/// Secrets path convention for a machine's BMC login, stored as this
/// struct's JSON under `bmc-credentials/<system_id>` (§6 "Secrets").
#[derive(Debug, Deserialize)]
struct StoredBmcSecret {
    username: String,
    password: String,
}

async fn bmc_credentials(state: &AppState, machine: &Machine) -> Option<BmcCredentials> {
    if machine.power_type == PowerType::Manual {
        return None;
    }
    let address = machine.bmc_address.clone()?;
    let path = format!("bmc-credentials/{}", machine.system_id);
    let raw = match state.secrets.get(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(target: "control::routes", "no BMC secret at {path} for {}: {e}", machine.system_id);
            return None;
        }
    };
    match serde_json::from_slice::<StoredBmcSecret>(&raw) {
        Ok(secret) => Some(BmcCredentials {
            address,
            username: secret.username,
            password: secret.password,
            power_type: machine.power_type,
        }),
        Err(e) => {
            warn!(target: "control::routes", "BMC secret at {path} is malformed: {e}");
            None
        }
    }
}

pub async fn create(req: HttpRequest, state: web::Data<AppState>, body: web::Json<CreateDeploymentRequest>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let body = body.into_inner();
    let now = Utc::now();

    let Some(machine) = state.store.machine(&body.machine_id) else {
        return respond(&Classified::not_found(format!("machine {} not found", body.machine_id)));
    };
    let Some(image) = state.store.boot_image(&body.image) else {
        return respond(&Classified::not_found(format!("boot image {} not found", body.image)));
    };

    let catalog = state.store.egg_catalog_snapshot();
    let profile = MachineProfile {
        architecture: machine.architecture,
        memory_mb: machine.memory_mb,
        storage_gb: machine.storage_gb,
    };
    let resolved = match resolve(&catalog, &body.eggs, profile) {
        Ok(eggs) => eggs,
        Err(e) => return respond(&Classified::from(e)),
    };
    let cloud_init = match render_cloud_init(&resolved) {
        Ok(text) => text,
        Err(e) => return respond(&Classified::from(e)),
    };

    if let Err(e) = state.store.transition_machine(&machine.system_id, Trigger::Deploy, now) {
        return respond(&e);
    }

    let job_id = Uuid::new_v4().to_string();
    let job = DeploymentJob {
        job_id: job_id.clone(),
        machine_id: machine.system_id.clone(),
        image_id: image.name.clone(),
        eggs_to_deploy: resolved.iter().map(|e| e.name.clone()).collect(),
        rendered_cloud_init: Some(cloud_init),
        status: DeploymentStatus::Pending,
        progress_percent: 0,
        current_phase: "pending".to_string(),
        log_output: vec![],
        error_message: None,
        skipped_eggs: vec![],
        started_at: now,
        completed_at: None,
    };
    state.store.create_job(job.clone());

    let bmc = bmc_credentials(&state, &machine).await;
    let eggs = resolved
        .into_iter()
        .map(|e| EggExpectation {
            egg_name: e.name,
            ignore_errors: e.ignore_errors,
        })
        .collect();
    let inputs = JobInputs {
        job_id: job_id.clone(),
        machine_id: machine.system_id.clone(),
        mac: machine.mac_address.clone(),
        bmc,
        eggs,
    };

    spawn_job(state.get_ref().clone(), inputs).await;

    HttpResponse::Accepted().json(job)
}

/// Registers a cancel flag for `job_id` and hands the run to the runtime.
/// `create`'s caller gets `202 Accepted` with the job's initial snapshot;
/// everything past this point is only visible through the store.
async fn spawn_job(state: AppState, inputs: JobInputs) {
    let job_id = inputs.job_id.clone();
    let cancel_flag = Arc::new(AtomicBool::new(false));
    state.cancel_flags.lock().await.insert(job_id.clone(), cancel_flag.clone());

    tokio::spawn(async move {
        run_to_completion(state, inputs, cancel_flag).await;
    });
}

async fn run_to_completion(state: AppState, inputs: JobInputs, cancel_flag: Arc<AtomicBool>) {
    let job_id = inputs.job_id.clone();
    let machine_id = inputs.machine_id.clone();
    let eggs_to_deploy: Vec<String> = inputs.eggs.iter().map(|e| e.egg_name.clone()).collect();
    let bmc = inputs.bmc.clone();
    let is_cancelled = || cancel_flag.load(Ordering::Relaxed);

    let outcome = state
        .orchestrator
        .run_job(
            inputs,
            state.store.as_ref(),
            state.store.as_ref(),
            state.store.as_ref(),
            &is_cancelled,
        )
        .await;

    let now = Utc::now();
    match outcome {
        JobOutcome::Complete => {
            let _ = state.store.update_job(&job_id, |job| {
                job.status = DeploymentStatus::Complete;
                job.progress_percent = 100;
                job.completed_at = Some(now);
            });
            match state.store.transition_machine(&machine_id, Trigger::DeploymentComplete, now) {
                Ok(_) => info!(target: "control::routes", "job {job_id} complete for machine {machine_id}"),
                Err(e) => warn!(target: "control::routes", "deployment-complete transition rejected for {machine_id}: {e}"),
            }
        }
        JobOutcome::Failed { phase, message } => {
            warn!(target: "control::routes", "job {job_id} failed in {phase:?}: {message}");
            let _ = state.store.update_job(&job_id, |job| {
                job.status = DeploymentStatus::Failed;
                job.error_message = Some(message);
                job.completed_at = Some(now);
            });
            let _ = state.store.transition_machine(&machine_id, Trigger::DeploymentFailed, now);
            run_rollback(&state, &machine_id, &eggs_to_deploy, bmc.as_ref()).await;
        }
        JobOutcome::Cancelled { phase } => {
            info!(target: "control::routes", "job {job_id} cancelled during {phase:?}");
            let _ = state.store.update_job(&job_id, |job| {
                job.status = DeploymentStatus::Failed;
                job.error_message = Some(format!("cancelled during {phase:?}"));
                job.completed_at = Some(now);
            });
            let _ = state.store.transition_machine(&machine_id, Trigger::DeploymentFailed, now);
            run_rollback(&state, &machine_id, &eggs_to_deploy, bmc.as_ref()).await;
        }
    }

    state.cancel_flags.lock().await.remove(&job_id);
}

async fn run_rollback(state: &AppState, machine_id: &str, eggs_to_deploy: &[String], bmc: Option<&BmcCredentials>) {
    let runner = RollbackRunner::new(
        state.power.clone() as Arc<dyn power_driver::PowerDriver>,
        state.bmc_locks.clone(),
        &state.config.orchestrator,
    );
    match runner.run(machine_id, eggs_to_deploy, bmc, state.store.as_ref()).await {
        deployment_orchestrator::RollbackOutcome::Released => {
            info!(target: "control::routes", "rollback released machine {machine_id}");
        }
        deployment_orchestrator::RollbackOutcome::Failed { step, message } => {
            warn!(target: "control::routes", "rollback for {machine_id} failed at {step}: {message}");
        }
    }
}

pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.store.job(&path.into_inner()) {
        Some(job) => HttpResponse::Ok().json(job),
        None => respond(&Classified::not_found("deployment job not found")),
    }
}

pub async fn cancel(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let job_id = path.into_inner();
    let Some(job) = state.store.job(&job_id) else {
        return respond(&Classified::not_found("deployment job not found"));
    };
    if job.status.is_terminal() {
        return HttpResponse::Ok().json(job);
    }
    let flags = state.cancel_flags.lock().await;
    match flags.get(&job_id) {
        Some(flag) => {
            flag.store(true, Ordering::Relaxed);
            HttpResponse::Ok().json(serde_json::json!({ "cancelling": true }))
        }
        None => respond(&Classified::not_found("no in-flight run for this job")),
    }
}

pub async fn retry(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let job_id = path.into_inner();
    let Some(previous) = state.store.job(&job_id) else {
        return respond(&Classified::not_found("deployment job not found"));
    };
    if previous.status != DeploymentStatus::Failed {
        return respond(&Classified::invalid("only a failed job can be retried"));
    }
    let Some(machine) = state.store.machine(&previous.machine_id) else {
        return respond(&Classified::not_found(format!("machine {} not found", previous.machine_id)));
    };

    let now = Utc::now();
    if let Err(e) = state.store.transition_machine(&machine.system_id, Trigger::Retry, now) {
        return respond(&e);
    }

    let new_job_id = Uuid::new_v4().to_string();
    let job = DeploymentJob {
        job_id: new_job_id.clone(),
        machine_id: machine.system_id.clone(),
        image_id: previous.image_id.clone(),
        eggs_to_deploy: previous.eggs_to_deploy.clone(),
        rendered_cloud_init: previous.rendered_cloud_init.clone(),
        status: DeploymentStatus::Pending,
        progress_percent: 0,
        current_phase: "pending".to_string(),
        log_output: vec![],
        error_message: None,
        skipped_eggs: vec![],
        started_at: now,
        completed_at: None,
    };
    state.store.create_job(job.clone());

    let bmc = bmc_credentials(&state, &machine).await;
    let eggs = previous
        .eggs_to_deploy
        .iter()
        .map(|name| EggExpectation {
            egg_name: name.clone(),
            ignore_errors: state.store.egg(name).map(|e| e.ignore_errors).unwrap_or(false),
        })
        .collect();
    let inputs = JobInputs {
        job_id: new_job_id,
        machine_id: machine.system_id.clone(),
        mac: machine.mac_address.clone(),
        bmc,
        eggs,
    };

    spawn_job(state.get_ref().clone(), inputs).await;

    HttpResponse::Accepted().json(job)
}

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list_jobs())
}
