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

//! The full HTTP surface of §6, wired onto one `actix_web::web::ServiceConfig`
//! so `bin/main.rs` only has to call [`configure`].

pub mod agents;
pub mod boot_assets;
pub mod deployments;
pub mod dto;
pub mod eggs;
pub mod internal;
pub mod machines;
pub mod ssh_ca;
pub mod teams;
pub mod workers;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/internal")
            .route("/boot-script", web::get().to(internal::boot_script))
            .route("/cloud-init/{machine_id}/meta-data", web::get().to(internal::cloud_init_meta_data))
            .route("/cloud-init/{machine_id}/user-data", web::get().to(internal::cloud_init_user_data))
            .route("/image-url/{key:.*}", web::get().to(internal::image_url))
            .route("/boot-event", web::post().to(internal::boot_event)),
    );

    cfg.service(
        web::scope("/workers")
            .route("/enroll", web::post().to(workers::enroll))
            .route("/heartbeat", web::post().to(workers::heartbeat))
            .route("", web::get().to(workers::list)),
    );

    cfg.service(
        web::scope("/agents")
            .route("/enrollment-keys", web::post().to(agents::create_enrollment_key))
            .route("/enroll", web::post().to(agents::enroll))
            .route("/heartbeat", web::post().to(agents::heartbeat))
            .route("/token/refresh", web::post().to(agents::refresh_token))
            .route("/{agent_id}/suspend", web::post().to(agents::suspend))
            .route("", web::get().to(agents::list)),
    );

    cfg.service(web::resource("/ssh-ca/sign").route(web::post().to(ssh_ca::sign)));

    cfg.service(
        web::scope("/machines")
            .route("", web::get().to(machines::list))
            .route("/{system_id}", web::get().to(machines::get))
            .route("/{system_id}/commission", web::post().to(machines::commission))
            .route("/{system_id}/release", web::post().to(machines::release))
            .route("/{system_id}/hard-reset", web::post().to(machines::hard_reset))
            .route("/{system_id}/reimage", web::post().to(machines::request_reimage)),
    );

    cfg.service(
        web::scope("/deployments")
            .route("", web::post().to(deployments::create))
            .route("", web::get().to(deployments::list))
            .route("/{job_id}", web::get().to(deployments::get))
            .route("/{job_id}/cancel", web::post().to(deployments::cancel))
            .route("/{job_id}/retry", web::post().to(deployments::retry)),
    );

    cfg.service(
        web::scope("/eggs")
            .route("/render", web::post().to(eggs::render))
            .route("", web::get().to(eggs::list_eggs))
            .route("/{name}", web::get().to(eggs::get_egg))
            .route("/{name}", web::put().to(eggs::upsert_egg))
            .route("/{name}", web::delete().to(eggs::delete_egg)),
    );

    cfg.service(
        web::scope("/egg-groups")
            .route("", web::get().to(eggs::list_groups))
            .route("/{name}", web::get().to(eggs::get_group))
            .route("/{name}", web::put().to(eggs::upsert_group))
            .route("/{name}", web::delete().to(eggs::delete_group)),
    );

    cfg.service(
        web::scope("/boot-images")
            .route("", web::get().to(boot_assets::list_images))
            .route("", web::post().to(boot_assets::upsert_image)),
    );

    cfg.service(
        web::scope("/boot-configs")
            .route("/{name}", web::get().to(boot_assets::get_config))
            .route("", web::post().to(boot_assets::upsert_config)),
    );

    cfg.service(
        web::scope("/teams")
            .route("", web::get().to(teams::list))
            .route("", web::post().to(teams::upsert))
            .route("/{team_id}", web::get().to(teams::get))
            .route("/assignments", web::post().to(teams::assign))
            .route(
                "/assignments/{resource_type}/{resource_id}",
                web::get().to(teams::assignments_for),
            ),
    );
}
