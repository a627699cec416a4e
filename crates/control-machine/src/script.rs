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

//! iPXE-script generation: a pure function of `(machine state, active job if
//! any, boot_config, requested image, worker's base URL)`, per §4.2. Always
//! terminates in either a `boot` instruction or a `shell` fallback — never
//! an unbounded loop. Literal script shape is grounded on the Python
//! original's `ipxe_handler.py::generate_script`.

use gough_core::model::{BootImage, DeploymentStatus, MachineStatus};

/// Everything the decision needs; no field is looked up by this module —
/// the caller (`control`) resolves the current job/image/flag and hands
/// them over as a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub mac: &'a str,
    pub status: MachineStatus,
    /// Status of the machine's active `DeploymentJob`, if `status ==
    /// Deploying`. `None` otherwise.
    pub active_job_status: Option<DeploymentStatus>,
    pub active_job_error: Option<&'a str>,
    /// The image to chain into for an install or commissioning boot.
    pub image: Option<&'a BootImage>,
    /// A machine carrying `deployed` status with this flag set gets a
    /// fresh install script instead of chaining to its local disk — this is
    /// the explicit "re-image flag" tie-break from §4.2.
    pub reimage_requested: bool,
    pub worker_base_url: &'a str,
}

const BANNER: &str = "Gough Provisioning";

fn header(title: &str) -> String {
    format!("#!ipxe\necho ======================================\necho {BANNER} - {title}\necho ======================================\n")
}

fn discovery_script(ctx: &ScriptContext<'_>) -> String {
    let mut s = header("Machine Discovery");
    s.push_str(&format!("echo MAC Address: {}\necho\n", ctx.mac));
    s.push_str(&format!(
        "echo Registering machine with provisioning server...\nchain {}/boot-event || goto failed\n",
        ctx.worker_base_url
    ));
    s.push_str("echo Booting discovery image...\n");
    s.push_str(&format!(
        "kernel {base}/images/discovery/vmlinuz initrd=initrd ip=dhcp\ninitrd {base}/images/discovery/initrd\nboot || goto failed\n",
        base = ctx.worker_base_url
    ));
    s.push_str(":failed\necho\necho Discovery boot failed. Dropping to iPXE shell.\nshell\n");
    s
}

fn install_script(ctx: &ScriptContext<'_>, title: &str) -> String {
    let mut s = header(title);
    match ctx.image {
        Some(image) => {
            s.push_str(&format!("echo Booting install image: {}\n", image.name));
            s.push_str(&format!(
                "kernel {base}/images/{kernel} initrd=initrd {params}\ninitrd {base}/images/{initrd}\nboot || goto failed\n",
                base = ctx.worker_base_url,
                kernel = image.kernel_path,
                initrd = image.initrd_path,
                params = image.kernel_params,
            ));
        }
        None => {
            s.push_str("echo No boot image resolved for this phase.\n");
            return finish_with_shell(s);
        }
    }
    s.push_str(":failed\necho\necho Install boot failed. Dropping to iPXE shell.\nshell\n");
    s
}

fn local_disk_script(ctx: &ScriptContext<'_>) -> String {
    let mut s = header("Chain to Local Disk");
    s.push_str(&format!("echo MAC Address: {}\n", ctx.mac));
    s.push_str("sanboot --no-describe --drive 0x80 || goto failed\n");
    s.push_str(":failed\necho\necho Local disk boot failed. Dropping to iPXE shell.\nshell\n");
    s
}

fn error_script(ctx: &ScriptContext<'_>, message: &str) -> String {
    let mut s = header("Error");
    s.push_str(&format!("echo {message}\necho\n"));
    s.push_str("echo Dropping to iPXE shell.\necho Type 'reboot' to restart.\nshell\n");
    let _ = ctx;
    s
}

fn finish_with_shell(mut s: String) -> String {
    s.push_str("shell\n");
    s
}

/// Renders the iPXE script for `ctx`, following §4.2's transition table and
/// tie-break rules. Always ends in `boot`/`chain`/`sanboot` or `shell`.
pub fn render_ipxe_script(ctx: &ScriptContext<'_>) -> String {
    match ctx.status {
        MachineStatus::Unknown | MachineStatus::Discovered => discovery_script(ctx),
        MachineStatus::Commissioning => install_script(ctx, "Commissioning"),
        MachineStatus::Ready => local_disk_script(ctx),
        MachineStatus::Deploying => match ctx.active_job_status {
            Some(DeploymentStatus::Pending)
            | Some(DeploymentStatus::PowerOn)
            | Some(DeploymentStatus::PxeBoot)
            | Some(DeploymentStatus::OsInstall) => install_script(ctx, "Deploying"),
            Some(DeploymentStatus::EggDeploy) | Some(DeploymentStatus::Complete) => {
                local_disk_script(ctx)
            }
            Some(DeploymentStatus::Failed) => {
                error_script(ctx, ctx.active_job_error.unwrap_or("deployment failed"))
            }
            None => error_script(ctx, "machine is deploying but has no active job"),
        },
        MachineStatus::Deployed => {
            if ctx.reimage_requested {
                install_script(ctx, "Re-image")
            } else {
                local_disk_script(ctx)
            }
        }
        MachineStatus::Failed => error_script(
            ctx,
            ctx.active_job_error.unwrap_or("last deployment attempt failed"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image() -> BootImage {
        BootImage {
            name: "ubuntu-24.04-amd64".into(),
            architecture: gough_core::model::Architecture::Amd64,
            kernel_path: "ubuntu-24.04/vmlinuz".into(),
            initrd_path: "ubuntu-24.04/initrd".into(),
            squashfs_path: None,
            kernel_params: "ip=dhcp".into(),
            checksum: "deadbeef".into(),
            size_bytes: 0,
        }
    }

    fn ctx<'a>(status: MachineStatus, image: Option<&'a BootImage>) -> ScriptContext<'a> {
        ScriptContext {
            mac: "aabbcc112233",
            status,
            active_job_status: None,
            active_job_error: None,
            image,
            reimage_requested: false,
            worker_base_url: "http://worker1:8080",
        }
    }

    #[test]
    fn discovery_script_starts_with_shebang_and_ends_boot_or_shell() {
        let script = render_ipxe_script(&ctx(MachineStatus::Discovered, None));
        assert!(script.starts_with("#!ipxe\n"));
        assert!(script.trim_end().ends_with("shell"));
    }

    #[test]
    fn ready_machine_chains_to_local_disk() {
        let script = render_ipxe_script(&ctx(MachineStatus::Ready, None));
        assert!(script.contains("sanboot"));
    }

    #[test]
    fn deploying_machine_in_pxe_boot_phase_gets_install_script() {
        let img = image();
        let mut c = ctx(MachineStatus::Deploying, Some(&img));
        c.active_job_status = Some(DeploymentStatus::PxeBoot);
        let script = render_ipxe_script(&c);
        assert!(script.contains("ubuntu-24.04/vmlinuz"));
        assert!(script.trim_end().ends_with("shell"));
    }

    #[test]
    fn deploying_machine_in_egg_deploy_phase_chains_local_disk_not_fresh_discovery() {
        let mut c = ctx(MachineStatus::Deploying, None);
        c.active_job_status = Some(DeploymentStatus::EggDeploy);
        let script = render_ipxe_script(&c);
        assert!(script.contains("sanboot"));
        assert!(!script.contains("Machine Discovery"));
    }

    #[test]
    fn deployed_machine_without_reimage_flag_chains_local_disk() {
        let script = render_ipxe_script(&ctx(MachineStatus::Deployed, None));
        assert!(script.contains("sanboot"));
    }

    #[test]
    fn deployed_machine_with_reimage_flag_gets_install_script() {
        let img = image();
        let mut c = ctx(MachineStatus::Deployed, Some(&img));
        c.reimage_requested = true;
        let script = render_ipxe_script(&c);
        assert!(script.contains("vmlinuz"));
    }

    #[test]
    fn failed_job_yields_error_script_with_message() {
        let mut c = ctx(MachineStatus::Deploying, None);
        c.active_job_status = Some(DeploymentStatus::Failed);
        c.active_job_error = Some("pxe_boot timeout");
        let script = render_ipxe_script(&c);
        assert!(script.contains("pxe_boot timeout"));
        assert!(script.trim_end().ends_with("shell"));
    }

    #[test]
    fn every_script_terminates_in_boot_chain_sanboot_or_shell() {
        for status in [
            MachineStatus::Unknown,
            MachineStatus::Discovered,
            MachineStatus::Commissioning,
            MachineStatus::Ready,
            MachineStatus::Deployed,
            MachineStatus::Failed,
        ] {
            let img = image();
            let script = render_ipxe_script(&ctx(status, Some(&img)));
            let last_directive = script
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap()
                .trim();
            assert!(
                ["shell", "boot", "boot || goto failed"].contains(&last_directive)
                    || last_directive.starts_with("sanboot"),
                "unexpected terminal line: {last_directive}"
            );
        }
    }
}
