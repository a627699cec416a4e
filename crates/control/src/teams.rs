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

//! §3's capability model: teams, their members' roles, and the
//! `(resource_type, resource_id)` permission sets assigned to them. Kept
//! separate from `store::Store` because it is consulted by the SSH-CA
//! sub-protocol only, not by the machine/job state machine.

use std::collections::HashMap;
use std::sync::RwLock;

use gough_core::model::{Permission, ResourceTeam, TeamRole};

use crate::store::Store;

#[derive(Debug, Default)]
pub struct TeamRegistry {
    teams: RwLock<HashMap<String, ResourceTeam>>,
}

impl TeamRegistry {
    pub fn upsert(&self, team: ResourceTeam) {
        self.teams.write().unwrap().insert(team.team_id.clone(), team);
    }

    pub fn get(&self, team_id: &str) -> Option<ResourceTeam> {
        self.teams.read().unwrap().get(team_id).cloned()
    }

    pub fn list(&self) -> Vec<ResourceTeam> {
        self.teams.read().unwrap().values().cloned().collect()
    }

    /// Every team `user` belongs to, with their role in it.
    fn teams_for_user(&self, user: &str) -> Vec<(ResourceTeam, TeamRole)> {
        self.teams
            .read()
            .unwrap()
            .values()
            .filter_map(|t| t.members.get(user).map(|role| (t.clone(), *role)))
            .collect()
    }
}

/// What a caller is permitted to do on a resource, resolved from their team
/// memberships and the assignments `store` holds for that resource — the
/// `CallerContext` the SSH-CA sub-protocol (§4.5) checks against.
pub fn resolve_caller_context(
    teams: &TeamRegistry,
    store: &Store,
    user: &str,
    resource_type: &str,
    resource_id: &str,
) -> agent_protocol::ssh_ca::CallerContext {
    let user_teams: Vec<String> = teams
        .teams_for_user(user)
        .into_iter()
        .map(|(t, _)| t.team_id)
        .collect();
    let assignments = store.assignments_for(resource_type, resource_id);
    let mut has_shell = false;
    let mut allowed_principals = Vec::new();
    for assignment in assignments {
        if !user_teams.contains(&assignment.team_id) {
            continue;
        }
        if assignment.permissions.contains(&Permission::Shell) {
            has_shell = true;
            for principal in &assignment.allowed_principals {
                if !allowed_principals.contains(principal) {
                    allowed_principals.push(principal.clone());
                }
            }
        }
    }
    agent_protocol::ssh_ca::CallerContext {
        has_shell_capability: has_shell,
        allowed_principals,
        user_email: user.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn member_with_shell_assignment_gets_allowed_principals() {
        let teams = TeamRegistry::default();
        let mut members = HashMap::new();
        members.insert("alice@example.com".to_string(), TeamRole::Member);
        teams.upsert(ResourceTeam {
            team_id: "infra".into(),
            name: "Infra".into(),
            members,
        });

        let store = Store::new();
        store.upsert_assignment(gough_core::model::ResourceAssignment {
            team_id: "infra".into(),
            resource_type: "vm".into(),
            resource_id: "v-1".into(),
            permissions: BTreeSet::from([Permission::Shell]),
            allowed_principals: vec!["ubuntu".into()],
        });

        let ctx = resolve_caller_context(&teams, &store, "alice@example.com", "vm", "v-1");
        assert!(ctx.has_shell_capability);
        assert_eq!(ctx.allowed_principals, vec!["ubuntu".to_string()]);
    }

    #[test]
    fn non_member_has_no_capability() {
        let teams = TeamRegistry::default();
        let store = Store::new();
        let ctx = resolve_caller_context(&teams, &store, "mallory@example.com", "vm", "v-1");
        assert!(!ctx.has_shell_capability);
    }
}
