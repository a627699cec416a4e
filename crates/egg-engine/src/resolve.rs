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

//! `resolve`: expand a group, topologically sort the dependency DAG with
//! ties broken by declared insertion order (Kahn's algorithm), and check
//! the target machine against each egg's architecture/resource
//! requirements. See spec §4.3 and the testable properties of §8.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use gough_core::model::{Architecture, Egg, EggGroup, EggSelector};

use crate::error::EggError;

/// The longest dependency chain this engine will resolve. Chosen so a
/// depth of 256 resolves cleanly and a depth of 4096 is rejected, per the
/// boundary behaviors in spec §8; the spec leaves the exact cutoff
/// unspecified.
pub const MAX_DEPENDENCY_DEPTH: usize = 1024;

/// The subset of `Machine` fields `resolve` checks eggs against.
#[derive(Debug, Clone, Copy)]
pub struct MachineProfile {
    pub architecture: Architecture,
    pub memory_mb: u64,
    pub storage_gb: u64,
}

/// A read-only view over the egg/group catalog that `resolve` queries.
pub trait EggCatalog {
    fn egg(&self, name: &str) -> Option<&Egg>;
    fn group(&self, name: &str) -> Option<&EggGroup>;
}

/// A plain in-memory catalog, used by `control`'s store and by tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    pub eggs: HashMap<String, Egg>,
    pub groups: HashMap<String, EggGroup>,
}

impl EggCatalog for InMemoryCatalog {
    fn egg(&self, name: &str) -> Option<&Egg> {
        self.eggs.get(name)
    }

    fn group(&self, name: &str) -> Option<&EggGroup> {
        self.groups.get(name)
    }
}

/// Expands a selector (bare egg list or named group) into a flat, declared
/// list of egg names, in encounter order.
fn expand_selector(catalog: &impl EggCatalog, selector: &EggSelector) -> Result<Vec<String>, EggError> {
    match selector {
        EggSelector::Eggs(names) => Ok(names.clone()),
        EggSelector::Group(name) => {
            let group = catalog
                .group(name)
                .ok_or_else(|| EggError::UnknownGroup(name.clone()))?;
            let mut members = group.members.clone();
            members.sort_by_key(|m| m.order);
            Ok(members.into_iter().map(|m| m.egg_name).collect())
        }
    }
}

/// Walks the dependency closure of `declared`, in discovery order: each
/// declared egg first, then its dependencies depth-first, each name
/// appearing once. Also returns the longest dependency chain length seen,
/// bailing out early once it exceeds `MAX_DEPENDENCY_DEPTH` rather than
/// continuing to walk a pathological input.
fn dependency_closure(
    catalog: &impl EggCatalog,
    declared: &[String],
) -> Result<Vec<String>, EggError> {
    let mut seen = HashSet::new();
    let mut in_progress = HashSet::new();
    let mut order = Vec::new();

    for root in declared {
        walk(catalog, root, &mut seen, &mut in_progress, &mut order, 0)?;
    }

    Ok(order)
}

fn walk(
    catalog: &impl EggCatalog,
    name: &str,
    seen: &mut HashSet<String>,
    in_progress: &mut HashSet<String>,
    order: &mut Vec<String>,
    depth: usize,
) -> Result<(), EggError> {
    if depth > MAX_DEPENDENCY_DEPTH {
        return Err(EggError::DepthLimit {
            depth,
            limit: MAX_DEPENDENCY_DEPTH,
        });
    }
    if seen.contains(name) {
        return Ok(());
    }
    // A dependency back to a node still on the current path is a cycle;
    // stop descending here and let the Kahn pass in `topological_sort`
    // report it cleanly instead of recursing forever.
    if !in_progress.insert(name.to_string()) {
        return Ok(());
    }
    let egg = catalog
        .egg(name)
        .ok_or_else(|| EggError::UnknownEgg(name.to_string()))?;
    for dep in &egg.dependencies {
        walk(catalog, dep, seen, in_progress, order, depth + 1)?;
    }
    in_progress.remove(name);
    if seen.insert(name.to_string()) {
        order.push(name.to_string());
    }
    Ok(())
}

/// Topologically sorts `closure` (all names already known to exist in the
/// catalog) via Kahn's algorithm, breaking ties by `closure`'s own
/// (insertion) order. Returns `ConfigError` if a cycle remains.
fn topological_sort(catalog: &impl EggCatalog, closure: &[String]) -> Result<Vec<String>, EggError> {
    let order_index: HashMap<&str, usize> = closure
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i))
        .collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for name in closure {
        let egg = catalog.egg(name).expect("closure only contains known eggs");
        in_degree.entry(name.as_str()).or_insert(0);
        for dep in &egg.dependencies {
            *in_degree.entry(name.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
        }
    }

    // BTreeMap<order_index, name> acts as a stable ready-set: always pop the
    // smallest declared-order index among currently-ready nodes.
    let mut ready: BTreeMap<usize, &str> = BTreeMap::new();
    for name in closure {
        if in_degree[name.as_str()] == 0 {
            ready.insert(order_index[name.as_str()], name.as_str());
        }
    }

    let mut sorted = Vec::with_capacity(closure.len());
    while let Some((_, name)) = ready.iter().next().map(|(k, v)| (*k, *v)) {
        ready.remove(&order_index[name]);
        sorted.push(name.to_string());
        if let Some(deps) = dependents.get(name) {
            for &dependent in deps {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(order_index[dependent], dependent);
                }
            }
        }
    }

    if sorted.len() != closure.len() {
        let stuck = closure
            .iter()
            .find(|n| !sorted.contains(n))
            .cloned()
            .unwrap_or_default();
        return Err(EggError::ConfigError(stuck));
    }

    Ok(sorted)
}

/// Resolves a selector against `machine`, returning eggs in a deterministic
/// total dependency order. See spec §4.3 operation 1 and §8 properties 3-4.
pub fn resolve(
    catalog: &impl EggCatalog,
    selector: &EggSelector,
    machine: MachineProfile,
) -> Result<Vec<Egg>, EggError> {
    let declared = expand_selector(catalog, selector)?;
    let closure = dependency_closure(catalog, &declared)?;
    let sorted_names = topological_sort(catalog, &closure)?;

    let mut resolved = Vec::with_capacity(sorted_names.len());
    for name in sorted_names {
        let egg = catalog.egg(&name).expect("validated above").clone();

        if !egg.required_architecture.matches(machine.architecture) {
            return Err(EggError::ArchMismatch {
                egg: egg.name.clone(),
                required: format!("{:?}", egg.required_architecture),
                actual: format!("{:?}", machine.architecture),
            });
        }
        if egg.min_ram_mb > machine.memory_mb {
            return Err(EggError::InsufficientResources {
                egg: egg.name.clone(),
                resource: "ram_mb",
                needed: egg.min_ram_mb,
                available: machine.memory_mb,
            });
        }
        if egg.min_disk_gb > machine.storage_gb {
            return Err(EggError::InsufficientResources {
                egg: egg.name.clone(),
                resource: "disk_gb",
                needed: egg.min_disk_gb,
                available: machine.storage_gb,
            });
        }

        resolved.push(egg);
    }

    Ok(resolved)
}

/// A simple breadth-unbounded queue reused by the depth audit in tests: not
/// part of the public resolve path, kept here because it documents the
/// shape Kahn's algorithm relies on.
#[allow(dead_code)]
fn bfs_layers(dependents: &HashMap<&str, Vec<&str>>, roots: &[&str]) -> VecDeque<Vec<String>> {
    let mut layers = VecDeque::new();
    let mut frontier: Vec<&str> = roots.to_vec();
    while !frontier.is_empty() {
        layers.push_back(frontier.iter().map(|s| s.to_string()).collect());
        frontier = frontier
            .iter()
            .flat_map(|n| dependents.get(n).cloned().unwrap_or_default())
            .collect();
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use gough_core::model::{EggGroupMember, RequiredArchitecture};
    use pretty_assertions::assert_eq;

    fn egg(name: &str, deps: &[&str]) -> Egg {
        Egg {
            name: name.to_string(),
            display_name: name.to_string(),
            version: "1.0".to_string(),
            category: "test".to_string(),
            payload: gough_core::model::EggPayload::CloudInit {
                content: "packages: []\n".to_string(),
            },
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            min_ram_mb: 0,
            min_disk_gb: 0,
            required_architecture: RequiredArchitecture::Any,
            ignore_errors: false,
            is_active: true,
            checksum: "deadbeef".to_string(),
            size_bytes: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn profile() -> MachineProfile {
        MachineProfile {
            architecture: Architecture::Amd64,
            memory_mb: 16384,
            storage_gb: 500,
        }
    }

    #[test]
    fn resolves_dependencies_before_dependents_stably() {
        let mut catalog = InMemoryCatalog::default();
        catalog.eggs.insert("base".into(), egg("base", &[]));
        catalog.eggs.insert("web".into(), egg("web", &["base"]));
        let selector = EggSelector::Eggs(vec!["base".into(), "web".into()]);

        let resolved = resolve(&catalog, &selector, profile()).unwrap();
        let names: Vec<_> = resolved.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["base", "web"]);
    }

    #[test]
    fn transitive_dependency_is_pulled_in_even_if_not_declared() {
        let mut catalog = InMemoryCatalog::default();
        catalog.eggs.insert("base".into(), egg("base", &[]));
        catalog.eggs.insert("web".into(), egg("web", &["base"]));
        let selector = EggSelector::Eggs(vec!["web".into()]);

        let resolved = resolve(&catalog, &selector, profile()).unwrap();
        let names: Vec<_> = resolved.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["base", "web"]);
    }

    #[test]
    fn cycle_is_rejected_before_any_other_check() {
        let mut catalog = InMemoryCatalog::default();
        catalog.eggs.insert("a".into(), egg("a", &["b"]));
        catalog.eggs.insert("b".into(), egg("b", &["a"]));
        let selector = EggSelector::Eggs(vec!["a".into()]);

        let err = resolve(&catalog, &selector, profile()).unwrap_err();
        assert!(matches!(err, EggError::ConfigError(_)));
    }

    #[test]
    fn arch_mismatch_is_rejected() {
        let mut catalog = InMemoryCatalog::default();
        let mut arm_only = egg("arm-thing", &[]);
        arm_only.required_architecture = RequiredArchitecture::Arm64;
        catalog.eggs.insert("arm-thing".into(), arm_only);
        let selector = EggSelector::Eggs(vec!["arm-thing".into()]);

        let err = resolve(&catalog, &selector, profile()).unwrap_err();
        assert!(matches!(err, EggError::ArchMismatch { .. }));
    }

    #[test]
    fn insufficient_resources_is_rejected() {
        let mut catalog = InMemoryCatalog::default();
        let mut hungry = egg("hungry", &[]);
        hungry.min_ram_mb = 1_000_000;
        catalog.eggs.insert("hungry".into(), hungry);
        let selector = EggSelector::Eggs(vec!["hungry".into()]);

        let err = resolve(&catalog, &selector, profile()).unwrap_err();
        assert!(matches!(err, EggError::InsufficientResources { .. }));
    }

    #[test]
    fn group_expands_in_declared_order() {
        let mut catalog = InMemoryCatalog::default();
        catalog.eggs.insert("a".into(), egg("a", &[]));
        catalog.eggs.insert("b".into(), egg("b", &[]));
        catalog.groups.insert(
            "bundle".into(),
            EggGroup {
                name: "bundle".into(),
                display_name: "Bundle".into(),
                members: vec![
                    EggGroupMember {
                        egg_name: "b".into(),
                        order: 1,
                    },
                    EggGroupMember {
                        egg_name: "a".into(),
                        order: 0,
                    },
                ],
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        );
        let selector = EggSelector::Group("bundle".into());

        let resolved = resolve(&catalog, &selector, profile()).unwrap();
        let names: Vec<_> = resolved.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    fn chain_catalog(depth: usize) -> (InMemoryCatalog, String) {
        let mut catalog = InMemoryCatalog::default();
        let mut prev: Option<String> = None;
        let mut head = String::new();
        for i in 0..depth {
            let name = format!("link{i}");
            let deps: Vec<&str> = prev.as_deref().into_iter().collect();
            catalog.eggs.insert(name.clone(), egg(&name, &deps));
            prev = Some(name.clone());
            head = name;
        }
        (catalog, head)
    }

    #[test]
    fn depth_256_resolves_correctly() {
        let (catalog, head) = chain_catalog(256);
        let selector = EggSelector::Eggs(vec![head]);
        let resolved = resolve(&catalog, &selector, profile()).unwrap();
        assert_eq!(resolved.len(), 256);
        assert_eq!(resolved.first().unwrap().name, "link0");
        assert_eq!(resolved.last().unwrap().name, "link255");
    }

    #[test]
    fn depth_4096_rejects_with_depth_limit() {
        let (catalog, head) = chain_catalog(4096);
        let selector = EggSelector::Eggs(vec![head]);
        let err = resolve(&catalog, &selector, profile()).unwrap_err();
        assert!(matches!(err, EggError::DepthLimit { .. }));
    }
}
