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

//! `render_cloud_init` and `validate`, per spec §4.3 operations 2 and 3.
//!
//! Merge is a tagged-variant pattern match, generalized from the reference
//! workspace's design-notes idiom for merging dynamically-typed documents
//! (§9: "Dynamic-typed cloud-init mapping"): a merge function dispatches on
//! the pair of value kinds, one arm per combination.

use gough_core::model::{Egg, EggPayload};
use serde_yaml::{Mapping, Value};

use crate::error::EggError;

/// Default maximum size of a rendered cloud-init document: 512 KiB, per §4.3.
pub const DEFAULT_MAX_RENDERED_BYTES: usize = 512 * 1024;

/// Merges `incoming` into `existing` at the same key, per §4.3's type rules:
/// sequences concatenate (duplicates preserved), mappings shallow-merge
/// with `incoming`'s keys overriding, and anything else is a scalar
/// override where `incoming` wins.
fn merge_value(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Sequence(mut a), Value::Sequence(b)) => {
            a.extend(b);
            Value::Sequence(a)
        }
        (Value::Mapping(mut a), Value::Mapping(b)) => {
            for (k, v) in b {
                a.insert(k, v);
            }
            Value::Mapping(a)
        }
        (_, incoming) => incoming,
    }
}

fn merge_mapping_into(target: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        match target.remove(&key) {
            Some(existing) => {
                target.insert(key, merge_value(existing, value));
            }
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn reserved_sequence<'a>(root: &'a mut Mapping, key: &str) -> &'a mut Vec<Value> {
    let key_value = Value::String(key.to_string());
    if root.get(&key_value).is_none() {
        root.insert(key_value.clone(), Value::Sequence(Vec::new()));
    }
    match root.get_mut(&key_value).unwrap() {
        Value::Sequence(seq) => seq,
        _ => unreachable!("reserved key {key} was just ensured to be a sequence"),
    }
}

fn nested_reserved_sequence<'a>(root: &'a mut Mapping, parent: &str, key: &str) -> &'a mut Vec<Value> {
    let parent_key = Value::String(parent.to_string());
    if root.get(&parent_key).is_none() {
        root.insert(parent_key.clone(), Value::Mapping(Mapping::new()));
    }
    let parent_map = match root.get_mut(&parent_key) {
        Some(Value::Mapping(m)) => m,
        _ => unreachable!("reserved parent {parent} was just ensured to be a mapping"),
    };
    reserved_sequence(parent_map, key)
}

/// Renders the ordered, already-resolved egg list into a single
/// `#cloud-config` document. Byte-identical for byte-identical input, per
/// §8 property 3.
pub fn render_cloud_init(eggs: &[Egg]) -> Result<String, EggError> {
    render_cloud_init_with_limit(eggs, DEFAULT_MAX_RENDERED_BYTES)
}

pub fn render_cloud_init_with_limit(eggs: &[Egg], max_bytes: usize) -> Result<String, EggError> {
    let mut merged = Mapping::new();

    for egg in eggs {
        match &egg.payload {
            EggPayload::CloudInit { content } => {
                let parsed: Value = serde_yaml::from_str(content)
                    .map_err(|e| EggError::Malformed(e.to_string()))?;
                let mapping = match parsed {
                    Value::Mapping(m) => m,
                    Value::Null => Mapping::new(),
                    _ => return Err(EggError::InvalidCloudInit(egg.name.clone())),
                };
                merge_mapping_into(&mut merged, mapping);
            }
            EggPayload::Snap {
                snap_name,
                channel,
                classic,
            } => {
                let mut entry = Mapping::new();
                entry.insert(Value::String("name".into()), Value::String(snap_name.clone()));
                entry.insert(
                    Value::String("channel".into()),
                    Value::String(channel.clone()),
                );
                entry.insert(Value::String("classic".into()), Value::Bool(*classic));
                reserved_sequence(&mut merged, "snaps").push(Value::Mapping(entry));
            }
            EggPayload::LxdContainer {
                image_alias,
                image_url,
                profiles,
            }
            | EggPayload::LxdVm {
                image_alias,
                image_url,
                profiles,
            } => {
                let mut entry = Mapping::new();
                entry.insert(
                    Value::String("image_alias".into()),
                    Value::String(image_alias.clone()),
                );
                if let Some(url) = image_url {
                    entry.insert(Value::String("image_url".into()), Value::String(url.clone()));
                }
                entry.insert(
                    Value::String("profiles".into()),
                    Value::Sequence(profiles.iter().cloned().map(Value::String).collect()),
                );
                nested_reserved_sequence(&mut merged, "lxd", "images").push(Value::Mapping(entry));
            }
        }
    }

    let body = serde_yaml::to_string(&Value::Mapping(merged))
        .map_err(|e| EggError::Malformed(e.to_string()))?;
    let rendered = format!("#cloud-config\n{body}");

    if rendered.as_bytes().len() > max_bytes {
        return Err(EggError::TooLarge {
            actual: rendered.as_bytes().len(),
            limit: max_bytes,
        });
    }

    Ok(rendered)
}

/// Pure syntactic validation plus a root-mapping check, per §4.3 operation 3.
pub fn validate(yaml_text: &str) -> Result<(), EggError> {
    let parsed: Value =
        serde_yaml::from_str(yaml_text).map_err(|e| EggError::Malformed(e.to_string()))?;
    match parsed {
        Value::Mapping(_) => Ok(()),
        _ => Err(EggError::InvalidCloudInit("<root>".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gough_core::model::RequiredArchitecture;
    use pretty_assertions::assert_eq;

    fn cloud_init_egg(name: &str, yaml: &str) -> Egg {
        Egg {
            name: name.to_string(),
            display_name: name.to_string(),
            version: "1.0".into(),
            category: "test".into(),
            payload: EggPayload::CloudInit {
                content: yaml.to_string(),
            },
            dependencies: vec![],
            min_ram_mb: 0,
            min_disk_gb: 0,
            required_architecture: RequiredArchitecture::Any,
            ignore_errors: false,
            is_active: true,
            checksum: String::new(),
            size_bytes: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn sequences_concatenate_in_encounter_order() {
        let eggs = vec![
            cloud_init_egg("base", "packages: [curl]\n"),
            cloud_init_egg("extra", "packages: [curl, htop]\n"),
        ];
        let rendered = render_cloud_init(&eggs).unwrap();
        let doc: Value = serde_yaml::from_str(
            rendered.trim_start_matches("#cloud-config\n"),
        )
        .unwrap();
        let packages = doc.as_mapping().unwrap().get("packages").unwrap();
        let packages: Vec<&str> = packages
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(packages, vec!["curl", "curl", "htop"]);
    }

    #[test]
    fn mappings_shallow_merge_with_later_keys_winning() {
        let eggs = vec![
            cloud_init_egg("base", "users:\n  default:\n    shell: /bin/bash\n"),
            cloud_init_egg(
                "override",
                "users:\n  default:\n    shell: /bin/zsh\n    groups: [sudo]\n",
            ),
        ];
        let rendered = render_cloud_init(&eggs).unwrap();
        assert!(rendered.contains("shell: /bin/zsh"));
        assert!(rendered.contains("sudo"));
    }

    #[test]
    fn scalars_are_overridden_by_later_eggs() {
        let eggs = vec![
            cloud_init_egg("base", "hostname: base-host\n"),
            cloud_init_egg("override", "hostname: final-host\n"),
        ];
        let rendered = render_cloud_init(&eggs).unwrap();
        assert!(rendered.contains("final-host"));
        assert!(!rendered.contains("base-host"));
    }

    #[test]
    fn snap_eggs_are_injected_as_a_list() {
        let eggs = vec![Egg {
            payload: EggPayload::Snap {
                snap_name: "nginx".into(),
                channel: "stable".into(),
                classic: false,
            },
            ..cloud_init_egg("web", "{}\n")
        }];
        let rendered = render_cloud_init(&eggs).unwrap();
        assert!(rendered.contains("snaps:"));
        assert!(rendered.contains("nginx"));
        assert!(rendered.contains("stable"));
    }

    #[test]
    fn rendering_is_deterministic_for_identical_input() {
        let eggs = vec![
            cloud_init_egg("base", "packages: [curl]\n"),
            Egg {
                payload: EggPayload::Snap {
                    snap_name: "nginx".into(),
                    channel: "stable".into(),
                    classic: false,
                },
                ..cloud_init_egg("web", "{}\n")
            },
        ];
        let first = render_cloud_init(&eggs).unwrap();
        let second = render_cloud_init(&eggs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_mapping_cloud_init_content_is_rejected() {
        let eggs = vec![cloud_init_egg("bad", "- just\n- a\n- list\n")];
        let err = render_cloud_init(&eggs).unwrap_err();
        assert!(matches!(err, EggError::InvalidCloudInit(_)));
    }

    #[test]
    fn oversized_output_is_rejected() {
        let huge = format!("packages: [{}]\n", "x".repeat(2000));
        let eggs = vec![cloud_init_egg("huge", &huge)];
        let err = render_cloud_init_with_limit(&eggs, 100).unwrap_err();
        assert!(matches!(err, EggError::TooLarge { .. }));
    }

    #[test]
    fn validate_accepts_mappings_and_rejects_scalars() {
        assert!(validate("a: 1\nb: 2\n").is_ok());
        assert!(validate("just a string\n").is_err());
        assert!(validate("- 1\n- 2\n").is_err());
    }
}
