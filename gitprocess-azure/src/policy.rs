//! Branch policy configuration model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full reference name for a branch
///
/// The name is always taken as a short branch name, matching the ref git
/// creates for it, so `refs/heads/x` maps to `refs/heads/refs/heads/x`.
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{}", branch)
}

/// A policy configuration as exchanged with Azure DevOps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Service-assigned id, absent on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Policy type
    #[serde(rename = "type")]
    pub policy_type: PolicyType,

    /// Type-specific settings, copied verbatim
    #[serde(default)]
    pub settings: Map<String, Value>,

    #[serde(default)]
    pub is_enabled: bool,

    #[serde(default)]
    pub is_blocking: bool,

    /// Branches and repositories the policy applies to
    ///
    /// Azure DevOps stores the scope inside `settings`; older payloads may
    /// carry it at the top level as well.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<PolicyScope>,
}

/// Policy type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyType {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// One scope entry of a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
}

impl PolicyScope {
    /// Exact-match scope for one branch of one repository
    pub fn exact(ref_name: impl Into<String>, repository_id: impl Into<String>) -> Self {
        Self {
            ref_name: Some(ref_name.into()),
            match_kind: Some("Exact".to_string()),
            repository_id: Some(repository_id.into()),
        }
    }
}

impl Policy {
    /// Name used when reporting on this policy
    pub fn display_name(&self) -> &str {
        if self.policy_type.display_name.is_empty() {
            &self.policy_type.id
        } else {
            &self.policy_type.display_name
        }
    }

    /// Copy of this policy for creation on `target_ref`
    ///
    /// The id is cleared and every scope entry, wherever it is stored, points
    /// at `target_ref`. A policy without any scope entry gets an exact scope
    /// for `target_ref` in `repository_id`.
    pub fn retarget(&self, target_ref: &str, repository_id: &str) -> Policy {
        let mut copy = self.clone();
        copy.id = None;

        for entry in &mut copy.scope {
            entry.ref_name = Some(target_ref.to_string());
        }

        let mut settings_scoped = false;
        if let Some(Value::Array(entries)) = copy.settings.get_mut("scope") {
            for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
                entry.insert("refName".to_string(), Value::String(target_ref.to_string()));
                settings_scoped = true;
            }
        }

        if copy.scope.is_empty() && !settings_scoped {
            copy.scope.push(PolicyScope::exact(target_ref, repository_id));
        }

        copy
    }

    /// Every ref name this policy is scoped to
    pub fn scoped_refs(&self) -> Vec<&str> {
        let top_level = self.scope.iter().filter_map(|s| s.ref_name.as_deref());

        let in_settings = self
            .settings
            .get("scope")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("refName").and_then(Value::as_str));

        top_level.chain(in_settings).collect()
    }
}
