//! Classification of Cloud Audit Log entries into permission-change summaries.

use permwatch_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROJECT_RESOURCE_TYPE: &str = "project";
const BIGQUERY_RESOURCE_TYPE: &str = "bigquery_dataset";

/// A single IAM binding delta recorded by an audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDelta {
    /// Delta action, `ADD` or `REMOVE`.
    pub action: String,
    /// Role the delta applies to.
    pub role: String,
    /// The single member added to or removed from the role.
    pub member: String,
}

/// One role binding from a full IAM policy snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBinding {
    /// Role the binding grants.
    pub role: String,
    /// Every member holding the role, in policy order.
    pub members: Vec<String>,
}

/// Which BigQuery resource an IAM change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BigQueryResourceKind {
    /// The change was recorded against a table.
    Table,
    /// The change was recorded against a dataset.
    Dataset,
}

impl BigQueryResourceKind {
    /// Returns the resource type label used in chat messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "bigquery_table",
            Self::Dataset => "bigquery_dataset",
        }
    }
}

/// Normalized summary of one IAM permission change, tagged by the shape of
/// the originating audit log record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSummary {
    /// Project-level IAM policy delta.
    ProjectPolicy {
        /// Project the change was recorded in.
        project_id: String,
        /// Principal that made the change.
        changed_by: String,
        /// Identifier of the backing audit log entry.
        insert_id: String,
        /// Binding deltas in log order.
        deltas: Vec<BindingDelta>,
    },
    /// Table- or dataset-level BigQuery policy delta.
    BigQueryPolicy {
        /// Project the change was recorded in.
        project_id: String,
        /// Principal that made the change.
        changed_by: String,
        /// Identifier of the backing audit log entry.
        insert_id: String,
        /// Full resource name of the changed table or dataset.
        resource_name: String,
        /// Whether the change targeted a table or a dataset.
        resource_kind: BigQueryResourceKind,
        /// Binding deltas in log order.
        deltas: Vec<BindingDelta>,
    },
    /// Any other resource; carries the full policy snapshot after the change
    /// rather than a delta list.
    GenericResource {
        /// Project the change was recorded in.
        project_id: String,
        /// Principal that made the change.
        changed_by: String,
        /// Identifier of the backing audit log entry.
        insert_id: String,
        /// Literal resource type string from the log record.
        resource_type: String,
        /// Full resource name of the changed resource.
        resource_name: String,
        /// Policy bindings after the change, in policy order.
        bindings: Vec<PolicyBinding>,
    },
}

impl ChangeSummary {
    /// Classifies a parsed audit log record and extracts its change summary.
    ///
    /// Fails with a malformed-log error when a field required by the matched
    /// branch is absent; nothing is defaulted.
    pub fn from_log_entry(log: &Value) -> AppResult<Self> {
        let changed_by =
            required_str(log, "protoPayload.authenticationInfo.principalEmail")?.to_owned();
        let insert_id = required_str(log, "insertId")?.to_owned();
        let resource_type = required_str(log, "resource.type")?;
        let project_id = required_str(log, "resource.labels.project_id")?.to_owned();

        match resource_type {
            PROJECT_RESOURCE_TYPE => {
                let deltas =
                    binding_deltas(log, "protoPayload.serviceData.policyDelta.bindingDeltas")?;

                Ok(Self::ProjectPolicy {
                    project_id,
                    changed_by,
                    insert_id,
                    deltas,
                })
            }
            BIGQUERY_RESOURCE_TYPE => {
                let resource_name = required_str(log, "protoPayload.resourceName")?.to_owned();
                let metadata = required_field(log, "protoPayload.metadata")?;

                let (resource_kind, change) = if let Some(change) = metadata.get("tableChange") {
                    (BigQueryResourceKind::Table, change)
                } else if let Some(change) = metadata.get("datasetChange") {
                    (BigQueryResourceKind::Dataset, change)
                } else {
                    return Err(AppError::MalformedLog(
                        "unknown bigquery resource type".to_owned(),
                    ));
                };

                let deltas = binding_deltas(change, "bindingDeltas")?;

                Ok(Self::BigQueryPolicy {
                    project_id,
                    changed_by,
                    insert_id,
                    resource_name,
                    resource_kind,
                    deltas,
                })
            }
            other => {
                let resource_name = required_str(log, "protoPayload.resourceName")?.to_owned();
                let bindings = policy_bindings(log, "protoPayload.request.policy.bindings")?;

                Ok(Self::GenericResource {
                    project_id,
                    changed_by,
                    insert_id,
                    resource_type: other.to_owned(),
                    resource_name,
                    bindings,
                })
            }
        }
    }

    /// Identifier of the audit log entry backing this summary.
    #[must_use]
    pub fn insert_id(&self) -> &str {
        match self {
            Self::ProjectPolicy { insert_id, .. }
            | Self::BigQueryPolicy { insert_id, .. }
            | Self::GenericResource { insert_id, .. } => insert_id,
        }
    }

    /// Project the change was recorded in.
    #[must_use]
    pub fn project_id(&self) -> &str {
        match self {
            Self::ProjectPolicy { project_id, .. }
            | Self::BigQueryPolicy { project_id, .. }
            | Self::GenericResource { project_id, .. } => project_id,
        }
    }

    /// Principal that made the change.
    #[must_use]
    pub fn changed_by(&self) -> &str {
        match self {
            Self::ProjectPolicy { changed_by, .. }
            | Self::BigQueryPolicy { changed_by, .. }
            | Self::GenericResource { changed_by, .. } => changed_by,
        }
    }
}

fn lookup<'a>(log: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(log, |value, key| value.get(key))
}

fn required_field<'a>(log: &'a Value, path: &str) -> AppResult<&'a Value> {
    lookup(log, path)
        .ok_or_else(|| AppError::MalformedLog(format!("missing required field '{path}'")))
}

fn required_str<'a>(log: &'a Value, path: &str) -> AppResult<&'a str> {
    required_field(log, path)?
        .as_str()
        .ok_or_else(|| AppError::MalformedLog(format!("field '{path}' must be a string")))
}

fn binding_deltas(value: &Value, path: &str) -> AppResult<Vec<BindingDelta>> {
    let deltas = required_field(value, path)?;
    serde_json::from_value(deltas.clone()).map_err(|error| {
        AppError::MalformedLog(format!("invalid binding delta list at '{path}': {error}"))
    })
}

fn policy_bindings(value: &Value, path: &str) -> AppResult<Vec<PolicyBinding>> {
    let bindings = required_field(value, path)?;
    serde_json::from_value(bindings.clone()).map_err(|error| {
        AppError::MalformedLog(format!("invalid policy binding list at '{path}': {error}"))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BigQueryResourceKind, BindingDelta, ChangeSummary, PolicyBinding};

    #[test]
    fn project_log_extracts_policy_deltas() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "serviceData": {"policyDelta": {"bindingDeltas": [
                    {"action": "ADD", "role": "roles/viewer", "member": "user:testuser@example.com"}
                ]}},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "project", "labels": {"project_id": "test-project"}},
        });

        let summary = ChangeSummary::from_log_entry(&log);
        let expected = ChangeSummary::ProjectPolicy {
            project_id: "test-project".to_owned(),
            changed_by: "test@example.com".to_owned(),
            insert_id: "test-insert-id".to_owned(),
            deltas: vec![BindingDelta {
                action: "ADD".to_owned(),
                role: "roles/viewer".to_owned(),
                member: "user:testuser@example.com".to_owned(),
            }],
        };
        assert!(matches!(summary, Ok(ref found) if *found == expected));
    }

    #[test]
    fn project_log_preserves_delta_order() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "serviceData": {"policyDelta": {"bindingDeltas": [
                    {"action": "REMOVE", "role": "roles/editor", "member": "user:olduser@example.com"},
                    {"action": "ADD", "role": "roles/viewer", "member": "user:testuser@example.com"}
                ]}},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "project", "labels": {"project_id": "test-project"}},
        });

        let Ok(ChangeSummary::ProjectPolicy { deltas, .. }) = ChangeSummary::from_log_entry(&log)
        else {
            panic!("expected a project policy summary");
        };
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].action, "REMOVE");
        assert_eq!(deltas[1].action, "ADD");
    }

    #[test]
    fn bigquery_dataset_change_extracts_dataset_kind() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "resourceName": "project/test-project/dataset/test-dataset",
                "metadata": {"datasetChange": {"bindingDeltas": [
                    {"action": "ADD", "role": "roles/viewer", "member": "user:testuser@example.com"}
                ]}},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "bigquery_dataset", "labels": {"project_id": "test-project"}},
        });

        let Ok(ChangeSummary::BigQueryPolicy {
            resource_kind,
            resource_name,
            deltas,
            ..
        }) = ChangeSummary::from_log_entry(&log)
        else {
            panic!("expected a bigquery policy summary");
        };
        assert_eq!(resource_kind, BigQueryResourceKind::Dataset);
        assert_eq!(resource_name, "project/test-project/dataset/test-dataset");
        assert_eq!(deltas.len(), 1);
    }

    #[test]
    fn bigquery_table_change_extracts_table_kind() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "resourceName": "project/test-project/dataset/test-dataset",
                "metadata": {"tableChange": {"bindingDeltas": [
                    {"action": "ADD", "role": "roles/viewer", "member": "user:testuser@example.com"}
                ]}},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "bigquery_dataset", "labels": {"project_id": "test-project"}},
        });

        let Ok(ChangeSummary::BigQueryPolicy { resource_kind, .. }) =
            ChangeSummary::from_log_entry(&log)
        else {
            panic!("expected a bigquery policy summary");
        };
        assert_eq!(resource_kind, BigQueryResourceKind::Table);
    }

    #[test]
    fn bigquery_log_without_change_metadata_is_rejected() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "resourceName": "project/test-project/resource/test-resource",
                "metadata": {},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "bigquery_dataset", "labels": {"project_id": "test-project"}},
        });

        let result = ChangeSummary::from_log_entry(&log);
        let Err(error) = result else {
            panic!("expected extraction to fail");
        };
        assert!(error.to_string().contains("unknown bigquery resource type"));
    }

    #[test]
    fn generic_resource_extracts_policy_snapshot() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "request": {"policy": {"bindings": [
                    {"role": "roles/test", "members": ["user:test@example.com"]}
                ]}},
                "resourceName": "project/test-project/resource/test-resource",
            },
            "insertId": "test-insert-id",
            "resource": {"type": "test_resource", "labels": {"project_id": "test-project"}},
        });

        let summary = ChangeSummary::from_log_entry(&log);
        let expected = ChangeSummary::GenericResource {
            project_id: "test-project".to_owned(),
            changed_by: "test@example.com".to_owned(),
            insert_id: "test-insert-id".to_owned(),
            resource_type: "test_resource".to_owned(),
            resource_name: "project/test-project/resource/test-resource".to_owned(),
            bindings: vec![PolicyBinding {
                role: "roles/test".to_owned(),
                members: vec!["user:test@example.com".to_owned()],
            }],
        };
        assert!(matches!(summary, Ok(ref found) if *found == expected));
    }

    #[test]
    fn generic_resource_preserves_binding_order() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "request": {"policy": {"bindings": [
                    {"role": "roles/owner", "members": ["user:a@example.com", "user:b@example.com"]},
                    {"role": "roles/viewer", "members": ["user:c@example.com"]}
                ]}},
                "resourceName": "project/test-project/resource/test-resource",
            },
            "insertId": "test-insert-id",
            "resource": {"type": "gcs_bucket", "labels": {"project_id": "test-project"}},
        });

        let Ok(ChangeSummary::GenericResource { bindings, .. }) =
            ChangeSummary::from_log_entry(&log)
        else {
            panic!("expected a generic resource summary");
        };
        assert_eq!(bindings[0].role, "roles/owner");
        assert_eq!(
            bindings[0].members,
            vec!["user:a@example.com", "user:b@example.com"]
        );
        assert_eq!(bindings[1].role, "roles/viewer");
    }

    #[test]
    fn missing_principal_email_is_rejected() {
        let log = json!({
            "protoPayload": {},
            "insertId": "test-insert-id",
            "resource": {"type": "project", "labels": {"project_id": "test-project"}},
        });

        let result = ChangeSummary::from_log_entry(&log);
        let Err(error) = result else {
            panic!("expected extraction to fail");
        };
        assert!(error.to_string().contains("principalEmail"));
    }

    #[test]
    fn missing_delta_list_is_rejected() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "project", "labels": {"project_id": "test-project"}},
        });

        assert!(ChangeSummary::from_log_entry(&log).is_err());
    }

    #[test]
    fn delta_entry_missing_member_is_rejected() {
        let log = json!({
            "protoPayload": {
                "authenticationInfo": {"principalEmail": "test@example.com"},
                "serviceData": {"policyDelta": {"bindingDeltas": [
                    {"action": "ADD", "role": "roles/viewer"}
                ]}},
            },
            "insertId": "test-insert-id",
            "resource": {"type": "project", "labels": {"project_id": "test-project"}},
        });

        let result = ChangeSummary::from_log_entry(&log);
        let Err(error) = result else {
            panic!("expected extraction to fail");
        };
        assert!(error.to_string().contains("member"));
    }
}
