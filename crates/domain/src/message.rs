//! Chat message rendering for permission-change summaries.

use crate::audit::{BindingDelta, ChangeSummary, PolicyBinding};

const LOG_VIEWER_BASE: &str = "https://console.cloud.google.com/logs/query";

impl ChangeSummary {
    /// Renders this summary as a Google Chat text message.
    ///
    /// The layout is compatibility-relevant and must stay stable: header,
    /// `Project:`/`Updated By:` lines, a variant-specific body, and a
    /// trailing deep link into the log viewer.
    #[must_use]
    pub fn to_chat_message(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        match self {
            Self::ProjectPolicy {
                project_id,
                changed_by,
                deltas,
                ..
            } => {
                lines.push("*Project Level Permissions Updated*".to_owned());
                lines.push(format!("Project: `{project_id}`"));
                lines.push(format!("Updated By: `{changed_by}`"));
                lines.push("\n*Changes:*".to_owned());
                push_delta_lines(&mut lines, deltas);
            }
            Self::BigQueryPolicy {
                project_id,
                changed_by,
                resource_name,
                resource_kind,
                deltas,
                ..
            } => {
                lines.push("*BigQuery Resource Level Permissions Updated*".to_owned());
                lines.push(format!("Project: `{project_id}`"));
                lines.push(format!("Updated By: `{changed_by}`"));
                lines.push(format!("Resource Type: `{}`", resource_kind.as_str()));
                lines.push(format!("Resource Name: `{resource_name}`"));
                lines.push("\n*Changes:*".to_owned());
                push_delta_lines(&mut lines, deltas);
            }
            Self::GenericResource {
                project_id,
                changed_by,
                resource_type,
                resource_name,
                bindings,
                ..
            } => {
                lines.push("*Resource Level Permissions Updated*".to_owned());
                lines.push(format!("Project: `{project_id}`"));
                lines.push(format!("Updated By: `{changed_by}`"));
                lines.push(format!("Resource Type: `{resource_type}`"));
                lines.push(format!("Resource Name: `{resource_name}`"));
                lines.push("\n*Latest Permissions After Update:*".to_owned());
                push_binding_lines(&mut lines, bindings);
            }
        }

        lines.push(format!("\n[View Log]({})", self.log_viewer_url()));

        lines.join("\n")
    }

    /// Deep link into the Cloud Logging viewer filtered to this entry.
    ///
    /// The query template carries its `=`, `"` and leading newline already
    /// percent-encoded; the entry id and project id are substituted verbatim.
    #[must_use]
    pub fn log_viewer_url(&self) -> String {
        format!(
            "{LOG_VIEWER_BASE};query=%0AinsertId%3D%22{}%22?project={}",
            self.insert_id(),
            self.project_id()
        )
    }
}

fn push_delta_lines(lines: &mut Vec<String>, deltas: &[BindingDelta]) {
    for delta in deltas {
        lines.push(format!("  - Action: `{}`", delta.action));
        lines.push(format!("  - Role: `{}`", delta.role));
        lines.push(format!("  - Members: `{}`", delta.member));
    }
}

fn push_binding_lines(lines: &mut Vec<String>, bindings: &[PolicyBinding]) {
    for binding in bindings {
        lines.push(format!("  - Role: `{}`", binding.role));
        lines.push(format!("  - Members: `{}`", binding.members.join(", ")));
    }
}
