//! Service model for Statuswatch
//!
//! A Service is the core abstraction - a named unit of monitored functionality
//! with an operator-asserted status and an optional parent service used for
//! one level of report grouping.

use serde::{Deserialize, Serialize};

/// Unique identifier for a service
pub type ServiceId = String;

/// Fixed status vocabulary, ordered by severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    MajorOutage,
    PartialOutage,
    DegradedPerformance,
    Maintenance,
    Operational,
    Unknown,
}

impl StatusLevel {
    /// Classify a rendered status string by substring match.
    ///
    /// Status strings carry a marker glyph ("🔴 Major Outage"), so matching
    /// is on the label, not equality.
    pub fn classify(status: &str) -> Self {
        if status.contains("Major Outage") {
            StatusLevel::MajorOutage
        } else if status.contains("Partial Outage") {
            StatusLevel::PartialOutage
        } else if status.contains("Degraded Performance") {
            StatusLevel::DegradedPerformance
        } else if status.contains("Maintenance") {
            StatusLevel::Maintenance
        } else if status.contains("Operational") {
            StatusLevel::Operational
        } else {
            StatusLevel::Unknown
        }
    }

    /// Severity rank, higher is worse. Partial Outage and Degraded
    /// Performance share a rank. Unknown never outranks anything.
    pub fn rank(&self) -> u8 {
        match self {
            StatusLevel::MajorOutage => 4,
            StatusLevel::PartialOutage | StatusLevel::DegradedPerformance => 3,
            StatusLevel::Maintenance => 2,
            StatusLevel::Operational => 1,
            StatusLevel::Unknown => 0,
        }
    }

    /// Rendered status line for this level, with its marker glyph
    pub fn glyph_label(&self) -> &'static str {
        match self {
            StatusLevel::MajorOutage => "🔴 Major Outage",
            StatusLevel::PartialOutage => "🟡 Partial Outage",
            StatusLevel::DegradedPerformance => "🟡 Degraded Performance",
            StatusLevel::Maintenance => "🔵 Maintenance",
            StatusLevel::Operational => "🟢 Operational",
            StatusLevel::Unknown => "⚪ Unknown Status",
        }
    }
}

/// A monitored service and its current operator-asserted status.
///
/// Immutable value object; updates go through [`Service::with_updated_status`]
/// so concurrent readers never observe a half-written record. Identity and
/// equality are defined solely by `service_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Human-readable name
    pub display_name: String,

    /// Unique identifier, the registry key
    pub service_id: ServiceId,

    /// Rendered status line, e.g. "🟢 Operational"
    pub status: String,

    /// Shown only when non-empty, appended after the status line
    #[serde(default)]
    pub outage_description: String,

    /// Always-shown summary text
    pub description: String,

    /// Reference to another service's id, or None for a top-level service
    #[serde(default)]
    pub parent_id: Option<ServiceId>,
}

impl Service {
    pub fn new(
        display_name: impl Into<String>,
        service_id: impl Into<String>,
        status: impl Into<String>,
        outage_description: impl Into<String>,
        description: impl Into<String>,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            service_id: service_id.into(),
            status: status.into(),
            outage_description: outage_description.into(),
            description: description.into(),
            parent_id,
        }
    }

    /// True iff `parent_id` is present and non-blank after trimming
    pub fn has_parent(&self) -> bool {
        self.parent_id
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    /// New value sharing identity (`service_id`, `display_name`, `parent_id`)
    /// with the three mutable fields replaced
    pub fn with_updated_status(
        &self,
        new_status: impl Into<String>,
        new_description: impl Into<String>,
        new_outage_description: impl Into<String>,
    ) -> Self {
        Self {
            display_name: self.display_name.clone(),
            service_id: self.service_id.clone(),
            status: new_status.into(),
            outage_description: new_outage_description.into(),
            description: new_description.into(),
            parent_id: self.parent_id.clone(),
        }
    }

    /// Severity of this service's current status string
    pub fn level(&self) -> StatusLevel {
        StatusLevel::classify(&self.status)
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.service_id == other.service_id
    }
}

impl Eq for Service {}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(id: &str, parent: Option<&str>) -> Service {
        Service::new(
            id.to_uppercase(),
            id,
            "🟢 Operational",
            "",
            "desc",
            parent.map(|p| p.to_string()),
        )
    }

    #[test]
    fn test_has_parent_absent() {
        assert!(!svc("api", None).has_parent());
    }

    #[test]
    fn test_has_parent_blank_after_trim() {
        assert!(!svc("api", Some("   ")).has_parent());
        assert!(!svc("api", Some("")).has_parent());
    }

    #[test]
    fn test_has_parent_present() {
        assert!(svc("db", Some("api")).has_parent());
    }

    #[test]
    fn test_with_updated_status_keeps_identity() {
        let original = svc("db", Some("api"));
        let updated = original.with_updated_status("🔴 Major Outage", "new desc", "down hard");

        assert_eq!(updated.service_id, "db");
        assert_eq!(updated.display_name, "DB");
        assert_eq!(updated.parent_id.as_deref(), Some("api"));
        assert_eq!(updated.status, "🔴 Major Outage");
        assert_eq!(updated.description, "new desc");
        assert_eq!(updated.outage_description, "down hard");
    }

    #[test]
    fn test_equality_by_id_only() {
        let a = svc("api", None);
        let mut b = svc("api", Some("other"));
        b.status = "🔴 Major Outage".to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_classify_levels() {
        assert_eq!(
            StatusLevel::classify("🔴 Major Outage"),
            StatusLevel::MajorOutage
        );
        assert_eq!(
            StatusLevel::classify("🟡 Degraded Performance"),
            StatusLevel::DegradedPerformance
        );
        assert_eq!(StatusLevel::classify("whatever"), StatusLevel::Unknown);
    }

    #[test]
    fn test_rank_ordering() {
        assert!(StatusLevel::MajorOutage.rank() > StatusLevel::PartialOutage.rank());
        assert_eq!(
            StatusLevel::PartialOutage.rank(),
            StatusLevel::DegradedPerformance.rank()
        );
        assert!(StatusLevel::Maintenance.rank() > StatusLevel::Operational.rank());
        assert!(StatusLevel::Unknown.rank() < StatusLevel::Operational.rank());
    }

    #[test]
    fn test_wire_field_names() {
        let s = svc("db", Some("api"));
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("serviceId").is_some());
        assert!(json.get("outageDescription").is_some());
        assert_eq!(json.get("parentId").unwrap(), "api");
    }
}
