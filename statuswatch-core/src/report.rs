//! Aggregation and rendering engine
//!
//! Pure functions from the full service set to per-parent report blocks and
//! one global severity. No I/O, deterministic for a deterministic input
//! order.
//!
//! Two distinct traversals on purpose: channel reports group exactly one
//! level deep (parent plus direct children), while the `list` view recurses
//! arbitrarily far down `parent_id` chains.

use std::collections::BTreeMap;

use crate::service::{Service, StatusLevel};

/// Color class for a report block, mapped to concrete RGB by the embed layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockColor {
    /// Any Major Outage in the group
    Major,
    /// Any Partial Outage or Degraded Performance, no Major
    Partial,
    /// Maintenance only, renders in the default embed color
    Maintenance,
    /// Everything operational (or unrecognized)
    AllClear,
}

/// Channel-level severity derived from the whole service set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalSeverity {
    Major,
    Partial,
    Maintenance,
}

/// One rendered report, one per top-level service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportBlock {
    pub title: String,
    pub body: String,
    pub color: BlockColor,
}

fn status_line(service: &Service) -> String {
    if service.outage_description.is_empty() {
        format!("> {}", service.status)
    } else {
        format!("> {} - {}", service.status, service.outage_description)
    }
}

/// Worst-rank color across a parent and its direct children
fn block_color(parent: &Service, children: &[&Service]) -> BlockColor {
    let mut worst = parent.level();
    for child in children {
        if child.level().rank() > worst.rank() {
            worst = child.level();
        }
    }
    match worst {
        StatusLevel::MajorOutage => BlockColor::Major,
        StatusLevel::PartialOutage | StatusLevel::DegradedPerformance => BlockColor::Partial,
        StatusLevel::Maintenance => BlockColor::Maintenance,
        StatusLevel::Operational | StatusLevel::Unknown => BlockColor::AllClear,
    }
}

/// Split the set into top-level services and a parent -> children mapping.
///
/// A `parent_id` that does not resolve to a present service makes the
/// service top-level; the record stays visible instead of silently dropping
/// out of the report.
fn partition<'a>(services: &'a [Service]) -> (Vec<&'a Service>, BTreeMap<&'a str, Vec<&'a Service>>) {
    let mut parents = Vec::new();
    let mut children: BTreeMap<&str, Vec<&Service>> = BTreeMap::new();

    for service in services {
        let resolved_parent = service
            .parent_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .filter(|p| services.iter().any(|s| s.service_id == *p));

        match resolved_parent {
            Some(parent_id) => children.entry(parent_id).or_default().push(service),
            None => parents.push(service),
        }
    }

    (parents, children)
}

/// Build one report block per top-level service, in input order
pub fn build_report_blocks(services: &[Service]) -> Vec<ReportBlock> {
    let (parents, children_map) = partition(services);

    parents
        .into_iter()
        .map(|parent| {
            let children = children_map
                .get(parent.service_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut body = String::new();
            body.push_str(&format!("**{}**\n", parent.display_name));
            body.push_str(&format!("{}\n", parent.description));
            body.push_str(&format!("{}\n\n", status_line(parent)));

            if !children.is_empty() {
                body.push_str("**Sub-services:**\n");
                for child in children {
                    body.push_str(&format!(
                        "\n> **{}**\n> {}\n{}\n",
                        child.display_name,
                        child.description,
                        status_line(child)
                    ));
                }
            }

            ReportBlock {
                title: format!("Service Status - {}", parent.display_name),
                body,
                color: block_color(parent, children),
            }
        })
        .collect()
}

/// Single worst-status classification across all services.
///
/// Scans in strict precedence order: Major, then Partial, then Maintenance.
/// When none match the result is Partial, not Operational - the channel
/// label fails toward caution. Degraded Performance alone never raises the
/// global severity even though it colors its block.
pub fn global_severity(services: &[Service]) -> GlobalSeverity {
    if services
        .iter()
        .any(|s| s.level() == StatusLevel::MajorOutage)
    {
        return GlobalSeverity::Major;
    }
    if services
        .iter()
        .any(|s| s.level() == StatusLevel::PartialOutage)
    {
        return GlobalSeverity::Partial;
    }
    if services
        .iter()
        .any(|s| s.level() == StatusLevel::Maintenance)
    {
        return GlobalSeverity::Maintenance;
    }
    GlobalSeverity::Partial
}

/// Fully recursive hierarchical listing used by the `list` command.
///
/// Unlike the report blocks this honors arbitrary nesting depth. Shares
/// `partition` with the report builder, so an unresolvable `parent_id`
/// surfaces the service at top level here too.
pub fn render_service_list(services: &[Service]) -> String {
    if services.is_empty() {
        return "No services found.".to_string();
    }

    let (roots, children) = partition(services);

    let mut out = String::new();
    for root in roots {
        append_service(&mut out, root, &children, 0);
    }
    out
}

fn append_service(
    out: &mut String,
    service: &Service,
    children: &BTreeMap<&str, Vec<&Service>>,
    depth: usize,
) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{}• **{}** (**ID:** `{}` | **Status:** `{}`)\n{}  {}\n",
        indent,
        service.display_name,
        service.service_id,
        service.status,
        indent,
        service.description
    ));

    if let Some(direct) = children.get(service.service_id.as_str()) {
        for child in direct {
            append_service(out, child, children, depth + 1);
        }
    }
}
