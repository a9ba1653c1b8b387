//! Command dispatch for the status command surface
//!
//! Authorization and reply construction live here, never in the store: the
//! registry itself accepts whatever it is handed. Every mutating action that
//! succeeds has already triggered a channel refresh through the store's
//! broadcast by the time the reply embed is returned.

use std::sync::Arc;

use statuswatch_core::client::Embed;
use statuswatch_core::config::Config;
use statuswatch_core::report::render_service_list;
use statuswatch_core::service::{Service, StatusLevel};
use statuswatch_core::store::StatusStore;
use tracing::{error, info};

use crate::embeds::EmbedStyle;

/// Map a status choice keyword to its rendered status line
pub fn eval_status(keyword: &str) -> &'static str {
    match keyword {
        "operational" => StatusLevel::Operational.glyph_label(),
        "degraded" => StatusLevel::DegradedPerformance.glyph_label(),
        "partial_outage" => StatusLevel::PartialOutage.glyph_label(),
        "major_outage" => StatusLevel::MajorOutage.glyph_label(),
        "maintenance" => StatusLevel::Maintenance.glyph_label(),
        _ => StatusLevel::Unknown.glyph_label(),
    }
}

/// One parsed status subcommand
#[derive(Clone, Debug)]
pub enum CommandAction {
    Add {
        display_name: String,
        service_id: String,
        description: String,
        parent_id: Option<String>,
    },
    Update {
        service_id: String,
        /// Status choice keyword, e.g. "major_outage"
        status: String,
        /// None or empty retains the prior description
        description: Option<String>,
        /// None or empty retains the prior outage description
        outage_description: Option<String>,
        /// Explicitly clear the outage description
        clear_outage: bool,
    },
    Remove {
        service_id: String,
    },
    List,
}

/// A command invocation with the caller's role memberships attached
#[derive(Clone, Debug)]
pub struct CommandRequest {
    pub caller_id: String,
    pub caller_roles: Vec<String>,
    pub action: CommandAction,
}

/// Dispatches status commands against the registry
pub struct CommandHandler {
    store: Arc<StatusStore>,
    config: Arc<Config>,
    style: EmbedStyle,
}

impl CommandHandler {
    pub fn new(store: Arc<StatusStore>, config: Arc<Config>, style: EmbedStyle) -> Self {
        Self {
            store,
            config,
            style,
        }
    }

    fn authorized(&self, roles: &[String]) -> bool {
        roles
            .iter()
            .any(|r| self.config.bot.administrator_role_ids.contains(r))
    }

    /// Handle one request, returning the reply embed
    pub async fn handle(&self, request: CommandRequest) -> Embed {
        if !self.authorized(&request.caller_roles) {
            info!(caller = %request.caller_id, "rejected unauthorized status command");
            return self
                .style
                .simple_error("❌ You are not authorized to use this command.");
        }

        match request.action {
            CommandAction::Add {
                display_name,
                service_id,
                description,
                parent_id,
            } => self.add(display_name, service_id, description, parent_id).await,
            CommandAction::Update {
                service_id,
                status,
                description,
                outage_description,
                clear_outage,
            } => {
                self.update(service_id, status, description, outage_description, clear_outage)
                    .await
            }
            CommandAction::Remove { service_id } => self.remove(service_id).await,
            CommandAction::List => {
                let services = self.store.list().await;
                self.style
                    .default_embed("📋 Registered Services", render_service_list(&services))
            }
        }
    }

    async fn add(
        &self,
        display_name: String,
        service_id: String,
        description: String,
        parent_id: Option<String>,
    ) -> Embed {
        if let Some(parent) = parent_id.as_deref() {
            if self.store.get(parent).await.is_none() {
                return self.style.error(
                    "Error",
                    format!("Parent service with ID `{parent}` not found."),
                );
            }
        }

        let service = Service::new(
            display_name.clone(),
            service_id,
            StatusLevel::Operational.glyph_label(),
            "",
            description,
            parent_id.clone(),
        );

        match self.store.add(service).await {
            Ok(()) => self.style.success(
                "Service added successfully",
                match parent_id {
                    Some(parent) => {
                        format!("✅ Service added: {display_name} (child of `{parent}`)")
                    }
                    None => format!("✅ Service added: {display_name}"),
                },
            ),
            Err(e) => {
                error!(error = %e, "failed to persist service add");
                self.style.error("Error", e.to_string())
            }
        }
    }

    async fn update(
        &self,
        service_id: String,
        status: String,
        description: Option<String>,
        outage_description: Option<String>,
        clear_outage: bool,
    ) -> Embed {
        let Some(existing) = self.store.get(&service_id).await else {
            return self
                .style
                .error("Error", format!("Service with ID `{service_id}` not found."));
        };

        // An omitted or empty option keeps the prior record's text
        let description = match description.filter(|d| !d.is_empty()) {
            Some(d) => d,
            None => existing.description.clone(),
        };
        let outage_description = if clear_outage {
            String::new()
        } else {
            match outage_description.filter(|o| !o.is_empty()) {
                Some(o) => o,
                None => existing.outage_description.clone(),
            }
        };

        let status = eval_status(&status);
        match self
            .store
            .update(&service_id, status, &description, &outage_description)
            .await
        {
            Ok(()) => self.style.success(
                "Service updated successfully",
                format!("✅ Updated service `{service_id}`"),
            ),
            Err(e) => {
                error!(error = %e, "failed to persist service update");
                self.style.error("Error", e.to_string())
            }
        }
    }

    async fn remove(&self, service_id: String) -> Embed {
        match self.store.remove(&service_id).await {
            Ok(()) => self.style.success(
                "Service removed successfully",
                format!("🗑️ Removed service `{service_id}`"),
            ),
            Err(e) => {
                error!(error = %e, "failed to persist service removal");
                self.style.error("Error", e.to_string())
            }
        }
    }
}
