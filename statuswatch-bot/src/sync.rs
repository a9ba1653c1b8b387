//! Channel sync driver
//!
//! Runs the purge -> publish -> relabel cycle against the destination
//! channel after every registry mutation. The cycle is best-effort: failing
//! to resolve the channel aborts the whole cycle, individual message
//! deletions, publishes, and crossposts are swallowed, and nothing here ever
//! propagates back to the mutation that triggered it. A failed cycle is
//! retried de facto by the next mutation's cycle.

use std::sync::Arc;

use statuswatch_core::client::{ChannelKind, ChatClient};
use statuswatch_core::config::Config;
use statuswatch_core::report::{build_report_blocks, global_severity};
use statuswatch_core::service::Service;
use statuswatch_core::store::StoreEvent;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::embeds::EmbedStyle;

/// How many prior messages are scanned when purging bot-authored reports
const PURGE_WINDOW: usize = 100;

/// Drives full channel refresh cycles from store snapshots
pub struct ChannelSync {
    client: Arc<dyn ChatClient>,
    config: Arc<Config>,
    style: EmbedStyle,
}

impl ChannelSync {
    pub fn new(client: Arc<dyn ChatClient>, config: Arc<Config>, style: EmbedStyle) -> Self {
        Self {
            client,
            config,
            style,
        }
    }

    /// Consume store snapshots until the store goes away
    pub async fn run(self, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Refreshed { services }) => self.refresh(&services).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Snapshots are full-state, so only the newest matters
                    warn!(skipped, "channel sync lagging behind store events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// One full purge -> publish -> relabel cycle
    pub async fn refresh(&self, services: &[Service]) {
        let channel_id = &self.config.status.status_channel_id;
        let channel = match self.client.resolve_channel(channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(channel_id = %channel_id, error = %e, "cannot resolve status channel, skipping cycle");
                return;
            }
        };

        // Purge prior bot-authored reports. Losing the history listing kills
        // the cycle; losing a single delete does not.
        let history = match self.client.recent_messages(&channel, PURGE_WINDOW).await {
            Ok(history) => history,
            Err(e) => {
                error!(error = %e, "cannot fetch status channel history, skipping cycle");
                return;
            }
        };
        for message in history.iter().filter(|m| m.from_me) {
            if let Err(e) = self.client.delete_message(&channel, &message.id).await {
                debug!(message_id = %message.id, error = %e, "failed to delete old report");
            }
        }

        // Publish one embed per top-level service, in order
        for block in build_report_blocks(services) {
            let embed = self.style.report(&block);
            match self.client.send_embed(&channel, embed).await {
                Ok(message_id) => {
                    if channel.kind == ChannelKind::Announcement {
                        if let Err(e) = self.client.crosspost(&channel, &message_id).await {
                            debug!(message_id = %message_id, error = %e, "crosspost failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(title = %block.title, error = %e, "failed to publish report block");
                }
            }
        }

        // Exactly one relabel per cycle
        let severity = global_severity(services);
        let name = self.config.channel_name_for(severity);
        if let Err(e) = self.client.rename_channel(&channel, name).await {
            warn!(name, error = %e, "failed to relabel status channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use statuswatch_core::config::{Config, DEFAULT_CONFIG};
    use statuswatch_core::store::StatusStore;

    use crate::fake::InMemoryChat;

    const CHANNEL: &str = "0000000000000000000";

    fn svc(id: &str, status: &str, parent: Option<&str>) -> Service {
        Service::new(
            id.to_uppercase(),
            id,
            status,
            "",
            format!("{id} description"),
            parent.map(|p| p.to_string()),
        )
    }

    fn fixture(kind: ChannelKind) -> (Arc<InMemoryChat>, ChannelSync) {
        let client = Arc::new(InMemoryChat::new());
        client.add_channel(CHANNEL, kind);
        let config = Arc::new(Config::from_str(DEFAULT_CONFIG).unwrap());
        let style = EmbedStyle::from_config(&config.embeds, "test");
        let sync = ChannelSync::new(client.clone(), config, style);
        (client, sync)
    }

    #[tokio::test]
    async fn test_cycle_purges_only_bot_messages() {
        let (client, sync) = fixture(ChannelKind::Text);
        let bot_msg = client.seed_message(CHANNEL, true);
        let user_msg = client.seed_message(CHANNEL, false);

        sync.refresh(&[svc("api", "🟢 Operational", None)]).await;

        let remaining = client.messages(CHANNEL);
        assert!(remaining.iter().all(|m| m.id != bot_msg));
        assert!(remaining.iter().any(|m| m.id == user_msg));
        // and the new report was published
        assert_eq!(client.embeds(CHANNEL).len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_publishes_one_embed_per_parent_in_order() {
        let (client, sync) = fixture(ChannelKind::Text);

        sync.refresh(&[
            svc("api", "🟢 Operational", None),
            svc("db", "🔴 Major Outage", Some("api")),
            svc("web", "🟢 Operational", None),
        ])
        .await;

        let embeds = client.embeds(CHANNEL);
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0].title.as_deref(), Some("Service Status - API"));
        assert_eq!(embeds[1].title.as_deref(), Some("Service Status - WEB"));
    }

    #[tokio::test]
    async fn test_cycle_relabels_once_with_severity_label() {
        let (client, sync) = fixture(ChannelKind::Text);

        sync.refresh(&[svc("api", "🔴 Major Outage", None)]).await;
        assert_eq!(client.channel_name(CHANNEL), "「🔴」status");
        assert_eq!(client.rename_count(CHANNEL), 1);

        sync.refresh(&[svc("api", "🔵 Maintenance", None)]).await;
        assert_eq!(client.channel_name(CHANNEL), "「🔵」status");
        assert_eq!(client.rename_count(CHANNEL), 2);
    }

    #[tokio::test]
    async fn test_all_operational_relabels_to_partial_fallback() {
        let (client, sync) = fixture(ChannelKind::Text);
        sync.refresh(&[svc("api", "🟢 Operational", None)]).await;
        assert_eq!(client.channel_name(CHANNEL), "「🟡」status");
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let (client, sync) = fixture(ChannelKind::Text);
        let stuck = client.seed_message(CHANNEL, true);
        client.fail_delete_of(&stuck);

        sync.refresh(&[svc("api", "🟢 Operational", None)]).await;

        // Cycle still published and relabeled
        assert_eq!(client.embeds(CHANNEL).len(), 1);
        assert_eq!(client.rename_count(CHANNEL), 1);
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed_and_relabel_still_runs() {
        let (client, sync) = fixture(ChannelKind::Text);
        client.set_fail_send(true);

        sync.refresh(&[svc("api", "🔴 Major Outage", None)]).await;

        assert!(client.embeds(CHANNEL).is_empty());
        assert_eq!(client.channel_name(CHANNEL), "「🔴」status");
    }

    #[tokio::test]
    async fn test_resolve_failure_aborts_cycle() {
        let (client, sync) = fixture(ChannelKind::Text);
        client.set_fail_resolve(true);

        sync.refresh(&[svc("api", "🔴 Major Outage", None)]).await;

        client.set_fail_resolve(false);
        assert!(client.embeds(CHANNEL).is_empty());
        assert_eq!(client.rename_count(CHANNEL), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_publish() {
        let (client, sync) = fixture(ChannelKind::Text);
        client.set_fail_fetch(true);

        sync.refresh(&[svc("api", "🟢 Operational", None)]).await;

        assert!(client.embeds(CHANNEL).is_empty());
        assert_eq!(client.rename_count(CHANNEL), 0);
    }

    #[tokio::test]
    async fn test_announcement_channel_crossposts_each_report() {
        let (client, sync) = fixture(ChannelKind::Announcement);

        sync.refresh(&[
            svc("api", "🟢 Operational", None),
            svc("web", "🟢 Operational", None),
        ])
        .await;

        assert_eq!(client.crossposted(CHANNEL).len(), 2);
    }

    #[tokio::test]
    async fn test_text_channel_never_crossposts() {
        let (client, sync) = fixture(ChannelKind::Text);
        sync.refresh(&[svc("api", "🟢 Operational", None)]).await;
        assert!(client.crossposted(CHANNEL).is_empty());
    }

    #[tokio::test]
    async fn test_store_mutation_drives_cycle_through_broadcast() {
        let (client, sync) = fixture(ChannelKind::Text);

        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path().join("status.json")).unwrap();
        let events = store.subscribe();
        let handle = tokio::spawn(sync.run(events));

        store.add(svc("api", "🔴 Major Outage", None)).await.unwrap();

        // The cycle runs outside the mutation path; poll for its effects
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if client.rename_count(CHANNEL) > 0 {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "cycle never ran");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(client.embeds(CHANNEL).len(), 1);
        assert_eq!(client.channel_name(CHANNEL), "「🔴」status");

        drop(store);
        handle.await.unwrap();
    }
}
