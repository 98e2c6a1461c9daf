//! The email sync workflow.
//!
//! Walks the selected folders of an authenticated mailbox session, extracts
//! one signal per relevant message, and folds each signal into the store
//! through the reconciliation engine. Folder-level failures are contained;
//! whatever merged before a hard failure stays merged — each order mutation
//! is its own unit.

use crate::extract::{extract_signal, is_relevant};
use crate::folders::{format_since_date, select_folders};
use crate::session::MailboxSession;
use chrono::{Duration, Utc};
use traccia_core::{AppConfig, Error, OrderFilter, OrderSignal, StoreDb, reconcile};

/// Header fetches are batched to bound round-trips.
const HEADER_CHUNK: usize = 100;

/// Aggregate outcome of one sync pass, reported to the user at the end.
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    /// Signals extracted from the mailbox.
    pub fetched: usize,
    /// Order rows written.
    pub applied: usize,
    /// Matches skipped because the message was already applied.
    pub skipped: usize,
    /// Status values dropped by the hierarchy gate.
    pub rejected_status: usize,
    /// Signals that matched no stored order and were dropped.
    pub unmatched: usize,
}

/// Drives fetch + reconcile against a mailbox session and the order store.
pub struct SyncEngine {
    config: AppConfig,
}

impl SyncEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Scan the mailbox and extract signals, without touching the store's
    /// order rows (the store is only read, for the folder selection).
    pub async fn fetch_updates(
        &self,
        session: &mut dyn MailboxSession,
        store: &StoreDb,
    ) -> Result<Vec<OrderSignal>, Error> {
        if !self.config.email_sync_enabled {
            tracing::info!("email sync disabled, nothing to do");
            return Ok(Vec::new());
        }

        let all_folders = match session.list_folders().await {
            Ok(folders) => folders,
            Err(e) => {
                tracing::warn!(error = %e, "folder listing failed, falling back to inbox only");
                vec!["INBOX".to_string()]
            }
        };

        let active_platforms = store.active_platforms().await?;
        tracing::info!(?active_platforms, "active platforms in store");

        let folders = select_folders(&all_folders, &active_platforms, self.config.max_folders);
        tracing::info!(?folders, "folders selected for scan");

        let since = Utc::now().date_naive() - Duration::days(self.config.scan_window_days as i64);
        let since_token = format_since_date(since);
        tracing::info!(since = %since_token, "scan window start");

        let mut signals = Vec::new();
        'folders: for folder in &folders {
            if let Err(e) = session.select(folder).await {
                tracing::error!(folder = %folder, error = %e, "folder select failed");
                // A dead connection won't recover on the next folder.
                let message = e.to_string().to_lowercase();
                if message.contains("closed") || message.contains("eof") {
                    break 'folders;
                }
                continue;
            }

            let ids = match session.search_since(&since_token).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::error!(folder = %folder, error = %e, "search failed");
                    continue;
                }
            };
            if ids.is_empty() {
                tracing::info!(folder = %folder, "no recent messages");
                continue;
            }

            let mut relevant = Vec::new();
            for chunk in ids.chunks(HEADER_CHUNK) {
                match session.fetch_headers(chunk).await {
                    Ok(headers) => {
                        relevant.extend(headers.into_iter().filter(|h| is_relevant(&h.subject, folder)));
                    }
                    Err(e) => {
                        tracing::error!(folder = %folder, error = %e, "header fetch failed");
                    }
                }
            }
            tracing::info!(folder = %folder, total = ids.len(), relevant = relevant.len(), "relevance filter applied");

            for header in relevant {
                match session.fetch_body(&header.id).await {
                    Ok(body) => signals.push(extract_signal(folder, &header, &body)),
                    Err(e) => {
                        tracing::error!(folder = %folder, id = %header.id, error = %e, "body fetch failed");
                    }
                }
            }
        }

        if let Err(e) = session.logout().await {
            tracing::warn!(error = %e, "logout failed");
        }

        Ok(signals)
    }

    /// Full sync: fetch signals and merge each into the store.
    pub async fn sync_with_store(
        &self,
        session: &mut dyn MailboxSession,
        store: &StoreDb,
    ) -> Result<SyncReport, Error> {
        let signals = self.fetch_updates(session, store).await?;
        let mut report = SyncReport { fetched: signals.len(), ..Default::default() };

        // One snapshot of the candidates, kept current with our own writes
        // so later signals in the same pass see them.
        let mut orders = store.list_orders(OrderFilter::active()).await?;

        for signal in &signals {
            tracing::info!(
                subject = %signal.subject,
                tracking = %signal.tracking_number,
                order_id = %signal.site_order_id,
                status = ?signal.status,
                "matching signal"
            );

            let merge = reconcile::apply_signal(signal, &orders, Utc::now());
            if merge.matched == 0 {
                report.unmatched += 1;
                continue;
            }
            report.skipped += merge.skipped;
            report.rejected_status += merge.rejected_status;

            for updated in merge.updated {
                if store.update_order(updated.id, &updated).await? {
                    report.applied += 1;
                    if let Some(slot) = orders.iter_mut().find(|o| o.id == updated.id) {
                        *slot = updated;
                    }
                }
            }
        }

        tracing::info!(
            fetched = report.fetched,
            applied = report.applied,
            skipped = report.skipped,
            rejected = report.rejected_status,
            unmatched = report.unmatched,
            "sync pass complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MessageHeader;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use traccia_core::{Order, Status};

    #[derive(Clone)]
    struct MockMessage {
        id: &'static str,
        subject: &'static str,
        body: &'static str,
    }

    struct MockSession {
        folders: Vec<String>,
        messages: HashMap<String, Vec<MockMessage>>,
        selected: Option<String>,
        last_since_token: Option<String>,
        logged_out: bool,
    }

    impl MockSession {
        fn new(folders: &[&str]) -> Self {
            Self {
                folders: folders.iter().map(|f| f.to_string()).collect(),
                messages: HashMap::new(),
                selected: None,
                last_since_token: None,
                logged_out: false,
            }
        }

        fn with_message(mut self, folder: &str, id: &'static str, subject: &'static str, body: &'static str) -> Self {
            self.messages
                .entry(folder.to_string())
                .or_default()
                .push(MockMessage { id, subject, body });
            self
        }

        fn current(&self) -> &[MockMessage] {
            self.selected
                .as_ref()
                .and_then(|f| self.messages.get(f))
                .map(|v| v.as_slice())
                .unwrap_or(&[])
        }
    }

    #[async_trait]
    impl MailboxSession for MockSession {
        async fn list_folders(&mut self) -> Result<Vec<String>, Error> {
            Ok(self.folders.clone())
        }

        async fn select(&mut self, folder: &str) -> Result<(), Error> {
            self.selected = Some(folder.to_string());
            Ok(())
        }

        async fn search_since(&mut self, since_token: &str) -> Result<Vec<String>, Error> {
            self.last_since_token = Some(since_token.to_string());
            Ok(self.current().iter().map(|m| m.id.to_string()).collect())
        }

        async fn fetch_headers(&mut self, ids: &[String]) -> Result<Vec<MessageHeader>, Error> {
            Ok(self
                .current()
                .iter()
                .filter(|m| ids.contains(&m.id.to_string()))
                .map(|m| MessageHeader {
                    id: m.id.to_string(),
                    subject: m.subject.to_string(),
                    date: "Mon, 9 Feb 2026 10:00:00 +0100".to_string(),
                })
                .collect())
        }

        async fn fetch_body(&mut self, id: &str) -> Result<String, Error> {
            self.current()
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.body.to_string())
                .ok_or_else(|| Error::Mailbox(format!("no such message: {id}")))
        }

        async fn logout(&mut self) -> Result<(), Error> {
            self.logged_out = true;
            Ok(())
        }
    }

    fn sync_config() -> AppConfig {
        AppConfig { email_sync_enabled: true, ..Default::default() }
    }

    async fn seeded_store() -> StoreDb {
        let store = StoreDb::open_in_memory().await.unwrap();
        let mut order = Order {
            order_date: "2026-01-20".to_string(),
            platform: "Amazon".to_string(),
            description: "Cuffie bluetooth over-ear".to_string(),
            quantity: 1,
            site_order_id: "407-1234567-1234567".to_string(),
            ..Default::default()
        };
        order.set_status(Status::Shipped);
        store.insert_order(&order).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sync_applies_delivery_email() {
        let store = seeded_store().await;
        let mut session = MockSession::new(&["INBOX"]).with_message(
            "INBOX",
            "1",
            "Il tuo ordine è stato consegnato",
            "Ordine 407-1234567-1234567 consegnato oggi. Grazie!",
        );

        let engine = SyncEngine::new(sync_config());
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.applied, 1);
        assert_eq!(report.unmatched, 0);
        assert!(session.logged_out);

        // The SINCE token always uses English month abbreviations.
        let token = session.last_since_token.as_deref().unwrap();
        let month = token.split('-').nth(1).unwrap();
        assert!(["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"].contains(&month));

        let orders = store.list_orders(OrderFilter::all()).await.unwrap();
        assert_eq!(orders[0].status, Status::Delivered);
        assert!(orders[0].is_delivered);
        assert_eq!(orders[0].last_email_id, "INBOX_1");
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let store = seeded_store().await;
        let engine = SyncEngine::new(sync_config());

        for _ in 0..2 {
            let mut session = MockSession::new(&["INBOX"]).with_message(
                "INBOX",
                "1",
                "Il tuo ordine è in transito",
                "Ordine 407-1234567-1234567 in transito verso di te.",
            );
            engine.sync_with_store(&mut session, &store).await.unwrap();
        }

        let mut session = MockSession::new(&["INBOX"]).with_message(
            "INBOX",
            "1",
            "Il tuo ordine è in transito",
            "Ordine 407-1234567-1234567 in transito verso di te.",
        );
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, 1);

        let orders = store.list_orders(OrderFilter::all()).await.unwrap();
        // One sync note only: re-applying the same message never duplicates it.
        let note_count = orders[0].notes.matches("Aggiornamento Email").count();
        assert_eq!(note_count, 1);
    }

    #[tokio::test]
    async fn test_stale_email_does_not_downgrade() {
        let store = seeded_store().await;
        store.mark_delivered(1, true).await.unwrap();

        let mut session = MockSession::new(&["INBOX"]).with_message(
            "INBOX",
            "9",
            "Il tuo ordine è stato spedito",
            "Ordine 407-1234567-1234567 spedito.",
        );

        let engine = SyncEngine::new(sync_config());
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();

        // Delivered orders leave the active candidate set, so the stale
        // email finds nothing to touch.
        assert_eq!(report.unmatched, 1);
        let orders = store.list_orders(OrderFilter::all()).await.unwrap();
        assert_eq!(orders[0].status, Status::Delivered);
    }

    #[tokio::test]
    async fn test_irrelevant_messages_not_fetched() {
        let store = seeded_store().await;
        let mut session = MockSession::new(&["INBOX"])
            .with_message("INBOX", "1", "Newsletter sconti primavera", "Tanti sconti!")
            .with_message("INBOX", "2", "La tua spedizione è partita", "Ordine 407-1234567-1234567 in viaggio");

        let engine = SyncEngine::new(sync_config());
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();
        assert_eq!(report.fetched, 1, "newsletter must be filtered at the header stage");
    }

    #[tokio::test]
    async fn test_unmatched_signal_dropped() {
        let store = seeded_store().await;
        let mut session = MockSession::new(&["INBOX"]).with_message(
            "INBOX",
            "1",
            "Ordine spedito",
            "Ordine 999-0000000-0000000 spedito oggi",
        );

        let engine = SyncEngine::new(sync_config());
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.applied, 0);
    }

    #[tokio::test]
    async fn test_sync_disabled_is_noop() {
        let store = seeded_store().await;
        let mut session = MockSession::new(&["INBOX"]).with_message(
            "INBOX",
            "1",
            "Il tuo ordine è stato consegnato",
            "Ordine 407-1234567-1234567 consegnato.",
        );

        let engine = SyncEngine::new(AppConfig::default());
        let report = engine.sync_with_store(&mut session, &store).await.unwrap();
        assert_eq!(report.fetched, 0);
        assert_eq!(report.applied, 0);
    }
}
