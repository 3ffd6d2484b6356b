//! Coordinating-side mirror of run progress.
//!
//! A spawned task subscribes to the event bus and keeps the summary slot in
//! the state store current, so status surfaces in other processes can answer
//! without touching a page session. The slot exists only while a run is
//! live: completion, export, and failure all remove it, which is exactly
//! what resume planning keys on.

use std::sync::Arc;

use revex_core::{ExtractionEvent, SessionSummary};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::error::StoreError;
use crate::store::{set_json, StateStore, SUMMARY_KEY};

/// Spawns the mirror task for `bus`, writing through `store`.
///
/// The subscription is taken before the task starts, so no event published
/// after this call can be missed.
pub fn spawn_mirror(bus: &EventBus, store: Arc<dyn StateStore>) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        let mut summary = SessionSummary::default();
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "mirror lagged behind the event bus");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if let Err(err) = apply(&mut summary, &event, store.as_ref()).await {
                warn!(error = %err, "failed to mirror run state");
            }
        }
        debug!("event bus closed, mirror stopping");
    })
}

async fn apply(
    summary: &mut SessionSummary,
    event: &ExtractionEvent,
    store: &dyn StateStore,
) -> Result<(), StoreError> {
    match event {
        ExtractionEvent::ExtractionStarted {
            total_reviews,
            total_pages,
            product,
            settings,
        } => {
            *summary = SessionSummary {
                is_extracting: true,
                total_reviews: *total_reviews,
                total_pages: *total_pages,
                current_page: 1,
                product_title: product.title.clone(),
                settings: Some(*settings),
            };
            set_json(store, SUMMARY_KEY, summary).await
        }
        ExtractionEvent::PageExtracted { page, .. } => {
            // Page events outside a mirrored run belong to manual
            // page-by-page extraction, which the summary slot does not track.
            if !summary.is_extracting {
                return Ok(());
            }
            summary.current_page = *page;
            set_json(store, SUMMARY_KEY, summary).await
        }
        ExtractionEvent::ExtractionComplete { .. }
        | ExtractionEvent::ExportComplete { .. }
        | ExtractionEvent::ExtractionError { .. } => {
            *summary = SessionSummary::default();
            store.remove(SUMMARY_KEY).await
        }
        ExtractionEvent::Progress { .. } | ExtractionEvent::NavigationComplete { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use revex_core::{ExtractionSettings, ProductInfo};

    use super::*;
    use crate::store::{get_json, MemoryStore};

    fn product() -> ProductInfo {
        ProductInfo::new(
            "Widget Max".to_string(),
            "B000TEST01".to_string(),
            "https://www.amazon.com/product-reviews/B000TEST01".to_string(),
            40,
        )
    }

    async fn slot(store: &MemoryStore) -> Option<SessionSummary> {
        get_json(store, SUMMARY_KEY).await.unwrap()
    }

    #[tokio::test]
    async fn mirror_tracks_a_run_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let _mirror = spawn_mirror(&bus, Arc::clone(&store) as Arc<dyn StateStore>);

        bus.publish(ExtractionEvent::ExtractionStarted {
            total_reviews: 40,
            total_pages: 4,
            product: product(),
            settings: ExtractionSettings::default(),
        });
        let mut written = None;
        for _ in 0..200 {
            written = slot(store.as_ref()).await;
            if written.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let summary = written.expect("summary slot written");
        assert!(summary.is_extracting);
        assert_eq!(summary.total_pages, 4);
        assert_eq!(summary.current_page, 1);
        assert_eq!(summary.product_title, "Widget Max");
        assert!(summary.settings.is_some());

        bus.publish(ExtractionEvent::PageExtracted {
            page: 2,
            found: 10,
            added: 10,
            total: 20,
        });
        let mut current = 0;
        for _ in 0..200 {
            if let Some(summary) = slot(store.as_ref()).await {
                current = summary.current_page;
                if current == 2 {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(current, 2);

        bus.publish(ExtractionEvent::ExtractionComplete {
            total_reviews: 40,
            total_pages: 4,
            extracted_pages: vec![1, 2, 3, 4],
            product: None,
        });
        let mut cleared = false;
        for _ in 0..200 {
            if slot(store.as_ref()).await.is_none() {
                cleared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(cleared);
    }

    #[tokio::test]
    async fn failure_clears_the_summary_slot() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let _mirror = spawn_mirror(&bus, Arc::clone(&store) as Arc<dyn StateStore>);

        bus.publish(ExtractionEvent::ExtractionStarted {
            total_reviews: 40,
            total_pages: 4,
            product: product(),
            settings: ExtractionSettings::default(),
        });
        let mut written = false;
        for _ in 0..200 {
            if slot(store.as_ref()).await.is_some() {
                written = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(written);

        bus.publish(ExtractionEvent::ExtractionError {
            message: "navigation lost".to_string(),
        });

        let mut cleared = false;
        for _ in 0..200 {
            if slot(store.as_ref()).await.is_none() {
                cleared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(cleared);
    }

    #[tokio::test]
    async fn page_event_without_a_run_does_not_create_a_slot() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let _mirror = spawn_mirror(&bus, Arc::clone(&store) as Arc<dyn StateStore>);

        bus.publish(ExtractionEvent::PageExtracted {
            page: 1,
            found: 10,
            added: 10,
            total: 10,
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(slot(store.as_ref()).await.is_none());
    }
}
