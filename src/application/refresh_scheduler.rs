// Refresh scheduler - One polling task per widget
use crate::application::dashboard_store::DashboardStore;
use crate::application::data_source::FetchError;
use crate::application::response_cache::{ApiResponse, ResponseCache};
use crate::domain::widget::Widget;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fetch a widget's data through the cache and record the outcome on the
/// widget. Outcomes for widgets removed meanwhile are discarded.
pub async fn refresh_widget(
    cache: &ResponseCache,
    store: &DashboardStore,
    widget: &Widget,
    ttl_ms: u64,
) -> Result<ApiResponse, FetchError> {
    match cache.fetch(&widget.api_url, ttl_ms).await {
        Ok(response) => {
            store.record_success(&widget.id, response.timestamp).await;
            Ok(response)
        }
        Err(e) => {
            tracing::warn!("Error refreshing widget {}: {}", widget.id, e);
            store.record_failure(&widget.id, e.to_string()).await;
            Err(e)
        }
    }
}

struct ScheduledRefresh {
    api_url: String,
    interval_secs: u64,
    handle: JoinHandle<()>,
}

pub struct RefreshScheduler {
    cache: Arc<ResponseCache>,
    store: Arc<DashboardStore>,
    tasks: Mutex<HashMap<String, ScheduledRefresh>>,
}

impl RefreshScheduler {
    pub fn new(cache: Arc<ResponseCache>, store: Arc<DashboardStore>) -> Self {
        Self {
            cache,
            store,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile running timers with the widgets currently in the store.
    ///
    /// Timers of removed widgets are aborted, timers whose URL or interval
    /// changed are restarted, and polling widgets without a timer get one.
    pub async fn sync(&self) {
        let widgets = self.store.widgets_in_order().await;
        let mut tasks = self.tasks.lock().await;

        let wanted: HashMap<&str, &Widget> = widgets
            .iter()
            .filter(|w| w.polls())
            .map(|w| (w.id.as_str(), w))
            .collect();

        tasks.retain(|id, task| {
            let keep = wanted.get(id.as_str()).is_some_and(|w| {
                w.api_url == task.api_url && w.refresh_interval_secs == task.interval_secs
            });
            if !keep {
                tracing::debug!("Cancelling refresh timer for widget {}", id);
                task.handle.abort();
            }
            keep
        });

        for widget in widgets.iter().filter(|w| w.polls()) {
            if tasks.contains_key(&widget.id) {
                continue;
            }
            tracing::debug!(
                "Starting refresh timer for widget {} every {}s",
                widget.id,
                widget.refresh_interval_secs
            );
            tasks.insert(
                widget.id.clone(),
                ScheduledRefresh {
                    api_url: widget.api_url.clone(),
                    interval_secs: widget.refresh_interval_secs,
                    handle: self.spawn_timer(widget),
                },
            );
        }
    }

    fn spawn_timer(&self, widget: &Widget) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let store = self.store.clone();
        let id = widget.id.clone();
        let period = Duration::from_secs(widget.refresh_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(widget) = store.get_widget(&id).await else {
                    break;
                };
                let _ = refresh_widget(&cache, &store, &widget, widget.cache_ttl_ms()).await;
            }
        })
    }

    /// Manual refresh, bypassing the freshness window.
    pub async fn refresh_now(&self, widget: &Widget) -> Result<ApiResponse, FetchError> {
        refresh_widget(&self.cache, &self.store, widget, 0).await
    }

    #[cfg(test)]
    pub async fn scheduled_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn shutdown(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock().await;
            tasks
                .drain()
                .map(|(_, task)| {
                    task.handle.abort();
                    task.handle
                })
                .collect()
        };
        // Wait for aborted timers to unwind before returning.
        futures::future::join_all(handles).await;
        tracing::info!("Stopped all refresh timers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::response_cache::test_support::{ManualClock, ScriptedSource};
    use crate::domain::widget::WidgetType;
    use crate::infrastructure::memory_store::MemoryKeyValueStore;
    use serde_json::json;
    use tokio::task::AbortHandle;

    fn widget(id: &str, interval: u64) -> Widget {
        Widget::new(
            id.to_string(),
            id.to_string(),
            WidgetType::FinanceCard,
            format!("http://api/{}", id),
            interval,
            vec![],
        )
    }

    async fn timer(scheduler: &RefreshScheduler, id: &str) -> Option<(String, u64, AbortHandle)> {
        scheduler.tasks.lock().await.get(id).map(|task| {
            (
                task.api_url.clone(),
                task.interval_secs,
                task.handle.abort_handle(),
            )
        })
    }

    async fn wait_finished(handle: &AbortHandle) -> bool {
        for _ in 0..50 {
            if handle.is_finished() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.is_finished()
    }

    async fn setup(source: Arc<ScriptedSource>) -> (Arc<DashboardStore>, RefreshScheduler) {
        let store = Arc::new(DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await);
        let cache = Arc::new(ResponseCache::new(source, Arc::new(ManualClock::default())));
        (store.clone(), RefreshScheduler::new(cache, store))
    }

    #[tokio::test]
    async fn test_sync_tracks_polling_widgets() {
        let (store, scheduler) = setup(Arc::new(ScriptedSource::new(json!({})))).await;
        store.add_widget(widget("a", 60)).await.unwrap();
        store.add_widget(widget("b", 0)).await.unwrap();
        store.add_widget(widget("c", 60)).await.unwrap();

        scheduler.sync().await;
        assert_eq!(scheduler.scheduled_ids().await, vec!["a", "c"]);

        store.remove_widget("a").await.unwrap();
        let mut c = store.get_widget("c").await.unwrap();
        c.refresh_interval_secs = 0;
        store.update_widget(c).await.unwrap();
        let mut b = store.get_widget("b").await.unwrap();
        b.refresh_interval_secs = 5;
        store.update_widget(b).await.unwrap();

        scheduler.sync().await;
        assert_eq!(scheduler.scheduled_ids().await, vec!["b"]);

        scheduler.shutdown().await;
        assert!(scheduler.scheduled_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_url_change_restarts_timer() {
        let (store, scheduler) = setup(Arc::new(ScriptedSource::new(json!({})))).await;
        store.add_widget(widget("a", 60)).await.unwrap();
        scheduler.sync().await;
        let (_, _, old) = timer(&scheduler, "a").await.unwrap();

        let mut a = store.get_widget("a").await.unwrap();
        a.api_url = "http://api/other".to_string();
        store.update_widget(a).await.unwrap();
        scheduler.sync().await;

        assert!(wait_finished(&old).await);
        let (url, interval, current) = timer(&scheduler, "a").await.unwrap();
        assert_eq!(url, "http://api/other");
        assert_eq!(interval, 60);
        assert!(!current.is_finished());
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_interval_change_restarts_timer() {
        let (store, scheduler) = setup(Arc::new(ScriptedSource::new(json!({})))).await;
        store.add_widget(widget("a", 60)).await.unwrap();
        scheduler.sync().await;
        let (_, _, old) = timer(&scheduler, "a").await.unwrap();

        let mut a = store.get_widget("a").await.unwrap();
        a.refresh_interval_secs = 30;
        store.update_widget(a).await.unwrap();
        scheduler.sync().await;

        assert!(wait_finished(&old).await);
        let (url, interval, current) = timer(&scheduler, "a").await.unwrap();
        assert_eq!(url, "http://api/a");
        assert_eq!(interval, 30);
        assert!(!current.is_finished());
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_unchanged_widget_keeps_timer() {
        let (store, scheduler) = setup(Arc::new(ScriptedSource::new(json!({})))).await;
        store.add_widget(widget("a", 60)).await.unwrap();
        scheduler.sync().await;
        let (_, _, first) = timer(&scheduler, "a").await.unwrap();

        scheduler.sync().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!first.is_finished());
        assert!(timer(&scheduler, "a").await.is_some());
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_timer_fetches_immediately_and_records_result() {
        let source = Arc::new(ScriptedSource::new(json!({"price": 1})));
        let (store, scheduler) = setup(source.clone()).await;
        store.add_widget(widget("a", 3600)).await.unwrap();

        scheduler.sync().await;
        for _ in 0..50 {
            if store.get_widget("a").await.unwrap().last_updated.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(source.calls(), 1);
        let refreshed = store.get_widget("a").await.unwrap();
        assert!(refreshed.last_updated.is_some());
        assert_eq!(refreshed.error, None);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_refresh_now_records_failure() {
        let source = Arc::new(ScriptedSource::new(json!({})));
        let (store, scheduler) = setup(source.clone()).await;
        store.add_widget(widget("a", 0)).await.unwrap();

        source.push(Err(FetchError::Network));
        let w = store.get_widget("a").await.unwrap();
        assert_eq!(scheduler.refresh_now(&w).await, Err(FetchError::Network));
        assert_eq!(
            store.get_widget("a").await.unwrap().error.as_deref(),
            Some("Network Error: Unable to reach the API")
        );

        scheduler.refresh_now(&w).await.unwrap();
        assert_eq!(store.get_widget("a").await.unwrap().error, None);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_result_for_removed_widget_is_discarded() {
        let source = Arc::new(ScriptedSource::new(json!({})));
        let (store, scheduler) = setup(source).await;
        let w = widget("gone", 0);

        assert!(scheduler.refresh_now(&w).await.is_ok());
        assert!(store.get_widget("gone").await.is_none());
        assert!(store.snapshot().await.widgets.is_empty());
    }
}
