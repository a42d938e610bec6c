// Dashboard store - Widget CRUD, layout and theme with write-through persistence
use crate::application::key_value_store::KeyValueStore;
use crate::domain::dashboard::{DashboardError, DashboardState, Theme};
use crate::domain::widget::Widget;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const STORAGE_KEY: &str = "finboard-dashboard";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("widget already exists: {0}")]
    DuplicateWidget(String),

    #[error("widget not found: {0}")]
    WidgetNotFound(String),

    #[error("layout must list every widget exactly once")]
    InvalidLayout,

    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

pub struct DashboardStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<DashboardState>,
}

impl DashboardStore {
    /// Read persisted state once. Missing or unreadable state falls back to
    /// an empty light-themed dashboard.
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = match storage.get(STORAGE_KEY).await {
            Ok(Some(stored)) => match serde_json::from_str::<DashboardState>(&stored) {
                Ok(mut state) => {
                    if state.repair_layout() {
                        tracing::warn!("Repaired inconsistent widgets or layout in stored dashboard");
                    }
                    state
                }
                Err(e) => {
                    tracing::error!("Error parsing stored dashboard, starting empty: {}", e);
                    DashboardState::default()
                }
            },
            Ok(None) => DashboardState::default(),
            Err(e) => {
                tracing::error!("Error loading stored dashboard, starting empty: {:#}", e);
                DashboardState::default()
            }
        };

        tracing::info!("Loaded dashboard with {} widgets", state.widgets.len());
        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn widgets_in_order(&self) -> Vec<Widget> {
        let state = self.state.read().await;
        state.ordered_widgets().into_iter().cloned().collect()
    }

    pub async fn get_widget(&self, id: &str) -> Option<Widget> {
        self.state.read().await.widget(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.widget(id).is_some()
    }

    pub async fn add_widget(&self, widget: Widget) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.widget(&widget.id).is_some() {
            return Err(StoreError::DuplicateWidget(widget.id));
        }
        state.layout.push(widget.id.clone());
        state.widgets.push(widget);
        self.persist(&state).await;
        Ok(())
    }

    pub async fn remove_widget(&self, id: &str) -> Result<Widget, StoreError> {
        let mut state = self.state.write().await;
        let index = state
            .widgets
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| StoreError::WidgetNotFound(id.to_string()))?;
        let removed = state.widgets.remove(index);
        state.layout.retain(|entry| entry != id);
        self.persist(&state).await;
        Ok(removed)
    }

    /// Replace the widget with the same id.
    pub async fn update_widget(&self, widget: Widget) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let slot = state
            .widget_mut(&widget.id)
            .ok_or_else(|| StoreError::WidgetNotFound(widget.id.clone()))?;
        *slot = widget;
        self.persist(&state).await;
        Ok(())
    }

    /// Record a successful refresh. Returns false if the widget is gone.
    pub async fn record_success(&self, id: &str, timestamp_ms: i64) -> bool {
        let last_updated = chrono::DateTime::from_timestamp_millis(timestamp_ms)
            .unwrap_or_else(chrono::Utc::now)
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        self.modify_widget(id, |widget| {
            widget.last_updated = Some(last_updated);
            widget.error = None;
        })
        .await
    }

    /// Record a failed refresh. Returns false if the widget is gone.
    pub async fn record_failure(&self, id: &str, message: String) -> bool {
        self.modify_widget(id, |widget| widget.error = Some(message)).await
    }

    async fn modify_widget(&self, id: &str, apply: impl FnOnce(&mut Widget)) -> bool {
        let mut state = self.state.write().await;
        let Some(widget) = state.widget_mut(id) else {
            tracing::debug!("Discarding refresh result for removed widget {}", id);
            return false;
        };
        apply(widget);
        self.persist(&state).await;
        true
    }

    pub async fn reorder(&self, layout: Vec<String>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.is_permutation(&layout) {
            return Err(StoreError::InvalidLayout);
        }
        state.layout = layout;
        self.persist(&state).await;
        Ok(())
    }

    pub async fn toggle_theme(&self) -> Theme {
        let mut state = self.state.write().await;
        state.theme = state.theme.toggled();
        self.persist(&state).await;
        state.theme
    }

    pub async fn set_theme(&self, theme: Theme) {
        let mut state = self.state.write().await;
        state.theme = theme;
        self.persist(&state).await;
    }

    /// Replace the whole dashboard with an exported document. On error the
    /// current state is left untouched.
    pub async fn import(&self, document: &str) -> Result<DashboardState, StoreError> {
        let imported = DashboardState::from_json(document)?;
        let mut state = self.state.write().await;
        *state = imported.clone();
        self.persist(&state).await;
        tracing::info!("Imported dashboard with {} widgets", imported.widgets.len());
        Ok(imported)
    }

    pub async fn export(&self) -> Result<String, StoreError> {
        Ok(self.state.read().await.to_pretty_json()?)
    }

    async fn persist(&self, state: &DashboardState) {
        let encoded = match serde_json::to_string(state) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!("Error encoding dashboard: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(STORAGE_KEY, &encoded).await {
            tracing::error!("Error saving dashboard: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::WidgetType;
    use crate::infrastructure::memory_store::MemoryKeyValueStore;

    fn widget(id: &str) -> Widget {
        Widget::new(
            id.to_string(),
            format!("Widget {}", id),
            WidgetType::FinanceCard,
            format!("http://localhost/{}", id),
            10,
            vec![],
        )
    }

    async fn stored_state(storage: &MemoryKeyValueStore) -> DashboardState {
        let raw = storage.get(STORAGE_KEY).await.unwrap().expect("state persisted");
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_load_defaults_when_empty_or_corrupt() {
        let storage = Arc::new(MemoryKeyValueStore::default());
        let store = DashboardStore::load(storage.clone()).await;
        assert_eq!(store.snapshot().await, DashboardState::default());

        storage.set(STORAGE_KEY, "{broken").await.unwrap();
        let store = DashboardStore::load(storage).await;
        assert_eq!(store.snapshot().await, DashboardState::default());
    }

    #[tokio::test]
    async fn test_load_drops_widgets_with_repeated_ids() {
        let storage = Arc::new(MemoryKeyValueStore::default());
        let mut first = widget("a");
        first.name = "First".to_string();
        let stored = DashboardState {
            widgets: vec![first, widget("a"), widget("b")],
            layout: vec!["a".to_string()],
            theme: Theme::Light,
        };
        storage
            .set(STORAGE_KEY, &serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();

        let store = DashboardStore::load(storage).await;
        let state = store.snapshot().await;
        assert_eq!(state.widgets.len(), 2);
        assert_eq!(state.widgets[0].name, "First");
        assert_eq!(state.layout, vec!["a", "b"]);

        store.remove_widget("a").await.unwrap();
        let state = store.snapshot().await;
        assert_eq!(state.widgets.len(), 1);
        assert_eq!(state.layout, vec!["b"]);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let storage = Arc::new(MemoryKeyValueStore::default());
        let store = DashboardStore::load(storage.clone()).await;

        store.add_widget(widget("a")).await.unwrap();
        store.add_widget(widget("b")).await.unwrap();
        assert_eq!(stored_state(&storage).await.layout, vec!["a", "b"]);

        store.reorder(vec!["b".into(), "a".into()]).await.unwrap();
        assert_eq!(stored_state(&storage).await.layout, vec!["b", "a"]);

        assert_eq!(store.toggle_theme().await, Theme::Dark);
        assert_eq!(stored_state(&storage).await.theme, Theme::Dark);

        store.remove_widget("b").await.unwrap();
        let persisted = stored_state(&storage).await;
        assert_eq!(persisted.layout, vec!["a"]);
        assert_eq!(persisted.widgets.len(), 1);

        let reloaded = DashboardStore::load(storage).await;
        assert_eq!(reloaded.snapshot().await, persisted);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_id() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        store.add_widget(widget("a")).await.unwrap();
        assert!(matches!(
            store.add_widget(widget("a")).await,
            Err(StoreError::DuplicateWidget(_))
        ));
        assert_eq!(store.snapshot().await.layout, vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_and_remove_unknown_widget() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        assert!(matches!(
            store.update_widget(widget("ghost")).await,
            Err(StoreError::WidgetNotFound(_))
        ));
        assert!(matches!(
            store.remove_widget("ghost").await,
            Err(StoreError::WidgetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_requires_permutation() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        store.add_widget(widget("a")).await.unwrap();
        store.add_widget(widget("b")).await.unwrap();

        assert!(matches!(
            store.reorder(vec!["a".into()]).await,
            Err(StoreError::InvalidLayout)
        ));
        assert!(matches!(
            store.reorder(vec!["a".into(), "c".into()]).await,
            Err(StoreError::InvalidLayout)
        ));
        assert_eq!(store.snapshot().await.layout, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_refresh_results_update_widget() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        store.add_widget(widget("a")).await.unwrap();

        assert!(store.record_failure("a", "Network Error: Unable to reach the API".into()).await);
        let failed = store.get_widget("a").await.unwrap();
        assert_eq!(failed.error.as_deref(), Some("Network Error: Unable to reach the API"));

        assert!(store.record_success("a", 0).await);
        let refreshed = store.get_widget("a").await.unwrap();
        assert_eq!(refreshed.error, None);
        assert_eq!(refreshed.last_updated.as_deref(), Some("1970-01-01T00:00:00.000Z"));

        store.remove_widget("a").await.unwrap();
        assert!(!store.record_success("a", 0).await);
        assert!(!store.record_failure("a", "late".into()).await);
    }

    #[tokio::test]
    async fn test_import_failure_leaves_state_untouched() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        store.add_widget(widget("a")).await.unwrap();
        let before = store.snapshot().await;

        let err = store
            .import(r#"{"widgets":[],"layout":[],"theme":"purple"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Dashboard(DashboardError::Format(_))));
        assert_eq!(store.snapshot().await, before);

        let imported = store
            .import(r#"{"widgets":[],"layout":[],"theme":"dark"}"#)
            .await
            .unwrap();
        assert_eq!(imported.theme, Theme::Dark);
        assert!(store.snapshot().await.widgets.is_empty());
    }

    #[tokio::test]
    async fn test_export_is_importable() {
        let store = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        store.add_widget(widget("a")).await.unwrap();
        store.set_theme(Theme::Dark).await;

        let exported = store.export().await.unwrap();
        let other = DashboardStore::load(Arc::new(MemoryKeyValueStore::default())).await;
        other.import(&exported).await.unwrap();
        assert_eq!(other.snapshot().await, store.snapshot().await);
    }
}
