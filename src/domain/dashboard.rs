// Dashboard domain model
use super::widget::Widget;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Failed to parse dashboard configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid dashboard configuration format: {0}")]
    Format(String),
}

/// The single unit of persisted application state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub widgets: Vec<Widget>,
    /// Widget ids in render order.
    pub layout: Vec<String>,
    pub theme: Theme,
}

impl DashboardState {
    /// Parse and validate an exported dashboard document.
    ///
    /// `widgets` and `layout` must be arrays and `theme` must be `light` or
    /// `dark`. The returned state always satisfies the layout invariant.
    pub fn from_json(document: &str) -> Result<Self, DashboardError> {
        let parsed: Value = serde_json::from_str(document)?;
        let Value::Object(root) = parsed else {
            return Err(DashboardError::Format("document must be an object".to_string()));
        };

        let widgets = match root.get("widgets") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(DashboardError::Format("`widgets` must be an array".to_string())),
        };
        let layout = match root.get("layout") {
            Some(Value::Array(ids)) => ids
                .iter()
                .map(|id| {
                    id.as_str().map(str::to_string).ok_or_else(|| {
                        DashboardError::Format("`layout` must contain widget ids".to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(DashboardError::Format("`layout` must be an array".to_string())),
        };
        let theme = root
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::parse)
            .ok_or_else(|| {
                DashboardError::Format("`theme` must be \"light\" or \"dark\"".to_string())
            })?;

        let widgets = widgets
            .into_iter()
            .map(serde_json::from_value::<Widget>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DashboardError::Format(format!("invalid widget: {}", e)))?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = widgets.iter().find(|w| !seen.insert(w.id.as_str())) {
            return Err(DashboardError::Format(format!(
                "duplicate widget id: {}",
                duplicate.id
            )));
        }

        let mut state = Self {
            widgets,
            layout,
            theme,
        };
        state.repair_layout();
        Ok(state)
    }

    pub fn to_pretty_json(&self) -> Result<String, DashboardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Make `layout` a permutation of the widget ids: widgets sharing an id
    /// keep only the first, unknown and repeated layout ids are dropped,
    /// widgets missing from the layout are appended.
    /// Returns true when anything changed.
    pub fn repair_layout(&mut self) -> bool {
        let before = self.widgets.len();
        let mut ids = HashSet::new();
        self.widgets.retain(|w| ids.insert(w.id.clone()));
        let deduped = self.widgets.len() != before;

        let known: HashSet<&str> = self.widgets.iter().map(|w| w.id.as_str()).collect();
        let mut placed = HashSet::new();
        let mut layout: Vec<String> = self
            .layout
            .iter()
            .filter(|id| known.contains(id.as_str()) && placed.insert(id.as_str()))
            .cloned()
            .collect();

        for widget in &self.widgets {
            if !placed.contains(widget.id.as_str()) {
                layout.push(widget.id.clone());
            }
        }

        let changed = deduped || layout != self.layout;
        self.layout = layout;
        changed
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    /// Widgets in render order.
    pub fn ordered_widgets(&self) -> Vec<&Widget> {
        self.layout.iter().filter_map(|id| self.widget(id)).collect()
    }

    /// True when `layout` names every widget exactly once.
    pub fn is_permutation(&self, layout: &[String]) -> bool {
        if layout.len() != self.widgets.len() {
            return false;
        }
        let mut seen = HashSet::new();
        layout
            .iter()
            .all(|id| self.widget(id).is_some() && seen.insert(id.as_str()))
    }
}
