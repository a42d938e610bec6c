// Widget view models - what each rendering strategy lays out
use crate::application::field_explorer::find_first_array;
use crate::application::value_accessor::get_value;
use crate::application::value_formatter::{format_value, to_date, to_display_string, to_number};
use crate::domain::field::{FieldDescriptor, FieldType};
use crate::domain::widget::{DisplayMode, Widget, WidgetType};
use serde::Serialize;
use serde_json::Value;

pub const ROWS_PER_PAGE: usize = 10;

const CHART_ARRAY_KEYS: [&str; 5] = ["data", "values", "series", "items", "results"];
const CHART_PALETTE: [&str; 6] = ["#10b981", "#3b82f6", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899"];

const NO_TABLE_DATA: &str = "No table data available. Make sure the API returns an array.";
const NO_CHART_DATA: &str = "No chart data available. Make sure the API returns an array of data points.";
const NO_NUMERIC_FIELDS: &str = "No numeric fields selected for chart";

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub search: Option<String>,
    /// 1-based page number for table views.
    pub page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetView {
    Card {
        fields: Vec<CardField>,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
        page: usize,
        total_pages: usize,
        total_rows: usize,
    },
    Chart {
        labels: Vec<String>,
        datasets: Vec<Dataset>,
    },
    Message {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardField {
    pub key: String,
    pub label: String,
    pub value: Value,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub color: &'static str,
}

/// Build the view for `widget` from a fetched payload.
pub fn render(widget: &Widget, payload: &Value, options: &ViewOptions) -> WidgetView {
    let mode = widget.display_mode.unwrap_or(match widget.widget_type {
        WidgetType::FinanceCard => DisplayMode::Card,
        WidgetType::Table => DisplayMode::Table,
        WidgetType::Chart | WidgetType::ChartJs => DisplayMode::Chart,
    });

    match mode {
        DisplayMode::Card => render_card(&widget.fields, payload),
        DisplayMode::Table => render_table(&widget.fields, payload, options),
        DisplayMode::Chart => render_chart(&widget.fields, payload),
    }
}

fn render_card(fields: &[FieldDescriptor], payload: &Value) -> WidgetView {
    let fields = fields
        .iter()
        .map(|field| {
            let value = get_value(payload, &field.path);
            CardField {
                key: field.key.clone(),
                label: field.label.clone(),
                value: value.cloned().unwrap_or(Value::Null),
                formatted: format_value(value, field.field_type),
            }
        })
        .collect();
    WidgetView::Card { fields }
}

fn render_table(fields: &[FieldDescriptor], payload: &Value, options: &ViewOptions) -> WidgetView {
    let Some(rows) = find_first_array(payload).filter(|rows| !rows.is_empty()) else {
        return message(NO_TABLE_DATA);
    };

    let query = options
        .search
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();
    let matching: Vec<&Value> = rows
        .iter()
        .filter(|row| {
            query.is_empty()
                || fields.iter().any(|field| {
                    get_value(*row, &field.path)
                        .map(to_display_string)
                        .is_some_and(|text| text.to_lowercase().contains(&query))
                })
        })
        .collect();

    let total_rows = matching.len();
    let total_pages = total_rows.div_ceil(ROWS_PER_PAGE);
    let page = options.page.unwrap_or(1).clamp(1, total_pages.max(1));

    let rows = matching
        .into_iter()
        .skip((page - 1) * ROWS_PER_PAGE)
        .take(ROWS_PER_PAGE)
        .map(|row| {
            fields
                .iter()
                .map(|field| format_value(get_value(row, &field.path), field.field_type))
                .collect()
        })
        .collect();

    WidgetView::Table {
        columns: fields
            .iter()
            .map(|field| Column {
                key: field.key.clone(),
                label: field.label.clone(),
            })
            .collect(),
        rows,
        page,
        total_pages,
        total_rows,
    }
}

fn chart_points(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => CHART_ARRAY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .or_else(|| find_first_array(payload)),
        _ => None,
    }
}

fn render_chart(fields: &[FieldDescriptor], payload: &Value) -> WidgetView {
    let Some(points) = chart_points(payload).filter(|points| !points.is_empty()) else {
        return message(NO_CHART_DATA);
    };

    let value_fields: Vec<&FieldDescriptor> = fields
        .iter()
        .filter(|field| field.field_type == Some(FieldType::Number) || !field.key_mentions_time())
        .collect();
    if value_fields.is_empty() {
        return message(NO_NUMERIC_FIELDS);
    }

    let label_field = fields.iter().find(|field| field.is_temporal());
    let labels = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            label_field
                .and_then(|field| get_value(point, &field.path))
                .and_then(to_date)
                .map(|date| date.format("%-m/%-d/%Y").to_string())
                .unwrap_or_else(|| (index + 1).to_string())
        })
        .collect();

    let datasets = value_fields
        .iter()
        .enumerate()
        .map(|(index, field)| Dataset {
            label: field.label.clone(),
            data: points
                .iter()
                .map(|point| {
                    let n = get_value(point, &field.path).map(to_number).unwrap_or(f64::NAN);
                    if n.is_finite() { n } else { 0.0 }
                })
                .collect(),
            color: CHART_PALETTE[index % CHART_PALETTE.len()],
        })
        .collect();

    WidgetView::Chart { labels, datasets }
}

fn message(text: &str) -> WidgetView {
    WidgetView::Message {
        message: text.to_string(),
    }
}
