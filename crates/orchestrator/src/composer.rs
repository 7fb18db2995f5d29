//! Dashboard composition: merge the succeeded partial results into the
//! final dossier.
//!
//! Composition is a pure function of its inputs. Panel order follows
//! registry order, never completion order, and a succeeded task whose
//! payload defeats extraction still gets a raw fallback panel.

use std::collections::BTreeMap;

use serde_json::Value;

use dossier_core::{
    CompanyRecord, CompanySummary, ComponentData, ComponentKind, DashboardComponent, Dossier,
    ListItem, PersonEntry, SizeClass, StatFigure, TaskDefinition, TaskId, TextPayload, REGISTRY,
};

pub fn compose(
    subject: &str,
    company: Option<&CompanyRecord>,
    results: &BTreeMap<TaskId, Value>,
) -> Dossier {
    let summary = company
        .map(CompanyRecord::summary)
        .unwrap_or_else(|| CompanySummary::from_subject(subject));

    let components = REGISTRY
        .list()
        .iter()
        .filter_map(|def| results.get(&def.id).map(|value| shape_component(def, value)))
        .collect();

    Dossier {
        company: summary,
        components,
    }
}

fn shape_component(def: &TaskDefinition, value: &Value) -> DashboardComponent {
    let shaped = match def.id {
        TaskId::CompanyOverview => shape_overview(value),
        TaskId::KeyPeople => shape_people(value),
        TaskId::MarketSizing => shape_market(value),
        TaskId::CompetitorLandscape => shape_competitors(value),
        TaskId::GrowthMetrics => shape_growth(value),
    };

    match shaped {
        Some(data) => DashboardComponent {
            id: format!("panel-{}", def.id),
            title: def.label.to_string(),
            kind: def.shape,
            size: size_for(def.id),
            data,
        },
        // The task succeeded; keep its payload visible even when it
        // cannot be shaped.
        None => DashboardComponent {
            id: format!("panel-{}", def.id),
            title: def.label.to_string(),
            kind: ComponentKind::Raw,
            size: SizeClass::Small,
            data: ComponentData::Raw(value.clone()),
        },
    }
}

fn size_for(task: TaskId) -> SizeClass {
    match task {
        TaskId::CompanyOverview => SizeClass::Large,
        TaskId::KeyPeople => SizeClass::Medium,
        TaskId::MarketSizing => SizeClass::Medium,
        TaskId::CompetitorLandscape => SizeClass::Medium,
        TaskId::GrowthMetrics => SizeClass::Large,
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn shape_overview(value: &Value) -> Option<ComponentData> {
    let description = str_field(value, "description")?;

    let mut paragraphs = vec![description];

    match (str_field(value, "headquarters"), value.get("founded_year").and_then(Value::as_i64)) {
        (Some(hq), Some(year)) => paragraphs.push(format!("Founded in {year}, headquartered in {hq}.")),
        (Some(hq), None) => paragraphs.push(format!("Headquartered in {hq}.")),
        (None, Some(year)) => paragraphs.push(format!("Founded in {year}.")),
        (None, None) => {}
    }

    if let Some(model) = str_field(value, "business_model") {
        let revenue = str_field(value, "revenue_model");
        paragraphs.push(match revenue {
            Some(revenue) => format!("Business model: {model} ({revenue})."),
            None => format!("Business model: {model}."),
        });
    }

    Some(ComponentData::Text(TextPayload {
        headline: str_field(value, "tagline").or_else(|| str_field(value, "name")),
        paragraphs,
    }))
}

fn shape_people(value: &Value) -> Option<ComponentData> {
    let people: Vec<PersonEntry> = value
        .get("key_people")?
        .as_array()?
        .iter()
        .filter_map(|person| {
            Some(PersonEntry {
                name: str_field(person, "name")?,
                role: str_field(person, "role").unwrap_or_else(|| "Unknown".to_string()),
                background: str_field(person, "background"),
            })
        })
        .collect();

    if people.is_empty() {
        return None;
    }
    Some(ComponentData::People(people))
}

fn shape_market(value: &Value) -> Option<ComponentData> {
    let mut figures = Vec::new();
    for (field, label) in [("tam", "TAM"), ("sam", "SAM"), ("som", "SOM")] {
        if let Some(entry) = value.get(field) {
            if let Some(size) = str_field(entry, "size") {
                figures.push(StatFigure {
                    label: label.to_string(),
                    value: size,
                    delta: str_field(entry, "cagr"),
                });
            }
        }
    }

    if figures.is_empty() {
        return None;
    }
    Some(ComponentData::Stats(figures))
}

fn shape_competitors(value: &Value) -> Option<ComponentData> {
    let items: Vec<ListItem> = value
        .get("direct_competitors")?
        .as_array()?
        .iter()
        .filter_map(|competitor| {
            Some(ListItem {
                label: str_field(competitor, "name")?,
                detail: str_field(competitor, "description"),
            })
        })
        .collect();

    if items.is_empty() {
        return None;
    }
    Some(ComponentData::List(items))
}

fn shape_growth(value: &Value) -> Option<ComponentData> {
    let figures: Vec<StatFigure> = value
        .get("key_metrics")?
        .as_array()?
        .iter()
        .filter_map(|metric| {
            Some(StatFigure {
                label: str_field(metric, "metric")?,
                value: str_field(metric, "value").unwrap_or_else(|| "n/a".to_string()),
                delta: str_field(metric, "growth"),
            })
        })
        .collect();

    if figures.is_empty() {
        return None;
    }
    Some(ComponentData::Stats(figures))
}
