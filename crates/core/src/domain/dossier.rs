use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Presentation type of one dashboard panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    People,
    Text,
    List,
    Stat,
    Raw,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Text => "text",
            Self::List => "list",
            Self::Stat => "stat",
            Self::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonEntry {
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatFigure {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// Type-specific panel payload. Serialized untagged: the enclosing
/// component's `type` field already names the shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ComponentData {
    People(Vec<PersonEntry>),
    Text(TextPayload),
    List(Vec<ListItem>),
    Stats(Vec<StatFigure>),
    Raw(Value),
}

/// One panel of the composed dossier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardComponent {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub size: SizeClass,
    pub data: ComponentData,
}

/// Company header of the dossier, seeded from the static directory
/// lookup rather than from agent output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompanySummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_funding: Option<f64>,
}

impl CompanySummary {
    /// Header for a subject the directory knows nothing about.
    pub fn from_subject(subject: &str) -> Self {
        Self {
            name: subject.to_string(),
            ..Self::default()
        }
    }
}

/// The terminal artifact of a run. Contains no timestamps or generated
/// ids, so composing the same inputs twice yields identical JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dossier {
    pub company: CompanySummary,
    pub components: Vec<DashboardComponent>,
}
