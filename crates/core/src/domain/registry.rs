//! The process-wide task catalog.
//!
//! Registry order is load-bearing: it is the dossier panel order, no
//! matter in which order tasks happen to finish at run time.

use super::dossier::ComponentKind;
use super::task::{TaskDefinition, TaskId, ToolCapability};

const SEARCH: &[ToolCapability] = &[ToolCapability::Search];
const SEARCH_AND_SCRAPE: &[ToolCapability] = &[ToolCapability::Search, ToolCapability::Scrape];

const COMPANY_OVERVIEW_INSTRUCTIONS: &str = r#"You are researching basic information about a company.

Collect: official name, tagline, a comprehensive description of what the
company does, website URL, founding year, headquarters location, company
stage, approximate employee count, business model, revenue model, and
industry. Prefer authoritative sources: the company's own site, LinkedIn,
Crunchbase, tech press.

Use the web_search tool to find sources and the fetch_page tool to read
them. When done, answer with exactly this JSON object:
{
  "name": "...",
  "tagline": "...",
  "description": "...",
  "website": "https://...",
  "founded_year": 2020,
  "headquarters": "City, Country",
  "company_stage": "Series A",
  "employee_count": 50,
  "business_model": "B2B",
  "revenue_model": "SaaS",
  "industry": "..."
}"#;

const KEY_PEOPLE_INSTRUCTIONS: &str = r#"You are researching the team behind a company: founders, executives,
board members and advisors.

Use the web_search tool to locate team pages and profiles and the
fetch_page tool to read them. When done, answer with exactly this JSON
object:
{
  "key_people": [
    {"name": "...", "role": "...", "background": "..."}
  ],
  "board_members": [
    {"name": "...", "role": "...", "organization": "..."}
  ],
  "team_strength": "one-paragraph assessment"
}"#;

const MARKET_SIZING_INSTRUCTIONS: &str = r#"You are researching the market a company operates in: total addressable
market (TAM), serviceable addressable market (SAM), serviceable
obtainable market (SOM), and the trends shaping them.

Use the web_search tool for market reports and figures. When done, answer
with exactly this JSON object:
{
  "tam": {"size": "$X B", "year": 2025, "cagr": "X%", "description": "..."},
  "sam": {"size": "$X B", "year": 2025, "cagr": "X%", "description": "..."},
  "som": {"size": "$X M", "year": 2025, "cagr": "X%", "description": "..."},
  "market_trends": [
    {"trend": "...", "description": "..."}
  ]
}"#;

const COMPETITOR_LANDSCAPE_INSTRUCTIONS: &str = r#"You are mapping the competitive landscape around a company: direct
competitors, indirect competitors, and the company's competitive
advantage.

Use the web_search tool to find competitors and the fetch_page tool to
read comparisons. When done, answer with exactly this JSON object:
{
  "direct_competitors": [
    {"name": "...", "description": "...", "funding": "..."}
  ],
  "indirect_competitors": [
    {"name": "...", "description": "..."}
  ],
  "competitive_advantage": "..."
}"#;

const GROWTH_METRICS_INSTRUCTIONS: &str = r#"You are researching a company's growth: user growth, revenue growth, and
the headline metrics an investor would look at.

Use the web_search tool for figures and press coverage. Estimates are
acceptable when exact numbers are not public, as long as you say so in
the description. When done, answer with exactly this JSON object:
{
  "user_growth": {"current_users": "...", "growth_rate": "...", "description": "..."},
  "revenue_growth": {"description": "..."},
  "key_metrics": [
    {"metric": "ARR", "value": "$X M", "growth": "X% YoY"}
  ]
}"#;

static DEFINITIONS: [TaskDefinition; 5] = [
    TaskDefinition {
        id: TaskId::CompanyOverview,
        label: "Company Overview",
        phase_label: "Building company overview",
        required: SEARCH_AND_SCRAPE,
        shape: ComponentKind::Text,
        instructions: COMPANY_OVERVIEW_INSTRUCTIONS,
    },
    TaskDefinition {
        id: TaskId::KeyPeople,
        label: "Key People",
        phase_label: "Researching key people",
        required: SEARCH_AND_SCRAPE,
        shape: ComponentKind::People,
        instructions: KEY_PEOPLE_INSTRUCTIONS,
    },
    TaskDefinition {
        id: TaskId::MarketSizing,
        label: "Market Size",
        phase_label: "Sizing the market",
        required: SEARCH,
        shape: ComponentKind::Stat,
        instructions: MARKET_SIZING_INSTRUCTIONS,
    },
    TaskDefinition {
        id: TaskId::CompetitorLandscape,
        label: "Competitor Landscape",
        phase_label: "Mapping competitors",
        required: SEARCH_AND_SCRAPE,
        shape: ComponentKind::List,
        instructions: COMPETITOR_LANDSCAPE_INSTRUCTIONS,
    },
    TaskDefinition {
        id: TaskId::GrowthMetrics,
        label: "Growth Metrics",
        phase_label: "Collecting growth metrics",
        required: SEARCH,
        shape: ComponentKind::Stat,
        instructions: GROWTH_METRICS_INSTRUCTIONS,
    },
];

/// Read-only catalog of research tasks, initialized once for the whole
/// process.
pub struct TaskRegistry {
    definitions: &'static [TaskDefinition],
}

pub static REGISTRY: TaskRegistry = TaskRegistry {
    definitions: &DEFINITIONS,
};

impl TaskRegistry {
    /// All definitions, in registry (= dossier panel) order.
    pub fn list(&self) -> &'static [TaskDefinition] {
        self.definitions
    }

    pub fn get(&self, id: TaskId) -> Option<&'static TaskDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Subset selection preserving registry order. An empty focus set
    /// selects everything.
    pub fn filter(&self, focus: &[TaskId]) -> Vec<&'static TaskDefinition> {
        if focus.is_empty() {
            return self.definitions.iter().collect();
        }
        self.definitions
            .iter()
            .filter(|d| focus.contains(&d.id))
            .collect()
    }
}
