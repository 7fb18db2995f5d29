use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::dossier::CompanySummary;

/// One funding round in a company record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FundingRound {
    pub date: String,
    pub amount: f64,
    pub series: String,
    pub investors: Vec<String>,
}

/// A record from the static company directory. Shaped like the upstream
/// data source it mocks; only the summary portion ends up in a dossier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CompanyRecord {
    pub name: String,
    pub description: String,
    pub funding_rounds: Vec<FundingRound>,
    pub founders: Vec<String>,
    pub industry: String,
    pub founded_year: i64,
    pub total_funding: f64,
    pub website: String,
    pub location: String,
    pub status: String,
}

impl CompanyRecord {
    /// The dossier header derived from this record.
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            industry: Some(self.industry.clone()),
            founded_year: Some(self.founded_year),
            location: Some(self.location.clone()),
            website: Some(self.website.clone()),
            total_funding: Some(self.total_funding),
        }
    }
}
