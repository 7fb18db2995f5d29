//! Static company directory.
//!
//! Stands in for a real data-provider integration: a handful of curated
//! records plus a deterministic generic record for everything else.

use dossier_core::{CompanyRecord, FundingRound};
use websocket::CompanyLookup;

pub struct CompanyDirectory;

impl CompanyDirectory {
    pub fn new() -> Self {
        Self
    }

    /// A curated record, if the directory knows the company.
    pub fn known(&self, name: &str) -> Option<CompanyRecord> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(CompanyRecord {
                name: "OpenAI".to_string(),
                description: "OpenAI is an AI research and deployment company dedicated to \
                              ensuring that artificial general intelligence benefits all of humanity."
                    .to_string(),
                funding_rounds: vec![
                    FundingRound {
                        date: "2019-03-01".to_string(),
                        amount: 1_000_000_000.0,
                        series: "A".to_string(),
                        investors: vec!["Microsoft".to_string()],
                    },
                    FundingRound {
                        date: "2021-01-15".to_string(),
                        amount: 2_000_000_000.0,
                        series: "B".to_string(),
                        investors: vec!["Khosla Ventures".to_string(), "Reid Hoffman".to_string()],
                    },
                ],
                founders: vec![
                    "Sam Altman".to_string(),
                    "Elon Musk".to_string(),
                    "Greg Brockman".to_string(),
                    "Ilya Sutskever".to_string(),
                    "John Schulman".to_string(),
                    "Wojciech Zaremba".to_string(),
                ],
                industry: "Artificial Intelligence".to_string(),
                founded_year: 2015,
                total_funding: 3_000_000_000.0,
                website: "https://openai.com".to_string(),
                location: "San Francisco, CA".to_string(),
                status: "Operating".to_string(),
            }),
            "anthropic" => Some(CompanyRecord {
                name: "Anthropic".to_string(),
                description: "Anthropic is an AI safety company working to build reliable, \
                              interpretable, and steerable AI systems."
                    .to_string(),
                funding_rounds: vec![
                    FundingRound {
                        date: "2021-05-01".to_string(),
                        amount: 124_000_000.0,
                        series: "A".to_string(),
                        investors: vec!["Jaan Tallinn".to_string(), "Dustin Moskovitz".to_string()],
                    },
                    FundingRound {
                        date: "2022-04-15".to_string(),
                        amount: 580_000_000.0,
                        series: "B".to_string(),
                        investors: vec!["Google".to_string(), "Spark Capital".to_string()],
                    },
                ],
                founders: vec![
                    "Dario Amodei".to_string(),
                    "Daniela Amodei".to_string(),
                    "Tom Brown".to_string(),
                ],
                industry: "Artificial Intelligence".to_string(),
                founded_year: 2021,
                total_funding: 704_000_000.0,
                website: "https://www.anthropic.com".to_string(),
                location: "San Francisco, CA".to_string(),
                status: "Operating".to_string(),
            }),
            _ => None,
        }
    }

    /// A record for any name: curated when available, otherwise a
    /// deterministic generic one.
    pub fn lookup_or_mock(&self, name: &str) -> CompanyRecord {
        self.known(name).unwrap_or_else(|| {
            let trimmed = name.trim();
            CompanyRecord {
                name: trimmed.to_string(),
                description: format!("Mock data for {trimmed}"),
                funding_rounds: vec![FundingRound {
                    date: "2022-01-01".to_string(),
                    amount: 5_000_000.0,
                    series: "Seed".to_string(),
                    investors: vec!["Mock Ventures".to_string()],
                }],
                founders: vec!["Founder 1".to_string(), "Founder 2".to_string()],
                industry: "Technology".to_string(),
                founded_year: 2020,
                total_funding: 5_000_000.0,
                website: format!("https://www.{}.com", trimmed.to_lowercase()),
                location: "San Francisco, CA".to_string(),
                status: "Operating".to_string(),
            }
        })
    }
}

impl Default for CompanyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanyLookup for CompanyDirectory {
    fn lookup(&self, name: &str) -> Option<CompanyRecord> {
        self.known(name)
    }
}
