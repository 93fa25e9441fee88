use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Kind of posting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpportunityType {
    Volunteer,
    Donation,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpportunityCategory {
    Education,
    Health,
    Environment,
    Poverty,
    Crisis,
    Community,
    Arts,
    Animals,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpportunityUrgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle status; only `Active` postings are listed
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpportunityStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// Opportunity domain entity in the application's canonical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organization: String,
    pub organization_id: String,
    pub organization_logo: Option<String>,
    #[serde(rename = "type")]
    pub opportunity_type: OpportunityType,
    pub category: OpportunityCategory,
    pub location: String,
    pub is_remote: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub urgency: OpportunityUrgency,
    pub status: OpportunityStatus,
    pub required_skills: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Explicit start date, else the creation instant
    pub fn effective_start(&self) -> DateTime<Utc> {
        self.start_date.unwrap_or(self.created_at)
    }

    /// Explicit end date, else start date, else the creation instant
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_date.or(self.start_date).unwrap_or(self.created_at)
    }

    /// True when neither a start nor an end date is set
    pub fn is_undated(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

/// Server-side predicates for listing active opportunities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOpportunitiesInput {
    pub category: Option<OpportunityCategory>,
    pub opportunity_type: Option<OpportunityType>,
    /// Case-insensitive substring match
    pub location: Option<String>,
    pub is_remote: Option<bool>,
    pub urgency: Option<OpportunityUrgency>,
    pub organization_id: Option<String>,
}

/// Input for getting an opportunity by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOpportunityInput {
    pub opportunity_id: String,
}

/// Input for storing a new opportunity (ID and timestamps assigned by the store)
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOpportunityInput {
    pub title: String,
    pub description: String,
    pub organization: String,
    pub organization_id: String,
    pub organization_logo: Option<String>,
    pub opportunity_type: OpportunityType,
    pub category: OpportunityCategory,
    pub location: String,
    pub is_remote: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub urgency: OpportunityUrgency,
    pub status: OpportunityStatus,
    pub required_skills: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOpportunityInput {
    pub opportunity_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub organization: Option<String>,
    pub organization_logo: Option<String>,
    pub opportunity_type: Option<OpportunityType>,
    pub category: Option<OpportunityCategory>,
    pub location: Option<String>,
    pub is_remote: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub urgency: Option<OpportunityUrgency>,
    pub status: Option<OpportunityStatus>,
    pub required_skills: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Input for deleting an opportunity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOpportunityInput {
    pub opportunity_id: String,
}

/// Repository trait for opportunity storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// List active opportunities, newest first
    async fn list_opportunities(
        &self,
        input: ListOpportunitiesInput,
    ) -> DomainResult<Vec<Opportunity>>;

    /// Get an opportunity by ID (any status)
    async fn get_opportunity(&self, input: GetOpportunityInput)
        -> DomainResult<Option<Opportunity>>;

    async fn create_opportunity(&self, input: CreateOpportunityInput) -> DomainResult<Opportunity>;

    async fn update_opportunity(&self, input: UpdateOpportunityInput) -> DomainResult<Opportunity>;

    async fn delete_opportunity(&self, input: DeleteOpportunityInput) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn opportunity() -> Opportunity {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Opportunity {
            id: "opp-1".to_string(),
            title: "Beach cleanup".to_string(),
            description: "Collect litter".to_string(),
            organization: "Ocean Friends".to_string(),
            organization_id: "org-1".to_string(),
            organization_logo: None,
            opportunity_type: OpportunityType::Volunteer,
            category: OpportunityCategory::Environment,
            location: "Santa Monica, CA".to_string(),
            is_remote: false,
            start_date: None,
            end_date: None,
            urgency: OpportunityUrgency::High,
            status: OpportunityStatus::Active,
            required_skills: None,
            items: None,
            contact_email: "hello@oceanfriends.org".to_string(),
            contact_phone: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(OpportunityCategory::Environment.as_ref(), "environment");
        assert_eq!(OpportunityUrgency::Critical.to_string(), "critical");
        assert_eq!(
            OpportunityType::from_str("donation").unwrap(),
            OpportunityType::Donation
        );
        assert!(OpportunityStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_effective_dates_fall_back() {
        let mut opp = opportunity();
        assert!(opp.is_undated());
        assert_eq!(opp.effective_start(), opp.created_at);
        assert_eq!(opp.effective_end(), opp.created_at);

        let start = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        opp.start_date = Some(start);
        assert_eq!(opp.effective_start(), start);
        assert_eq!(opp.effective_end(), start);

        let end = Utc.with_ymd_and_hms(2024, 4, 2, 17, 0, 0).unwrap();
        opp.end_date = Some(end);
        assert_eq!(opp.effective_end(), end);
    }

    #[test]
    fn test_serializes_in_camel_case() {
        let json = serde_json::to_value(opportunity()).unwrap();
        assert_eq!(json["organizationId"], "org-1");
        assert_eq!(json["isRemote"], false);
        assert_eq!(json["type"], "volunteer");
        assert!(json.get("organization_id").is_none());
    }
}
