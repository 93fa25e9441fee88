use crate::domain::{
    CreateOpportunityInput, DomainError, Opportunity, UpdateOpportunityInput,
};
use crate::supabase::{closed_enum, format_instant, optional_instant, required_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "opportunity";

/// Raw `opportunities` row as returned by PostgREST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organization: String,
    pub organization_id: String,
    pub organization_logo: Option<String>,
    #[serde(rename = "type")]
    pub opportunity_type: String,
    pub category: String,
    pub location: String,
    pub is_remote: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub urgency: String,
    pub status: String,
    pub required_skills: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<OpportunityRow> for Opportunity {
    type Error = DomainError;

    fn try_from(row: OpportunityRow) -> Result<Self, Self::Error> {
        Ok(Opportunity {
            opportunity_type: closed_enum(ENTITY, "type", &row.opportunity_type)?,
            category: closed_enum(ENTITY, "category", &row.category)?,
            urgency: closed_enum(ENTITY, "urgency", &row.urgency)?,
            status: closed_enum(ENTITY, "status", &row.status)?,
            start_date: optional_instant("start_date", row.start_date.as_deref()),
            end_date: optional_instant("end_date", row.end_date.as_deref()),
            created_at: required_instant(ENTITY, "created_at", &row.created_at)?,
            updated_at: required_instant(ENTITY, "updated_at", &row.updated_at)?,
            id: row.id,
            title: row.title,
            description: row.description,
            organization: row.organization,
            organization_id: row.organization_id,
            organization_logo: row.organization_logo,
            location: row.location,
            is_remote: row.is_remote,
            required_skills: row.required_skills,
            items: row.items,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
        })
    }
}

impl From<&Opportunity> for OpportunityRow {
    fn from(opp: &Opportunity) -> Self {
        OpportunityRow {
            id: opp.id.clone(),
            title: opp.title.clone(),
            description: opp.description.clone(),
            organization: opp.organization.clone(),
            organization_id: opp.organization_id.clone(),
            organization_logo: opp.organization_logo.clone(),
            opportunity_type: opp.opportunity_type.to_string(),
            category: opp.category.to_string(),
            location: opp.location.clone(),
            is_remote: opp.is_remote,
            start_date: opp.start_date.as_ref().map(format_instant),
            end_date: opp.end_date.as_ref().map(format_instant),
            urgency: opp.urgency.to_string(),
            status: opp.status.to_string(),
            required_skills: opp.required_skills.clone(),
            items: opp.items.clone(),
            contact_email: opp.contact_email.clone(),
            contact_phone: opp.contact_phone.clone(),
            created_at: format_instant(&opp.created_at),
            updated_at: format_instant(&opp.updated_at),
        }
    }
}

/// Insert payload; the store assigns `id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOpportunityRow {
    pub title: String,
    pub description: String,
    pub organization: String,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_logo: Option<String>,
    #[serde(rename = "type")]
    pub opportunity_type: String,
    pub category: String,
    pub location: String,
    pub is_remote: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub urgency: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl NewOpportunityRow {
    pub fn new(input: CreateOpportunityInput, now: DateTime<Utc>) -> Self {
        let now = format_instant(&now);
        Self {
            title: input.title,
            description: input.description,
            organization: input.organization,
            organization_id: input.organization_id,
            organization_logo: input.organization_logo,
            opportunity_type: input.opportunity_type.to_string(),
            category: input.category.to_string(),
            location: input.location,
            is_remote: input.is_remote,
            start_date: input.start_date.as_ref().map(format_instant),
            end_date: input.end_date.as_ref().map(format_instant),
            urgency: input.urgency.to_string(),
            status: input.status.to_string(),
            required_skills: input.required_skills,
            items: input.items,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Update payload; only the provided columns are sent, `updated_at` always is
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpportunityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_logo: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub opportunity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_remote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub updated_at: String,
}

impl OpportunityPatch {
    pub fn new(input: &UpdateOpportunityInput, now: DateTime<Utc>) -> Self {
        Self {
            title: input.title.clone(),
            description: input.description.clone(),
            organization: input.organization.clone(),
            organization_logo: input.organization_logo.clone(),
            opportunity_type: input.opportunity_type.map(|t| t.to_string()),
            category: input.category.map(|c| c.to_string()),
            location: input.location.clone(),
            is_remote: input.is_remote,
            start_date: input.start_date.as_ref().map(format_instant),
            end_date: input.end_date.as_ref().map(format_instant),
            urgency: input.urgency.map(|u| u.to_string()),
            status: input.status.map(|s| s.to_string()),
            required_skills: input.required_skills.clone(),
            items: input.items.clone(),
            contact_email: input.contact_email.clone(),
            contact_phone: input.contact_phone.clone(),
            updated_at: format_instant(&now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        OpportunityCategory, OpportunityStatus, OpportunityType, OpportunityUrgency,
    };
    use chrono::TimeZone;

    fn raw_row() -> OpportunityRow {
        serde_json::from_value(serde_json::json!({
            "id": "8b1f6d0e-3a51-4c38-9f43-1d1b8f0b6a11",
            "title": "Winter coat drive",
            "description": "Collecting coats for the shelter",
            "organization": "Warm Hands",
            "organization_id": "org-42",
            "organization_logo": null,
            "type": "donation",
            "category": "poverty",
            "location": "Chicago, IL",
            "is_remote": false,
            "start_date": "2024-11-01T09:00:00+00:00",
            "end_date": null,
            "urgency": "critical",
            "status": "active",
            "required_skills": null,
            "items": ["coats", "gloves"],
            "contact_email": "coats@warmhands.org",
            "contact_phone": "555-0100",
            "created_at": "2024-10-01T08:00:00.123+00:00",
            "updated_at": "2024-10-02T08:00:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_normalizes_row() {
        let opp = Opportunity::try_from(raw_row()).unwrap();

        assert_eq!(opp.organization_id, "org-42");
        assert_eq!(opp.opportunity_type, OpportunityType::Donation);
        assert_eq!(opp.category, OpportunityCategory::Poverty);
        assert_eq!(opp.urgency, OpportunityUrgency::Critical);
        assert_eq!(opp.status, OpportunityStatus::Active);
        assert_eq!(
            opp.start_date,
            Some(Utc.with_ymd_and_hms(2024, 11, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(opp.end_date, None);
        assert_eq!(opp.items, Some(vec!["coats".to_string(), "gloves".to_string()]));
        assert_eq!(opp.contact_phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let row = raw_row();
        let opp = Opportunity::try_from(row.clone()).unwrap();
        let back = OpportunityRow::from(&opp);

        assert_eq!(back.id, row.id);
        assert_eq!(back.title, row.title);
        assert_eq!(back.organization_id, row.organization_id);
        assert_eq!(back.opportunity_type, row.opportunity_type);
        assert_eq!(back.category, row.category);
        assert_eq!(back.urgency, row.urgency);
        assert_eq!(back.status, row.status);
        assert_eq!(back.items, row.items);
        assert_eq!(back.contact_phone, row.contact_phone);
        assert_eq!(back.end_date, None);

        // Dates differ in representation only
        for (original, rendered) in [
            (row.start_date.as_deref(), back.start_date.as_deref()),
            (Some(row.created_at.as_str()), Some(back.created_at.as_str())),
            (Some(row.updated_at.as_str()), Some(back.updated_at.as_str())),
        ] {
            assert_eq!(
                original.and_then(crate::supabase::parse_instant),
                rendered.and_then(crate::supabase::parse_instant)
            );
        }

        assert_eq!(Opportunity::try_from(back).unwrap(), opp);
    }

    #[test]
    fn test_unknown_category_is_schema_mismatch() {
        let mut row = raw_row();
        row.category = "sports".to_string();
        let result = Opportunity::try_from(row);
        assert!(matches!(result, Err(DomainError::SchemaMismatch(_, detail)) if detail.contains("sports")));
    }

    #[test]
    fn test_malformed_optional_date_becomes_absent() {
        let mut row = raw_row();
        row.start_date = Some("soon".to_string());
        let opp = Opportunity::try_from(row).unwrap();
        assert_eq!(opp.start_date, None);
    }

    #[test]
    fn test_patch_only_serializes_provided_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let patch = OpportunityPatch::new(
            &UpdateOpportunityInput {
                opportunity_id: "opp-1".to_string(),
                status: Some(OpportunityStatus::Completed),
                ..Default::default()
            },
            now,
        );

        let json = serde_json::to_value(&patch).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["status"], "completed");
        assert_eq!(object["updated_at"], "2024-01-01T00:00:00.000Z");
    }
}
