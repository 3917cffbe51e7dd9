use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned document identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id, used by stores that assign their own identities
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        DocumentId(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId(s.to_string())
    }
}

/// A startup funding record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub company_name: String,
    pub industry: String,
    pub location: String,
    pub funding_stage: String,
    pub funding_amount: f64,
    pub lead_investor: String,
    pub monthly_revenue: f64,
    pub employee_count: u32,
    pub business_model: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_funding_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_investors: Vec<String>,
}

impl Document {
    /// Categorical values held by `field`.
    ///
    /// Single-valued fields yield one value, `other_investors` yields all of
    /// its entries. Returns `None` for fields that are not categorical.
    pub fn categorical_values(&self, field: &str) -> Option<Vec<&str>> {
        let single = match field {
            "industry" => &self.industry,
            "location" => &self.location,
            "funding_stage" => &self.funding_stage,
            "lead_investor" => &self.lead_investor,
            "business_model" => &self.business_model,
            "other_investors" => {
                return Some(self.other_investors.iter().map(String::as_str).collect());
            }
            _ => return None,
        };
        Some(vec![single.as_str()])
    }

    /// Numeric value of `field`, if the field is numeric and present
    pub fn numeric_value(&self, field: &str) -> Option<f64> {
        match field {
            "funding_amount" => Some(self.funding_amount),
            "monthly_revenue" => Some(self.monthly_revenue),
            "employee_count" => Some(f64::from(self.employee_count)),
            "founded_year" => self.founded_year.map(f64::from),
            _ => None,
        }
    }

    /// Free-text value of `field`
    pub fn text_value(&self, field: &str) -> Option<&str> {
        match field {
            "company_name" => Some(&self.company_name),
            "description" => Some(&self.description),
            other => self
                .categorical_values(other)
                .and_then(|values| values.into_iter().next()),
        }
    }
}

/// A document paired with the id its store assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    #[serde(flatten)]
    pub document: Document,
}
