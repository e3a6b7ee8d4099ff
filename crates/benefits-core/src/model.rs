use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Characters of `details` shown before the text is cut with an ellipsis.
pub const DETAILS_PREVIEW_CHARS: usize = 200;
/// Audience entries shown on a card before the rest are summarised as a count.
pub const DISPLAYED_AUDIENCES: usize = 3;

/// A single benefit row from the published sheet.
///
/// Field order follows the sheet's positional columns 0..=7.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Benefit {
    /// "Post ID" column; never empty for a loaded record.
    pub id: String,
    /// Comma-separated list of who the benefit is for.
    pub target_audience: String,
    pub category: String,
    pub subcategory: String,
    /// Ministry or organisation offering the benefit.
    pub organization: String,
    pub details_link: String,
    pub last_updated: String,
    /// Free-text fine print.
    pub details: String,
}

impl Benefit {
    /// Lower-cased `organization details category targetAudience`, the text every
    /// substring match runs against.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.organization, self.details, self.category, self.target_audience
        )
        .to_lowercase()
    }

    /// Target audience split on commas, trimmed, blanks dropped.
    pub fn audience_list(&self) -> Vec<String> {
        self.target_audience
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Build the card view with derived display fields.
    pub fn to_view(&self) -> BenefitView {
        let audiences = self.audience_list();
        let has_more_details = self.details.chars().count() > DETAILS_PREVIEW_CHARS;
        let details_truncated = if has_more_details {
            let head: String = self.details.chars().take(DETAILS_PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            self.details.clone()
        };

        BenefitView {
            benefit: self.clone(),
            details_truncated,
            has_more_details,
            target_audience_displayed: audiences.iter().take(DISPLAYED_AUDIENCES).cloned().collect(),
            has_more_audience: audiences.len() > DISPLAYED_AUDIENCES,
            additional_audience_count: audiences.len().saturating_sub(DISPLAYED_AUDIENCES),
            target_audience_array: audiences,
        }
    }

    /// Build the single-record view returned by id lookups.
    pub fn to_detail(&self) -> BenefitDetail {
        BenefitDetail {
            target_audience_array: self.audience_list(),
            benefit: self.clone(),
            hebrew_field_names: FieldLabels::default(),
        }
    }
}

/// A benefit plus the fields a list card needs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenefitView {
    #[serde(flatten)]
    pub benefit: Benefit,
    pub details_truncated: String,
    pub has_more_details: bool,
    pub target_audience_array: Vec<String>,
    pub target_audience_displayed: Vec<String>,
    pub has_more_audience: bool,
    pub additional_audience_count: usize,
}

/// A benefit with its audience list and the Hebrew labels of each field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenefitDetail {
    #[serde(flatten)]
    pub benefit: Benefit,
    pub target_audience_array: Vec<String>,
    pub hebrew_field_names: FieldLabels,
}

/// Hebrew display labels of the sheet columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldLabels {
    pub target_audience: String,
    pub category: String,
    pub subcategory: String,
    pub organization: String,
    pub details_link: String,
    pub last_updated: String,
    pub details: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            target_audience: "למי זה".to_string(),
            category: "קטגוריה".to_string(),
            subcategory: "תת קטגוריה".to_string(),
            organization: "שם המשרד/הארגון".to_string(),
            details_link: "לינק לפרטים".to_string(),
            last_updated: "מתי עודכן".to_string(),
            details: "פרטים".to_string(),
        }
    }
}

/// A name with the number of benefits it appears on (categories, audiences,
/// organisations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}
