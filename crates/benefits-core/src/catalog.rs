/// Read operations over the benefits sheet.
///
/// The free functions are pure and work on an already-loaded slice. `Catalog` pairs
/// them with a `SheetClient` so that every boundary operation loads the sheet the
/// same way: fetch, parse, compute, discard.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audience::{self, count_names, matches_audience};
use crate::error::CatalogError;
use crate::model::{Benefit, BenefitDetail, BenefitView, NamedCount};
use crate::relevance::{self, Suggestions};
use crate::sheets::SheetClient;

/// Organisations must offer at least this many benefits to be listed.
pub const MIN_ORGANIZATION_COUNT: usize = 2;
pub const MAX_ORGANIZATIONS: usize = 15;

/// Optional filters for [`search`]. Blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilters {
    /// Free text matched against organisation, details, category and audience.
    #[serde(rename = "searchQuery")]
    pub search: Option<String>,
    /// Exact category name.
    pub category: Option<String>,
    /// Audience name or audience group.
    pub audience: Option<String>,
}

impl SearchFilters {
    pub fn new(search: Option<String>, category: Option<String>, audience: Option<String>) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            search: non_blank(search),
            category: non_blank(category),
            audience: non_blank(audience),
        }
    }

    pub fn matches(&self, benefit: &Benefit) -> bool {
        if let Some(query) = &self.search {
            if !benefit.searchable_text().contains(&query.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if *category != benefit.category {
                return false;
            }
        }
        if let Some(audience) = &self.audience {
            if !matches_audience(benefit, audience) {
                return false;
            }
        }
        true
    }
}

pub fn enhance(benefits: &[Benefit]) -> Vec<BenefitView> {
    benefits.iter().map(Benefit::to_view).collect()
}

/// Benefits passing every filter, as card views, in sheet order.
pub fn search(benefits: &[Benefit], filters: &SearchFilters) -> Vec<BenefitView> {
    benefits
        .iter()
        .filter(|b| filters.matches(b))
        .map(Benefit::to_view)
        .collect()
}

/// Categories with their benefit counts, most common first.
pub fn categories(benefits: &[Benefit]) -> Vec<NamedCount> {
    count_names(benefits.iter().map(|b| b.category.trim().to_string()))
}

/// Organisations offering at least two benefits, most common first, top 15.
pub fn organizations(benefits: &[Benefit]) -> Vec<NamedCount> {
    count_names(benefits.iter().map(|b| b.organization.trim().to_string()))
        .into_iter()
        .filter(|o| o.count >= MIN_ORGANIZATION_COUNT)
        .take(MAX_ORGANIZATIONS)
        .collect()
}

/// First benefit with exactly this id.
pub fn find_by_id<'a>(benefits: &'a [Benefit], id: &str) -> Result<&'a Benefit, CatalogError> {
    benefits
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))
}

/// Request-scoped access to the sheet. Holds no records between calls.
#[derive(Clone)]
pub struct Catalog {
    sheets: SheetClient,
}

impl Catalog {
    pub fn new(sheets: SheetClient) -> Self {
        Self { sheets }
    }

    async fn load(&self) -> Result<Vec<Benefit>, CatalogError> {
        Ok(self.sheets.fetch_benefits().await?)
    }

    pub async fn list_benefits(&self) -> Result<Vec<Benefit>, CatalogError> {
        self.load().await
    }

    pub async fn enhanced_benefits(&self) -> Result<Vec<BenefitView>, CatalogError> {
        Ok(enhance(&self.load().await?))
    }

    pub async fn search_benefits(&self, filters: &SearchFilters) -> Result<Vec<BenefitView>, CatalogError> {
        let results = search(&self.load().await?, filters);
        info!(
            search = filters.search.as_deref(),
            category = filters.category.as_deref(),
            audience = filters.audience.as_deref(),
            count = results.len(),
            "benefit search"
        );
        Ok(results)
    }

    pub async fn categories(&self) -> Result<Vec<NamedCount>, CatalogError> {
        Ok(categories(&self.load().await?))
    }

    pub async fn audiences(&self) -> Result<Vec<NamedCount>, CatalogError> {
        Ok(audience::audiences(&self.load().await?))
    }

    pub async fn organizations(&self) -> Result<Vec<NamedCount>, CatalogError> {
        Ok(organizations(&self.load().await?))
    }

    pub async fn benefit_by_id(&self, id: &str) -> Result<BenefitDetail, CatalogError> {
        let benefits = self.load().await?;
        find_by_id(&benefits, id).map(Benefit::to_detail)
    }

    /// Validates the query before touching the network.
    pub async fn suggest(&self, query: &str) -> Result<Suggestions, CatalogError> {
        if query.trim().is_empty() {
            return Err(CatalogError::Validation("query is required".to_string()));
        }
        let benefits = self.load().await?;
        let suggestions = relevance::rank(query, &benefits)?;
        info!(
            query,
            keywords = suggestions.keywords.len(),
            total_matched = suggestions.total_matched,
            "generated suggestions"
        );
        Ok(suggestions)
    }
}
