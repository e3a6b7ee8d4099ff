/// MCP server exposing the benefits catalog as tools.
///
/// Exposes:
/// - `list_benefits`: every benefit in sheet order
/// - `search_benefits`: filter by free text, exact category and audience
/// - `get_benefit`: a single benefit by its Post ID
/// - `list_categories` / `list_audiences` / `list_organizations`: counted listings
/// - `suggest_benefits`: keyword-scored suggestions with a Hebrew explanation
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use benefits_core::catalog::{Catalog, SearchFilters};
use benefits_core::model::{Benefit, BenefitDetail, BenefitView, NamedCount};
use benefits_core::relevance::Suggestions;

#[derive(Clone)]
pub struct BenefitsServer {
    catalog: Arc<Catalog>,
    tool_router: ToolRouter<BenefitsServer>,
}

impl BenefitsServer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchBenefitsParams {
    /// Free text matched against organisation, details, category and audience.
    query: Option<String>,
    /// Exact category name, e.g. "בריאות".
    category: Option<String>,
    /// Audience name or audience group, e.g. "משרתי מילואים".
    audience: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetBenefitParams {
    /// Post ID of the benefit.
    id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SuggestParams {
    /// Free-text question, usually in Hebrew.
    query: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct BenefitListResponse {
    benefits: Vec<Benefit>,
    count: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SearchBenefitsResponse {
    benefits: Vec<BenefitView>,
    count: usize,
    filters: SearchFilters,
}

#[derive(Debug, Serialize, JsonSchema)]
struct CountsResponse {
    items: Vec<NamedCount>,
    total: usize,
}

impl CountsResponse {
    fn new(items: Vec<NamedCount>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

#[tool_router]
impl BenefitsServer {
    #[tool(description = "List every benefit in the published sheet, in sheet order.")]
    async fn list_benefits(&self) -> Result<Json<BenefitListResponse>, String> {
        let benefits = self
            .catalog
            .list_benefits()
            .await
            .map_err(|e| format!("list_benefits failed: {e}"))?;
        Ok(Json(BenefitListResponse {
            count: benefits.len(),
            benefits,
        }))
    }

    #[tool(description = "Search benefits. 'query' is a substring match over organisation, details, category and audience; 'category' must match exactly; 'audience' matches a name or a known audience group. All filters are optional.")]
    async fn search_benefits(
        &self,
        Parameters(params): Parameters<SearchBenefitsParams>,
    ) -> Result<Json<SearchBenefitsResponse>, String> {
        let filters = SearchFilters::new(params.query, params.category, params.audience);
        let benefits = self
            .catalog
            .search_benefits(&filters)
            .await
            .map_err(|e| format!("search failed: {e}"))?;
        Ok(Json(SearchBenefitsResponse {
            count: benefits.len(),
            benefits,
            filters,
        }))
    }

    #[tool(description = "Get a single benefit by its Post ID, with its audience list and Hebrew field labels.")]
    async fn get_benefit(
        &self,
        Parameters(params): Parameters<GetBenefitParams>,
    ) -> Result<Json<BenefitDetail>, String> {
        let id = params.id.trim().to_string();
        if id.is_empty() {
            return Err("id must not be empty".to_string());
        }
        let benefit = self
            .catalog
            .benefit_by_id(&id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Json(benefit))
    }

    #[tool(description = "List benefit categories with how many benefits each has, most common first.")]
    async fn list_categories(&self) -> Result<Json<CountsResponse>, String> {
        let categories = self
            .catalog
            .categories()
            .await
            .map_err(|e| format!("list_categories failed: {e}"))?;
        Ok(Json(CountsResponse::new(categories)))
    }

    #[tool(description = "List target audiences: consolidated audience groups plus the most common specific audiences, most common first.")]
    async fn list_audiences(&self) -> Result<Json<CountsResponse>, String> {
        let audiences = self
            .catalog
            .audiences()
            .await
            .map_err(|e| format!("list_audiences failed: {e}"))?;
        Ok(Json(CountsResponse::new(audiences)))
    }

    #[tool(description = "List organisations offering at least two benefits (top 15), most common first.")]
    async fn list_organizations(&self) -> Result<Json<CountsResponse>, String> {
        let organizations = self
            .catalog
            .organizations()
            .await
            .map_err(|e| format!("list_organizations failed: {e}"))?;
        Ok(Json(CountsResponse::new(organizations)))
    }

    #[tool(description = "Suggest up to five benefits for a free-text question. Keywords are extracted from a fixed Hebrew topic lexicon and benefits are ranked by a rule-based score.")]
    async fn suggest_benefits(
        &self,
        Parameters(params): Parameters<SuggestParams>,
    ) -> Result<Json<Suggestions>, String> {
        info!(query = %params.query, "suggest_benefits tool invoked");
        let suggestions = self
            .catalog
            .suggest(&params.query)
            .await
            .map_err(|e| format!("suggest failed: {e}"))?;
        Ok(Json(suggestions))
    }
}

#[tool_handler]
impl ServerHandler for BenefitsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "benefits-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Benefits catalog MCP server. Reads the published benefits sheet on every \
                 call. Use search_benefits or list_categories/list_audiences to browse, \
                 get_benefit for a single record, and suggest_benefits for free-text \
                 questions in Hebrew."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{routing::get, Router};
    use benefits_core::catalog::Catalog;
    use benefits_core::sheets::{SheetClient, SheetClientConfig};
    use rmcp::handler::server::wrapper::Parameters;

    use super::{BenefitsServer, GetBenefitParams, SuggestParams};

    const SHEET: &str = "\
Post ID,למי זה,קטגוריה,תת קטגוריה,שם המשרד/הארגון,לינק לפרטים,מתי עודכן,פרטים
1,בעלי רכב,תחבורה,,משרד התחבורה,,,החזר אגרת רישוי
2,הורים,משפחה וילדים,,ביטוח לאומי,,,מענק לידה
";

    async fn server() -> BenefitsServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/sheet.csv", get(|| async { SHEET }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let sheets = SheetClient::new(SheetClientConfig {
            sheet_url: format!("http://{addr}/sheet.csv"),
            timeout: Duration::from_secs(5),
            max_retries: 0,
            ..SheetClientConfig::default()
        })
        .unwrap();
        BenefitsServer::new(Arc::new(Catalog::new(sheets)))
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = BenefitsServer::tool_router().list_all();
        for name in [
            "list_benefits",
            "search_benefits",
            "get_benefit",
            "list_categories",
            "list_audiences",
            "list_organizations",
            "suggest_benefits",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn suggest_scores_the_query_as_given() {
        let server = server().await;

        let exact = server
            .suggest_benefits(Parameters(SuggestParams { query: "רכב".to_string() }))
            .await
            .unwrap()
            .0;
        assert_eq!(exact.suggestions.len(), 1);
        assert_eq!(exact.suggestions[0].id, "1");

        // The audience ends the searchable text, so a trailing space cannot match verbatim
        let padded = server
            .suggest_benefits(Parameters(SuggestParams { query: "רכב ".to_string() }))
            .await
            .unwrap()
            .0;
        assert!(padded.suggestions.is_empty());
        assert!(padded.explanation.contains("'רכב '"));
    }

    #[tokio::test]
    async fn suggest_rejects_blank_query() {
        let err = server()
            .await
            .suggest_benefits(Parameters(SuggestParams { query: "   ".to_string() }))
            .await
            .err().unwrap();
        assert!(err.contains("query is required"));
    }

    #[tokio::test]
    async fn get_benefit_returns_detail() {
        let server = server().await;
        let detail = server
            .get_benefit(Parameters(GetBenefitParams { id: " 2 ".to_string() }))
            .await
            .unwrap()
            .0;
        assert_eq!(detail.benefit.organization, "ביטוח לאומי");
        assert_eq!(detail.target_audience_array, vec!["הורים"]);

        assert!(server
            .get_benefit(Parameters(GetBenefitParams { id: "99".to_string() }))
            .await
            .is_err());
    }
}
