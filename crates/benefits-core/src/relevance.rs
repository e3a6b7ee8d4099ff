/// Rule-based relevance scoring for free-text benefit suggestions.
///
/// A query is reduced to canonical keywords via the static lexicon in
/// [`crate::keywords`], every benefit is scored by a fixed additive heuristic, and
/// the best few are returned with a Hebrew explanation sentence.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::keywords::{extract_keywords, synonyms_of};
use crate::model::Benefit;

/// Maximum suggestions returned by [`rank`].
pub const MAX_SUGGESTIONS: usize = 5;

const QUERY_MATCH: u32 = 10;
const KEYWORD_MATCH: u32 = 5;
const SYNONYM_MATCH: u32 = 3;
const CATEGORY_MATCH: u32 = 4;
const AUDIENCE_MATCH: u32 = 3;

const FALLBACK_KEYWORD_TEXT: &str = "המילים שלכם";

/// Ranked suggestions for one query.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub keywords: Vec<String>,
    pub suggestions: Vec<Benefit>,
    pub explanation: String,
    /// Benefits with a positive score, before truncation.
    pub total_matched: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredBenefit<'a> {
    pub benefit: &'a Benefit,
    pub score: u32,
}

/// Score one benefit against the extracted keywords and the raw query.
///
/// Every rule is evaluated independently and summed:
/// - query found verbatim in the searchable text: +10
/// - per keyword found in the searchable text: +5
/// - per synonym of each keyword found in the searchable text: +3
/// - per keyword found in the category: +4
/// - per keyword found in the target audience: +3
pub fn score(benefit: &Benefit, keywords: &[&str], query: &str) -> u32 {
    let searchable = benefit.searchable_text();
    let category = benefit.category.to_lowercase();
    let audience = benefit.target_audience.to_lowercase();

    let mut score = 0;

    if searchable.contains(&query.to_lowercase()) {
        score += QUERY_MATCH;
    }

    for keyword in keywords {
        if searchable.contains(keyword) {
            score += KEYWORD_MATCH;
        }
        if let Some(synonyms) = synonyms_of(keyword) {
            let hits = synonyms.iter().filter(|s| searchable.contains(*s)).count() as u32;
            score += hits * SYNONYM_MATCH;
        }
    }

    for keyword in keywords {
        if category.contains(keyword) {
            score += CATEGORY_MATCH;
        }
    }

    for keyword in keywords {
        if audience.contains(keyword) {
            score += AUDIENCE_MATCH;
        }
    }

    score
}

/// Score all benefits and keep the positive ones, best first.
///
/// The sort is stable, so equal scores keep document order.
pub fn score_all<'a>(benefits: &'a [Benefit], keywords: &[&str], query: &str) -> Vec<ScoredBenefit<'a>> {
    let mut scored: Vec<ScoredBenefit<'a>> = benefits
        .iter()
        .map(|benefit| ScoredBenefit {
            benefit,
            score: score(benefit, keywords, query),
        })
        .filter(|s| s.score > 0)
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Rank benefits for a free-text query.
///
/// Returns `CatalogError::Validation` for an empty or whitespace-only query.
pub fn rank(query: &str, benefits: &[Benefit]) -> Result<Suggestions, CatalogError> {
    if query.trim().is_empty() {
        return Err(CatalogError::Validation("query is required".to_string()));
    }

    let keywords = extract_keywords(query);
    let scored = score_all(benefits, &keywords, query);
    let total_matched = scored.len();

    let suggestions: Vec<Benefit> = scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|s| s.benefit.clone())
        .collect();

    let explanation = explain(query, &keywords, suggestions.len());

    Ok(Suggestions {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        suggestions,
        explanation,
        total_matched,
    })
}

/// Hebrew sentence describing the outcome of a suggestion request.
pub fn explain(query: &str, keywords: &[&str], count: usize) -> String {
    if count == 0 {
        return format!(
            "לא מצאתי שירותים רלוונטיים לשאלה '{query}'. נסו לחפש במילים אחרות או בדקו את הקטגוריות השונות."
        );
    }

    let keyword_text = if keywords.is_empty() {
        FALLBACK_KEYWORD_TEXT.to_string()
    } else {
        keywords.join(", ")
    };

    if count == 1 {
        format!("מצאתי שירות אחד רלוונטי לשאלה שלכם על {keyword_text}.")
    } else {
        format!(
            "מצאתי {count} שירותים רלוונטיים לשאלה שלכם על {keyword_text}. השירותים מסודרים לפי רלוונטיות."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benefit(id: &str, category: &str, audience: &str, organization: &str, details: &str) -> Benefit {
        Benefit {
            id: id.to_string(),
            target_audience: audience.to_string(),
            category: category.to_string(),
            organization: organization.to_string(),
            details: details.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn children_query_against_family_category() {
        let b = benefit("1", "משפחה וילדים", "", "ביטוח לאומי", "");
        let keywords = extract_keywords("ילדים");
        assert!(keywords.contains(&"ילדים"));
        assert!(keywords.contains(&"משפחה"));
        assert!(score(&b, &keywords, "ילדים") >= 9);
    }

    #[test]
    fn score_sums_every_rule() {
        // searchable: "org בריאות מחלה בריאות נכים"
        let b = benefit("1", "בריאות", "נכים", "org", "בריאות מחלה");
        let keywords = ["בריאות"];
        // +10 query, +5 keyword, +3 בריאות +3 מחלה, +4 category, +0 audience
        assert_eq!(score(&b, &keywords, "בריאות"), 25);
    }

    #[test]
    fn unrelated_benefit_scores_zero() {
        let b = benefit("1", "תחבורה", "נהגים", "משרד התחבורה", "רישיון");
        assert_eq!(score(&b, &extract_keywords("פנסיה"), "פנסיה"), 0);
    }

    #[test]
    fn query_match_is_case_insensitive() {
        let b = benefit("1", "", "", "Bituach Leumi", "");
        assert_eq!(score(&b, &[], "BITUACH"), QUERY_MATCH);
    }

    #[test]
    fn adding_a_match_never_lowers_score() {
        let plain = benefit("1", "", "", "org", "הלוואה");
        let richer = benefit("2", "הלוואה", "עצמאים", "org", "הלוואה בנק");
        let keywords = extract_keywords("הלוואה");
        assert!(score(&richer, &keywords, "הלוואה") >= score(&plain, &keywords, "הלוואה"));
    }

    #[test]
    fn rank_truncates_and_counts_all_matches() {
        let benefits: Vec<Benefit> = (0..8)
            .map(|i| benefit(&i.to_string(), "מענק", "", "org", "מענק"))
            .collect();
        let result = rank("מענק", &benefits).unwrap();
        assert_eq!(result.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(result.total_matched, 8);
        assert!(result.explanation.starts_with("מצאתי 5 שירותים"));
    }

    #[test]
    fn rank_is_stable_for_equal_scores() {
        let benefits = vec![
            benefit("a", "", "", "org", "פנסיה"),
            benefit("b", "פנסיה", "", "org", "פנסיה"),
            benefit("c", "", "", "org", "פנסיה"),
        ];
        let result = rank("פנסיה", &benefits).unwrap();
        let ids: Vec<&str> = result.suggestions.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let again = rank("פנסיה", &benefits).unwrap();
        assert_eq!(
            again.suggestions.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn rank_rejects_blank_query() {
        assert!(matches!(rank("   ", &[]), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn rank_without_matches_explains_nothing_found() {
        let benefits = vec![benefit("1", "תחבורה", "", "org", "רישיון")];
        let result = rank("קשישים", &benefits).unwrap();
        assert!(result.suggestions.is_empty());
        assert_eq!(result.total_matched, 0);
        assert!(result.explanation.contains("'קשישים'"));
        assert_eq!(result.keywords, vec!["קשישים", "פנסיה"]);
    }

    #[test]
    fn suggestions_serialize_camel_case() {
        let benefits = vec![benefit("1", "", "", "org", "מענק")];
        let json = serde_json::to_value(rank("מענק", &benefits).unwrap()).unwrap();
        assert_eq!(json["totalMatched"], 1);
        assert!(json.get("total_matched").is_none());
    }

    #[test]
    fn explanation_templates() {
        assert_eq!(
            explain("q", &["ילדים", "משפחה"], 1),
            "מצאתי שירות אחד רלוונטי לשאלה שלכם על ילדים, משפחה."
        );
        assert_eq!(
            explain("q", &[], 1),
            "מצאתי שירות אחד רלוונטי לשאלה שלכם על המילים שלכם."
        );
        assert_eq!(
            explain("q", &["כסף"], 3),
            "מצאתי 3 שירותים רלוונטיים לשאלה שלכם על כסף. השירותים מסודרים לפי רלוונטיות."
        );
    }
}
