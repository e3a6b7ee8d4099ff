/// Audience parsing and consolidation.
///
/// Sheet editors spell the same audience several ways ("עצמאי", "עצמאים/ות", quoted
/// variants exported from merged cells). A small static table groups those
/// spellings under one display name; the same table widens audience filters.
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Benefit, NamedCount};

/// Specific audiences must appear on at least this many benefits to be listed.
pub const MIN_SPECIFIC_COUNT: usize = 3;
/// Cap on specific (non-grouped) audiences in the listing.
pub const MAX_SPECIFIC_AUDIENCES: usize = 15;

/// Audience names too generic to be useful as a filter.
const GENERIC_AUDIENCE_MARKERS: &[&str] = &["כולם", "אנשים פרטיים"];

/// Display name of an audience group → substrings that identify it.
pub static AUDIENCE_GROUPS: &[(&str, &[&str])] = &[
    ("משרתי מילואים", &["משרתי מילואים", "משרת מילואים", "מילואים"]),
    ("עצמאים/ות", &["עצמאים/ות", "עצמאיות", "עצמאי"]),
    ("בעלי עסקים", &["מעסיקים", "בעלי עסקים", "בעל עסק"]),
    ("נפגעי פעולות איבה", &["נפגעי פעולות איבה", "נפגעי איבה"]),
    ("נפגעי גוף/נפש", &["נפגעי גוף / נפש", "נפגעי גוף", "נפגעי נפש"]),
    ("תקועים בחו\"ל", &["תקועים בחו", "\"תקועים בחו", "\"\"תקועים בחו"]),
    ("נפגעי רכוש", &["נפגע בית", "נפגע רכב", "נפגע עסק", "נפגעי רכוש"]),
];

static OUTER_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^["']|["']$"#).expect("valid regex"));
static REPEATED_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""{2,}"#).expect("valid regex"));

/// Aliases of an audience group, or `None` if `name` is not a group.
pub fn group_aliases(name: &str) -> Option<&'static [&'static str]> {
    AUDIENCE_GROUPS
        .iter()
        .find(|(group, _)| *group == name)
        .map(|(_, aliases)| *aliases)
}

/// Strip one outer quote on each side, collapse runs of double quotes, trim.
pub fn clean_audience_name(audience: &str) -> String {
    let unquoted = OUTER_QUOTES.replace_all(audience, "");
    REPEATED_QUOTES.replace_all(&unquoted, "\"").trim().to_string()
}

/// Split a target audience cell into cleaned, non-empty names.
pub fn parse_audiences(target_audience: &str) -> Vec<String> {
    target_audience
        .split(',')
        .map(clean_audience_name)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Whether a benefit is for `audience`.
///
/// Plain names match as a case-insensitive substring of the target audience.
/// Group names match if any of the group's aliases occurs.
pub fn matches_audience(benefit: &Benefit, audience: &str) -> bool {
    let target = benefit.target_audience.to_lowercase();
    match group_aliases(audience) {
        Some(aliases) => {
            aliases.iter().any(|alias| target.contains(alias)) || target.contains(&audience.to_lowercase())
        }
        None => target.contains(&audience.to_lowercase()),
    }
}

/// Count names, ignoring blanks, then sort by count descending.
///
/// Ties keep the order in which names were first seen.
pub fn count_names<I>(names: I) -> Vec<NamedCount>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<NamedCount> = Vec::new();

    for name in names {
        if name.is_empty() {
            continue;
        }
        match index.get(&name) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name.clone(), counts.len());
                counts.push(NamedCount { name, count: 1 });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Audience listing: consolidated groups plus the most common specific audiences.
pub fn audiences(benefits: &[Benefit]) -> Vec<NamedCount> {
    let all = count_names(benefits.iter().flat_map(|b| parse_audiences(&b.target_audience)));

    let groups: Vec<NamedCount> = AUDIENCE_GROUPS
        .iter()
        .map(|(group, aliases)| NamedCount {
            name: group.to_string(),
            count: all
                .iter()
                .filter(|a| aliases.iter().any(|alias| a.name.contains(alias)))
                .map(|a| a.count)
                .sum(),
        })
        .filter(|g| g.count > 0)
        .collect();

    let specific = all
        .iter()
        .filter(|a| {
            a.count >= MIN_SPECIFIC_COUNT
                && !GENERIC_AUDIENCE_MARKERS.iter().any(|m| a.name.contains(m))
        })
        .take(MAX_SPECIFIC_AUDIENCES)
        .filter(|a| {
            !groups.iter().any(|g| {
                group_aliases(&g.name)
                    .is_some_and(|aliases| aliases.iter().any(|alias| a.name.contains(alias)))
            })
        })
        .cloned();

    let mut listing: Vec<NamedCount> = groups.iter().cloned().chain(specific).collect();
    listing.sort_by(|a, b| b.count.cmp(&a.count));
    listing
}
