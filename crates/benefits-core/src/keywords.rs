/// Static Hebrew topic lexicon used by the suggestion scorer.
///
/// Each entry maps a canonical keyword to the substrings that count as a mention of
/// it. Entries are grouped by topic; the table order is also the order in which
/// extracted keywords are reported.
pub static KEYWORD_SYNONYMS: &[(&str, &[&str])] = &[
    // Family and children
    ("ילדים", &["ילדים", "ילד", "ילדה", "משפחה", "הורים", "חינוך"]),
    ("משפחה", &["משפחה", "ילדים", "הורים", "זוג", "נישואין"]),
    ("הורים", &["הורים", "אמא", "אבא", "ילדים", "משפחה"]),
    // Business and employment
    ("עסק", &["עסק", "עסקים", "עצמאי", "עצמאים", "מעסיק", "עובד", "תעסוקה"]),
    ("עבודה", &["עבודה", "תעסוקה", "עובד", "מעסיק", "משכורת", "פיטורין"]),
    ("עצמאי", &["עצמאי", "עצמאים", "עסק", "עסקים", "פרילנסר"]),
    // Health and disability
    ("בריאות", &["בריאות", "רפואה", "רופא", "בית חולים", "מחלה", "טיפול"]),
    ("נכות", &["נכות", "נכה", "נפגע", "פגיעה", "נכים", "נגישות"]),
    ("נפש", &["נפש", "נפשי", "פסיכולוגי", "דיכאון", "חרדה", "טיפול נפשי"]),
    // Housing and property
    ("דיור", &["דיור", "בית", "דירה", "שכירות", "משכנתא", "מגורים"]),
    ("בית", &["בית", "דירה", "דיור", "מגורים", "נדלן", "נזק"]),
    // Financial assistance
    ("כסף", &["כסף", "כספי", "תשלום", "מענק", "הלוואה", "סיוע כלכלי"]),
    ("מענק", &["מענק", "תמיכה", "סיוע", "כסף", "תשלום"]),
    ("הלוואה", &["הלוואה", "אשראי", "כסף", "מימון", "בנק"]),
    // Emergency and war
    ("מלחמה", &["מלחמה", "חירום", "פגיעה", "נפגע", "מילואים", "ביטחון"]),
    ("חירום", &["חירום", "מלחמה", "אסון", "פגיעה", "נפגע"]),
    ("מילואים", &["מילואים", "מילואימניק", "צבא", "שירות", "חירום"]),
    // Women and gender
    ("נשים", &["נשים", "אישה", "נשי", "אמהות", "מגדר"]),
    ("אישה", &["אישה", "נשים", "נשי", "אמא", "מגדר"]),
    // Elderly
    ("קשישים", &["קשישים", "קשיש", "זקנים", "גיל שלישי", "פנסיה"]),
    ("פנסיה", &["פנסיה", "פנסיונר", "קשישים", "זקנה", "גמלאות"]),
    // Legal and rights
    ("זכויות", &["זכויות", "חוק", "משפט", "תביעה", "הגנה"]),
    ("תביעה", &["תביעה", "תביעות", "משפט", "פיצוי", "זכויות"]),
    // Education
    ("חינוך", &["חינוך", "לימודים", "בית ספר", "סטודנט", "השכלה"]),
    ("לימודים", &["לימודים", "חינוך", "סטודנט", "אוניברסיטה", "השכלה"]),
];

/// Synonyms of a canonical keyword, or `None` if it is not in the table.
pub fn synonyms_of(keyword: &str) -> Option<&'static [&'static str]> {
    KEYWORD_SYNONYMS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, synonyms)| *synonyms)
}

/// Canonical keywords mentioned in `text`, unique and in table order.
///
/// A keyword is mentioned when any of its synonyms occurs as a substring of the
/// lower-cased, trimmed text. No tokenisation or stemming is applied.
pub fn extract_keywords(text: &str) -> Vec<&'static str> {
    let text_lower = text.trim().to_lowercase();
    KEYWORD_SYNONYMS
        .iter()
        .filter(|(_, synonyms)| synonyms.iter().any(|s| text_lower.contains(s)))
        .map(|(keyword, _)| *keyword)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keys_are_unique() {
        for (i, (keyword, _)) in KEYWORD_SYNONYMS.iter().enumerate() {
            assert!(
                KEYWORD_SYNONYMS[i + 1..].iter().all(|(k, _)| k != keyword),
                "duplicate keyword {keyword}"
            );
        }
    }

    #[test]
    fn every_keyword_is_its_own_synonym() {
        for (keyword, synonyms) in KEYWORD_SYNONYMS {
            assert!(synonyms.contains(keyword), "{keyword} missing from its synonyms");
        }
    }

    #[test]
    fn children_query_cross_hits_family() {
        let keywords = extract_keywords("ילדים");
        assert!(keywords.contains(&"ילדים"));
        assert!(keywords.contains(&"משפחה"));
        assert!(keywords.contains(&"הורים"));
    }

    #[test]
    fn keywords_follow_table_order() {
        let keywords = extract_keywords("  הלוואה לעסק קטן ");
        assert_eq!(keywords, vec!["עסק", "עצמאי", "כסף", "הלוואה"]);
    }

    #[test]
    fn no_keywords_for_unrelated_text() {
        assert!(extract_keywords("hello world").is_empty());
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn synonyms_lookup() {
        assert_eq!(synonyms_of("נפש").map(|s| s.len()), Some(6));
        assert!(synonyms_of("לא קיים").is_none());
    }
}
