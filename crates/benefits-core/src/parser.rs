/// Parser for the benefits sheet CSV export.
///
/// The export has a loose structure:
/// - Zero or more preamble rows (titles, notes, blank lines)
/// - A header row, recognised by a cell containing `Post ID`
/// - Data rows with at least eight positional columns
///
/// Parser approach: a quote-aware CSV tokenizer produces raw rows, then rows after the
/// header are mapped positionally onto `Benefit`. Incomplete rows are skipped; the
/// parser never panics.
use tracing::debug;

use crate::error::SourceError;
use crate::model::Benefit;

/// Marker text identifying the real header row.
pub const HEADER_MARKER: &str = "Post ID";
/// Data rows shorter than this are discarded.
pub const MIN_COLUMNS: usize = 8;

/// Parse a whole CSV export into benefits, in document order.
///
/// Fails with `SourceError::Parse` if no row contains [`HEADER_MARKER`].
pub fn parse_benefits(text: &str) -> Result<Vec<Benefit>, SourceError> {
    let rows = parse_rows(text);

    let header_index = rows
        .iter()
        .position(|row| row.iter().any(|cell| cell.contains(HEADER_MARKER)))
        .ok_or_else(|| {
            SourceError::Parse(format!("header not found: no row contains {HEADER_MARKER:?}"))
        })?;

    let data_rows = &rows[header_index + 1..];
    let benefits: Vec<Benefit> = data_rows.iter().filter_map(|row| row_to_benefit(row)).collect();

    debug!(
        header_row = header_index,
        data_rows = data_rows.len(),
        kept = benefits.len(),
        "parsed benefits sheet"
    );
    Ok(benefits)
}

/// Map one data row onto a `Benefit`, or `None` if the row should be skipped.
///
/// A row is kept only if it has at least [`MIN_COLUMNS`] cells, a non-blank id, and
/// either an organisation or details.
pub fn row_to_benefit(row: &[String]) -> Option<Benefit> {
    if row.len() < MIN_COLUMNS || row.iter().all(|cell| cell.trim().is_empty()) {
        return None;
    }

    let cell = |i: usize| row.get(i).map(|c| c.trim().to_string()).unwrap_or_default();

    let benefit = Benefit {
        id: cell(0),
        target_audience: cell(1),
        category: cell(2),
        subcategory: cell(3),
        organization: cell(4),
        details_link: cell(5),
        last_updated: cell(6),
        details: cell(7),
    };

    if benefit.id.is_empty() || (benefit.organization.is_empty() && benefit.details.is_empty()) {
        return None;
    }
    Some(benefit)
}

/// Split CSV text into rows of cells.
///
/// Fields are comma separated and may be wrapped in double quotes. Inside quotes a
/// doubled quote is a literal `"`, and commas and line breaks are part of the field.
/// Both `\n` and `\r\n` end a row. An unterminated quote runs to end of input.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    // Last row without a trailing newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
רשימת הטבות,,,,,,,
עודכן לאחרונה,,,,,,,
Post ID,למי זה,קטגוריה,תת קטגוריה,שם המשרד/הארגון,לינק לפרטים,מתי עודכן,פרטים
101,\"הורים, משפחות\",משפחה וילדים,מענקים,ביטוח לאומי,https://example.org/101,01/10/2024,מענק חד פעמי להורים
102,עצמאים,עסקים,הלוואות,קרן הסיוע,https://example.org/102,02/10/2024,\"הלוואה בערבות מדינה, בתנאים מועדפים\"
,עצמאים,עסקים,,משרד הכלכלה,,,ללא מזהה
103,קשישים,בריאות,,,,,
,,,,,,,
104,נכים,בריאות
105,  נפגעי פעולות איבה  ,חירום,,  משרד הביטחון  ,,,  פיצוי
";

    #[test]
    fn test_parse_rows_handles_quotes() {
        let rows = parse_rows("a,\"b,c\",\"say \"\"hi\"\"\"\n1,2,3");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b,c", "say \"hi\""]);
        assert_eq!(rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_parse_rows_multiline_quoted_field() {
        let rows = parse_rows("1,\"first line\nsecond line\",x\r\n2,y,z\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "first line\nsecond line");
        assert_eq!(rows[1], vec!["2", "y", "z"]);
    }

    #[test]
    fn test_parse_rows_keeps_empty_trailing_fields() {
        let rows = parse_rows("a,,\n");
        assert_eq!(rows, vec![vec!["a".to_string(), String::new(), String::new()]]);
    }

    #[test]
    fn test_parse_benefits_skips_preamble_and_bad_rows() {
        let benefits = parse_benefits(SHEET).unwrap();
        let ids: Vec<&str> = benefits.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102", "105"]);

        let first = &benefits[0];
        assert_eq!(first.target_audience, "הורים, משפחות");
        assert_eq!(first.category, "משפחה וילדים");
        assert_eq!(first.subcategory, "מענקים");
        assert_eq!(first.organization, "ביטוח לאומי");
        assert_eq!(first.details_link, "https://example.org/101");
        assert_eq!(first.last_updated, "01/10/2024");
        assert_eq!(first.details, "מענק חד פעמי להורים");

        assert_eq!(benefits[1].details, "הלוואה בערבות מדינה, בתנאים מועדפים");
    }

    #[test]
    fn test_parse_benefits_trims_fields() {
        let benefits = parse_benefits(SHEET).unwrap();
        let last = benefits.last().unwrap();
        assert_eq!(last.target_audience, "נפגעי פעולות איבה");
        assert_eq!(last.organization, "משרד הביטחון");
        assert_eq!(last.details, "פיצוי");
    }

    #[test]
    fn test_missing_header_is_parse_error() {
        let err = parse_benefits("id,name\n1,foo,,,,,,,\n").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
        assert!(!err.is_fetch());
    }

    #[test]
    fn test_header_only_yields_no_benefits() {
        let benefits = parse_benefits("Post ID,a,b,c,d,e,f,g\n").unwrap();
        assert!(benefits.is_empty());
    }

    #[test]
    fn test_row_to_benefit_rules() {
        let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();

        assert!(row_to_benefit(&row(&["1", "a", "b", "c", "org", "e", "f"])).is_none());
        assert!(row_to_benefit(&row(&["", "", "", "", "", "", "", ""])).is_none());
        assert!(row_to_benefit(&row(&["  ", "a", "b", "c", "org", "e", "f", "g"])).is_none());
        assert!(row_to_benefit(&row(&["1", "a", "b", "c", "", "e", "f", ""])).is_none());

        let only_details = row_to_benefit(&row(&["1", "", "", "", "", "", "", "פרטים"])).unwrap();
        assert_eq!(only_details.details, "פרטים");

        let extra_columns =
            row_to_benefit(&row(&["2", "a", "b", "c", "org", "e", "f", "g", "extra"])).unwrap();
        assert_eq!(extra_columns.details, "g");
    }

    #[test]
    fn test_duplicate_ids_are_preserved() {
        let text = "Post ID,,,,,,,\n1,,,,org a,,,\n1,,,,org b,,,\n";
        let benefits = parse_benefits(text).unwrap();
        assert_eq!(benefits.len(), 2);
        assert_eq!(benefits[1].organization, "org b");
    }
}
