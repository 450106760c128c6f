//! Find-clause normalization.

/// Clauses appended as-is instead of behind ` WHERE `.
const TRAILING_KEYWORDS: [&str; 3] = ["ORDER BY", "LIMIT", "GROUP BY"];

/// Turn a find fragment into a SQL suffix.
///
/// Absent or empty fragments yield `""`. Fragments starting with `ORDER BY`,
/// `LIMIT` or `GROUP BY` (case-sensitive) are returned behind a single space;
/// anything else becomes ` WHERE <fragment>`. The fragment text is trusted:
/// nothing is escaped.
pub fn normalize(fragment: Option<&str>) -> String {
    match fragment {
        None | Some("") => String::new(),
        Some(text) if TRAILING_KEYWORDS.iter().any(|kw| text.starts_with(kw)) => {
            format!(" {}", text)
        }
        Some(text) => format!(" WHERE {}", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fragment() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("")), "");
    }

    #[test]
    fn test_condition_gets_where() {
        assert_eq!(normalize(Some("id = ?")), " WHERE id = ?");
        assert_eq!(
            normalize(Some("id > ? ORDER BY id LIMIT 2")),
            " WHERE id > ? ORDER BY id LIMIT 2"
        );
    }

    #[test]
    fn test_trailing_clauses_pass_through() {
        assert_eq!(normalize(Some("ORDER BY id DESC")), " ORDER BY id DESC");
        assert_eq!(normalize(Some("LIMIT 1")), " LIMIT 1");
        assert_eq!(normalize(Some("GROUP BY kind")), " GROUP BY kind");
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        assert_eq!(normalize(Some("limit 1")), " WHERE limit 1");
        assert_eq!(normalize(Some(" LIMIT 1")), " WHERE  LIMIT 1");
    }
}
