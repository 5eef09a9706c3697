// src/ingest/mod.rs
pub mod providers;
pub mod types;

use anyhow::{bail, Result};

/// X recent search rejects queries longer than this.
pub const MAX_QUERY_LEN: usize = 512;

/// OR-combine search terms into one query string.
/// Blank terms are skipped; the result must fit `MAX_QUERY_LEN`.
pub fn build_query<S: AsRef<str>>(terms: &[S]) -> Result<String> {
    let parts: Vec<&str> = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        bail!("no search terms configured");
    }
    let query = parts.join(" OR ");
    let len = query.chars().count();
    if len > MAX_QUERY_LEN {
        bail!("combined search query is {len} chars, limit is {MAX_QUERY_LEN}");
    }
    Ok(query)
}

/// Decode HTML entities the search API leaves in post text and trim it.
/// Line breaks are kept so the notification reads like the post.
pub fn normalize_text(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_joins_with_or_and_skips_blanks() {
        let q = build_query(&["#hiring", " ", "#DevOps "]).unwrap();
        assert_eq!(q, "#hiring OR #DevOps");
    }

    #[test]
    fn query_rejects_empty_and_overlong() {
        let empty: [&str; 0] = [];
        assert!(build_query(&empty).is_err());

        let long: Vec<String> = (0..100).map(|i| format!("#keyword{i}")).collect();
        let err = build_query(&long).unwrap_err().to_string();
        assert!(err.contains("limit is 512"), "{err}");
    }

    #[test]
    fn normalize_decodes_entities() {
        assert_eq!(
            normalize_text("  R&amp;D role &gt; apply\nnow "),
            "R&D role > apply\nnow"
        );
    }
}
