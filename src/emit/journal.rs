//! `journal` keyword emission: the value (already folded with any
//! following `volume` by the restructuring pass into `"J,V"`, or
//! `"J,V,P"` when a page/article-id was present) is split back apart and
//! turned into a title match plus a nested volume/page/artid match.

use serde_json::{json, Value as Json};

use crate::emit::util::generate_match_query;

/// Builds the journal query: a `bool.must` of a title `match` and,
/// when a volume (and optionally page/artid) was folded in, a nested
/// `must` over the volume and a `should` of page/artid matches.
pub fn build_journal_query(value: &str) -> Json {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let title_clause = generate_match_query("publication_info.journal_title", parts[0]);

    if parts.len() == 1 {
        return title_clause;
    }

    let volume_clause = generate_match_query("publication_info.journal_volume", parts[1]);
    let mut must = vec![title_clause, volume_clause];

    if let Some(page_or_artid) = parts.get(2) {
        let page_should = json!({
            "bool": {
                "should": [
                    generate_match_query("publication_info.page_start", page_or_artid),
                    generate_match_query("publication_info.artid", page_or_artid),
                ]
            }
        });
        must.push(page_should);
    }

    json!({ "bool": { "must": must } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_only_is_a_single_match() {
        assert_eq!(
            build_journal_query("Phys.Rev.D"),
            json!({"match": {"publication_info.journal_title": {"query": "Phys.Rev.D", "operator": "and"}}})
        );
    }

    #[test]
    fn journal_and_volume_fold_into_bool_must() {
        let q = build_journal_query("Phys.Rev.D,94");
        assert_eq!(
            q,
            json!({"bool": {"must": [
                {"match": {"publication_info.journal_title": {"query": "Phys.Rev.D", "operator": "and"}}},
                {"match": {"publication_info.journal_volume": {"query": "94", "operator": "and"}}},
            ]}})
        );
    }
}
