use mongodb::bson::Document;

use super::store::QueryPlan;
use crate::models::IndexSpec;

pub const ID_INDEX: &str = "_id_";

/// Picks the index an equality filter would use.
///
/// `_id` equality always uses the primary index. Otherwise the candidate is
/// any non-text index whose leading key is constrained by the filter; the
/// longest constrained key prefix wins and ties go to the index declared
/// first.
pub fn plan_query(collection: &str, indexes: &[IndexSpec], filter: &Document) -> QueryPlan {
    if filter.contains_key("_id") {
        return QueryPlan {
            collection: collection.to_string(),
            index: Some(ID_INDEX.to_string()),
        };
    }

    let mut best: Option<(&IndexSpec, usize)> = None;
    for index in indexes.iter().filter(|i| !i.is_text()) {
        let prefix = index
            .fields()
            .take_while(|field| filter.contains_key(*field))
            .count();
        if prefix == 0 {
            continue;
        }
        match best {
            Some((_, best_prefix)) if best_prefix >= prefix => {}
            _ => best = Some((index, prefix)),
        }
    }

    QueryPlan {
        collection: collection.to_string(),
        index: best.map(|(index, _)| index.name.clone()),
    }
}
