//! Deep merge of bundle maps.
//!
//! Sequences concatenate (base entries first), component tables merge
//! key-wise with the update winning, and component lists union in order.

use super::types::{BundleMap, ComponentSelection};

/// Merge `update` onto `base`, returning the combined map.
///
/// Bundles present only in `update` are appended after the bundles of `base`.
pub fn merge_bundle_maps(base: &BundleMap, update: &BundleMap) -> BundleMap {
    let mut merged = base.clone();

    for (name, desc) in update {
        let entry = merged.entry(name.clone()).or_default();
        entry.assets.extend(desc.assets.iter().cloned());
        entry.pages.extend(desc.pages.iter().cloned());
        entry.components = merge_components(entry.components.take(), desc.components.as_ref());
    }

    merged
}

fn merge_components(
    base: Option<ComponentSelection>,
    update: Option<&ComponentSelection>,
) -> Option<ComponentSelection> {
    let Some(update) = update else {
        return base;
    };
    let Some(base) = base else {
        return Some(update.clone());
    };

    match (base, update) {
        (ComponentSelection::List(mut names), ComponentSelection::List(more)) => {
            for name in more {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Some(ComponentSelection::List(names))
        }
        (base, update) => {
            let mut merged = base.into_map();
            merged.extend(update.clone().into_map());
            Some(ComponentSelection::Map(merged))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{AssetReference, BundleDescriptor};
    use serde_json::json;

    fn map(entries: Vec<(&str, BundleDescriptor)>) -> BundleMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn assets_concatenate_base_first() {
        let base = map(vec![("main", BundleDescriptor::with_assets(["plugin.js"]))]);
        let update = map(vec![("main", BundleDescriptor::with_assets(["user.js"]))]);

        let merged = merge_bundle_maps(&base, &update);
        let paths: Vec<_> = merged["main"].assets.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["plugin.js", "user.js"]);
    }

    #[test]
    fn new_bundles_are_appended_in_order() {
        let base = map(vec![("main", BundleDescriptor::default())]);
        let update = map(vec![
            ("hmr", BundleDescriptor::default()),
            ("main", BundleDescriptor::default()),
        ]);

        let merged = merge_bundle_maps(&base, &update);
        let names: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(names, vec!["main", "hmr"]);
    }

    #[test]
    fn component_lists_union_without_duplicates() {
        let mut a = BundleDescriptor::default();
        a.components = Some(ComponentSelection::List(vec!["nav".into(), "tabs".into()]));
        let mut b = BundleDescriptor::default();
        b.components = Some(ComponentSelection::List(vec!["tabs".into(), "modal".into()]));

        let merged = merge_bundle_maps(&map(vec![("main", a)]), &map(vec![("main", b)]));
        assert_eq!(
            merged["main"].components,
            Some(ComponentSelection::List(vec![
                "nav".into(),
                "tabs".into(),
                "modal".into()
            ]))
        );
    }

    #[test]
    fn component_tables_merge_key_wise() {
        let mut a = BundleDescriptor::default();
        a.components = Some(ComponentSelection::List(vec!["nav".into()]));
        let mut b = BundleDescriptor::default();
        b.components = Some(
            serde_json::from_value(json!({ "nav": false, "tabs": { "vertical": true } })).unwrap(),
        );

        let merged = merge_bundle_maps(&map(vec![("main", a)]), &map(vec![("main", b)]));
        let enabled = merged["main"].components.as_ref().unwrap().enabled();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].0, "tabs");
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let base = map(vec![("main", BundleDescriptor::with_assets([AssetReference::new("a.js")]))]);
        let update = base.clone();
        let _ = merge_bundle_maps(&base, &update);
        assert_eq!(base["main"].assets.len(), 1);
    }
}
