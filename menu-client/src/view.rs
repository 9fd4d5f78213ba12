//! Pure view derivations over a [`MenuDocument`]
//!
//! Nothing here mutates its input; every function returns fresh values.

use shared::models::sort_categories;
use shared::{Category, Language, LocalizedText, MenuDocument, Product};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A product tagged with where it sits in the menu tree
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub product: Product,
    /// Main (or top-level) category the item is shown under
    pub category_id: String,
    pub category_name: LocalizedText,
    /// Set when the item belongs to a subcategory of `category_id`
    pub subcategory_id: Option<String>,
    pub subcategory_name: Option<LocalizedText>,
}

impl MenuItem {
    /// Id of the category that directly owns the product
    pub fn owner_id(&self) -> &str {
        self.subcategory_id.as_deref().unwrap_or(&self.category_id)
    }

    /// Display name of the owning category
    pub fn owner_name(&self, lang: Language) -> &str {
        self.subcategory_name
            .as_ref()
            .unwrap_or(&self.category_name)
            .get(lang)
    }

    pub fn name(&self, lang: Language) -> &str {
        self.product.name.get(lang)
    }
}

/// Subcategory filter; `all` (or an empty string) means no filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SubcategoryFilter {
    #[default]
    All,
    Only(String),
}

impl SubcategoryFilter {
    pub const ALL_TOKEN: &'static str = "all";

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == Self::ALL_TOKEN {
            SubcategoryFilter::All
        } else {
            SubcategoryFilter::Only(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubcategoryFilter::All => Self::ALL_TOKEN,
            SubcategoryFilter::Only(id) => id,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SubcategoryFilter::All)
    }
}

impl fmt::Display for SubcategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn tag(
    out: &mut Vec<MenuItem>,
    items: &[Product],
    main: &Category,
    sub: Option<&Category>,
) {
    out.extend(items.iter().filter(|p| p.available).map(|p| MenuItem {
        product: p.clone(),
        category_id: main.id.clone(),
        category_name: main.name.clone(),
        subcategory_id: sub.map(|s| s.id.clone()),
        subcategory_name: sub.map(|s| s.name.clone()),
    }));
}

/// Every available product, tagged with its owning category.
///
/// Categories whose `parentPage` points at an existing main category are
/// tagged as subcategories of it.
pub fn flatten_products(doc: &MenuDocument) -> Vec<MenuItem> {
    let mut out = Vec::new();
    for category in &doc.categories {
        let parent = category
            .parent_page
            .as_deref()
            .filter(|p| *p != category.id)
            .and_then(|p| doc.categories.iter().find(|c| c.id == p));

        match parent {
            Some(main) => tag(&mut out, &category.items, main, Some(category)),
            None => tag(&mut out, &category.items, category, None),
        }
        for sub in &category.subcategories {
            let main = parent.unwrap_or(category);
            tag(&mut out, &sub.items, main, Some(sub));
        }
    }
    out
}

/// Available products shown under a main category: its own items, nested
/// subcategories and `parentPage`-linked categories.
pub fn products_for_main_category(doc: &MenuDocument, main_id: &str) -> Vec<MenuItem> {
    flatten_products(doc)
        .into_iter()
        .filter(|item| item.category_id == main_id || item.owner_id() == main_id)
        .collect()
}

/// Keep items owned by the selected subcategory; `All` keeps everything
pub fn filter_by_subcategory(items: &[MenuItem], filter: &SubcategoryFilter) -> Vec<MenuItem> {
    match filter {
        SubcategoryFilter::All => items.to_vec(),
        SubcategoryFilter::Only(id) => filter_by_any_subcategory(items, &[id.as_str()]),
    }
}

/// Keep items owned by any of `ids` (combined filters such as cocktails + mocktails)
pub fn filter_by_any_subcategory(items: &[MenuItem], ids: &[&str]) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| ids.contains(&item.owner_id()))
        .cloned()
        .collect()
}

/// Lowercased `name description brand ingredients`, missing fields skipped
fn search_haystack(product: &Product, lang: Language) -> String {
    let fields = [
        Some(product.name.get(lang)),
        product.description.as_ref().map(|t| t.get(lang)),
        product.brand.as_deref(),
        product.ingredients.as_ref().map(|t| t.get(lang)),
    ];
    fields
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive substring search over the joined name, description,
/// brand and ingredients. A blank query returns the input unchanged.
pub fn filter_by_search(items: &[MenuItem], query: &str, lang: Language) -> Vec<MenuItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| search_haystack(&item.product, lang).contains(&needle))
        .cloned()
        .collect()
}

/// Group items by a display key, groups sorted by key, item order preserved
pub fn group_by_category<F>(items: &[MenuItem], key_fn: F) -> Vec<(String, Vec<MenuItem>)>
where
    F: Fn(&MenuItem) -> String,
{
    let mut groups: BTreeMap<String, Vec<MenuItem>> = BTreeMap::new();
    for item in items {
        groups.entry(key_fn(item)).or_default().push(item.clone());
    }
    groups.into_iter().collect()
}

/// Main categories by `sortOrder` (missing = 999), document order for ties
pub fn main_categories(doc: &MenuDocument) -> Vec<&Category> {
    let mut mains: Vec<&Category> = doc
        .categories
        .iter()
        .filter(|c| c.is_main_category)
        .collect();
    sort_categories(&mut mains);
    mains
}

/// Nested subcategories of `main_id` followed by `parentPage`-linked ones
pub fn subcategories_of<'a>(doc: &'a MenuDocument, main_id: &str) -> Vec<&'a Category> {
    let mut subs: Vec<&Category> = doc
        .categories
        .iter()
        .filter(|c| c.id == main_id)
        .flat_map(|c| c.subcategories.iter())
        .chain(
            doc.categories
                .iter()
                .filter(|c| c.id != main_id && c.parent_page.as_deref() == Some(main_id)),
        )
        .collect();
    sort_categories(&mut subs);
    subs
}

pub fn find_category<'a>(doc: &'a MenuDocument, id: &str) -> Option<&'a Category> {
    doc.find_category(id)
}

/// Branded items first, ordered by brand then name (case-insensitive)
pub fn sort_by_brand(items: &[MenuItem], lang: Language) -> Vec<MenuItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by_cached_key(|item| {
        let brand = item.product.brand.as_deref().map(str::to_lowercase);
        (brand.is_none(), brand, item.name(lang).to_lowercase())
    });
    sorted
}

/// Distinct brands, sorted
pub fn available_brands(items: &[MenuItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.product.brand.as_deref())
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::bundled_menu;

    fn ids(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.product.id.as_str()).collect()
    }

    /// Main category A with items a1, a2 and nested subcategory S with s1
    /// (available) and s2 (unavailable); unrelated main B with b1.
    fn scenario_doc() -> MenuDocument {
        let json = r#"{"categories":[
            {"id":"A","name":"A","isMainCategory":true,
             "items":[{"id":"a1","name":"a1"},{"id":"a2","name":"a2"}],
             "subcategories":[{"id":"S","name":"S","items":[
                {"id":"s1","name":"s1"},{"id":"s2","name":"s2","available":false}]}]},
            {"id":"B","name":"B","isMainCategory":true,"items":[{"id":"b1","name":"b1"}]}
        ]}"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_products_for_main_category_includes_nested() {
        let doc = scenario_doc();
        let items = products_for_main_category(&doc, "A");
        assert_eq!(ids(&items), ["a1", "a2", "s1"]);

        let s1 = &items[2];
        assert_eq!(s1.category_id, "A");
        assert_eq!(s1.subcategory_id.as_deref(), Some("S"));
        assert_eq!(s1.owner_id(), "S");

        let only_s = filter_by_subcategory(&items, &SubcategoryFilter::parse("S"));
        assert_eq!(ids(&only_s), ["s1"]);
    }

    #[test]
    fn test_all_filter_is_identity() {
        let items = flatten_products(&scenario_doc());
        assert_eq!(filter_by_subcategory(&items, &SubcategoryFilter::All), items);
        assert_eq!(SubcategoryFilter::parse(""), SubcategoryFilter::All);
        assert_eq!(SubcategoryFilter::parse("all"), SubcategoryFilter::All);
    }

    #[test]
    fn test_flatten_excludes_unavailable() {
        let items = flatten_products(&scenario_doc());
        assert!(items.iter().all(|i| i.product.available));
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_parent_page_linked_categories_become_subcategories() {
        let doc = bundled_menu();
        let drinks = products_for_main_category(&doc, "drinks");
        let owners: BTreeSet<&str> = drinks.iter().map(|i| i.owner_id()).collect();
        assert_eq!(
            owners.into_iter().collect::<Vec<_>>(),
            ["cocktails", "hot-drinks", "mocktails", "softdrinks"]
        );
        assert!(drinks.iter().all(|i| i.category_id == "drinks"));
        // Caipirinha is unavailable
        assert!(!ids(&drinks).contains(&"cocktail-2"));
    }

    #[test]
    fn test_combined_filter() {
        let doc = bundled_menu();
        let drinks = products_for_main_category(&doc, "drinks");
        let combined = filter_by_any_subcategory(&drinks, &["cocktails", "mocktails"]);
        assert_eq!(ids(&combined), ["cocktail-1", "mocktail-1"]);
    }

    #[test]
    fn test_search_blank_is_identity() {
        let items = flatten_products(&bundled_menu());
        assert_eq!(filter_by_search(&items, "   ", Language::De), items);
    }

    #[test]
    fn test_search_fields_and_language_fallback() {
        let items = flatten_products(&bundled_menu());

        let by_brand = filter_by_search(&items, "al fakher", Language::En);
        assert_eq!(ids(&by_brand), ["shisha-1", "shisha-3"]);

        // English description
        let by_desc = filter_by_search(&items, "CHEESE", Language::En);
        assert_eq!(ids(&by_desc), ["snack-1"]);

        // Danish missing, falls back to German
        let by_german = filter_by_search(&items, "käsesauce", Language::Da);
        assert_eq!(ids(&by_german), ["snack-1"]);

        let by_ingredient = filter_by_search(&items, "rohrzucker", Language::De);
        assert_eq!(ids(&by_ingredient), ["soft-2"]);
    }

    fn drinks_doc() -> MenuDocument {
        let json = r#"{"categories":[
            {"id":"drinks","name":"Drinks","isMainCategory":true,"items":[
                {"id":"m","name":"Mojito","description":{"de":"Minze Limette"}},
                {"id":"c","name":"Cola","brand":"Coca"}]}
        ]}"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = flatten_products(&drinks_doc());
        assert_eq!(ids(&filter_by_search(&items, "moji", Language::En)), ["m"]);
        assert_eq!(ids(&filter_by_search(&items, "MOJI", Language::En)), ["m"]);
    }

    #[test]
    fn test_search_spans_fields() {
        let items = flatten_products(&drinks_doc());
        assert_eq!(ids(&filter_by_search(&items, "mojito minze", Language::En)), ["m"]);
        assert_eq!(ids(&filter_by_search(&items, "cola coca", Language::De)), ["c"]);
        assert!(filter_by_search(&items, "minze mojito", Language::De).is_empty());
    }

    #[test]
    fn test_nested_subcategory_products_belong_to_main() {
        let json = r#"{"categories":[
            {"id":"shisha","name":"Shisha","isMainCategory":true,"items":[],
             "subcategories":[{"id":"5","name":"Standard","items":[
                {"id":"p1","name":"Apfel","available":true,"price":10}]}]}
        ]}"#;
        let doc: MenuDocument = serde_json::from_str(json).unwrap();
        let items = products_for_main_category(&doc, "shisha");
        assert_eq!(ids(&items), ["p1"]);
        assert_eq!(items[0].owner_id(), "5");
    }

    #[test]
    fn test_group_by_category_sorted_by_name() {
        let doc = bundled_menu();
        let items = products_for_main_category(&doc, "drinks");
        let groups = group_by_category(&items, |i| i.owner_name(Language::En).to_string());
        let names: Vec<&str> = groups.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Cocktails", "Mocktails", "Soft Drinks", "Tea & Coffee"]);
        assert_eq!(groups[2].1.len(), 2);
    }

    #[test]
    fn test_main_categories_sorted() {
        let doc = bundled_menu();
        let mains: Vec<&str> = main_categories(&doc).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(mains, ["shisha", "drinks", "snacks"]);
    }

    #[test]
    fn test_subcategories_of() {
        let doc = bundled_menu();
        let shisha: Vec<&str> = subcategories_of(&doc, "shisha")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(shisha, ["shisha-standard", "shisha-premium"]);

        let drinks = subcategories_of(&doc, "drinks");
        assert_eq!(drinks.len(), 4);
        assert!(subcategories_of(&doc, "snacks").is_empty());
    }

    #[test]
    fn test_sort_by_brand_and_brands() {
        let doc = bundled_menu();
        let shisha = products_for_main_category(&doc, "shisha");
        let sorted = sort_by_brand(&shisha, Language::De);
        assert_eq!(ids(&sorted), ["shisha-2", "shisha-1", "shisha-3", "shisha-10"]);
        assert_eq!(available_brands(&shisha), ["Adalya", "Al Fakher", "Darkside"]);
    }

    #[test]
    fn test_derivations_do_not_mutate_input() {
        let doc = bundled_menu();
        let before = doc.clone();
        let items = flatten_products(&doc);
        let _ = sort_by_brand(&items, Language::De);
        let _ = filter_by_search(&items, "mint", Language::En);
        assert_eq!(doc, before);
    }
}
