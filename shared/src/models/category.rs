//! Category Model

use super::product::Product;
use super::text::{Language, LocalizedText};
use super::{merge_shallow, null_as_empty, string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Sort position for categories without an explicit `sortOrder`
pub const DEFAULT_SORT_ORDER: i64 = 999;

/// Category entity
///
/// Main categories appear on the home screen; subcategories are either
/// nested in `subcategories` or linked through `parentPage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub is_main_category: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub subcategories: Vec<Category>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    /// Fields not modeled here (icon, image, color, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<LocalizedText>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_main_category: false,
            parent_page: None,
            subcategories: Vec::new(),
            items: Vec::new(),
            sort_order: None,
            extra: Map::new(),
        }
    }

    pub fn main(id: impl Into<String>, name: impl Into<LocalizedText>) -> Self {
        Self {
            is_main_category: true,
            ..Self::new(id, name)
        }
    }

    pub fn display_name(&self, lang: Language) -> &str {
        self.name.get(lang)
    }

    pub fn effective_sort_order(&self) -> i64 {
        self.sort_order.unwrap_or(DEFAULT_SORT_ORDER)
    }

    /// Own items plus items of nested subcategories
    pub fn product_count(&self) -> usize {
        self.items.len()
            + self
                .subcategories
                .iter()
                .map(|s| s.product_count())
                .sum::<usize>()
    }

    pub fn has_products(&self) -> bool {
        self.product_count() > 0
    }

    pub fn find_product(&self, item_id: &str) -> Option<&Product> {
        self.items.iter().find(|p| p.id == item_id)
    }

    /// Apply a partial JSON update; id, items and nested subcategories are kept.
    pub fn merged(&self, patch: &Map<String, Value>) -> serde_json::Result<Category> {
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merge_shallow(&mut current, patch);
        current.insert("id".to_string(), Value::String(self.id.clone()));
        current.remove("items");
        current.remove("subcategories");

        let mut updated: Category = serde_json::from_value(Value::Object(current))?;
        updated.items = self.items.clone();
        updated.subcategories = self.subcategories.clone();
        Ok(updated)
    }
}

/// Create category payload; the caller picks the id
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_category_create"))]
pub struct CategoryCreate {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub is_main_category: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CategoryCreate {
    /// New categories start without products
    pub fn into_category(self) -> Category {
        Category {
            id: self.id.trim().to_string(),
            name: self.name,
            description: self.description,
            is_main_category: self.is_main_category,
            parent_page: self.parent_page,
            subcategories: Vec::new(),
            items: Vec::new(),
            sort_order: self.sort_order,
            extra: self.extra,
        }
    }
}

fn validate_category_create(c: &CategoryCreate) -> Result<(), ValidationError> {
    if c.id.trim().is_empty() {
        return Err(ValidationError::new("id_required"));
    }
    if c.name.is_blank() {
        return Err(ValidationError::new("name_required"));
    }
    Ok(())
}

/// Sort categories by `sortOrder` (missing = 999), keeping document order for ties
pub fn sort_categories(categories: &mut [&Category]) {
    categories.sort_by_key(|c| c.effective_sort_order());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_nested_and_unknown_fields() {
        let json = r#"{
            "id": "drinks",
            "name": {"de": "Getränke", "en": "Drinks"},
            "isMainCategory": true,
            "icon": "🍹",
            "subcategories": [{"id": "softdrinks", "name": "Softdrinks", "items": []}],
            "items": null
        }"#;
        let c: Category = serde_json::from_str(json).unwrap();
        assert!(c.is_main_category);
        assert_eq!(c.subcategories.len(), 1);
        assert!(c.items.is_empty());
        assert_eq!(c.extra["icon"], "🍹");
        assert_eq!(c.effective_sort_order(), DEFAULT_SORT_ORDER);
    }

    #[test]
    fn test_product_count_includes_nested() {
        let mut shisha = Category::main("shisha", "Shisha");
        shisha.items.push(Product::new("1", "Double Apple"));
        let mut standard = Category::new("shisha-standard", "Standard");
        standard.items.push(Product::new("2", "Mint"));
        standard.items.push(Product::new("3", "Grape"));
        shisha.subcategories.push(standard);

        assert_eq!(shisha.product_count(), 3);
        assert!(shisha.has_products());
        assert!(!Category::new("empty", "Empty").has_products());
    }

    #[test]
    fn test_merged_preserves_items() {
        let mut c = Category::main("snacks", "Snacks");
        c.items.push(Product::new("1", "Nachos"));

        let patch: Map<String, Value> =
            serde_json::from_str(r##"{"name":"Knabbereien","items":[],"color":"#fff"}"##).unwrap();
        let updated = c.merged(&patch).unwrap();

        assert_eq!(updated.name, LocalizedText::from("Knabbereien"));
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.extra["color"], "#fff");
        assert!(updated.is_main_category);
    }

    #[test]
    fn test_create_requires_id_and_name() {
        let ok: CategoryCreate = serde_json::from_str(r#"{"id":"tea","name":"Tee"}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert!(ok.into_category().items.is_empty());

        let no_id: CategoryCreate = serde_json::from_str(r#"{"id":"","name":"Tee"}"#).unwrap();
        assert!(no_id.validate().is_err());

        let no_name: CategoryCreate = serde_json::from_str(r#"{"id":"tea","name":""}"#).unwrap();
        assert!(no_name.validate().is_err());

        assert!(serde_json::from_str::<CategoryCreate>(r#"{"name":"Tee"}"#).is_err());
    }

    #[test]
    fn test_sort_categories_is_stable() {
        let mut a = Category::main("a", "A");
        a.sort_order = Some(2);
        let b = Category::main("b", "B");
        let mut c = Category::main("c", "C");
        c.sort_order = Some(1);
        let d = Category::main("d", "D");

        let mut refs = vec![&a, &b, &c, &d];
        sort_categories(&mut refs);
        let ids: Vec<&str> = refs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b", "d"]);
    }
}
