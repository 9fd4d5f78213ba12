//! Product Model

use super::{default_true, merge_shallow, null_as_empty, string_or_number};
use super::text::{Language, LocalizedText};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Size variant for products with per-size pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub size: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SizeVariant {
    pub fn is_available(&self) -> bool {
        self.available.unwrap_or(true)
    }
}

/// Display badges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badges {
    #[serde(default)]
    pub neu: bool,
    #[serde(default)]
    pub kurze_zeit: bool,
    #[serde(default)]
    pub beliebt: bool,
}

impl Badges {
    pub fn any(&self) -> bool {
        self.neu || self.kurze_zeit || self.beliebt
    }
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sizes: Vec<SizeVariant>,
    /// Missing means available
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Badges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<LocalizedText>,
    /// Fields not modeled here (imageUrl, allergens, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<LocalizedText>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            price: None,
            sizes: Vec::new(),
            available: true,
            brand: None,
            badges: None,
            ingredients: None,
            extra: Map::new(),
        }
    }

    pub fn display_name(&self, lang: Language) -> &str {
        self.name.get(lang)
    }

    /// Single price, or the lowest available size price
    pub fn starting_price(&self) -> Option<Decimal> {
        self.price.or_else(|| {
            self.sizes
                .iter()
                .filter(|s| s.is_available())
                .map(|s| s.price)
                .min()
        })
    }

    /// Apply a partial JSON update. Keys present in `patch` replace the
    /// stored ones; the id never changes.
    pub fn merged(&self, patch: &Map<String, Value>) -> serde_json::Result<Product> {
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merge_shallow(&mut current, patch);
        current.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(current))
    }
}

/// Create product payload; the server assigns the id
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_product_create"))]
pub struct ProductCreate {
    pub name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sizes: Vec<SizeVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Badges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<LocalizedText>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductCreate {
    pub fn into_product(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            description: self.description,
            price: self.price,
            sizes: self.sizes,
            available: self.available.unwrap_or(true),
            brand: self.brand,
            badges: self.badges,
            ingredients: self.ingredients,
            extra: self.extra,
        }
    }
}

fn validate_product_create(p: &ProductCreate) -> Result<(), ValidationError> {
    if p.name.is_blank() {
        return Err(ValidationError::new("name_required"));
    }
    let negative_size = p.sizes.iter().any(|s| s.price.is_sign_negative());
    if p.price.is_some_and(|price| price.is_sign_negative()) || negative_size {
        return Err(ValidationError::new("negative_price"));
    }
    Ok(())
}
