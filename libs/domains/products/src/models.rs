use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Fields every stored product must carry, in the order they are reported
/// back when missing.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "title",
    "price",
    "description",
    "brand",
    "model",
    "color",
    "category",
    "discount",
];

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Product entity - represents a product stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id", with = "product_id")]
    pub id: Uuid,
    pub title: String,
    /// Hosted image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: f64,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub category: String,
    pub discount: f64,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(fields: ProductFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: fields.title,
            image: fields.image.into_url(),
            price: fields.price,
            description: fields.description,
            brand: fields.brand,
            model: fields.model,
            color: fields.color,
            category: fields.category,
            discount: fields.discount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the mutable fields. The image follows [`ImageChange`].
    pub fn apply(&mut self, fields: ProductFields) {
        self.title = fields.title;
        match fields.image {
            ImageChange::Keep => {}
            ImageChange::Clear => self.image = None,
            ImageChange::Set(url) => self.image = Some(url),
        }
        self.price = fields.price;
        self.description = fields.description;
        self.brand = fields.brand;
        self.model = fields.model;
        self.color = fields.color;
        self.category = fields.category;
        self.discount = fields.discount;
        self.updated_at = Utc::now();
    }
}

/// What a write does to the stored image.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageChange {
    /// `image` was not sent
    #[default]
    Keep,
    /// `image` was sent as `null` or `""`
    Clear,
    /// Hosted URL, or an embedded payload still to be uploaded
    Set(String),
}

impl ImageChange {
    pub fn as_set(&self) -> Option<&str> {
        match self {
            ImageChange::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            ImageChange::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Request body for create and update.
///
/// Deserialization never fails on field contents: values that are empty,
/// zero or of an unusable type become `None` and are then reported as
/// missing by [`ProductInput::into_fields`].
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    /// Hosted URL, or a `data:image/...;base64,...` payload to upload.
    /// `null` or `""` removes the stored image; non-string values are ignored.
    #[serde(default, deserialize_with = "lenient::image")]
    #[schema(value_type = Option<String>)]
    pub image: ImageChange,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(required)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(required)]
    pub discount: Option<f64>,
}

impl ProductInput {
    /// Read an input from an arbitrary JSON value. Anything that is not an
    /// object yields an input with every field missing.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Validate and unwrap the required fields.
    ///
    /// On failure returns the names of missing fields in [`REQUIRED_FIELDS`] order.
    pub fn into_fields(self) -> Result<ProductFields, Vec<String>> {
        if let Err(errors) = self.validate() {
            let invalid = errors.field_errors();
            return Err(REQUIRED_FIELDS
                .iter()
                .filter(|field| invalid.contains_key(**field))
                .map(|field| field.to_string())
                .collect());
        }

        let (
            Some(title),
            Some(price),
            Some(description),
            Some(brand),
            Some(model),
            Some(color),
            Some(category),
            Some(discount),
        ) = (
            self.title,
            self.price,
            self.description,
            self.brand,
            self.model,
            self.color,
            self.category,
            self.discount,
        )
        else {
            return Err(REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect());
        };

        Ok(ProductFields {
            title,
            image: self.image,
            price,
            description,
            brand,
            model,
            color,
            category,
            discount,
        })
    }
}

/// Validated product fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub title: String,
    pub image: ImageChange,
    pub price: f64,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub category: String,
    pub discount: f64,
}

/// Equality filters for listing products
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// Query string for `GET /api/products`.
///
/// Every parameter is kept as a raw string so that malformed values fall
/// back to their defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Exact category match
    pub category: Option<String>,
    /// Exact brand match
    pub brand: Option<String>,
    /// 1-based page number (default 1)
    #[param(value_type = Option<u64>)]
    pub page: Option<String>,
    /// Page size (default 10)
    #[param(value_type = Option<u64>)]
    pub limit: Option<String>,
}

impl ListQuery {
    /// Build from decoded query pairs. The first occurrence of a key wins and
    /// unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "category" => &mut query.category,
                "brand" => &mut query.brand,
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }

    pub fn filter(&self) -> ProductFilter {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        ProductFilter {
            category: non_empty(&self.category),
            brand: non_empty(&self.brand),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(parse_positive)
            .unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .as_deref()
            .and_then(parse_positive)
            .unwrap_or(DEFAULT_LIMIT)
    }
}

/// Parses the leading integer of `raw` ("3", " 3 ", "3abc", "3.7" all give 3).
/// Returns `None` for anything that does not start with a positive integer.
fn parse_positive(raw: &str) -> Option<u64> {
    let trimmed = raw.trim().trim_start_matches('+');
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<u64>().ok().filter(|n| *n > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of products with its pagination metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub message: String,
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Timestamps are stored and rendered as fixed-width RFC 3339 strings with
/// millisecond precision, so lexical order in MongoDB matches time order.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

/// Product ids are always stored and rendered as hyphenated strings, whatever
/// the serializer's human-readable setting.
pub mod product_id {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(value: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }
}

/// Field deserializers that turn falsy or unusable JSON values into `None`.
mod lenient {
    use super::ImageChange;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Only runs when the key is present; an absent key stays [`ImageChange::Keep`].
    pub fn image<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ImageChange, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => ImageChange::Set(s),
            Value::String(_) | Value::Null => ImageChange::Clear,
            _ => ImageChange::Keep,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|v| v.is_finite() && *v != 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "title": "T",
            "price": 10,
            "description": "D",
            "brand": "B",
            "model": "M",
            "color": "C",
            "category": "Cat",
            "discount": 5
        })
    }

    #[test]
    fn test_complete_input_is_valid() {
        let fields = ProductInput::from_value(&complete()).into_fields().unwrap();

        assert_eq!(fields.title, "T");
        assert_eq!(fields.price, 10.0);
        assert_eq!(fields.discount, 5.0);
        assert_eq!(fields.image, ImageChange::Keep);
    }

    #[test]
    fn test_falsy_values_are_missing() {
        let mut body = complete();
        body["title"] = json!("");
        body["price"] = json!(0);
        body["brand"] = Value::Null;
        body["discount"] = json!({ "amount": 5 });
        body.as_object_mut().unwrap().remove("color");

        let missing = ProductInput::from_value(&body).into_fields().unwrap_err();

        assert_eq!(missing, vec!["title", "price", "brand", "color", "discount"]);
    }

    #[test]
    fn test_non_object_body_misses_everything() {
        let positional = json!(["T", null, 10, "D", "B", "M", "C", "Cat", 5]);

        for body in [json!([1, 2]), positional, json!("T"), json!(42), Value::Null] {
            let missing = ProductInput::from_value(&body).into_fields().unwrap_err();
            assert_eq!(missing, REQUIRED_FIELDS.to_vec(), "body {body}");
        }
    }

    #[test]
    fn test_numeric_strings_and_numeric_titles_are_accepted() {
        let mut body = complete();
        body["price"] = json!("19.99");
        body["model"] = json!(3000);

        let fields = ProductInput::from_value(&body).into_fields().unwrap();

        assert_eq!(fields.price, 19.99);
        assert_eq!(fields.model, "3000");
    }

    #[test]
    fn test_negative_numbers_are_accepted() {
        let mut body = complete();
        body["discount"] = json!(-5);

        let fields = ProductInput::from_value(&body).into_fields().unwrap();

        assert_eq!(fields.discount, -5.0);
    }

    #[test]
    fn test_null_or_empty_image_clears() {
        for image in [json!(""), Value::Null] {
            let mut body = complete();
            body["image"] = image;

            let fields = ProductInput::from_value(&body).into_fields().unwrap();

            assert_eq!(fields.image, ImageChange::Clear);
        }
    }

    #[test]
    fn test_non_string_image_is_ignored() {
        for image in [json!(12345), json!(true), json!({ "url": "x" }), json!(["x"])] {
            let mut body = complete();
            body["image"] = image;

            let fields = ProductInput::from_value(&body).into_fields().unwrap();

            assert_eq!(fields.image, ImageChange::Keep);
        }
    }

    #[test]
    fn test_string_image_is_set() {
        let mut body = complete();
        body["image"] = json!("https://res.cloudinary.com/demo/image/upload/v1/products/a.png");

        let fields = ProductInput::from_value(&body).into_fields().unwrap();

        assert_eq!(
            fields.image.as_set(),
            Some("https://res.cloudinary.com/demo/image/upload/v1/products/a.png")
        );
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.filter(), ProductFilter::default());
    }

    #[test]
    fn test_list_query_malformed_values_fall_back() {
        for raw in ["abc", "0", "-3", "", " "] {
            let query = ListQuery {
                page: Some(raw.to_string()),
                limit: Some(raw.to_string()),
                ..Default::default()
            };
            assert_eq!(query.page(), 1, "page {raw:?}");
            assert_eq!(query.limit(), 10, "limit {raw:?}");
        }
    }

    #[test]
    fn test_list_query_parses_leading_integer() {
        let query = ListQuery {
            page: Some("2.9".to_string()),
            limit: Some(" 25items".to_string()),
            ..Default::default()
        };
        assert_eq!(query.page(), 2);
        assert_eq!(query.limit(), 25);
    }

    #[test]
    fn test_list_query_from_pairs_first_occurrence_wins() {
        let query = ListQuery::from_pairs([
            ("page", "2"),
            ("category", "A"),
            ("page", "7"),
            ("sort", "price"),
            ("brand", "Acme"),
        ]);

        assert_eq!(query.page(), 2);
        assert_eq!(query.limit(), 10);
        assert_eq!(
            query.filter(),
            ProductFilter {
                category: Some("A".to_string()),
                brand: Some("Acme".to_string())
            }
        );
    }

    #[test]
    fn test_empty_filters_are_ignored() {
        let query = ListQuery {
            category: Some(String::new()),
            brand: Some("Acme".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.filter(),
            ProductFilter {
                category: None,
                brand: Some("Acme".to_string())
            }
        );
    }

    #[test]
    fn test_pagination_math() {
        let pagination = Pagination::new(2, 10, 15);
        assert_eq!(pagination.total_pages, 2);
        assert_eq!(pagination.skip(), 10);

        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 20).total_pages, 2);
    }

    #[test]
    fn test_product_json_shape() {
        let fields = ProductInput::from_value(&complete()).into_fields().unwrap();
        let product = Product::new(fields);

        let json = serde_json::to_value(&product).unwrap();

        assert!(json.get("_id").is_some());
        assert!(json.get("image").is_none());
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }

    fn with_image() -> Product {
        let mut body = complete();
        body["image"] = json!("https://res.cloudinary.com/demo/image/upload/v1/products/abc.jpg");
        Product::new(ProductInput::from_value(&body).into_fields().unwrap())
    }

    #[test]
    fn test_apply_keeps_image_when_key_is_absent() {
        let mut product = with_image();

        let mut update = ProductInput::from_value(&complete()).into_fields().unwrap();
        update.title = "New".to_string();
        product.apply(update);

        assert_eq!(product.title, "New");
        assert!(product.image.is_some());
    }

    #[test]
    fn test_apply_clears_image_on_null() {
        let mut product = with_image();

        let mut body = complete();
        body["image"] = Value::Null;
        product.apply(ProductInput::from_value(&body).into_fields().unwrap());

        assert_eq!(product.image, None);
    }

    #[test]
    fn test_timestamp_round_trip_truncates_to_millis() {
        let raw = "2024-05-01T10:20:30.123Z";
        let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(raw).unwrap().into();
        assert_eq!(timestamp::format(&parsed), raw);
    }
}
