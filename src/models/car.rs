use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use super::relations::{Customer, UserSummary};

pub const MIN_YEAR_MANUFACTURE: i32 = 1960;
pub const PLATES_LENGTH: usize = 8;
pub const MIN_SELLING_PRICE: f64 = 5_000.0;
pub const MAX_SELLING_PRICE: f64 = 5_000_000.0;

/// First day the store was open; no car can have been sold before it.
pub fn store_open_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 20).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Amarelo,
    Azul,
    Branco,
    Cinza,
    Dourado,
    Laranja,
    Marrom,
    Prata,
    Preto,
    Rosa,
    Roxo,
    Verde,
    Vermelho,
}

impl Color {
    pub const ALL: [Color; 13] = [
        Color::Amarelo,
        Color::Azul,
        Color::Branco,
        Color::Cinza,
        Color::Dourado,
        Color::Laranja,
        Color::Marrom,
        Color::Prata,
        Color::Preto,
        Color::Rosa,
        Color::Roxo,
        Color::Verde,
        Color::Vermelho,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Amarelo => "AMARELO",
            Color::Azul => "AZUL",
            Color::Branco => "BRANCO",
            Color::Cinza => "CINZA",
            Color::Dourado => "DOURADO",
            Color::Laranja => "LARANJA",
            Color::Marrom => "MARROM",
            Color::Prata => "PRATA",
            Color::Preto => "PRETO",
            Color::Rosa => "ROSA",
            Color::Roxo => "ROXO",
            Color::Verde => "VERDE",
            Color::Vermelho => "VERMELHO",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown color '{0}'")]
pub struct UnknownColor(pub String);

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|color| color.as_str() == s)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = UnknownColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A car as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: i64,
    pub brand: String,
    pub model: String,
    #[sqlx(try_from = "String")]
    pub color: Color,
    pub year_manufacture: i32,
    pub imported: bool,
    pub plates: String,
    pub selling_date: Option<NaiveDate>,
    pub selling_price: Option<f64>,
    pub customer_id: Option<i64>,
    pub created_user_id: Option<i64>,
    pub updated_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated car fields, ready to be persisted. Audit fields are not part of
/// it: they always come from the authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarInput {
    pub brand: String,
    pub model: String,
    pub color: Color,
    pub year_manufacture: i32,
    pub imported: bool,
    pub plates: String,
    pub selling_date: Option<NaiveDate>,
    pub selling_price: Option<f64>,
    pub customer_id: Option<i64>,
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Adds `other`'s messages for fields that have none yet.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            let message = field_errors
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{} is invalid.", field));
            fields.insert(field, message);
        }
        fields
    }
}

/// Request body for creating or replacing a car.
///
/// Numbers, booleans and dates are accepted leniently (numeric strings,
/// `"true"`/`"1"`, ISO dates or timestamps) since form front-ends send
/// whatever their inputs hold. A value of the wrong JSON type is recorded
/// against its field instead of rejecting the whole body. Audit fields and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(from = "Map<String, Value>")]
pub struct CarPayload {
    #[validate(
        required(message = "brand is required."),
        length(max = 25, message = "brand must have at most 25 characters."),
        custom(function = "validate_brand_not_empty")
    )]
    pub brand: Option<String>,

    #[validate(
        required(message = "model is required."),
        length(max = 25, message = "model must have at most 25 characters."),
        custom(function = "validate_model_not_empty")
    )]
    pub model: Option<String>,

    #[validate(
        required(message = "color is required."),
        custom(function = "validate_color")
    )]
    pub color: Option<String>,

    #[validate(
        required(message = "year_manufacture must be an integer."),
        custom(function = "validate_year_manufacture")
    )]
    pub year_manufacture: Option<f64>,

    #[validate(required(message = "imported is required and must be true or false."))]
    pub imported: Option<bool>,

    #[validate(
        required(message = "plates is required."),
        length(equal = 8, message = "plates must have exactly 8 characters.")
    )]
    pub plates: Option<String>,

    #[validate(custom(function = "validate_selling_date"))]
    pub selling_date: Option<String>,

    #[validate(custom(function = "validate_selling_price"))]
    pub selling_price: Option<f64>,

    #[validate(range(min = 1, message = "customer_id must be a positive integer identifier."))]
    pub customer_id: Option<i64>,

    #[serde(skip)]
    type_errors: FieldErrors,
}

impl CarPayload {
    /// Runs every field check and converts the payload into validated
    /// [`CarInput`]. All failing fields are reported at once.
    pub fn validate_into(self) -> Result<CarInput, FieldErrors> {
        let mut errors = self.type_errors.clone();
        if let Err(invalid) = self.validate() {
            errors.merge(FieldErrors::from(invalid));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let missing = |field: &str| FieldErrors::single(field, format!("{} is required.", field));

        let color = self.color.ok_or_else(|| missing("color"))?;
        let color = Color::from_str(&color)
            .map_err(|_| FieldErrors::single("color", color_message()))?;

        Ok(CarInput {
            brand: self.brand.ok_or_else(|| missing("brand"))?,
            model: self.model.ok_or_else(|| missing("model"))?,
            color,
            year_manufacture: self
                .year_manufacture
                .map(|year| year as i32)
                .ok_or_else(|| missing("year_manufacture"))?,
            imported: self.imported.ok_or_else(|| missing("imported"))?,
            plates: self.plates.ok_or_else(|| missing("plates"))?,
            selling_date: self.selling_date.as_deref().and_then(parse_selling_date),
            selling_price: self.selling_price,
            customer_id: self.customer_id,
        })
    }
}

impl From<Map<String, Value>> for CarPayload {
    fn from(body: Map<String, Value>) -> Self {
        let mut reader = FieldReader {
            body,
            errors: FieldErrors::default(),
        };
        CarPayload {
            brand: reader.text("brand"),
            model: reader.text("model"),
            color: reader.text("color"),
            year_manufacture: reader.number("year_manufacture"),
            imported: reader.boolean("imported"),
            plates: reader.text("plates"),
            selling_date: reader.date("selling_date"),
            selling_price: reader.number("selling_price"),
            customer_id: reader.id("customer_id"),
            type_errors: reader.errors,
        }
    }
}

/// Pulls fields out of a JSON object, coercing what it can and recording a
/// message for values of the wrong type.
struct FieldReader {
    body: Map<String, Value>,
    errors: FieldErrors,
}

impl FieldReader {
    fn take(&mut self, field: &str) -> Option<Value> {
        match self.body.remove(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, field: &'static str) -> Option<String> {
        match self.take(field)? {
            Value::String(s) => Some(s),
            _ => {
                self.errors.insert(field, format!("{} must be a string.", field));
                None
            }
        }
    }

    // Numbers may arrive as JSON numbers or numeric strings. An empty string
    // is treated as absent; anything unparseable becomes NaN so the field's
    // own check reports it.
    fn number(&mut self, field: &str) -> Option<f64> {
        match self.take(field)? {
            Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
            _ => Some(f64::NAN),
        }
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        match self.take(field)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => Some(s == "true" || s == "1"),
            _ => None,
        }
    }

    // Dates are kept as text until validation. Unix timestamps in
    // milliseconds are rendered to RFC 3339 first.
    fn date(&mut self, field: &str) -> Option<String> {
        match self.take(field)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => {
                let rendered = n
                    .as_i64()
                    .and_then(|ms| {
                        let secs = ms.div_euclid(1000);
                        let nsecs = (ms.rem_euclid(1000) * 1_000_000) as u32;
                        DateTime::from_timestamp(secs, nsecs)
                    })
                    .map(|dt| dt.to_rfc3339());
                Some(rendered.unwrap_or_else(|| n.to_string()))
            }
            other => Some(other.to_string()),
        }
    }

    // Identifiers stay integral end to end; floats and non-numeric text are
    // rejected rather than rounded.
    fn id(&mut self, field: &'static str) -> Option<i64> {
        let parsed = match self.take(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) if s.trim().is_empty() => return None,
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.errors.insert(
                field,
                format!("{} must be a positive integer identifier.", field),
            );
        }
        parsed
    }
}

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn color_message() -> String {
    let names = Color::ALL
        .iter()
        .map(Color::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("color must be one of: {}.", names)
}

fn validate_brand_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(field_error("brand_min", "brand must have at least 1 character."));
    }
    Ok(())
}

fn validate_model_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(field_error("model_min", "model must have at least 1 character."));
    }
    Ok(())
}

fn validate_color(value: &str) -> Result<(), ValidationError> {
    Color::from_str(value)
        .map(|_| ())
        .map_err(|_| field_error("color", color_message()))
}

fn validate_year_manufacture(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(field_error(
            "year_manufacture_integer",
            "year_manufacture must be an integer.",
        ));
    }
    let current_year = Utc::now().year();
    if value < f64::from(MIN_YEAR_MANUFACTURE) {
        return Err(field_error(
            "year_manufacture_min",
            format!("year_manufacture cannot be earlier than {}.", MIN_YEAR_MANUFACTURE),
        ));
    }
    if value > f64::from(current_year) {
        return Err(field_error(
            "year_manufacture_max",
            format!("year_manufacture cannot be later than {}.", current_year),
        ));
    }
    Ok(())
}

fn validate_selling_date(value: &str) -> Result<(), ValidationError> {
    let in_range = parse_selling_date(value)
        .map(|date| date >= store_open_date() && date <= Utc::now().date_naive())
        .unwrap_or(false);
    if in_range {
        Ok(())
    } else {
        Err(field_error(
            "selling_date",
            "selling_date, if given, must be between 2020-03-20 and today.",
        ))
    }
}

fn validate_selling_price(value: f64) -> Result<(), ValidationError> {
    // NaN fails both comparisons
    if value >= MIN_SELLING_PRICE && value <= MAX_SELLING_PRICE {
        Ok(())
    } else {
        Err(field_error(
            "selling_price",
            "selling_price, if given, must be between 5,000.00 and 5,000,000.00.",
        ))
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC date is used).
pub fn parse_selling_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    None
}

/// Which relations to embed in a car response, parsed from a
/// comma-separated `include` query parameter. Unknown names are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub customer: bool,
    pub created_user: bool,
    pub updated_user: bool,
}

impl Include {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut include = Include::default();
        for name in raw.unwrap_or_default().split(',').map(str::trim) {
            match name {
                "customer" => include.customer = true,
                "created_user" => include.created_user = true,
                "updated_user" => include.updated_user = true,
                _ => {}
            }
        }
        include
    }

    pub fn is_empty(&self) -> bool {
        !(self.customer || self.created_user || self.updated_user)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeQuery {
    pub include: Option<String>,
}

impl IncludeQuery {
    pub fn include(&self) -> Include {
        Include::parse(self.include.as_deref())
    }
}

/// A car with the relations the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarDetails {
    #[serde(flatten)]
    pub car: Car,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_user: Option<UserSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_user: Option<UserSummary>,
}

impl From<Car> for CarDetails {
    fn from(car: Car) -> Self {
        Self {
            car,
            customer: None,
            created_user: None,
            updated_user: None,
        }
    }
}
