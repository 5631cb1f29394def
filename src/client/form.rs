use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::api::{CarApiClient, ClientError};
use crate::constants::CARS_ROUTE;
use crate::models::car::{MIN_YEAR_MANUFACTURE, PLATES_LENGTH};
use crate::models::{Car, CarPayload, Color, FieldErrors};

/// Plate input mask: `A` letter, `9` digit, `$` digit or A–J.
pub const PLATES_MASK: &str = "AAA-9$99";

const DISCARD_PROMPT: &str = "Discard changes?";

/// Editable text inputs of the car form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Brand,
    Model,
    Color,
    YearManufacture,
    Plates,
    SellingPrice,
    CustomerId,
}

#[derive(Debug, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "brand" => Field::Brand,
            "model" => Field::Model,
            "color" => Field::Color,
            "year_manufacture" => Field::YearManufacture,
            "plates" => Field::Plates,
            "selling_price" => Field::SellingPrice,
            "customer_id" => Field::CustomerId,
            other => return Err(UnknownField(other.to_string())),
        })
    }
}

/// Raw form contents, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    pub brand: String,
    pub model: String,
    pub color: String,
    pub year_manufacture: String,
    pub imported: bool,
    pub plates: String,
    pub selling_date: Option<NaiveDate>,
    pub selling_price: String,
    pub customer_id: String,
}

impl FormValues {
    pub fn from_car(car: &Car) -> Self {
        Self {
            brand: car.brand.clone(),
            model: car.model.clone(),
            color: car.color.to_string(),
            year_manufacture: car.year_manufacture.to_string(),
            imported: car.imported,
            plates: car.plates.clone(),
            selling_date: car.selling_date,
            selling_price: car.selling_price.map(|p| p.to_string()).unwrap_or_default(),
            customer_id: car.customer_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    /// Builds the request payload through the same lenient coercion the
    /// backend applies to incoming bodies.
    pub fn to_payload(&self) -> CarPayload {
        let selling_date = self
            .selling_date
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        let body: Map<String, Value> = [
            ("brand", Value::from(self.brand.as_str())),
            ("model", Value::from(self.model.as_str())),
            ("color", Value::from(self.color.as_str())),
            ("year_manufacture", Value::from(self.year_manufacture.as_str())),
            ("imported", Value::Bool(self.imported)),
            ("plates", Value::from(self.plates.as_str())),
            ("selling_date", selling_date),
            ("selling_price", Value::from(self.selling_price.as_str())),
            ("customer_id", Value::from(self.customer_id.as_str())),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect();
        CarPayload::from(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved { car_id: Option<i64>, navigate_to: &'static str },
    Invalid(FieldErrors),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackAction {
    Navigate(&'static str),
    ConfirmDiscard {
        prompt: &'static str,
        navigate_to: &'static str,
    },
}

/// Create/edit form for one car: input, local validation, submit, navigate.
#[derive(Debug, Clone, Default)]
pub struct CarForm {
    id: Option<i64>,
    values: FormValues,
    modified: bool,
    input_errors: FieldErrors,
}

impl CarForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn title(&self) -> &'static str {
        if self.id.is_some() {
            "Edit car"
        } else {
            "New car"
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn input_errors(&self) -> &FieldErrors {
        &self.input_errors
    }

    /// In edit mode, fetches the car and fills the form with it.
    pub async fn load(&mut self, client: &CarApiClient) -> Result<(), ClientError> {
        if let Some(id) = self.id {
            let car = client.get(id).await?;
            self.values = FormValues::from_car(&car);
            self.modified = false;
        }
        Ok(())
    }

    pub fn set_field(&mut self, field: Field, value: &str) {
        let value = value.to_string();
        match field {
            Field::Brand => self.values.brand = value,
            Field::Model => self.values.model = value,
            Field::Color => self.values.color = value,
            Field::YearManufacture => self.values.year_manufacture = value,
            Field::Plates => self.values.plates = format_plates(&value),
            Field::SellingPrice => self.values.selling_price = value,
            Field::CustomerId => self.values.customer_id = value,
        }
        self.modified = true;
    }

    pub fn set_imported(&mut self, imported: bool) {
        self.values.imported = imported;
        self.modified = true;
    }

    pub fn set_selling_date(&mut self, date: Option<NaiveDate>) {
        self.values.selling_date = date;
        self.modified = true;
    }

    /// Validates locally and only contacts the server when the form is
    /// valid. Server-side validation errors are surfaced like local ones.
    pub async fn submit(&mut self, client: &CarApiClient) -> SubmitOutcome {
        let payload = self.values.to_payload();
        if let Err(errors) = payload.clone().validate_into() {
            self.input_errors = errors.clone();
            return SubmitOutcome::Invalid(errors);
        }
        self.input_errors = FieldErrors::default();

        let result = match self.id {
            Some(id) => client.update(id, &payload).await.map(|_| Some(id)),
            None => client.create(&payload).await.map(|car| Some(car.id)),
        };

        match result {
            Ok(car_id) => {
                self.modified = false;
                SubmitOutcome::Saved {
                    car_id,
                    navigate_to: CARS_ROUTE,
                }
            }
            Err(ClientError::Validation(errors)) => {
                self.input_errors = errors.clone();
                SubmitOutcome::Invalid(errors)
            }
            Err(other) => SubmitOutcome::Failed(other.to_string()),
        }
    }

    pub fn back(&self) -> BackAction {
        if self.modified {
            BackAction::ConfirmDiscard {
                prompt: DISCARD_PROMPT,
                navigate_to: CARS_ROUTE,
            }
        } else {
            BackAction::Navigate(CARS_ROUTE)
        }
    }
}

/// Years offered by the form, newest first.
pub fn year_options() -> Vec<i32> {
    (MIN_YEAR_MANUFACTURE..=Utc::now().year()).rev().collect()
}

pub fn color_options() -> &'static [Color] {
    &Color::ALL
}

/// Applies [`PLATES_MASK`] to raw input: upper-cases, drops characters the
/// next slot does not accept and inserts the dash. Incomplete input stays
/// short, so it still fails the length check.
pub fn format_plates(raw: &str) -> String {
    let mut input = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase());
    let mut out = String::with_capacity(PLATES_LENGTH);
    let mut pending = String::new();

    for slot in PLATES_MASK.chars() {
        let accepts: fn(&char) -> bool = match slot {
            'A' => |c: &char| c.is_ascii_uppercase(),
            '9' => |c: &char| c.is_ascii_digit(),
            '$' => |c: &char| c.is_ascii_digit() || ('A'..='J').contains(c),
            literal => {
                pending.push(literal);
                continue;
            }
        };
        match input.by_ref().find(accepts) {
            Some(c) => {
                out.push_str(&pending);
                pending.clear();
                out.push(c);
            }
            None => break,
        }
    }
    out
}
