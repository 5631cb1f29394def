//! Form front-end for the car API: a typed HTTP client and the create/edit
//! form model, validating with the same schema as the server.

pub mod api;
pub mod form;

pub use api::{CarApiClient, ClientError};
pub use form::{
    color_options, format_plates, year_options, BackAction, CarForm, Field, FormValues,
    SubmitOutcome,
};
