pub mod car;
pub mod relations;

pub use car::{
    Car, CarDetails, CarInput, CarPayload, Color, FieldErrors, Include, IncludeQuery,
};
pub use relations::{Customer, UserSummary};
