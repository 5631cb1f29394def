/// Prefix for every log line emitted by the service.
pub const API_NAME: &str = "[dealership-api]";

pub const CARS_ROUTE: &str = "/cars";
