pub mod descriptor;
pub mod errors;
pub mod models;
