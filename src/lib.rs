mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
}
mod assets;
mod constants;
mod error;

pub use assets::*;
pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use database::error::{QueryError, TypeError};
pub use error::*;
