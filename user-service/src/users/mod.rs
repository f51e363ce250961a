//! The User entity: model, service and HTTP routes

mod model;
mod routes;
mod service;

pub use model::{NewUser, User, UserPatch, MAX_AGE};
pub use routes::router;
pub use service::{UserService, ENTITY_NAME};
