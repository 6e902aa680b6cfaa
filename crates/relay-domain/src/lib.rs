pub mod delivery;
pub mod error;
pub mod reading;
pub mod reading_service;
pub mod validate;

pub use delivery::*;
pub use error::*;
pub use reading::*;
pub use reading_service::*;
pub use validate::*;
