pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod payment_service;

pub use auth_service::*;
pub use cart_service::*;
pub use catalog_service::*;
pub use checkout_service::*;
pub use payment_service::*;
