pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod pagination;
pub mod payment;
pub mod user;

pub use cart::*;
pub use catalog::*;
pub use checkout::*;
pub use common::*;
pub use pagination::*;
pub use payment::*;
pub use user::*;
