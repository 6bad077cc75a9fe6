pub mod jwt;
pub mod money;
pub mod password;
pub mod slug;

pub use jwt::*;
pub use money::*;
pub use password::*;
pub use slug::*;
