pub mod billing_addresses;
pub mod categories;
pub mod items;
pub mod order_items;
pub mod order_order_items;
pub mod orders;
pub mod payments;
pub mod users;

pub use billing_addresses as billing_address_entity;
pub use categories as category_entity;
pub use items as item_entity;
pub use items::Label;
pub use order_items as order_item_entity;
pub use order_order_items as order_link_entity;
pub use orders as order_entity;
pub use payments as payment_entity;
pub use users as user_entity;
