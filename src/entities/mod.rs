pub mod customer_request;
pub mod customer_requested_part;
pub mod inventory;
pub mod inventory_log;
pub mod location;
pub mod order;
pub mod order_part;
pub mod part;
pub mod partner;
pub mod scrap;
