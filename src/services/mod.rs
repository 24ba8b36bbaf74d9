// Core ledger services
pub mod inventory;
pub mod ledger;
pub mod orders;

// Customer-facing services
pub mod customer_requests;

// Catalog and supporting services
pub mod locations;
pub mod partners;
pub mod parts;
pub mod scrap;
