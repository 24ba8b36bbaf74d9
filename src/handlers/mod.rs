pub mod customer_requests;
pub mod inventory;
pub mod locations;
pub mod orders;
pub mod partners;
pub mod parts;
pub mod scrap;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub parts: Arc<crate::services::parts::PartService>,
    pub locations: Arc<crate::services::locations::LocationService>,
    pub partners: Arc<crate::services::partners::PartnerService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub customer_requests: Arc<crate::services::customer_requests::CustomerRequestService>,
    pub scrap: Arc<crate::services::scrap::ScrapService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let parts = Arc::new(crate::services::parts::PartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let locations = Arc::new(crate::services::locations::LocationService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let partners = Arc::new(crate::services::partners::PartnerService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.bulk_receive_atomicity,
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.invoice_prefix.clone(),
        ));
        let customer_requests = Arc::new(
            crate::services::customer_requests::CustomerRequestService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.invoice_prefix.clone(),
            ),
        );
        let scrap = Arc::new(crate::services::scrap::ScrapService::new(
            db_pool,
            event_sender,
        ));

        Self {
            parts,
            locations,
            partners,
            inventory,
            orders,
            customer_requests,
            scrap,
        }
    }
}
