use enb_pickup::PickupService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PickupService>,
}

impl AppState {
    pub fn new(service: PickupService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
