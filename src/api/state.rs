use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::transfer::TransferService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransferService>,
    pub db: Arc<Database>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(service: Arc<TransferService>, db: Arc<Database>, shutdown: CancellationToken) -> Self {
        Self { service, db, shutdown }
    }
}
