use std::sync::Arc;

use crate::{
    db::{Database, DriverKind},
    services::BatchDispatcher,
};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<BatchDispatcher>,
    pub driver: DriverKind,
}

impl AppState {
    pub fn new(dispatcher: BatchDispatcher, driver: DriverKind) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            driver,
        }
    }

    /// Wires the dispatcher onto the process-wide database handle.
    pub fn from_database(db: Database) -> Self {
        let driver = db.driver();
        Self::new(BatchDispatcher::from_database(db), driver)
    }
}
