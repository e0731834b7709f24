use crate::cache::Revalidator;
use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub revalidator: Revalidator,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            revalidator: Revalidator::new(),
        }
    }
}
