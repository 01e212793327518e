//! Shared state handed to every request handler.

use parking_lot::Mutex;

use crate::db::CrmDb;
use crate::pdf::TemplateSet;

pub struct AppState {
    /// Single connection; handlers hold the lock only for synchronous store work.
    pub db: Mutex<CrmDb>,
    pub templates: TemplateSet,
}

impl AppState {
    pub fn new(db: CrmDb, templates: TemplateSet) -> Self {
        Self {
            db: Mutex::new(db),
            templates,
        }
    }
}
