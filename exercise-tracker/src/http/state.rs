use std::path::PathBuf;
use std::sync::Arc;

use crate::store::Store;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Holds `index.html`, served at `/`.
    pub static_dir: PathBuf,
    /// Served as-is for any path no route claims.
    pub public_dir: PathBuf,
}
