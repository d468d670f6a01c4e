//! Shared router state.

use std::sync::Arc;

use crate::bootstrap::AxumContext;

/// State handed to every handler.
pub type AppState = Arc<AxumContext>;
