use std::sync::Arc;

use pchart_db::DbPool;
use pchart_events::EventBus;

use crate::config::ServerConfig;

/// Handed to every handler as `State<AppState>`; cloning only bumps refcounts.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// Holds the operation sequence new orders are seeded with.
    pub config: Arc<ServerConfig>,
    pub event_bus: Arc<EventBus>,
}
