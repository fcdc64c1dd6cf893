use std::sync::Arc;

use crate::config::{Config, RelayConfig};
use crate::slack::SlackClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub relay: RelayConfig,
    pub slack: SlackClient,
}
