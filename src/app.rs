// Application state and configuration
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{ConvomatService, NotificationService},
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub convomat: Arc<ConvomatService>,
    pub notifications: Arc<NotificationService>,
    pub max_connections: u32,
}
