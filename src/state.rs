use crate::config::AppConfig;
use crate::services::front_desk::FrontDesk;

pub struct AppState {
    pub desk: FrontDesk,
    pub config: AppConfig,
}
