pub mod flows;
pub mod metrics_manager;
pub mod model;
pub mod prompt;
pub mod session_manager;
pub mod translate;
