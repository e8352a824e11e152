pub mod analysis;
pub mod app;
pub mod cli;
pub mod constants;
pub mod gateway;
pub mod runtime;
pub mod session;
pub mod utils;

pub use analysis::{classify, SowAnalysis};
pub use app::{load_config, Config};
pub use gateway::{RestGateway, SearchGateway};
pub use runtime::SearchClient;
pub use session::SessionStore;
pub use utils::SearchError;
