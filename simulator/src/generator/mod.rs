pub mod scenario;
pub mod synthetic;

pub use scenario::ScenarioConfig;
