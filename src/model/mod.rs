//! Wire types shared by the client, the presenter and the dashboard.

pub mod keyed;
pub mod request;
pub mod result;

pub use keyed::Keyed;
pub use request::{ModelType, OptimizationRequest, SyntheticDataRequest};
pub use result::{FlightInfo, OptimizationResult};
