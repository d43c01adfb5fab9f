// Cats core
//
// DB-agnostic domain types shared by the API, storage and background tasks,
// plus telemetry initialisation.

// Domain entity types
pub mod cat;

// Telemetry (tracing subscriber setup)
pub mod telemetry;

pub use cat::Cat;
