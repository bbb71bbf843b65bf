/// Typed wrappers over the backend REST API
///
/// Every function here goes through `ApiClient`, so bearer tokens and
/// session refresh are handled transparently.

pub mod auth;
pub mod collectes;
pub mod dechets;
pub mod geo;
pub mod signalements;
pub mod stats;
pub mod users;

pub use auth::{AuthResponse, RegisterInput};
pub use collectes::Collecte;
pub use dechets::{Dechet, DechetType, NewDechet};
pub use geo::{Proximite, ProximityKind};
pub use signalements::{NewSignalement, Signalement, SignalementType};
pub use stats::DashboardStats;
pub use users::{Role, User};
