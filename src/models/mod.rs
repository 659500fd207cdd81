pub mod draft;
pub mod order;
pub mod pricing;

pub use order::{ChangeKind, LocationType, OrderStatus, PickupPreference, RentalMode, SurfaceType};
