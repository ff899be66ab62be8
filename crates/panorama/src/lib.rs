pub mod angle;
pub mod bearing;
pub mod vector;

pub use angle::AngleError;
pub use bearing::{Bearing, bearing_between};
pub use vector::Vec3;
