//! Actuator drivers.  Both are generic over `embedded-hal` 1.0 traits and
//! map HAL errors into [`ActuatorError`](crate::error::ActuatorError).

pub mod damper;
pub mod fan;
