pub mod mirror;
pub mod pnr;
pub mod registry;

pub use mirror::{MirrorJob, MirrorStats, MirrorWriter};
pub use pnr::{MapperError, PnrMapper};
pub use registry::{RegistryError, ReservationRegistry};
