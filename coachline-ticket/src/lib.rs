pub mod artifact;
pub mod bundle;
pub mod fares;
pub mod resolve;
pub mod ticket_type;

pub use fares::{allocate, FareBreakdown, FareContext};
pub use resolve::{ResolveOptions, ResolvedTicket, TicketService};
pub use ticket_type::TicketTypeResolver;
