pub mod participants;
pub mod smp;

pub use participants::{ParticipantsClient, ParticipantsServer, ParticipantsService};
pub use smp::{SmpClient, SmpServer, SmpService};
