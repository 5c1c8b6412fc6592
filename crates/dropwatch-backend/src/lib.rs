//! dropwatch-backend: collaborator IO boundary.
//! The campaign oracle, session provider and presence simulator the scheduler
//! drives, plus dry-run implementations that make the daemon runnable without
//! a browser. No selection logic lives here.

pub mod error;
pub mod fixture;
pub mod oracle;
pub mod presence;
pub mod session;

pub use error::BackendError;
pub use fixture::{FixtureOracle, FixtureSnapshot};
pub use oracle::CampaignOracle;
pub use presence::{GatedPresence, LoggingPresenceActions, PresenceActions, PresenceSimulator};
pub use session::{DryRunSession, SessionProvider};
