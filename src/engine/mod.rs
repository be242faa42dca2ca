pub mod assembler;
pub mod availability;
pub mod caution;
pub mod confidence;
pub mod eligibility;
pub mod explain;
pub mod generators;
pub mod legs;
pub mod odds;
pub mod projection;

pub use assembler::{assemble, Parlay, ParlayLeg, ParlayRequest, SelectionOrder};
pub use caution::{CautionLevel, CautionResult};
pub use eligibility::{Verdict, Window};
pub use generators::{Candidate, Evidence};
pub use legs::{Direction, Leg, LegKind, Selection};
