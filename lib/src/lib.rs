//! Badminton rally-point scoring: the match engine, the court position
//! resolver, and the schema types shared with the scoring service.

mod api;
mod config;
pub mod court;
mod engine;
mod message;
mod record;
pub mod rules;
mod setup;
mod state;
mod team;
mod view;

pub use api::*;
pub use config::*;
pub use engine::*;
pub use message::*;
pub use record::*;
pub use rules::RallyOutcome;
pub use setup::*;
pub use state::{MatchState, MatchStatus, SetScore};
pub use team::*;
pub use view::*;
