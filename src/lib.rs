mod api;
pub mod args;
mod chat;
mod config;
mod db;
mod error;
mod identity;
mod ledger;
mod model;
mod state;
#[cfg(test)]
mod test;
mod utils;

pub use api::{sheets_api, Mode, SheetsApi};
pub use chat::{dispatcher, CommandName, Dispatcher, Inbound, Registry, Reply};
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use identity::{Identity, MemoryIdentity, User};
pub use ledger::{Accessor, Engine};
pub use model::{Amount, Catalog, CategoryRule, Entry, PendingState};
pub use state::{MemoryStateStore, StateStore};
