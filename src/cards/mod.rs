//! Record operations and index lookups over the scripted store.

pub mod lookup;
pub mod store;

pub use lookup::CardFinder;
pub use store::{CardStore, SaveResult, WriteStatus};
