mod model;
mod postgres;
mod store;

#[cfg(test)]
pub mod memory;

pub use model::{NewUser, ProfileUpdate, User, PALETTE_SIZE};
pub use postgres::PgUserStore;
pub use store::{StoreError, UserStore};
