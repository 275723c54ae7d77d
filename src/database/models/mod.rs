pub mod account;
pub mod client;
pub mod payload;
pub mod permission;
pub mod user;

pub use account::{Account, ClientAccountRow, NewAccount};
pub use client::{Client, ClientDetail, NewClient};
pub use payload::Payload;
pub use permission::{Permission, PermissionGrant};
pub use user::UserCredential;
