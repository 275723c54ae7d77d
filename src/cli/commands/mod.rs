pub mod permission;
pub mod storage;
pub mod user;
