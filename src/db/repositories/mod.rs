pub mod api_key;
pub mod item;
pub mod user;
