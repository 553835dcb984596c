pub mod prelude;

pub mod api_keys;
pub mod items;
pub mod users;
