pub use super::api_keys::Entity as ApiKeys;
pub use super::items::Entity as Items;
pub use super::users::Entity as Users;
