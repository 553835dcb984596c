//! Input and patch types accepted by the stores.

pub mod api_key;
pub mod item;
pub mod user;

use serde::{Deserialize, Deserializer};

pub use api_key::ApiKeyCreate;
pub use item::{ItemCreate, ItemUpdate};
pub use user::{UserCreate, UserUpdate};

/// Lets `Option<Option<T>>` tell an absent field (`None`) from an explicit
/// `null` (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
