//! Conversions from teloxide types to dbot_core types.
//!
//! Updates go through their Bot API JSON form: both sides model the same wire schema, and
//! dbot_core only keeps the fields dispatch needs.

use dbot_core::{DbotError, Result, Update, User};

/// Converts a teloxide update into a core [`Update`]. Kinds dbot_core does not model
/// become [`dbot_core::UpdateKind::Unknown`].
pub fn to_core_update(update: &teloxide::types::Update) -> Result<Update> {
    let value = serde_json::to_value(update)?;
    serde_json::from_value(value).map_err(DbotError::from)
}

/// Field-by-field user conversion.
pub fn to_core_user(user: &teloxide::types::User) -> User {
    User {
        id: user.id.0 as i64,
        is_bot: user.is_bot,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}
