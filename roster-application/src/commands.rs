pub mod capacity_commands;
pub mod check_in_commands;
pub mod refresh_commands;
pub mod registration_commands;
pub mod reset_commands;
pub mod waitlist_commands;

use roster_domain::Identity;

use crate::AppError;

pub(crate) fn parse_identity(raw: &str) -> Result<Identity, AppError> {
    let identity = Identity::new(raw);
    if identity.is_empty() {
        return Err(AppError::BadRequest("identity must not be empty".to_string()));
    }
    Ok(identity)
}
