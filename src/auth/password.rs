use crate::core::errors::SpendlyError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, SpendlyError> {
    bcrypt::hash(password, cost).map_err(|e| SpendlyError::InternalServerError(format!("Password hashing error: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, SpendlyError> {
    bcrypt::verify(password, hash)
        .map_err(|e| SpendlyError::InternalServerError(format!("Password verification error: {}", e)))
}
