//! Almacén de credenciales: hash y verificación de contraseñas con bcrypt.
//!
//! El costo se fija al construir el servicio y se usa para todos los hashes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bcrypt::{hash, verify};
use rand::RngCore;

use crate::utils::errors::{AppError, AppResult};

/// Sal y digest de un hash bcrypt que no corresponde a ninguna contraseña
const DUMMY_HASH_BODY: &str = "N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash con sal aleatoria al costo configurado
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        hash(password, self.cost).map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))
    }

    /// Falso si la contraseña no coincide o si el hash está malformado
    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match verify(password, password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("⚠️ Hash de contraseña inválido: {}", e);
                false
            }
        }
    }

    /// Verificar contra el hash de la cuenta, o contra un hash ficticio del
    /// mismo costo cuando la cuenta no existe; el tiempo de respuesta no
    /// delata si el email está registrado.
    pub fn verify_account(&self, password: &str, password_hash: Option<&str>) -> bool {
        match password_hash {
            Some(password_hash) => self.verify_password(password, password_hash),
            None => {
                let _ = verify(password, &self.dummy_hash());
                false
            }
        }
    }

    fn dummy_hash(&self) -> String {
        format!("$2b${:02}${}", self.cost, DUMMY_HASH_BODY)
    }
}

/// Bytes aleatorios de los tokens de verificación y de restablecimiento
pub const TOKEN_BYTES: usize = 32;

/// Token aleatorio URL-safe sin padding (43 caracteres)
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::new(4);
        let hashed = service.hash_password("correct horse").unwrap();

        assert_ne!(hashed, "correct horse");
        assert!(service.verify_password("correct horse", &hashed));
        assert!(!service.verify_password("wrong horse", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = PasswordService::new(4);
        let a = service.hash_password("same password").unwrap();
        let b = service.hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_tokens_are_url_safe() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_unknown_account_still_runs_bcrypt() {
        let service = PasswordService::new(4);
        assert_eq!(service.dummy_hash().len(), 60);
        assert!(matches!(verify("anything", &service.dummy_hash()), Ok(false)));
        assert!(!service.verify_account("anything", None));

        let hashed = service.hash_password("correct horse").unwrap();
        assert!(service.verify_account("correct horse", Some(&hashed)));
        assert!(!service.verify_account("wrong horse", Some(&hashed)));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        let service = PasswordService::new(4);
        assert!(!service.verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!service.verify_password("anything", ""));
    }
}
