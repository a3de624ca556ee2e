// src/services/credentials.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("falha ao gerar o hash da senha: {0}")]
    HashingFailure(String),

    #[error("hash de senha armazenado está corrompido")]
    CorruptCredential,
}

/// Hash e verificação de senhas com bcrypt.
/// O trabalho pesado roda no pool de threads bloqueantes do tokio.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(&plaintext, cost))
            .await
            .map_err(|e| CredentialError::HashingFailure(e.to_string()))?
            .map_err(|e| CredentialError::HashingFailure(e.to_string()))
    }

    /// `Ok(false)` quando a senha não confere; erro só se o hash guardado for inválido.
    pub async fn verify(&self, credential: &str, plaintext: &str) -> Result<bool, CredentialError> {
        let plaintext = plaintext.to_owned();
        let credential = credential.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::verify(&plaintext, &credential))
            .await
            .map_err(|_| CredentialError::CorruptCredential)?
            .map_err(|_| CredentialError::CorruptCredential)
    }
}
