use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, instrument};

use super::types::PlayerClaims;
use crate::config::AppConfig;
use crate::shared::AppError;

/// Signs and checks the identity tokens handed out at registration.
/// Keys are derived once from the secret.
#[derive(Clone)]
pub struct PlayerTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl PlayerTokens {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::days(config.token_lifetime_days))
    }

    #[instrument(skip(self, player_name))]
    pub fn issue(&self, player_id: &str, player_name: &str) -> Result<String, AppError> {
        let claims = PlayerClaims::issued_now(player_id, player_name, self.lifetime);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            debug!(error = %e, "Failed to sign player token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Returns the claims of a token signed with our secret. Expiry is
    /// reported separately so clients know to register again.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<PlayerClaims, AppError> {
        match decode::<PlayerClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                debug!("Player token expired");
                Err(AppError::Unauthorized("Token expired".to_string()))
            }
            Err(e) => {
                debug!(error = %e, "Rejected player token");
                Err(AppError::JwtError(e.to_string()))
            }
        }
    }
}
