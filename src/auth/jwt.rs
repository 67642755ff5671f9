use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::TokenType;
    use jsonwebtoken::{EncodingKey, Header, encode};

    pub fn token(secret: &str, exp: usize) -> String {
        let claims = Claims {
            user_id: 7,
            sub: "jane".into(),
            role: 3,
            exp,
            token_type: TokenType::Access,
            emp_id: Some("EMP001".into()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips_emp_id() {
        let claims = verify_token(&token("secret", 4_102_444_800), "secret").unwrap();
        assert_eq!(claims.emp_id.as_deref(), Some("EMP001"));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_or_expired_token_fails() {
        assert!(verify_token(&token("secret", 4_102_444_800), "other").is_err());
        assert!(verify_token(&token("secret", 1_000), "secret").is_err());
    }
}
