//! Identity extraction from bearer credentials.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use constructmate_core::{BearerToken, OrganisationId, UserIdentity};
use serde_json::{Map, Value};
use tracing::debug;

const NAME_CLAIMS: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
    "name",
    "unique_name",
];
const ROLE_CLAIMS: &[&str] = &[
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
    "role",
];
const EMAIL_CLAIMS: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
    "email",
];
const ORGANISATION_CLAIMS: &[&str] = &[
    "organisationid",
    "organisationId",
    "orgId",
    "organisation_id",
    "org_id",
    "http://schemas.microsoft.com/identity/claims/organisationid",
];

/// Decodes the claims of a JWT bearer credential into an identity.
///
/// The signature is not verified here; the upstream API verifies it on every call.
/// Returns `None` when the credential is empty or its payload cannot be decoded.
#[must_use]
pub fn decode_identity(token: &BearerToken) -> Option<UserIdentity> {
    let claims = decode_claims(token)?;

    let display_name = first_text_claim(&claims, NAME_CLAIMS).unwrap_or_default();
    let role_name = first_text_claim(&claims, ROLE_CLAIMS).unwrap_or_default();
    let email = first_text_claim(&claims, EMAIL_CLAIMS);
    let organisation_id = first_text_claim(&claims, ORGANISATION_CLAIMS)
        .and_then(|value| OrganisationId::new(value).ok());

    Some(UserIdentity::new(
        display_name,
        role_name,
        email,
        organisation_id,
    ))
}

fn decode_claims(token: &BearerToken) -> Option<Map<String, Value>> {
    let payload = token.expose().split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|error| debug!(error = %error, "bearer payload is not base64url"))
        .ok()?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Some(claims),
        Ok(_) => None,
        Err(error) => {
            debug!(error = %error, "bearer payload is not a JSON object");
            None
        }
    }
}

fn first_text_claim(claims: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| claims.get(*key))
        .find_map(claim_text)
}

fn claim_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(values) => values.iter().find_map(claim_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use constructmate_core::BearerToken;
    use serde_json::{Value, json};

    use super::decode_identity;

    fn token_with(claims: Value) -> BearerToken {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        BearerToken::new(format!("{header}.{payload}.signature"))
    }

    #[test]
    fn namespaced_claims_are_read() {
        let identity = decode_identity(&token_with(json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name": "Sam Mason",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": "Supervisor",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress": "sam@example.com",
            "organisationId": "org1"
        })));

        let identity = identity.unwrap_or_else(|| unreachable!());
        assert_eq!(identity.display_name(), "Sam Mason");
        assert_eq!(identity.role_name(), "Supervisor");
        assert_eq!(identity.email(), Some("sam@example.com"));
        assert_eq!(
            identity.organisation_id().map(|value| value.as_str()),
            Some("org1")
        );
    }

    #[test]
    fn organisation_claim_spellings_are_checked_in_order() {
        for key in [
            "organisationid",
            "orgId",
            "organisation_id",
            "org_id",
            "http://schemas.microsoft.com/identity/claims/organisationid",
        ] {
            let identity = decode_identity(&token_with(json!({ "role": "Clerk", (key): 42 })))
                .unwrap_or_else(|| unreachable!());
            assert_eq!(
                identity.organisation_id().map(|value| value.as_str()),
                Some("42"),
                "claim {key}"
            );
        }
    }

    #[test]
    fn first_non_blank_organisation_claim_wins() {
        let identity = decode_identity(&token_with(json!({
            "organisationid": "",
            "orgId": "org7",
            "org_id": "org9"
        })))
        .unwrap_or_else(|| unreachable!());

        assert_eq!(
            identity.organisation_id().map(|value| value.as_str()),
            Some("org7")
        );
    }

    #[test]
    fn missing_claims_yield_empty_role_and_no_organisation() {
        let identity =
            decode_identity(&token_with(json!({ "sub": "1" }))).unwrap_or_else(|| unreachable!());
        assert_eq!(identity.role_name(), "");
        assert!(identity.organisation_id().is_none());
    }

    #[test]
    fn role_arrays_take_first_entry() {
        let identity = decode_identity(&token_with(json!({ "role": ["Admin", "Clerk"] })))
            .unwrap_or_else(|| unreachable!());
        assert_eq!(identity.role_name(), "Admin");
    }

    #[test]
    fn undecodable_tokens_yield_no_identity() {
        assert!(decode_identity(&BearerToken::new("")).is_none());
        assert!(decode_identity(&BearerToken::new("not-a-jwt")).is_none());
        assert!(decode_identity(&BearerToken::new("a.%%%.c")).is_none());
        let array_payload = URL_SAFE_NO_PAD.encode("[1,2]");
        assert!(decode_identity(&BearerToken::new(format!("a.{array_payload}.c"))).is_none());
    }
}
