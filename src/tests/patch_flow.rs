//! Config file → parser → PATCH request → storage attributes, and the
//! authorization gate in front of it.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::{
    auth::{AuthError, RequestAuthorizationGate, Tenant, TenantAuthorizer},
    config::PatchgateConfig,
    scim::{
        PatchError, PatchOpKind, PatchRequest, PatchValue, PathSegment, ResourceType,
        ScimErrorResponse, StoragePath, find_value_for,
    },
};

const CONFIG: &str = r#"
[auth]
searchable_attribute = "email"
signing_secret = "${PATCHGATE_TEST_SECRET}"

[schema.user]
userName = "email"
displayName = "display_name"
name = { givenName = "first_name", familyName = "last_name" }
emails = [ { type = "work", value = "email" }, { type = "home", value = "personal_email" } ]
active = "active"

[schema.group]
displayName = "name"
members = "member_ids"
"#;

#[fixture]
fn config() -> PatchgateConfig {
    temp_env::with_var("PATCHGATE_TEST_SECRET", Some("flow-secret"), || {
        PatchgateConfig::from_str(CONFIG).unwrap()
    })
}

fn request(body: Value) -> PatchRequest {
    serde_json::from_value(body).unwrap()
}

#[rstest]
fn test_user_patch_resolves_storage_attributes(config: PatchgateConfig) {
    let parser = config.schema.parser(ResourceType::User);
    let request = request(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [
            { "op": "replace", "path": "name.givenName", "value": "Ada" },
            { "op": "add", "path": "emails[type eq \"home\"].value", "value": "ada@home.test" },
            { "op": "replace", "path": "active", "value": "false" },
            { "op": "remove", "path": "displayName" }
        ]
    }));

    let operations = request.parse_operations(&parser).unwrap();
    let resolved: Vec<_> = operations
        .iter()
        .map(|op| (op.op(), op.storage_attribute()))
        .collect();
    assert_eq!(
        resolved,
        vec![
            (PatchOpKind::Replace, Some("first_name")),
            (PatchOpKind::Add, Some("personal_email")),
            (PatchOpKind::Replace, Some("active")),
            (PatchOpKind::Remove, Some("display_name")),
        ]
    );

    assert_eq!(
        operations[1].path_sp(),
        Some(&StoragePath::from([
            PathSegment::from("emails"),
            PathSegment::Index(1),
            PathSegment::from("value"),
        ]))
    );
    assert_eq!(
        operations[1].value(),
        Some(&PatchValue::Single("ada@home.test".to_string()))
    );
    assert_eq!(operations[3].value(), None);
}

#[rstest]
fn test_group_patch_uses_group_schema(config: PatchgateConfig) {
    let parser = config.schema.parser(ResourceType::Group);
    let request = request(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [
            { "op": "add", "path": "members", "value": ["u-1", "u-2"] }
        ]
    }));

    let operations = request.parse_operations(&parser).unwrap();
    assert_eq!(operations[0].storage_attribute(), Some("member_ids"));
    assert_eq!(
        operations[0].value(),
        Some(&PatchValue::Multiple(vec!["u-1".to_string(), "u-2".to_string()]))
    );
}

#[rstest]
fn test_unresolvable_path_is_kept_without_storage(config: PatchgateConfig) {
    let parser = config.schema.parser(ResourceType::User);
    let op = parser
        .parse("replace", Some("nickName"), Some(&json!("Ada")))
        .unwrap();

    assert_eq!(op.path_scim().attribute, "nickName");
    assert_eq!(op.path_sp(), None);
    assert_eq!(op.storage_attribute(), None);
}

#[rstest]
fn test_failed_operation_maps_to_scim_error(config: PatchgateConfig) {
    let parser = config.schema.parser(ResourceType::User);
    let request = request(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [
            { "op": "replace", "path": "active", "value": "true" },
            { "op": "replace", "path": "emails[type eq work].value", "value": "x" }
        ]
    }));

    let err = request.parse_operations(&parser).unwrap_err();
    assert!(matches!(
        &err,
        PatchError::InvalidOperation { index: 1, error } if matches!(**error, PatchError::MalformedFilter(_))
    ));

    let response = ScimErrorResponse::from(err);
    assert_eq!(response.status, "400");
    assert!(response.detail.contains("index 1"));
}

#[rstest]
fn test_find_value_for_reads_inbound_body(config: PatchgateConfig) {
    let body = json!({
        "userName": "ada@work.test",
        "name": { "givenName": "Ada", "familyName": "Lovelace" },
        "emails": [ { "type": "work", "value": "ada@work.test" } ]
    });

    assert_eq!(
        find_value_for("last_name", &config.schema.user, &body),
        Some(&json!("Lovelace"))
    );
    assert_eq!(find_value_for("active", &config.schema.user, &body), None);
}

struct Tenants(HashMap<(String, String), Tenant>);

#[async_trait]
impl TenantAuthorizer for Tenants {
    async fn authorize(
        &self,
        searchable_attribute: &str,
        authentication_attribute: &str,
    ) -> Result<Option<Tenant>, AuthError> {
        Ok(self
            .0
            .get(&(
                searchable_attribute.to_owned(),
                authentication_attribute.to_owned(),
            ))
            .cloned())
    }
}

fn tenant() -> Tenant {
    Tenant {
        id: "t-1".to_string(),
        name: Some("Acme".to_string()),
    }
}

#[cfg(feature = "jwt")]
#[rstest]
#[tokio::test]
async fn test_gate_basic_flow(config: PatchgateConfig) {
    let authorizer = Tenants(HashMap::from([(
        ("admin@acme.test".to_string(), "pw".to_string()),
        tenant(),
    )]));
    let gate = RequestAuthorizationGate::from_config(&config.auth, Arc::new(authorizer));

    let header = format!("Basic {}", STANDARD.encode("admin@acme.test:pw"));
    assert_eq!(gate.authorize(Some(&header)).await.unwrap(), tenant());

    let header = format!("Basic {}", STANDARD.encode("admin@acme.test:nope"));
    assert_eq!(
        gate.authorize(Some(&header)).await.unwrap_err(),
        AuthError::InvalidCredentials
    );
}

#[cfg(feature = "jwt")]
#[rstest]
#[tokio::test]
async fn test_gate_bearer_flow(config: PatchgateConfig) {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let token = encode(
        &Header::default(),
        &json!({ "sub": "scim-client", "org": { "email": "ops@acme.test" } }),
        &EncodingKey::from_secret(b"flow-secret"),
    )
    .unwrap();
    let authorizer = Tenants(HashMap::from([(
        ("ops@acme.test".to_string(), token.clone()),
        tenant(),
    )]));
    let gate = RequestAuthorizationGate::from_config(&config.auth, Arc::new(authorizer));

    let tenant_found = gate
        .authorize(Some(&format!("Bearer {token}")))
        .await
        .unwrap();
    assert_eq!(tenant_found.id, "t-1");

    let forged = encode(
        &Header::default(),
        &json!({ "email": "ops@acme.test" }),
        &EncodingKey::from_secret(b"other-secret"),
    )
    .unwrap();
    assert!(matches!(
        gate.authorize(Some(&format!("Bearer {forged}"))).await,
        Err(AuthError::InvalidToken(_))
    ));
}
