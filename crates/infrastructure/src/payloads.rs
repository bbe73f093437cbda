//! Normalisation of upstream payloads into domain values.
//!
//! The upstream API is inconsistent about field casing and id types, so every field
//! is read through an ordered alias list. Rows that cannot be normalised are skipped.

use constructmate_application::{LoginOutcome, OrganisationSummary};
use constructmate_core::{AppError, AppResult, BearerToken, OrganisationId};
use constructmate_domain::{Page, PageId, Role, RoleId, RolePageMapping};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

#[cfg(test)]
mod tests;

const ROLE_ID_FIELDS: &[&str] = &["roleid", "roleId", "RoleId", "id"];
const ROLE_NAME_FIELDS: &[&str] = &["rolename", "roleName", "RoleName", "name"];
const ROLE_RANK_FIELDS: &[&str] = &["rank", "roleRank", "Rank"];
const PAGE_ID_FIELDS: &[&str] = &["pageId", "pageid", "PageId", "id"];
const PAGE_NAME_FIELDS: &[&str] = &["pageName", "pagename", "PageName", "name"];
const MAPPING_ROLE_FIELDS: &[&str] = &["roleid", "roleId", "RoleId", "role"];
const MAPPING_PAGE_LIST_FIELDS: &[&str] = &["pageIds", "pageids", "PageIds"];
const MAPPING_PAGE_FIELDS: &[&str] = &["pageid", "pageId", "PageId"];
const ORGANISATION_ID_FIELDS: &[&str] = &[
    "organisationId",
    "organisationid",
    "Organisationid",
    "OrganisationId",
    "orgId",
];
const ORGANISATION_NAME_FIELDS: &[&str] =
    &["organisationName", "organisationname", "OrganisationName"];

/// Normalises a role list body.
pub(crate) fn parse_roles(body: Value) -> Vec<Role> {
    parse_rows(body, "role", parse_role)
}

/// Normalises a page list body.
pub(crate) fn parse_pages(body: Value) -> Vec<Page> {
    parse_rows(body, "page", parse_page)
}

/// Normalises a role/page mapping list body.
pub(crate) fn parse_mappings(body: Value) -> Vec<RolePageMapping> {
    parse_rows(body, "role page mapping", parse_mapping)
}

/// Reads the organisation from a dashboard body.
pub(crate) fn parse_organisation(body: &Value) -> Option<OrganisationSummary> {
    let row = body.as_object()?;
    let organisation_id = field_text(row, ORGANISATION_ID_FIELDS)
        .and_then(|value| OrganisationId::new(value).ok())?;

    Some(OrganisationSummary {
        organisation_id,
        organisation_name: field_text(row, ORGANISATION_NAME_FIELDS),
    })
}

/// Reads a login response body.
pub(crate) fn parse_login(body: &Value) -> LoginOutcome {
    let row = body.as_object();
    match row.and_then(|row| field_text(row, &["token", "Token", "accessToken"])) {
        Some(token) => LoginOutcome::Issued(BearerToken::new(token)),
        None => LoginOutcome::Rejected(
            row.and_then(|row| field_text(row, &["errorMessage", "ErrorMessage", "message"]))
                .unwrap_or_else(|| "Login failed.".to_owned()),
        ),
    }
}

/// Role body accepted by the upstream add and update endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct RoleBody<'a> {
    #[serde(rename = "roleid", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<&'a str>,
    #[serde(rename = "RoleName")]
    pub role_name: &'a str,
    #[serde(rename = "Organisationid")]
    pub organisation_id: &'a str,
}

/// Page body accepted by the upstream add and update endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<&'a str>,
    pub page_name: &'a str,
    pub organisation_id: &'a str,
}

/// One mapping row accepted by the upstream save endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct MappingBody<'a> {
    #[serde(rename = "roleid")]
    pub role_id: &'a str,
    #[serde(rename = "pageIds")]
    pub page_ids: Vec<&'a str>,
}

impl<'a> MappingBody<'a> {
    pub(crate) fn from_mapping(mapping: &'a RolePageMapping) -> Self {
        Self {
            role_id: mapping.role_id().as_str(),
            page_ids: mapping.page_ids().iter().map(PageId::as_str).collect(),
        }
    }
}

/// Credentials accepted by the upstream login endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginBody<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

fn parse_rows<T>(
    body: Value,
    kind: &'static str,
    parse: impl Fn(&Map<String, Value>) -> AppResult<T>,
) -> Vec<T> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Null => return Vec::new(),
        other => {
            warn!(kind, body = %other, "expected a list body; treating as empty");
            return Vec::new();
        }
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let parsed = match row.as_object() {
                Some(object) => parse(object),
                None => Err(AppError::Validation("row is not an object".to_owned())),
            };
            parsed
                .map_err(|error| warn!(kind, index, error = %error, "skipping malformed row"))
                .ok()
        })
        .collect()
}

fn parse_role(row: &Map<String, Value>) -> AppResult<Role> {
    let id = require_text(row, ROLE_ID_FIELDS, "role id")?;
    let name = require_text(row, ROLE_NAME_FIELDS, "role name")?;
    let rank = field(row, ROLE_RANK_FIELDS).and_then(Value::as_i64);

    Role::new(RoleId::new(id)?, name, organisation_of(row), rank)
}

fn parse_page(row: &Map<String, Value>) -> AppResult<Page> {
    let id = require_text(row, PAGE_ID_FIELDS, "page id")?;
    let name = require_text(row, PAGE_NAME_FIELDS, "page name")?;

    Page::new(PageId::new(id)?, name, organisation_of(row))
}

fn parse_mapping(row: &Map<String, Value>) -> AppResult<RolePageMapping> {
    let role_id = RoleId::new(require_text(row, MAPPING_ROLE_FIELDS, "mapping role id")?)?;

    let page_ids = match field(row, MAPPING_PAGE_LIST_FIELDS) {
        Some(Value::Array(values)) => values.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => field_text(row, MAPPING_PAGE_FIELDS).into_iter().collect::<Vec<_>>(),
    };
    let page_ids = page_ids
        .into_iter()
        .map(PageId::new)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(RolePageMapping::new(role_id, page_ids))
}

fn organisation_of(row: &Map<String, Value>) -> Option<OrganisationId> {
    field_text(row, ORGANISATION_ID_FIELDS).and_then(|value| OrganisationId::new(value).ok())
}

fn require_text(row: &Map<String, Value>, keys: &[&str], label: &str) -> AppResult<String> {
    field_text(row, keys).ok_or_else(|| AppError::Validation(format!("missing {label}")))
}

fn field<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn field_text(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find_map(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
