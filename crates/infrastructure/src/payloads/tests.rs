use constructmate_application::LoginOutcome;
use constructmate_domain::{PageId, RoleId, RolePageMapping};
use serde_json::json;

use super::{
    MappingBody, PageBody, RoleBody, parse_login, parse_mappings, parse_organisation, parse_pages,
    parse_roles,
};

#[test]
fn role_rows_accept_every_casing() {
    let roles = parse_roles(json!([
        { "roleid": 1, "rolename": "Supervisor", "organisationId": 7, "rank": 2 },
        { "roleId": "2", "roleName": " Engineer " },
        { "id": 3, "name": "Accountant" }
    ]));

    let names: Vec<&str> = roles.iter().map(|role| role.name()).collect();
    assert_eq!(names, vec!["Supervisor", "Engineer", "Accountant"]);
    assert_eq!(roles.first().map(|role| role.id().as_str()), Some("1"));
    assert_eq!(roles.first().and_then(|role| role.rank()), Some(2));
    assert_eq!(
        roles
            .first()
            .and_then(|role| role.organisation_id())
            .map(|value| value.as_str()),
        Some("7")
    );
}

#[test]
fn malformed_rows_are_skipped() {
    let roles = parse_roles(json!([
        { "rolename": "No Id" },
        { "roleid": 5 },
        "not an object",
        { "roleid": 6, "rolename": "Foreman" }
    ]));

    assert_eq!(roles.len(), 1);
    assert_eq!(roles.first().map(|role| role.name()), Some("Foreman"));
}

#[test]
fn non_list_bodies_are_empty() {
    assert!(parse_pages(json!(null)).is_empty());
    assert!(parse_pages(json!({ "message": "no pages" })).is_empty());
}

#[test]
fn page_rows_accept_every_casing() {
    let pages = parse_pages(json!([
        { "pageId": 10, "pageName": "Site Management" },
        { "pageid": "11", "pagename": "Employee Management" },
        { "id": 12, "name": "Receipts" }
    ]));

    let ids: Vec<&str> = pages.iter().map(|page| page.id().as_str()).collect();
    assert_eq!(ids, vec!["10", "11", "12"]);
}

#[test]
fn mapping_rows_accept_lists_and_single_ids() {
    let mappings = parse_mappings(json!([
        { "roleid": 1, "pageIds": [10, "11"] },
        { "roleId": 2, "pageid": 12 },
        { "role": "3", "pageId": "13" },
        { "roleid": 4 },
        { "pageIds": [10] }
    ]));

    assert_eq!(mappings.len(), 4);
    let first = mappings.first().unwrap_or_else(|| unreachable!());
    assert_eq!(first.role_id().as_str(), "1");
    assert_eq!(first.page_ids().len(), 2);
    assert!(
        mappings
            .get(3)
            .is_some_and(|mapping| mapping.page_ids().is_empty())
    );
}

#[test]
fn numeric_and_text_ids_normalise_to_the_same_value() {
    let mappings = parse_mappings(json!([{ "roleid": 1, "pageIds": [10] }]));
    let pages = parse_pages(json!([{ "pageId": "10", "pageName": "Sites" }]));

    let mapped = mappings
        .first()
        .map(|mapping| mapping.page_ids().iter().cloned().collect::<Vec<_>>());
    let listed = pages.first().map(|page| vec![page.id().clone()]);
    assert_eq!(mapped, listed);
}

#[test]
fn organisation_is_read_from_dashboard_body() {
    let summary = parse_organisation(&json!({
        "organisationId": 42,
        "organisationName": "Mason Builders",
        "totalSites": 3
    }))
    .unwrap_or_else(|| unreachable!());

    assert_eq!(summary.organisation_id.as_str(), "42");
    assert_eq!(summary.organisation_name.as_deref(), Some("Mason Builders"));
    assert!(parse_organisation(&json!({ "totalSites": 3 })).is_none());
    assert!(parse_organisation(&json!(null)).is_none());
}

#[test]
fn login_body_yields_token_or_message() {
    assert_eq!(
        parse_login(&json!({ "token": "abc" })),
        LoginOutcome::Issued(constructmate_core::BearerToken::new("abc"))
    );
    assert_eq!(
        parse_login(&json!({ "token": null, "errorMessage": "Invalid password" })),
        LoginOutcome::Rejected("Invalid password".to_owned())
    );
    assert_eq!(
        parse_login(&json!("unexpected")),
        LoginOutcome::Rejected("Login failed.".to_owned())
    );
}

#[test]
fn request_bodies_use_upstream_field_names() {
    let role = serde_json::to_value(RoleBody {
        role_id: Some("1"),
        role_name: "Supervisor",
        organisation_id: "7",
    })
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        role,
        json!({ "roleid": "1", "RoleName": "Supervisor", "Organisationid": "7" })
    );

    let page = serde_json::to_value(PageBody {
        page_id: None,
        page_name: "Receipts",
        organisation_id: "7",
    })
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(page, json!({ "pageName": "Receipts", "organisationId": "7" }));

    let role_id = RoleId::new("1").unwrap_or_else(|_| unreachable!());
    let page_id = PageId::new("10").unwrap_or_else(|_| unreachable!());
    let mapping = RolePageMapping::new(role_id, [page_id]);
    let body = serde_json::to_value(MappingBody::from_mapping(&mapping))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(body, json!({ "roleid": "1", "pageIds": ["10"] }));
}
