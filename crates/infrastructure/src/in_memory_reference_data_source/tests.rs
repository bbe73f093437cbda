use constructmate_application::{
    CreatePageInput, CreateRoleInput, ReferenceDataSource, UpdateRoleInput,
};
use constructmate_core::{AppError, BearerToken, OrganisationId};
use constructmate_domain::{PageId, RoleId, RolePageMapping};

use super::InMemoryReferenceDataSource;

const SEED: &str = r#"{
    "roles": [
        { "roleid": 1, "rolename": "Supervisor", "organisationId": 7 },
        { "roleid": 2, "rolename": "Engineer", "organisationId": 8 },
        { "roleid": 3, "rolename": "Admin" }
    ],
    "pages": [
        { "pageId": 10, "pageName": "Site Management", "organisationId": 7 },
        { "pageId": 11, "pageName": "Employee Management", "organisationId": 7 }
    ],
    "mappings": [
        { "roleid": 1, "pageIds": [10] },
        { "roleid": 1, "pageid": 11 },
        { "pageIds": [10] }
    ],
    "organisations": [
        { "email": "Sam@Example.com", "organisationId": 7, "organisationName": "Mason Builders" },
        { "organisationId": 9 }
    ]
}"#;

fn token() -> BearerToken {
    BearerToken::new("token")
}

fn organisation(value: &str) -> OrganisationId {
    OrganisationId::new(value).unwrap_or_else(|_| unreachable!())
}

fn seeded() -> InMemoryReferenceDataSource {
    InMemoryReferenceDataSource::from_seed_json(SEED).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn seed_rows_are_scoped_by_organisation() {
    let source = seeded();

    let roles = source
        .list_roles(&token(), &organisation("7"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let names: Vec<&str> = roles.iter().map(|role| role.name()).collect();
    assert_eq!(names, vec!["Supervisor", "Admin"]);

    let pages = source
        .list_pages(&token(), &organisation("8"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(pages.is_empty());
}

#[tokio::test]
async fn seed_mappings_merge_repeated_roles() {
    let mappings = seeded()
        .list_role_page_mappings(&token())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(mappings.len(), 1);
    assert_eq!(
        mappings.first().map(|mapping| mapping.page_ids().len()),
        Some(2)
    );
}

#[tokio::test]
async fn organisations_are_found_by_case_insensitive_email() {
    let summary = seeded()
        .find_organisation(&token(), " sam@example.COM ")
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());

    assert_eq!(summary.organisation_id.as_str(), "7");
    assert_eq!(summary.organisation_name.as_deref(), Some("Mason Builders"));
}

#[tokio::test]
async fn created_rows_get_the_next_numeric_id() {
    let source = seeded();
    source
        .create_role(
            &token(),
            CreateRoleInput {
                organisation_id: organisation("7"),
                name: "Foreman".to_owned(),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    source
        .create_page(
            &token(),
            CreatePageInput {
                organisation_id: organisation("7"),
                name: "Receipts".to_owned(),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let roles = source
        .list_roles(&token(), &organisation("7"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(
        roles
            .iter()
            .any(|role| role.id().as_str() == "4" && role.name() == "Foreman")
    );

    let pages = source
        .list_pages(&token(), &organisation("7"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(pages.iter().any(|page| page.id().as_str() == "12"));
}

#[tokio::test]
async fn updating_a_role_of_another_organisation_is_not_found() {
    let result = seeded()
        .update_role(
            &token(),
            UpdateRoleInput {
                role_id: RoleId::new("2").unwrap_or_else(|_| unreachable!()),
                organisation_id: organisation("7"),
                name: "Site Engineer".to_owned(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn replacing_mappings_overwrites_only_submitted_roles() {
    let source = seeded();
    let role_id = RoleId::new("2").unwrap_or_else(|_| unreachable!());
    let page_id = PageId::new("11").unwrap_or_else(|_| unreachable!());

    source
        .replace_role_page_mappings(&token(), vec![RolePageMapping::new(role_id, [page_id])])
        .await
        .unwrap_or_else(|_| unreachable!());

    let mappings = source
        .list_role_page_mappings(&token())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(mappings.len(), 2);
}

#[test]
fn invalid_seed_is_rejected() {
    assert!(matches!(
        InMemoryReferenceDataSource::from_seed_json("[1, 2"),
        Err(AppError::Validation(_))
    ));
}
