use roster_core::api::{
    STATUS_BAD_REQUEST, STATUS_CONFLICT, STATUS_CREATED, STATUS_NO_CONTENT, STATUS_NOT_FOUND,
    STATUS_OK, STATUS_UNAUTHORIZED,
};
use roster_core::{AppConfig, Level, RosterApi, StudentDraft, StudentQuery, Token};

fn api() -> RosterApi {
    RosterApi::open(&AppConfig::default()).unwrap()
}

fn login(api: &RosterApi) -> Token {
    let response = api.login("admin", "password");
    assert_eq!(response.status, STATUS_OK);
    response.body.unwrap()
}

#[test]
fn bootstrap_admin_can_log_in_and_bad_credentials_look_identical() {
    let api = api();
    login(&api);

    let wrong_secret = api.login("admin", "nope");
    let unknown_user = api.login("ghost", "password");
    assert_eq!(wrong_secret.status, STATUS_UNAUTHORIZED);
    assert_eq!(wrong_secret.error, unknown_user.error);
}

#[test]
fn student_operations_require_a_valid_token() {
    let api = api();
    let forged = Token::new("not-a-session");

    assert_eq!(
        api.list_students(&forged, &StudentQuery::default()).status,
        STATUS_UNAUTHORIZED
    );
    assert_eq!(
        api.create_student(&forged, &StudentDraft::new("john", Level::FirstGrade))
            .status,
        STATUS_UNAUTHORIZED
    );
    assert_eq!(api.delete_student(&forged, 1).status, STATUS_UNAUTHORIZED);
}

#[test]
fn crud_calls_use_reference_status_codes() {
    let api = api();
    let token = login(&api);

    let created = api.create_student(&token, &StudentDraft::new("john", Level::ThirdGrade));
    assert_eq!(created.status, STATUS_CREATED);
    let john = created.body.unwrap();

    assert_eq!(api.get_student(&token, john.id).status, STATUS_OK);
    assert_eq!(
        api.create_student(&token, &StudentDraft::new("JOHN", Level::FirstGrade))
            .status,
        STATUS_CONFLICT
    );
    assert_eq!(
        api.update_student(&token, john.id, &StudentDraft::new("johnny", Level::Advanced))
            .status,
        STATUS_OK
    );

    let deleted = api.delete_student(&token, john.id);
    assert_eq!(deleted.status, STATUS_NO_CONTENT);
    assert!(deleted.body.is_none());
    assert_eq!(api.get_student(&token, john.id).status, STATUS_NOT_FOUND);
}

#[test]
fn validation_failure_serializes_field_errors() {
    let api = api();
    let token = login(&api);

    let response = api.create_student(&token, &StudentDraft::new("x", Level::FirstGrade));
    assert_eq!(response.status, STATUS_BAD_REQUEST);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], 400);
    assert!(json.get("body").is_none());
    assert_eq!(json["error"]["status"], 400);
    assert!(json["error"]["errors"]["username"].is_string());
}

#[test]
fn import_error_reports_row_and_keeps_store() {
    let api = api();
    let token = login(&api);
    api.create_student(&token, &StudentDraft::new("john", Level::ThirdGrade));

    let response = api.import_students(
        &token,
        "ID,Username,Level\n1,amy,FIRST_GRADE\n2,bob,NINTH_GRADE\n".as_bytes(),
    );
    assert_eq!(response.status, STATUS_BAD_REQUEST);
    let error = response.error.unwrap();
    assert!(error.message.starts_with("row 3"));
    assert!(error.errors.contains_key("level"));

    let listed = api.list_students(&token, &StudentQuery::default());
    assert_eq!(listed.body.unwrap().total, 1);
}

#[test]
fn export_and_import_through_the_facade() {
    let api = api();
    let token = login(&api);
    api.create_student(&token, &StudentDraft::new("mike", Level::Advanced));

    let mut csv = Vec::new();
    let exported = api.export_students(&token, &mut csv);
    assert_eq!(exported.body.unwrap().exported, 1);

    let imported = api.import_students(&token, csv.as_slice());
    assert_eq!(imported.status, STATUS_OK);
    let summary = imported.body.unwrap();
    assert_eq!((summary.imported, summary.replaced), (1, 1));
}

#[test]
fn only_authenticated_admins_register_new_admins() {
    let api = api();
    let token = login(&api);

    assert_eq!(
        api.register(&Token::new("forged"), "registrar", "s3cret").status,
        STATUS_UNAUTHORIZED
    );

    let registered = api.register(&token, "registrar", "s3cret");
    assert_eq!(registered.status, STATUS_CREATED);
    assert_eq!(registered.body.unwrap().username, "registrar");
    assert_eq!(
        api.register(&token, "registrar", "other").status,
        STATUS_CONFLICT
    );
    assert_eq!(api.login("registrar", "s3cret").status, STATUS_OK);
}

#[test]
fn logout_revokes_the_token() {
    let api = api();
    let token = login(&api);

    assert_eq!(api.logout(&token).status, STATUS_NO_CONTENT);
    assert_eq!(
        api.get_student(&token, 1).status,
        STATUS_UNAUTHORIZED
    );
}

#[test]
fn expired_sessions_are_rejected() {
    let config = AppConfig {
        session_ttl_secs: 1,
        ..AppConfig::default()
    };
    let api = RosterApi::open(&config).unwrap();
    let token = login(&api);
    std::thread::sleep(std::time::Duration::from_millis(1100));

    assert_eq!(
        api.list_students(&token, &StudentQuery::default()).status,
        STATUS_UNAUTHORIZED
    );
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        db_path: Some(dir.path().join("roster.db")),
        ..AppConfig::default()
    };

    {
        let api = RosterApi::open(&config).unwrap();
        let token = login(&api);
        api.create_student(&token, &StudentDraft::new("john", Level::FirstGrade));
    }

    let api = RosterApi::open(&config).unwrap();
    let token = login(&api);
    let listed = api.list_students(&token, &StudentQuery::default());
    assert_eq!(listed.body.unwrap().items[0].username, "john");
}
