use roster_core::db::{open_db_in_memory, share};
use roster_core::{
    Level, PagingConfig, ServiceError, SqliteStudentRepository, StudentDraft, StudentService,
};

fn service() -> StudentService<SqliteStudentRepository> {
    let conn = share(open_db_in_memory().unwrap());
    StudentService::new(SqliteStudentRepository::new(conn), PagingConfig::default())
}

#[test]
fn create_then_get_returns_input_with_assigned_id() {
    let service = service();
    let draft = StudentDraft::new("john", Level::ThirdGrade);

    let created = service.create(&draft).unwrap();
    let loaded = service.get(created.id).unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.username, "john");
    assert_eq!(loaded.level, Level::ThirdGrade);
}

#[test]
fn get_is_stable_until_the_record_is_mutated() {
    let service = service();
    let john = service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();
    service
        .create(&StudentDraft::new("mike", Level::Advanced))
        .unwrap();

    assert_eq!(service.get(john.id).unwrap(), john);
    assert_eq!(service.get(john.id).unwrap(), john);

    let updated = service
        .update(john.id, &StudentDraft::new("johnny", Level::SecondGrade))
        .unwrap();
    assert_eq!(updated.id, john.id);
    assert_eq!(service.get(john.id).unwrap(), updated);
}

#[test]
fn create_with_taken_username_conflicts_and_leaves_store_unchanged() {
    let service = service();
    service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();

    let err = service
        .create(&StudentDraft::new("John", Level::Advanced))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(name) if name == "John"));
    assert_eq!(service.count().unwrap(), 1);
}

#[test]
fn update_to_another_students_username_conflicts() {
    let service = service();
    service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();
    let mike = service
        .create(&StudentDraft::new("mike", Level::FirstGrade))
        .unwrap();

    let err = service
        .update(mike.id, &StudentDraft::new("JOHN", Level::FirstGrade))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(service.get(mike.id).unwrap(), mike);
}

#[test]
fn update_may_keep_own_username() {
    let service = service();
    let john = service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();

    let updated = service
        .update(john.id, &StudentDraft::new("John", Level::FifthGrade))
        .unwrap();
    assert_eq!(updated.username, "John");
    assert_eq!(updated.level, Level::FifthGrade);
}

#[test]
fn update_missing_id_is_not_found() {
    let service = service();
    let err = service
        .update(7, &StudentDraft::new("john", Level::FirstGrade))
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(7)));
}

#[test]
fn delete_missing_id_is_not_found_and_size_is_unchanged() {
    let service = service();
    service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();

    let err = service.delete(999).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(999)));
    assert_eq!(service.count().unwrap(), 1);
}

#[test]
fn delete_removes_the_record() {
    let service = service();
    let john = service
        .create(&StudentDraft::new("john", Level::FirstGrade))
        .unwrap();

    service.delete(john.id).unwrap();
    assert!(matches!(
        service.get(john.id),
        Err(ServiceError::NotFound(id)) if id == john.id
    ));
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn invalid_username_is_a_validation_error() {
    let service = service();
    let err = service
        .create(&StudentDraft::new("jo hn", Level::FirstGrade))
        .unwrap_err();
    match err {
        ServiceError::Validation(err) => assert_eq!(err.field, "username"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}
