use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use runcrew_crypto::keys::generate_key;
use runcrew_db::Database;
use runcrew_service::{ErrorCode, ServiceConfig, Services};
use runcrew_types::api::{
    CreateCrewRequest, CrewFilter, NewMessageRequest, NewRunRecordRequest, PageRequest,
    SignupRequest,
};
use runcrew_types::models::{Gender, MessageType, Region};

fn setup() -> Services {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let config = ServiceConfig::new(":memory:", generate_key(), "crew-test-secret");
    Services::with_database(db, &config)
}

fn crew(name: &str, region: Region, ages: (i32, i32), gender: Option<Gender>) -> CreateCrewRequest {
    CreateCrewRequest {
        crew_name: name.into(),
        activity_region: Some(region),
        min_age: Some(ages.0),
        max_age: Some(ages.1),
        gender,
        run_record_open: true,
        leader_required: false,
    }
}

fn seed_crews(services: &Services) {
    for req in [
        crew("Han River Dawn", Region::Seoul, (20, 40), None),
        crew("Haeundae Tempo", Region::Busan, (25, 50), Some(Gender::Female)),
        crew("Namsan Hills", Region::Seoul, (30, 60), Some(Gender::Male)),
        crew("Gangnam Night", Region::Seoul, (18, 35), Some(Gender::Female)),
    ] {
        services.crews.register_crew(req).unwrap();
    }
}

fn names(page: &runcrew_types::api::Page<runcrew_types::api::CrewResponse>) -> Vec<&str> {
    page.items.iter().map(|c| c.crew_name.as_str()).collect()
}

#[test]
fn empty_filter_returns_every_crew_in_order() {
    let services = setup();
    seed_crews(&services);

    let page = services
        .crews
        .find_crews(&CrewFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(page.total_elements, 4);
    assert_eq!(page.total_pages, 1);
    assert_eq!(
        names(&page),
        vec!["Han River Dawn", "Haeundae Tempo", "Namsan Hills", "Gangnam Night"]
    );
}

#[test]
fn filters_combine_with_and() {
    let services = setup();
    seed_crews(&services);

    let filter = CrewFilter {
        activity_region: Some(Region::Seoul),
        gender: Some(Gender::Female),
        ..CrewFilter::default()
    };
    let page = services.crews.find_crews(&filter, PageRequest::default()).unwrap();
    assert_eq!(names(&page), vec!["Gangnam Night"]);
}

#[test]
fn age_filter_requires_range_to_fit_inside_crew_range() {
    let services = setup();
    seed_crews(&services);

    let filter = CrewFilter {
        min_age: Some(30),
        max_age: Some(40),
        ..CrewFilter::default()
    };
    let page = services.crews.find_crews(&filter, PageRequest::default()).unwrap();
    assert_eq!(names(&page), vec!["Han River Dawn", "Haeundae Tempo", "Namsan Hills"]);
}

#[test]
fn pages_are_stable_slices() {
    let services = setup();
    seed_crews(&services);

    let second = services
        .crews
        .find_crews(&CrewFilter::default(), PageRequest::new(1, 3))
        .unwrap();
    assert_eq!(second.total_elements, 4);
    assert_eq!(second.total_pages, 2);
    assert_eq!(names(&second), vec!["Gangnam Night"]);

    let past_end = services
        .crews
        .find_crews(&CrewFilter::default(), PageRequest::new(5, 3))
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_elements, 4);
}

#[test]
fn out_of_range_page_sizes_are_clamped() {
    let services = setup();
    for i in 0..105 {
        services
            .crews
            .register_crew(crew(&format!("Crew {i:03}"), Region::Gyeonggi, (20, 40), None))
            .unwrap();
    }

    let huge: PageRequest = serde_json::from_str(r#"{"page":0,"size":100000}"#).unwrap();
    let page = services.crews.find_crews(&CrewFilter::default(), huge).unwrap();
    assert_eq!(page.items.len(), 100);
    assert_eq!(page.size, PageRequest::MAX_SIZE);
    assert_eq!(page.total_pages, 2);

    let zero: PageRequest = serde_json::from_str(r#"{"page":0,"size":0}"#).unwrap();
    let page = services.crews.find_crews(&CrewFilter::default(), zero).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_elements, 105);
    assert_eq!(page.total_pages, 105);
}

#[test]
fn crew_names_are_unique() {
    let services = setup();
    services
        .crews
        .register_crew(crew("Han River Dawn", Region::Seoul, (20, 40), None))
        .unwrap();

    let err = services
        .crews
        .register_crew(crew("Han River Dawn", Region::Busan, (20, 40), None))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyExistCrew);
}

#[test]
fn invalid_crew_and_missing_crew() {
    let services = setup();
    let err = services
        .crews
        .register_crew(crew("Backwards", Region::Jeju, (50, 20), None))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    let err = services.crews.get_crew(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFoundCrew);
}

#[test]
fn registered_crew_can_be_fetched() {
    let services = setup();
    let created = services
        .crews
        .register_crew(crew("Daegu Sunrise", Region::Daegu, (20, 45), None))
        .unwrap();

    let fetched = services.crews.get_crew(created.id).unwrap();
    assert_eq!(fetched.crew_name, "Daegu Sunrise");
    assert_eq!(fetched.activity_region, Some(Region::Daegu));
    assert!(fetched.run_record_open);
}

fn talk(content: &str) -> NewMessageRequest {
    NewMessageRequest {
        message_type: MessageType::Talk,
        content: content.into(),
        image_url: None,
    }
}

#[test]
fn messages_replay_newest_first_with_cursor() {
    let services = setup();
    for text in ["first", "second", "third"] {
        services.messages.record_message(talk(text)).unwrap();
    }

    let latest = services.messages.recent_messages(2, None).unwrap();
    let contents: Vec<_> = latest.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["third", "second"]);

    let older = services
        .messages
        .recent_messages(2, Some(latest[1].id))
        .unwrap();
    let contents: Vec<_> = older.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first"]);

    let exhausted = services.messages.recent_messages(2, Some(older[0].id)).unwrap();
    assert!(exhausted.is_empty());
}

#[test]
fn zero_limit_still_returns_one_message() {
    let services = setup();
    services.messages.record_message(talk("hello")).unwrap();
    assert_eq!(services.messages.recent_messages(0, None).unwrap().len(), 1);
}

#[test]
fn message_validation_by_type() {
    let services = setup();

    let err = services
        .messages
        .record_message(NewMessageRequest {
            message_type: MessageType::Image,
            content: String::new(),
            image_url: Some("  ".into()),
        })
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    let err = services.messages.record_message(talk("   ")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    let enter = services
        .messages
        .record_message(NewMessageRequest {
            message_type: MessageType::Enter,
            content: String::new(),
            image_url: Some(String::new()),
        })
        .unwrap();
    assert_eq!(enter.message_type, MessageType::Enter);
    assert_eq!(enter.image_url, None);
}

fn run(distance_meters: u32, duration_seconds: u32, day: u32) -> NewRunRecordRequest {
    NewRunRecordRequest {
        distance_meters,
        duration_seconds,
        run_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
    }
}

#[test]
fn run_records_belong_to_existing_members() {
    let services = setup();
    let member = services
        .members
        .register_user(SignupRequest {
            email: "runner@run.kr".into(),
            password: "Morning5k!".into(),
            confirm_password: "Morning5k!".into(),
            phone_number: "01080808080".into(),
            name: "Park".into(),
            nick_name: "pacer".into(),
            gender: None,
            birth_year: None,
            activity_region: None,
            profile_image: None,
        })
        .unwrap();

    services.run_records.record_run(member.id, run(10_000, 3_000, 9)).unwrap();
    let first = services.run_records.record_run(member.id, run(5_000, 1_500, 2)).unwrap();
    assert_eq!(first.pace_seconds_per_km, 300);

    let records = services.run_records.records_for_member(member.id).unwrap();
    let days: Vec<_> = records.iter().map(|r| r.run_date).collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 9).unwrap(),
        ]
    );

    assert_eq!(services.run_records.delete_all_for_member(member.id).unwrap(), 2);
    assert!(services.run_records.records_for_member(member.id).unwrap().is_empty());

    let err = services
        .run_records
        .record_run(Uuid::new_v4(), run(5_000, 1_500, 2))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFoundUser);

    let err = services
        .run_records
        .record_run(member.id, run(0, 1_500, 2))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}
