//! End-to-end runs over a saved timetable page.

use chrono::{NaiveTime, Weekday};
use schedule_ingest::events::{CourseEvent, RecordingPublisher};
use schedule_ingest::ingest::{
    CourseType, IngestConfig, NormalizedCourse, ScheduleCourseSet, ScheduleId, SchedulePipeline,
    WeekParity,
};
use schedule_ingest::service::IngestionService;
use schedule_ingest::store::{CourseRepository, InMemoryCourseStore};

const PAGE: &str = include_str!("fixtures/schedule.html");

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn parse(html: &str) -> ScheduleCourseSet {
    SchedulePipeline::new(&IngestConfig::default())
        .unwrap()
        .parse_html(html)
        .unwrap()
}

fn find<'a>(courses: &'a ScheduleCourseSet, name: &str, parity: WeekParity) -> &'a NormalizedCourse {
    courses
        .iter()
        .find(|c| c.name == name && c.week_parity == parity)
        .unwrap_or_else(|| panic!("no {name} ({parity:?}) in {courses:#?}"))
}

#[test]
fn test_fixture_course_count() {
    // Seven cells: one duplicate, one outside the grid.
    assert_eq!(parse(PAGE).len(), 5);
}

#[test]
fn test_fixture_lecture() {
    let courses = parse(PAGE);
    let lecture = find(&courses, "Analiza matematyczna", WeekParity::Every);

    assert_eq!(lecture.course_type, CourseType::Lecture);
    assert_eq!(lecture.day_of_week, Some(Weekday::Mon));
    assert_eq!((lecture.starts_at, lecture.ends_at), (time(8, 30), time(10, 45)));
    assert_eq!(lecture.teachers, "Kowalski J., Nowak A.");
    assert_eq!(lecture.classrooms, "CEK 101");
    assert_eq!(lecture.additional_info, None);
}

#[test]
fn test_fixture_split_column() {
    let courses = parse(PAGE);
    let odd = find(&courses, "Fizyka", WeekParity::Odd);
    let even = find(&courses, "Fizyka", WeekParity::Even);

    for lab in [odd, even] {
        assert_eq!(lab.course_type, CourseType::Lab);
        assert_eq!(lab.day_of_week, Some(Weekday::Wed));
        assert_eq!((lab.starts_at, lab.ends_at), (time(10, 30), time(12, 45)));
        assert_eq!(lab.classrooms, "LAB 2");
    }
}

#[test]
fn test_fixture_note_and_degraded_cell() {
    let courses = parse(PAGE);

    let project = find(&courses, "Programowanie", WeekParity::Every);
    assert_eq!(project.course_type, CourseType::Project);
    assert_eq!(project.day_of_week, Some(Weekday::Fri));
    assert_eq!(project.ends_at, time(9, 45));
    assert_eq!(project.classrooms, "");
    assert_eq!(
        project.additional_info.as_deref(),
        Some("uwagi: zajęcia od 10 marca sala zmieniona")
    );

    let seminar = find(&courses, "Seminarium dyplomowe", WeekParity::Every);
    assert_eq!(seminar.course_type, CourseType::Info);
    assert_eq!(seminar.day_of_week, None);
}

#[test]
fn test_parsing_is_deterministic() {
    assert_eq!(parse(PAGE), parse(PAGE));
}

#[tokio::test]
async fn test_reingesting_a_changed_page() {
    let service = IngestionService::new(
        &IngestConfig::default(),
        InMemoryCourseStore::new(),
        RecordingPublisher::new(),
    )
    .unwrap();
    let schedule_id = ScheduleId(3);

    let first = service.ingest_html(schedule_id, PAGE).await.unwrap();
    assert_eq!(first.to_create.len(), 5);
    service.repository().apply(schedule_id, &first);

    let unchanged = service.ingest_html(schedule_id, PAGE).await.unwrap();
    assert!(unchanged.is_empty());

    let moved = PAGE.replace("LAB 2", "LAB 3");
    service.publisher().take();
    let second = service.ingest_html(schedule_id, &moved).await.unwrap();

    assert_eq!(second.to_create.len(), 2);
    assert_eq!(second.to_delete.len(), 2);
    assert!(second.to_create.iter().all(|c| c.classrooms == "LAB 3"));
    assert!(second.to_delete.iter().all(|c| c.course.classrooms == "LAB 2"));

    let events = service.publisher().take();
    assert!(matches!(
        events.as_slice(),
        [
            CourseEvent::ScheduleProcessed { .. },
            CourseEvent::CoursesDeleted { .. },
            CourseEvent::CoursesCreated { .. },
        ]
    ));

    service.repository().apply(schedule_id, &second);
    let stored = service.repository().current_courses(schedule_id).unwrap();
    assert_eq!(stored.len(), 5);
}

#[test]
fn test_shipped_config_matches_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/ingest.json");
    let config = IngestConfig::load_from_file(&path).unwrap();

    let pipeline = SchedulePipeline::new(&config).unwrap();
    assert_eq!(pipeline.parse_html(PAGE).unwrap(), parse(PAGE));
    assert_eq!(config.fetch.base_url.as_deref(), Some("https://plan.example.edu/"));
}
