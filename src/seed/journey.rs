//! The Journey demo course.
//!
//! Four books, each with six lessons, a checkpoint after the third lesson and
//! a closing review. Only lessons carry videos: one per class day, each with
//! a single activity.

use serde_json::{Value, json};

use crate::types::{
    ActivityType, BookSeed, CourseSeed, CourseUnitSeed, MAX_DAY_NUMBER, MIN_DAY_NUMBER, UnitType,
    VideoSeed,
};

pub const JOURNEY_COURSE_NAME: &str = "Journey";

const BOOKS: &[(&str, &str)] = &[
    ("Journey 1", "#3B82F6"),
    ("Journey 2", "#10B981"),
    ("Journey 3", "#F59E0B"),
    ("Journey 4", "#EF4444"),
];
const LESSONS_PER_BOOK: usize = 6;
const CHECKPOINT_AFTER: usize = 3;
const VIDEO_BASE_URL: &str = "https://videos.example.com/journey";

#[must_use]
pub fn journey_course() -> CourseSeed {
    CourseSeed {
        name: JOURNEY_COURSE_NAME.to_string(),
        level: "beginner".to_string(),
        language: "en".to_string(),
        description: Some("General English from first words to everyday conversation".to_string()),
        books: BOOKS
            .iter()
            .enumerate()
            .map(|(i, (title, color))| book(i + 1, title, color))
            .collect(),
    }
}

fn book(number: usize, title: &str, color: &str) -> BookSeed {
    let mut units = Vec::new();
    let mut order = 0;
    let mut next_order = || {
        order += 1;
        order
    };

    for lesson in 1..=LESSONS_PER_BOOK {
        units.push(lesson_unit(number, lesson, next_order()));
        if lesson == CHECKPOINT_AFTER {
            units.push(CourseUnitSeed {
                title: format!("Checkpoint {number}.A"),
                display_order: next_order(),
                unit_type: UnitType::Checkpoint,
                videos: Vec::new(),
            });
        }
    }
    units.push(CourseUnitSeed {
        title: format!("Review {number}"),
        display_order: next_order(),
        unit_type: UnitType::Review,
        videos: Vec::new(),
    });

    BookSeed {
        title: title.to_string(),
        display_order: number as i32,
        color: Some(color.to_string()),
        units,
    }
}

fn lesson_unit(book: usize, lesson: usize, display_order: i32) -> CourseUnitSeed {
    CourseUnitSeed {
        title: format!("Lesson {book}.{lesson}"),
        display_order,
        unit_type: UnitType::Lesson,
        videos: (MIN_DAY_NUMBER..=MAX_DAY_NUMBER)
            .map(|day| video(book, lesson, day))
            .collect(),
    }
}

fn video(book: usize, lesson: usize, day: u8) -> VideoSeed {
    // Rotate through the activity types so every type appears in each lesson.
    let activity_type = match day {
        1 => ActivityType::MultipleChoice,
        2 => ActivityType::FillBlank,
        3 => ActivityType::Matching,
        4 => ActivityType::Ordering,
        5 => ActivityType::TrueFalse,
        _ => ActivityType::Speaking,
    };
    let (content, correct_answer) = activity(activity_type, lesson);

    VideoSeed {
        day_number: day,
        title: format!("Lesson {book}.{lesson} - Day {day}"),
        video_url: format!("{VIDEO_BASE_URL}/{book}/{lesson}/{day}"),
        activity_type,
        content,
        correct_answer,
    }
}

fn activity(activity_type: ActivityType, lesson: usize) -> (Value, Value) {
    match activity_type {
        ActivityType::MultipleChoice => (
            json!({
                "question": "How do you greet someone in the morning?",
                "options": ["Good night", "Good morning", "Goodbye"]
            }),
            json!(1),
        ),
        ActivityType::FillBlank => (
            json!({ "sentence": "I ___ a student.", "hint": "to be" }),
            json!("am"),
        ),
        ActivityType::Matching => (
            json!({
                "left": ["cat", "dog", "bird"],
                "right": ["gato", "pássaro", "cachorro"]
            }),
            json!([[0, 0], [1, 2], [2, 1]]),
        ),
        ActivityType::Ordering => (
            json!({ "words": ["name", "is", "My", "Ana"] }),
            json!(["My", "name", "is", "Ana"]),
        ),
        ActivityType::TrueFalse => (
            json!({ "statement": format!("Lesson {lesson} is about greetings.") }),
            json!(true),
        ),
        ActivityType::Speaking => (
            json!({ "prompt": "Introduce yourself in two sentences." }),
            json!(null),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journey_shape() {
        let course = journey_course();
        assert_eq!(course.name, "Journey");
        assert_eq!(course.books.len(), 4);

        let book = &course.books[0];
        let types: Vec<_> = book.units.iter().map(|u| u.unit_type).collect();
        assert_eq!(types.len(), 8);
        assert_eq!(types[3], UnitType::Checkpoint);
        assert_eq!(types[7], UnitType::Review);

        let orders: Vec<_> = book.units.iter().map(|u| u.display_order).collect();
        assert_eq!(orders, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_only_lessons_have_videos() {
        for book in journey_course().books {
            for unit in book.units {
                match unit.unit_type {
                    UnitType::Lesson => {
                        let days: Vec<_> = unit.videos.iter().map(|v| v.day_number).collect();
                        assert_eq!(days, vec![1, 2, 3, 4, 5, 6]);
                    }
                    _ => assert!(unit.videos.is_empty()),
                }
            }
        }
    }
}
