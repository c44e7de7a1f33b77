//! HTTP API tests against an in-process server seeded with the demo data.

mod common;

use reqwest::Method;
use serde_json::{Value, json};

use common::TestServer;

const MONDAY: &str = "2026-03-02";

fn find_by<'a>(items: &'a Value, field: &str, value: &str) -> &'a Value {
    items
        .as_array()
        .expect("not an array")
        .iter()
        .find(|item| item[field] == value)
        .unwrap_or_else(|| panic!("no item with {field} = {value}"))
}

fn id_of(item: &Value) -> String {
    item["id"].as_str().expect("id not a string").to_string()
}

async fn user_id(server: &TestServer, admin: &str, email: &str) -> String {
    let (status, body) = server.get(admin, "/api/users").await;
    assert_eq!(status, 200);
    id_of(find_by(&body["data"], "email", email))
}

async fn journey_course(server: &TestServer, token: &str) -> Value {
    let (_, courses) = server.get(token, "/api/courses").await;
    let id = id_of(find_by(&courses["data"], "name", "Journey"));
    let (status, tree) = server.get(token, &format!("/api/courses/{id}")).await;
    assert_eq!(status, 200);
    tree["data"].clone()
}

#[tokio::test]
async fn test_login_and_me() {
    let server = TestServer::start().await;
    let token = server.login("admin@demo.com").await;
    assert!(token.starts_with("campus_"));

    let (status, body) = server.get(&token, "/api/auth/me").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["email"], "admin@demo.com");
    assert!(body["data"]["user"].get("password_hash").is_none());
    let permissions = body["data"]["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "permissions:manage"));

    let (status, body) = server
        .get(&server.login("teacher@demo.com").await, "/api/auth/me")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["staff"]["position"], "teacher");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "admin@demo.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens_are_401() {
    let server = TestServer::start().await;

    let resp = server.client.get(server.url("/api/units")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers()["www-authenticate"],
        "Bearer realm=\"campus\""
    );

    let (status, _) = server.get("campus_deadbeef_notarealsecret", "/api/units").await;
    assert_eq!(status, 401);

    let (status, _) = server.get("garbage", "/api/units").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let server = TestServer::start_with_session_ttl(-1).await;
    let token = server.login("secretary@demo.com").await;

    let resp = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(
        resp.headers()["www-authenticate"],
        "Bearer realm=\"campus\""
    );
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_malformed_bodies_are_400_envelopes() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;

    let (status, body) = server
        .post(
            &admin,
            "/api/courses",
            json!({ "name": "Teens", "level": "B1", "language": "en", "bogus_field": 1 }),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["data"].is_null());
    assert!(body["error"].as_str().unwrap().contains("bogus_field"));
    let (_, courses) = server.get(&admin, "/api/courses").await;
    assert!(
        courses["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["name"] != "Teens")
    );

    let tree = journey_course(&server, &admin).await;
    let unit_id = id_of(&tree["books"][0]["units"][0]);
    let (status, body) = server
        .post(
            &admin,
            &format!("/api/course-units/{unit_id}/videos"),
            json!({ "day_number": 300, "title": "Day 300", "video_url": "https://videos.example.com/x" }),
        )
        .await;
    assert_eq!(status, 400);
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());

    let (status, body) = server
        .post(&admin, "/api/classes", json!({ "name": "Broken", "day_of_week": -1 }))
        .await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = server.get(&admin, "/api/classes?day_of_week=300").await;
    assert_eq!(status, 400);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = TestServer::start().await;
    let token = server.login("secretary@demo.com").await;

    let (status, _) = server.post(&token, "/api/auth/logout", json!({})).await;
    assert_eq!(status, 204);

    let (status, _) = server.get(&token, "/api/auth/me").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_overrides_change_effective_permissions() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;
    let teacher = server.login("teacher@demo.com").await;
    let teacher_id = user_id(&server, &admin, "teacher@demo.com").await;

    let (_, units) = server.get(&admin, "/api/units").await;
    let unit_id = id_of(find_by(&units["data"], "name", "Demo Unit"));
    let new_student = json!({ "unit_id": unit_id, "name": "Bruna Lima" });

    let (status, body) = server.post(&teacher, "/api/students", new_student.clone()).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Missing permission: students:write");

    let overrides = format!("/api/users/{teacher_id}/overrides");
    let (status, body) = server
        .post(&admin, &overrides, json!({ "permission": "students:write", "is_granted": true }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = server.post(&teacher, "/api/students", new_student.clone()).await;
    assert_eq!(status, 201);

    // A deny replaces the grant and can also remove a baseline permission.
    server
        .post(&admin, &overrides, json!({ "permission": "students:write", "is_granted": false }))
        .await;
    server
        .post(&admin, &overrides, json!({ "permission": "units:read", "is_granted": false }))
        .await;

    let (status, body) = server
        .get(&admin, &format!("/api/users/{teacher_id}/permissions"))
        .await;
    assert_eq!(status, 200);
    let effective = body["data"]["effective"].as_array().unwrap();
    assert!(!effective.iter().any(|p| p == "students:write"));
    assert!(!effective.iter().any(|p| p == "units:read"));
    assert!(body["data"]["baseline"].as_array().unwrap().iter().any(|p| p == "units:read"));
    assert_eq!(body["data"]["overrides"].as_array().unwrap().len(), 2);

    let (status, _) = server.get(&teacher, "/api/units").await;
    assert_eq!(status, 403);

    let (status, _) = server
        .send(Method::DELETE, &admin, &format!("{overrides}/units:read"), json!({}))
        .await;
    assert_eq!(status, 204);
    let (status, _) = server.get(&teacher, "/api/units").await;
    assert_eq!(status, 200);

    let (status, _) = server
        .send(Method::DELETE, &admin, &format!("{overrides}/units:read"), json!({}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_role_baseline_update() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;
    let student = server.login("student@demo.com").await;

    let (status, _) = server.get(&student, "/api/classes").await;
    assert_eq!(status, 403);

    let (status, body) = server
        .send(
            Method::PUT,
            &admin,
            "/api/roles/student/permissions",
            json!({ "permissions": ["courses:read", "classes:read", "courses:read"] }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["permissions"], json!(["classes:read", "courses:read"]));

    let (status, _) = server.get(&student, "/api/classes").await;
    assert_eq!(status, 200);

    let (status, _) = server
        .send(
            Method::PUT,
            &admin,
            "/api/roles/janitor/permissions",
            json!({ "permissions": [] }),
        )
        .await;
    assert_eq!(status, 404);

    // Only admins hold permissions:manage.
    let director = server.login("director@demo.com").await;
    let (status, _) = server
        .send(
            Method::PUT,
            &director,
            "/api/roles/student/permissions",
            json!({ "permissions": [] }),
        )
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_seeded_journey_tree() {
    let server = TestServer::start().await;
    let student = server.login("student@demo.com").await;

    let tree = journey_course(&server, &student).await;
    let books = tree["books"].as_array().unwrap();
    assert_eq!(books.len(), 4);
    assert_eq!(books[0]["title"], "Journey 1");

    let units = books[0]["units"].as_array().unwrap();
    assert_eq!(units.len(), 8);
    assert_eq!(units[0]["unit_type"], "lesson");
    assert_eq!(units[3]["unit_type"], "checkpoint");
    assert_eq!(units[7]["unit_type"], "review");

    let videos = units[0]["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 6);
    assert_eq!(videos[0]["day_number"], 1);
    assert!(videos[0]["activity"]["activity_type"].is_string());
}

#[tokio::test]
async fn test_curriculum_uniqueness_and_validation() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;

    let (status, body) = server
        .post(
            &admin,
            "/api/courses",
            json!({ "name": "Kids", "level": "A1", "language": "en" }),
        )
        .await;
    assert_eq!(status, 201);
    let course_id = id_of(&body["data"]);

    let (status, _) = server
        .post(
            &admin,
            "/api/courses",
            json!({ "name": "Kids", "level": "A2", "language": "en" }),
        )
        .await;
    assert_eq!(status, 409);

    let books = format!("/api/courses/{course_id}/books");
    let (status, body) = server
        .post(&admin, &books, json!({ "title": "Kids 1", "display_order": 1, "color": "#3B82F6" }))
        .await;
    assert_eq!(status, 201);
    let book_id = id_of(&body["data"]);

    let (status, _) = server
        .post(&admin, &books, json!({ "title": "Kids 1b", "display_order": 1 }))
        .await;
    assert_eq!(status, 409);

    let (status, _) = server
        .post(&admin, &books, json!({ "title": "Kids 2", "display_order": 2, "color": "blue" }))
        .await;
    assert_eq!(status, 400);

    let units = format!("/api/books/{book_id}/units");
    let (status, _) = server
        .post(&admin, &units, json!({ "title": "Lesson 1", "display_order": 1, "unit_type": "quiz" }))
        .await;
    assert_eq!(status, 400);

    let (status, body) = server
        .post(&admin, &units, json!({ "title": "Lesson 1", "display_order": 1, "unit_type": "lesson" }))
        .await;
    assert_eq!(status, 201);
    let unit_id = id_of(&body["data"]);

    let videos = format!("/api/course-units/{unit_id}/videos");
    let video = |day: u8| {
        json!({ "day_number": day, "title": format!("Day {day}"), "video_url": "https://videos.example.com/kids" })
    };
    let (status, body) = server.post(&admin, &videos, video(1)).await;
    assert_eq!(status, 201);
    let video_id = id_of(&body["data"]);

    let (status, _) = server.post(&admin, &videos, video(1)).await;
    assert_eq!(status, 409);
    let (status, _) = server.post(&admin, &videos, video(7)).await;
    assert_eq!(status, 400);

    let activity = format!("/api/videos/{video_id}/activity");
    let (status, _) = server
        .send(
            Method::PUT,
            &admin,
            &activity,
            json!({ "activity_type": "true_false", "content": {"statement": "Cats bark"}, "correct_answer": false }),
        )
        .await;
    assert_eq!(status, 200);
    let (status, body) = server
        .send(
            Method::PUT,
            &admin,
            &activity,
            json!({ "activity_type": "speaking", "content": {"prompt": "Say hello"}, "correct_answer": null }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["activity_type"], "speaking");

    let (status, body) = server.get(&admin, &format!("/api/videos/{video_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["activity"]["activity_type"], "speaking");

    let (status, _) = server.get(&admin, "/api/books/missing/units").await;
    assert_eq!(status, 404);

    // Teachers read the curriculum but cannot change it.
    let teacher = server.login("teacher@demo.com").await;
    let (status, _) = server.get(&teacher, &format!("/api/courses/{course_id}")).await;
    assert_eq!(status, 200);
    let (status, _) = server
        .send(Method::DELETE, &teacher, &format!("/api/courses/{course_id}"), json!({}))
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_class_slot_overlap() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;

    let (_, staff) = server.get(&admin, "/api/staff").await;
    let teacher_id = id_of(find_by(&staff["data"], "position", "teacher"));
    let unit_id = staff["data"][0]["unit_id"].as_str().unwrap().to_string();
    let tree = journey_course(&server, &admin).await;
    let book_id = id_of(&tree["books"][0]);

    let class = |name: &str, start: &str, end: &str| {
        json!({
            "name": name,
            "teacher_id": teacher_id,
            "book_id": book_id,
            "unit_id": unit_id,
            "day_of_week": 2,
            "start_time": start,
            "end_time": end,
        })
    };

    let (status, body) = server
        .post(&admin, "/api/classes", class("Tuesday A", "14:00", "15:30"))
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["start_time"], "14:00");
    let first_id = id_of(&body["data"]);

    let (status, _) = server
        .post(&admin, "/api/classes", class("Tuesday B", "14:30", "15:00"))
        .await;
    assert_eq!(status, 409);

    let (status, _) = server
        .post(&admin, "/api/classes", class("Tuesday C", "15:30", "16:30"))
        .await;
    assert_eq!(status, 201);

    let (status, _) = server
        .post(&admin, "/api/classes", class("Broken", "16:00", "15:00"))
        .await;
    assert_eq!(status, 400);

    // Moving the first class onto the second one conflicts; staying put does not.
    let (status, _) = server
        .send(
            Method::PATCH,
            &admin,
            &format!("/api/classes/{first_id}"),
            json!({ "start_time": "15:00", "end_time": "16:00" }),
        )
        .await;
    assert_eq!(status, 409);
    let (status, _) = server
        .send(
            Method::PATCH,
            &admin,
            &format!("/api/classes/{first_id}"),
            json!({ "room": "Room 2" }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = server
        .get(&admin, &format!("/api/schedule?teacher_id={teacher_id}"))
        .await;
    assert_eq!(status, 200);
    let days = body["data"].as_array().unwrap();
    assert_eq!(days.len(), 6);
    assert_eq!(days[0]["day_name"], "Monday");
    assert_eq!(days[0]["classes"].as_array().unwrap().len(), 1);
    let tuesday: Vec<&str> = days[1]["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(tuesday, ["Tuesday A", "Tuesday C"]);
}

#[tokio::test]
async fn test_attendance_flow() {
    let server = TestServer::start().await;
    let teacher = server.login("teacher@demo.com").await;

    let (status, classes) = server.get(&teacher, "/api/classes").await;
    assert_eq!(status, 200);
    let class_id = id_of(find_by(&classes["data"], "name", "Journey 1 - Monday"));
    let attendance = format!("/api/classes/{class_id}/attendance");

    let (status, roster) = server.get(&teacher, &format!("{attendance}?date={MONDAY}")).await;
    assert_eq!(status, 200);
    let students = roster["data"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert!(students[0]["status"].is_null());
    let student_id = students[0]["student_id"].as_str().unwrap().to_string();

    for status_value in ["present", "absent"] {
        let (status, _) = server
            .post(
                &teacher,
                &format!("{attendance}?date={MONDAY}"),
                json!({ "student_id": student_id, "status": status_value }),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (_, roster) = server.get(&teacher, &format!("{attendance}?date={MONDAY}")).await;
    assert_eq!(roster["data"]["students"][0]["status"], "absent");

    let (status, _) = server
        .post(
            &teacher,
            &format!("{attendance}?date={MONDAY}"),
            json!({ "student_id": student_id, "status": "late" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = server
        .post(
            &teacher,
            &format!("{attendance}/bulk?date=2026-03-09"),
            json!({ "status": "justified" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["marked"], 1);

    let (status, history) = server
        .get(
            &teacher,
            &format!("{attendance}/history?from=2026-03-01&to=2026-03-31"),
        )
        .await;
    assert_eq!(status, 200);
    let records = history["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["status"], "absent");
    assert_eq!(records[1]["status"], "justified");

    let (status, _) = server
        .get(
            &teacher,
            &format!("{attendance}/history?from=2026-03-31&to=2026-03-01"),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_attendance_requires_active_enrollment() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;

    let (_, classes) = server.get(&admin, "/api/classes").await;
    let class_id = id_of(find_by(&classes["data"], "name", "Journey 1 - Monday"));
    let (_, enrollments) = server
        .get(&admin, &format!("/api/classes/{class_id}/enrollments"))
        .await;
    let student_id = enrollments["data"][0]["student_id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            &admin,
            &format!("/api/classes/{class_id}/enrollments"),
            json!({ "student_id": student_id }),
        )
        .await;
    assert_eq!(status, 409);

    let (status, _) = server
        .send(
            Method::DELETE,
            &admin,
            &format!("/api/classes/{class_id}/enrollments/{student_id}"),
            json!({}),
        )
        .await;
    assert_eq!(status, 204);

    let (status, body) = server
        .post(
            &admin,
            &format!("/api/classes/{class_id}/attendance?date={MONDAY}"),
            json!({ "student_id": student_id, "status": "present" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Student is not enrolled in this class");

    let (_, roster) = server
        .get(&admin, &format!("/api/classes/{class_id}/attendance?date={MONDAY}"))
        .await;
    assert!(roster["data"]["students"].as_array().unwrap().is_empty());

    // Re-enrolling reopens the enrollment.
    let (status, _) = server
        .post(
            &admin,
            &format!("/api/classes/{class_id}/enrollments"),
            json!({ "student_id": student_id }),
        )
        .await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn test_staff_creation_creates_login() {
    let server = TestServer::start().await;
    let admin = server.login("admin@demo.com").await;

    let (_, units) = server.get(&admin, "/api/units").await;
    let unit_id = id_of(find_by(&units["data"], "name", "Demo Unit"));

    let staff = json!({
        "unit_id": unit_id,
        "name": "Carla Souza",
        "email": "Carla@Demo.com",
        "password": "secret1",
        "position": "secretary",
    });
    let (status, body) = server.post(&admin, "/api/staff", staff.clone()).await;
    assert_eq!(status, 201);
    let staff_id = id_of(&body["data"]);

    let (status, _) = server.post(&admin, "/api/staff", staff).await;
    assert_eq!(status, 409);

    let token = server.login("carla@demo.com").await;
    let (status, body) = server.get(&token, "/api/auth/me").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["role"], "secretary");

    // A new position moves the login role along with it.
    let (status, body) = server
        .send(
            Method::PATCH,
            &admin,
            &format!("/api/staff/{staff_id}"),
            json!({ "position": "teacher" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["position"], "teacher");
    let (_, body) = server.get(&token, "/api/auth/me").await;
    assert_eq!(body["data"]["user"]["role"], "teacher");

    // The seeded teacher still owns the demo class.
    let (_, staff) = server.get(&admin, "/api/staff").await;
    let seeded_teacher = id_of(find_by(&staff["data"], "name", "Demo Teacher"));
    let (status, body) = server
        .send(Method::DELETE, &admin, &format!("/api/staff/{seeded_teacher}"), json!({}))
        .await;
    assert_eq!(status, 409);
    assert!(body["error"].is_string());
    let (status, _) = server.get(&admin, &format!("/api/staff/{seeded_teacher}")).await;
    assert_eq!(status, 200);

    let (status, _) = server.get(&admin, "/api/units/missing").await;
    assert_eq!(status, 404);

    let (status, _) = server
        .send(Method::DELETE, &admin, &format!("/api/staff/{staff_id}"), json!({}))
        .await;
    assert_eq!(status, 204);

    let resp = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "carla@demo.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
