/// End-to-end tests for the DevCamper API
///
/// These drive the full router (middleware included) against PostgreSQL:
/// - Sessions: register, login, me, password reset
/// - Bootcamp lifecycle with derived averages and cascade delete
/// - Query builder: select, sort and pagination
/// - Role and ownership checks
///
/// Require `DATABASE_URL`; every test returns early without it.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{unique, TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_register_then_me() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let email = format!("John.{}@Example.com", unique());
    let response = ctx
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "John Doe", "email": email, "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    let token = response.body["token"].as_str().unwrap().to_string();

    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with(&format!("token={}", token)));
    assert!(cookie.contains("HttpOnly"));

    let me = ctx.send("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["email"], email.to_lowercase());
    assert_eq!(me.body["data"]["role"], "user");
    assert!(me.body["data"].get("password").is_none());
    assert!(me.body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, user_id) = ctx.register("user").await;

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.call(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["_id"], user_id.to_string());

    let logout = ctx.send("GET", "/api/v1/auth/logout", None, None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .starts_with("token=none"));
}

#[tokio::test]
async fn test_login_errors_are_identical() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let email = format!("jane-{}@example.com", unique());
    ctx.send(
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Jane", "email": email, "password": PASSWORD })),
    )
    .await;

    let wrong_password = ctx
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
    let unknown_email = ctx
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": format!("nobody-{}@example.com", unique()), "password": PASSWORD })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);

    let missing = ctx
        .send("POST", "/api/v1/auth/login", None, Some(json!({ "email": email })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Please provide an email and password");

    let ok = ctx
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": PASSWORD })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_role_cannot_be_self_assigned() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let response = ctx
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "name": "Mallory",
                "email": format!("mallory-{}@example.com", unique()),
                "password": PASSWORD,
                "role": "admin"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let email = format!("reset-{}@example.com", unique());
    ctx.send(
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Reset", "email": email, "password": PASSWORD })),
    )
    .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/forgotpassword")
        .header(header::HOST, "devcamper.test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": email }).to_string()))
        .unwrap();
    let response = ctx.call(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], "Email sent");

    let message = ctx.mailer.last().unwrap();
    assert_eq!(message.to, email);
    let prefix = "http://devcamper.test/api/v1/auth/resetpassword/";
    let start = message.text.find(prefix).unwrap() + prefix.len();
    let token: String = message.text[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    assert_eq!(token.len(), 40);

    let reset = ctx
        .send(
            "PUT",
            &format!("/api/v1/auth/resetpassword/{}", token),
            None,
            Some(json!({ "password": "new-password" })),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert!(reset.body["token"].is_string());

    // Tokens are single use
    let again = ctx
        .send(
            "PUT",
            &format!("/api/v1/auth/resetpassword/{}", token),
            None,
            Some(json!({ "password": "another-password" })),
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], "Invalid token");

    let login = ctx
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": "new-password" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_mail_failure() {
    let Some(ctx) = TestContext::with_failing_mailer().await else {
        return;
    };

    let email = format!("nomail-{}@example.com", unique());
    ctx.send(
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "No Mail", "email": email, "password": PASSWORD })),
    )
    .await;

    let response = ctx
        .send(
            "POST",
            "/api/v1/auth/forgotpassword",
            None,
            Some(json!({ "email": email })),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Email could not be sent");

    let (token,): (Option<String>,) =
        sqlx::query_as("SELECT reset_password_token FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert!(token.is_none());

    let unknown = ctx
        .send(
            "POST",
            "/api/v1/auth/forgotpassword",
            None,
            Some(json!({ "email": format!("ghost-{}@example.com", unique()) })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "There is no user with that email");
}

#[tokio::test]
async fn test_create_bootcamp_sets_slug_and_location() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, publisher_id) = ctx.register("publisher").await;
    let name = format!("Devworks Bootcamp {}", unique());
    let bootcamp = ctx.create_bootcamp(&token, &name).await;

    assert_eq!(bootcamp["slug"], name.to_lowercase().replace(' ', "-"));
    assert_eq!(bootcamp["location"]["type"], "Point");
    assert_eq!(bootcamp["location"]["coordinates"], json!([-71.0769, 42.3396]));
    assert_eq!(bootcamp["location"]["zipcode"], "02118");
    assert_eq!(bootcamp["user"], publisher_id.to_string());
    assert_eq!(bootcamp["photo"], "no-photo.jpg");
    assert!(bootcamp.get("address").is_none());

    // One bootcamp per publisher
    let second = ctx
        .send(
            "POST",
            "/api/v1/bootcamps",
            Some(&token),
            Some(json!({
                "name": format!("Second {}", unique()),
                "description": "Another",
                "address": "Boston MA",
                "careers": ["Other"]
            })),
        )
        .await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        second.body["error"],
        format!("The user with ID {} has already published a bootcamp", publisher_id)
    );
}

#[tokio::test]
async fn test_bootcamp_validation_and_roles() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (user_token, _) = ctx.register("user").await;
    let (publisher_token, _) = ctx.register("publisher").await;

    let body = json!({
        "name": "x".repeat(51),
        "description": "Too long a name",
        "address": "Boston MA",
        "careers": ["Underwater Basket Weaving"]
    });

    let unauthenticated = ctx
        .send("POST", "/api/v1/bootcamps", None, Some(body.clone()))
        .await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let wrong_role = ctx
        .send("POST", "/api/v1/bootcamps", Some(&user_token), Some(body.clone()))
        .await;
    assert_eq!(wrong_role.status, StatusCode::FORBIDDEN);

    let invalid = ctx
        .send("POST", "/api/v1/bootcamps", Some(&publisher_token), Some(body))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let error = invalid.body["error"].as_str().unwrap();
    assert!(error.contains("Name can not be more than 50 characters"));
}

#[tokio::test]
async fn test_average_cost_and_cascade_delete() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, _) = ctx.register("publisher").await;
    let bootcamp = ctx
        .create_bootcamp(&token, &format!("Codemasters {}", unique()))
        .await;
    let id = bootcamp["_id"].as_str().unwrap();

    ctx.create_course(&token, id, 8000.0).await;
    let second = ctx.create_course(&token, id, 10001.0).await;

    let fetched = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}", id), None, None)
        .await;
    // ceil(9000.5 / 10) * 10
    assert_eq!(fetched.body["data"]["averageCost"], 9010.0);
    assert_eq!(fetched.body["data"]["courses"].as_array().unwrap().len(), 2);

    let removed = ctx
        .send(
            "DELETE",
            &format!("/api/v1/courses/{}", second["_id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["data"], json!({}));

    let fetched = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}", id), None, None)
        .await;
    assert_eq!(fetched.body["data"]["averageCost"], 8000.0);

    let (reviewer, _) = ctx.register("user").await;
    let review = ctx
        .send(
            "POST",
            &format!("/api/v1/bootcamps/{}/reviews", id),
            Some(&reviewer),
            Some(json!({ "title": "Great", "text": "Learned a lot", "rating": 9 })),
        )
        .await;
    assert_eq!(review.status, StatusCode::CREATED);

    let deleted = ctx
        .send("DELETE", &format!("/api/v1/bootcamps/{}", id), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let courses = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}/courses", id), None, None)
        .await;
    assert_eq!(courses.body["count"], 0);

    let reviews = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}/reviews", id), None, None)
        .await;
    assert_eq!(reviews.body["count"], 0);

    let gone = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}", id), None, None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(
        gone.body["error"],
        format!("Bootcamp not found with id of {}", id)
    );
}

#[tokio::test]
async fn test_duplicate_review_is_rejected() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (publisher, _) = ctx.register("publisher").await;
    let bootcamp = ctx
        .create_bootcamp(&publisher, &format!("Reviewed Camp {}", unique()))
        .await;
    let uri = format!(
        "/api/v1/bootcamps/{}/reviews",
        bootcamp["_id"].as_str().unwrap()
    );

    let (reviewer, _) = ctx.register("user").await;
    let body = json!({ "title": "Solid", "text": "Good mentors", "rating": 7 });

    let first = ctx.send("POST", &uri, Some(&reviewer), Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["data"]["rating"], 7);

    let second = ctx.send("POST", &uri, Some(&reviewer), Some(body.clone())).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.body["error"], "Duplicate field value entered");

    // Publishers may not review
    let forbidden = ctx.send("POST", &uri, Some(&publisher), Some(body)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let fetched = ctx
        .send(
            "GET",
            &format!("/api/v1/bootcamps/{}", bootcamp["_id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert_eq!(fetched.body["data"]["averageRating"], 7.0);
}

#[tokio::test]
async fn test_course_update_requires_owner_or_admin() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (owner, _) = ctx.register("publisher").await;
    let (other, other_id) = ctx.register("publisher").await;
    let (admin, _) = ctx.register("admin").await;

    let bootcamp = ctx
        .create_bootcamp(&owner, &format!("Owned Camp {}", unique()))
        .await;
    let course = ctx
        .create_course(&owner, bootcamp["_id"].as_str().unwrap(), 5000.0)
        .await;
    let uri = format!("/api/v1/courses/{}", course["_id"].as_str().unwrap());

    let forbidden = ctx
        .send("PUT", &uri, Some(&other), Some(json!({ "tuition": 1 })))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(
        forbidden.body["error"],
        format!(
            "User {} is not authorized to update course {}",
            other_id,
            course["_id"].as_str().unwrap()
        )
    );

    let updated = ctx
        .send("PUT", &uri, Some(&admin), Some(json!({ "tuition": 6000, "weeks": 10 })))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["tuition"], 6000.0);
    assert_eq!(updated.body["data"]["weeks"], "10");

    let add_to_foreign = ctx
        .send(
            "POST",
            &format!(
                "/api/v1/bootcamps/{}/courses",
                bootcamp["_id"].as_str().unwrap()
            ),
            Some(&other),
            Some(json!({
                "title": "Intruder",
                "description": "Not mine",
                "weeks": "4",
                "tuition": 100,
                "minimumSkill": "beginner"
            })),
        )
        .await;
    assert_eq!(add_to_foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_select_sort_and_pagination() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, owner_id) = ctx.register("publisher").await;
    let bootcamp = ctx
        .create_bootcamp(&token, &format!("Paged Camp {}", unique()))
        .await;
    let id = bootcamp["_id"].as_str().unwrap();
    for tuition in [1000.0, 3000.0, 2000.0] {
        ctx.create_course(&token, id, tuition).await;
    }

    let page_one = ctx
        .send(
            "GET",
            &format!(
                "/api/v1/courses?user={}&select=title,tuition&sort=-tuition&limit=2",
                owner_id
            ),
            None,
            None,
        )
        .await;
    assert_eq!(page_one.status, StatusCode::OK);
    assert_eq!(page_one.body["count"], 2);
    assert_eq!(page_one.body["pagination"]["next"], json!({ "page": 2, "limit": 2 }));
    assert!(page_one.body["pagination"].get("prev").is_none());

    let data = page_one.body["data"].as_array().unwrap();
    assert_eq!(data[0]["tuition"], 3000.0);
    assert_eq!(data[1]["tuition"], 2000.0);
    let mut keys: Vec<_> = data[0].as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, ["_id", "title", "tuition"]);

    let page_two = ctx
        .send(
            "GET",
            &format!(
                "/api/v1/courses?user={}&sort=-tuition&limit=2&page=2",
                owner_id
            ),
            None,
            None,
        )
        .await;
    assert_eq!(page_two.body["count"], 1);
    assert_eq!(page_two.body["pagination"]["prev"], json!({ "page": 1, "limit": 2 }));
    assert!(page_two.body["pagination"].get("next").is_none());
    assert_eq!(page_two.body["data"][0]["bootcamp"]["_id"], id);
    assert!(page_two.body["data"][0]["bootcamp"]["name"].is_string());

    let filtered = ctx
        .send(
            "GET",
            &format!("/api/v1/courses?user={}&tuition[gte]=2000", owner_id),
            None,
            None,
        )
        .await;
    assert_eq!(filtered.body["count"], 2);

    let bad = ctx
        .send("GET", "/api/v1/courses?sort=password", None, None)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_radius_search() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, _) = ctx.register("publisher").await;
    let bootcamp = ctx
        .create_bootcamp(&token, &format!("Nearby Camp {}", unique()))
        .await;

    let response = ctx
        .send("GET", "/api/v1/bootcamps/radius/02118/10", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<_> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["_id"].clone())
        .collect();
    assert!(ids.contains(&bootcamp["_id"]));

    let negative = ctx
        .send("GET", "/api/v1/bootcamps/radius/02118/-5", None, None)
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative.body["error"], "Distance must be a positive number");
}

#[tokio::test]
async fn test_photo_upload() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (token, _) = ctx.register("publisher").await;
    let bootcamp = ctx
        .create_bootcamp(&token, &format!("Photo Camp {}", unique()))
        .await;
    let id = bootcamp["_id"].as_str().unwrap();

    let upload = |content_type: &str, bytes: &[u8]| {
        let boundary = "devcamper-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"camp.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("PUT")
            .uri(format!("/api/v1/bootcamps/{}/photo", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    };

    let not_image = ctx.call(upload("text/plain", b"hello")).await;
    assert_eq!(not_image.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_image.body["error"], "Please upload an image file");

    let too_large = ctx.call(upload("image/jpeg", &[0u8; 2048])).await;
    assert_eq!(too_large.status, StatusCode::BAD_REQUEST);

    let ok = ctx.call(upload("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0])).await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);
    assert_eq!(ok.body["data"], format!("photo_{}.jpg", id));

    let fetched = ctx
        .send("GET", &format!("/api/v1/bootcamps/{}", id), None, None)
        .await;
    assert_eq!(fetched.body["data"]["photo"], format!("photo_{}.jpg", id));
}

#[tokio::test]
async fn test_users_are_admin_only() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let (user, _) = ctx.register("user").await;
    let (admin, _) = ctx.register("admin").await;

    let forbidden = ctx.send("GET", "/api/v1/users", Some(&user), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let created = ctx
        .send(
            "POST",
            "/api/v1/users",
            Some(&admin),
            Some(json!({
                "name": "Staff",
                "email": format!("staff-{}@example.com", unique()),
                "password": PASSWORD,
                "role": "admin"
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["role"], "admin");
    let staff_id = created.body["data"]["_id"].as_str().unwrap().to_string();

    let updated = ctx
        .send(
            "PUT",
            &format!("/api/v1/users/{}", staff_id),
            Some(&admin),
            Some(json!({ "role": "publisher" })),
        )
        .await;
    assert_eq!(updated.body["data"]["role"], "publisher");

    let listed = ctx
        .send("GET", "/api/v1/users?role=publisher&select=name", Some(&admin), None)
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert!(listed.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["_id"] == staff_id.as_str()));

    let deleted = ctx
        .send("DELETE", &format!("/api/v1/users/{}", staff_id), Some(&admin), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = ctx
        .send("GET", &format!("/api/v1/users/{}", staff_id), Some(&admin), None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_and_unknown_route() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let malformed = ctx
        .send("GET", "/api/v1/bootcamps/not-a-uuid", None, None)
        .await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
    assert_eq!(malformed.body["success"], false);
    assert_eq!(malformed.body["error"], "Resource not found");

    let unknown = ctx.send("GET", "/api/v1/nope", None, None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["success"], false);
}

#[tokio::test]
async fn test_rate_limit_and_security_headers() {
    let Some(ctx) = TestContext::with_mailer_and(|vars| {
        vars.insert("RATE_LIMIT_MAX".to_string(), "2".to_string());
    })
    .await
    else {
        return;
    };

    let first = ctx.send("GET", "/health", None, None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers["x-content-type-options"], "nosniff");
    assert_eq!(first.headers["x-ratelimit-limit"], "2");

    ctx.send("GET", "/health", None, None).await;
    let limited = ctx.send("GET", "/health", None, None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_rotating_forwarded_for_shares_one_bucket() {
    let Some(ctx) = TestContext::with_mailer_and(|vars| {
        vars.insert("RATE_LIMIT_MAX".to_string(), "2".to_string());
    })
    .await
    else {
        return;
    };

    let mut statuses = Vec::new();
    for i in 0..5 {
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", format!("203.0.113.{}", i))
            .body(Body::empty())
            .unwrap();
        statuses.push(ctx.call(request).await.status);
    }

    assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
    assert!(statuses[2..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let Some(ctx) = TestContext::try_new().await else {
        return;
    };

    let response = ctx
        .send(
            "GET",
            &format!("/api/v1/bootcamps?page={}", i64::MAX),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["count"], 0);
    assert!(response.body["pagination"].get("next").is_none());
}
