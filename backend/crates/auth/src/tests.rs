//! Scenario tests for the auth crate
//! Use cases run against the in-memory store; HTTP tests drive the router with `oneshot`.

#[cfg(test)]
mod fixtures {
    use std::sync::Arc;

    use platform::password::HashCost;

    use crate::application::register::RegisterInput;
    use crate::application::{AuthConfig, AuthServices};

    pub const EMAIL: &str = "student@u-tokyo.ac.jp";
    pub const PASSWORD: &str = "password123";
    pub const USERNAME: &str = "alice";
    pub const FULL_NAME: &str = "Alice Tanaka";

    pub fn services() -> Arc<AuthServices> {
        let config = AuthConfig::new("scenario-test-secret").with_hash_cost(HashCost::insecure_fast());
        Arc::new(AuthServices::from_config(&config).unwrap())
    }

    pub fn register_input(email: &str, username: &str) -> RegisterInput {
        RegisterInput {
            email: Some(email.to_string()),
            password: Some(PASSWORD.to_string()),
            username: Some(username.to_string()),
            full_name: Some(FULL_NAME.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod account_tests {
    use std::sync::Arc;

    use super::fixtures::*;
    use crate::application::account::DECOY_PASSWORD;
    use crate::application::{
        GetProfileUseCase, IdentityContext, LoginInput, LoginUseCase, RegisterInput,
        RegisterUseCase,
    };
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{email::Email, user_id::UserId};
    use crate::error::AuthError;
    use crate::infra::InMemoryUserRepository;

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();

        let registered = RegisterUseCase::new(repo.clone(), services.clone())
            .execute(register_input(EMAIL, USERNAME))
            .await
            .unwrap();

        assert_eq!(registered.user.email, EMAIL);
        assert_eq!(registered.user.user_name, USERNAME);
        assert_eq!(registered.user.full_name, FULL_NAME);

        let claims = services.tokens.verify(&registered.token.token).unwrap();
        assert_eq!(claims.user_id, registered.user.user_id);
        assert_eq!(claims.email, EMAIL);

        let stored = repo.find_by_id(&registered.user.user_id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
        assert_ne!(stored.password.as_phc_string(), PASSWORD);

        let logged_in = LoginUseCase::new(repo.clone(), services.clone())
            .execute(login_input(EMAIL, PASSWORD))
            .await
            .unwrap();
        assert_eq!(logged_in.user.user_id, registered.user.user_id);
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_username() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let output = RegisterUseCase::new(repo.clone(), services())
            .execute(register_input("  Student@U-Tokyo.AC.JP ", "  Alice "))
            .await
            .unwrap();

        assert_eq!(output.user.email, EMAIL);
        assert_eq!(output.user.user_name, USERNAME);
    }

    #[tokio::test]
    async fn test_register_stores_academic_fields() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let output = RegisterUseCase::new(repo.clone(), services())
            .execute(RegisterInput {
                university: Some(" University of Tokyo ".to_string()),
                year: Some(2),
                department: Some("".to_string()),
                ..register_input(EMAIL, USERNAME)
            })
            .await
            .unwrap();

        let profile = GetProfileUseCase::new(repo.clone())
            .execute(&IdentityContext {
                user_id: output.user.user_id,
                email: output.user.email.clone(),
                username: output.user.user_name.clone(),
                full_name: output.user.full_name.clone(),
            })
            .await
            .unwrap();

        assert_eq!(profile.university.as_deref(), Some("University of Tokyo"));
        assert_eq!(profile.year, Some(2));
        assert_eq!(profile.department, None);
        assert!(profile.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts_and_store_unchanged() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let use_case = RegisterUseCase::new(repo.clone(), services());

        use_case.execute(register_input(EMAIL, USERNAME)).await.unwrap();
        let err = use_case
            .execute(register_input("other@keio.jp", "ALICE"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(repo.len().await, 1);
        let other = Email::new("other@keio.jp").unwrap();
        assert!(repo.find_by_email(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let use_case = RegisterUseCase::new(repo.clone(), services());

        use_case.execute(register_input(EMAIL, USERNAME)).await.unwrap();
        let err = use_case
            .execute(register_input("STUDENT@u-tokyo.ac.jp", "bob"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_non_institutional_email() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let use_case = RegisterUseCase::new(repo.clone(), services());

        for email in [
            "someone@gmail.com",
            "foo@evil.com/u-tokyo.ac.jp",
            "u-tokyo.ac.jp@evil.com",
            "not-an-email",
        ] {
            let err = use_case.execute(register_input(email, USERNAME)).await.unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidEmailDomain),
                "{} should be rejected, got {:?}",
                email,
                err
            );
        }
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_required_fields() {
        let use_case = RegisterUseCase::new(Arc::new(InMemoryUserRepository::new()), services());

        let cases: [(&str, RegisterInput); 4] = [
            (
                "email",
                RegisterInput {
                    email: None,
                    ..register_input(EMAIL, USERNAME)
                },
            ),
            (
                "password",
                RegisterInput {
                    password: Some("   ".to_string()),
                    ..register_input(EMAIL, USERNAME)
                },
            ),
            (
                "username",
                RegisterInput {
                    username: None,
                    ..register_input(EMAIL, USERNAME)
                },
            ),
            (
                "fullName",
                RegisterInput {
                    full_name: Some(String::new()),
                    ..register_input(EMAIL, USERNAME)
                },
            ),
        ];

        for (expected, input) in cases {
            match use_case.execute(input).await {
                Err(AuthError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {}, got {:?}", expected, other),
            }
        }
    }

    #[tokio::test]
    async fn test_register_password_and_username_policy() {
        let use_case = RegisterUseCase::new(Arc::new(InMemoryUserRepository::new()), services());

        let err = use_case
            .execute(RegisterInput {
                password: Some("short".to_string()),
                ..register_input(EMAIL, USERNAME)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));

        for username in ["ab", "abcdefghijklmnopqrstu"] {
            let err = use_case.execute(register_input(EMAIL, username)).await.unwrap_err();
            match err {
                AuthError::Validation { field, message } => {
                    assert_eq!(field, "username");
                    assert_eq!(message, "Username must be between 3 and 20 characters");
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        let err = use_case
            .execute(RegisterInput {
                year: Some(0),
                ..register_input(EMAIL, USERNAME)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "year", .. }));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        RegisterUseCase::new(repo.clone(), services.clone())
            .execute(register_input(EMAIL, USERNAME))
            .await
            .unwrap();

        let login = LoginUseCase::new(repo.clone(), services);

        let wrong_password = login
            .execute(login_input(EMAIL, "password123x"))
            .await
            .unwrap_err();
        let unknown_email = login
            .execute(login_input("nobody@u-tokyo.ac.jp", PASSWORD))
            .await
            .unwrap_err();
        let malformed_email = login
            .execute(login_input("nobody", PASSWORD))
            .await
            .unwrap_err();

        for err in [&wrong_password, &unknown_email, &malformed_email] {
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_unknown_email_never_matches_decoy_hash() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let login = LoginUseCase::new(repo.clone(), services());

        let err = login
            .execute(login_input("nobody@u-tokyo.ac.jp", DECOY_PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let login = LoginUseCase::new(Arc::new(InMemoryUserRepository::new()), services());
        let err = login
            .execute(LoginInput {
                email: Some(EMAIL.to_string()),
                password: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_login() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let registered = RegisterUseCase::new(repo.clone(), services.clone())
            .execute(register_input(EMAIL, USERNAME))
            .await
            .unwrap();

        assert!(repo.set_active(&registered.user.user_id, false).await.unwrap());

        let err = LoginUseCase::new(repo.clone(), services.clone())
            .execute(login_input(EMAIL, PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));

        // Deactivation is checked before the password
        let err = LoginUseCase::new(repo.clone(), services)
            .execute(login_input(EMAIL, "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));
    }

    #[tokio::test]
    async fn test_set_active_unknown_user() {
        let repo = InMemoryUserRepository::new();
        assert!(!repo.set_active(&UserId::new(), false).await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_of_vanished_user_is_not_found() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let err = GetProfileUseCase::new(repo)
            .execute(&IdentityContext {
                user_id: UserId::new(),
                email: EMAIL.to_string(),
                username: USERNAME.to_string(),
                full_name: FULL_NAME.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }
}

#[cfg(test)]
mod resolver_tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::fixtures::*;
    use crate::application::token::TokenClaims;
    use crate::application::{IdentityResolver, RegisterUseCase};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;
    use crate::infra::InMemoryUserRepository;

    #[tokio::test]
    async fn test_resolve_valid_token() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let registered = RegisterUseCase::new(repo.clone(), services.clone())
            .execute(register_input(EMAIL, USERNAME))
            .await
            .unwrap();

        let identity = IdentityResolver::new(repo, services)
            .resolve(&registered.token.token)
            .await
            .unwrap();

        assert_eq!(identity.user_id, registered.user.user_id);
        assert_eq!(identity.email, EMAIL);
        assert_eq!(identity.username, USERNAME);
        assert_eq!(identity.full_name, FULL_NAME);
    }

    #[tokio::test]
    async fn test_resolve_deactivated_or_missing_user() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let registered = RegisterUseCase::new(repo.clone(), services.clone())
            .execute(register_input(EMAIL, USERNAME))
            .await
            .unwrap();
        let resolver = IdentityResolver::new(repo.clone(), services.clone());

        repo.set_active(&registered.user.user_id, false).await.unwrap();
        let err = resolver.resolve(&registered.token.token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));

        let orphan = services.tokens.issue(&UserId::new(), EMAIL).unwrap();
        let err = resolver.resolve(&orphan.token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_resolve_bad_tokens() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let services = services();
        let resolver = IdentityResolver::new(repo, services.clone());

        let now = Utc::now().timestamp();
        let expired = services
            .tokens
            .sign(&TokenClaims {
                user_id: UserId::new().to_string(),
                email: EMAIL.to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(
            resolver.resolve(&expired).await.unwrap_err(),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            resolver.resolve("garbage").await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}

#[cfg(test)]
mod http_tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use chrono::Utc;
    use platform::rate_limit::{
        InMemoryRateLimitStore, RateLimitConfig, RateLimitSettings, RateLimiterBank,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::fixtures::*;
    use crate::application::AuthServices;
    use crate::application::token::TokenClaims;
    use crate::domain::value_object::user_id::UserId;
    use crate::infra::InMemoryUserRepository;
    use crate::presentation::router::auth_router;

    struct TestApp {
        router: Router,
        services: Arc<AuthServices>,
    }

    fn app_with(settings: RateLimitSettings) -> TestApp {
        let services = services();
        let bank = Arc::new(RateLimiterBank::new(InMemoryRateLimitStore::new(), settings));
        let router = auth_router(
            Arc::new(InMemoryUserRepository::new()),
            services.clone(),
            bank,
        );
        TestApp { router, services }
    }

    fn app() -> TestApp {
        app_with(RateLimitSettings::default())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn register_body() -> Value {
        json!({
            "email": EMAIL,
            "password": PASSWORD,
            "username": USERNAME,
            "fullName": FULL_NAME,
            "university": "University of Tokyo",
            "year": 3
        })
    }

    async fn register(app: &TestApp) -> String {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/register", register_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    fn expired_token(services: &AuthServices) -> String {
        let now = Utc::now().timestamp();
        services
            .tokens
            .sign(&TokenClaims {
                user_id: UserId::new().to_string(),
                email: EMAIL.to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_response_shape() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(post_json("/register", register_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("ratelimit-remaining"));

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User registered successfully");
        assert!(body["token"].is_string());
        assert!(body["expiresAt"].is_string());
        assert_eq!(body["user"]["email"], EMAIL);
        assert_eq!(body["user"]["username"], USERNAME);
        assert_eq!(body["user"]["fullName"], FULL_NAME);
        assert_eq!(body["user"]["university"], "University of Tokyo");
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_conflict_and_validation_status() {
        let app = app();
        register(&app).await;

        let response = app
            .router
            .clone()
            .oneshot(post_json("/register", register_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "USER_ALREADY_EXISTS");

        let response = app
            .router
            .clone()
            .oneshot(post_json("/register", json!({ "email": EMAIL })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["field"], "body");
    }

    #[tokio::test]
    async fn test_login_and_profile() {
        let app = app();
        register(&app).await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/login",
                json!({ "email": EMAIL, "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Login successful");
        let token = body["token"].as_str().unwrap().to_string();

        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], EMAIL);
        assert_eq!(body["user"]["year"], 3);
        assert!(body["user"]["lastLogin"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app();
        register(&app).await;

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/login",
                json!({ "email": EMAIL, "password": "password123x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_profile_rejections() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/profile", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], "UNAUTHENTICATED");
        assert_eq!(body["detail"], "Access token required");

        let expired = expired_token(&app.services);
        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/profile", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "TOKEN_EXPIRED");

        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/profile", Some("not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_session_is_optional() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/session", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "authenticated": false }));

        let expired = expired_token(&app.services);
        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/session", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["authenticated"], false);

        let token = register(&app).await;
        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/session", Some(&token)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["username"], USERNAME);
    }

    #[tokio::test]
    async fn test_logout_is_advisory() {
        let app = app();
        let token = register(&app).await;

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "success": true, "message": "Logout successful" })
        );

        // Token remains usable until it expires
        let response = app
            .router
            .clone()
            .oneshot(get_with_token("/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_registration_limiter_rejects_fourth_attempt() {
        let app = app();

        for _ in 0..3 {
            let response = app
                .router
                .clone()
                .oneshot(post_json("/register", json!({})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app
            .router
            .clone()
            .oneshot(post_json("/register", register_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(response.headers()["ratelimit-remaining"], "0");

        let body = json_body(response).await;
        assert_eq!(body["code"], "RATE_LIMITED");
        assert_eq!(
            body["detail"],
            "Too many registration attempts, please try again later"
        );
    }

    #[tokio::test]
    async fn test_login_limiter_keys_on_user_agent() {
        let settings = RateLimitSettings {
            login: RateLimitConfig::new(1, 60),
            ..RateLimitSettings::default()
        };
        let app = app_with(settings);

        let login = |agent: &str| {
            let mut request = post_json("/login", json!({ "email": EMAIL, "password": "x" }));
            request
                .headers_mut()
                .insert(header::USER_AGENT, agent.parse().unwrap());
            request
        };

        let first = app.router.clone().oneshot(login("agent-a")).await.unwrap();
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

        let second = app.router.clone().oneshot(login("agent-a")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let other_agent = app.router.clone().oneshot(login("agent-b")).await.unwrap();
        assert_eq!(other_agent.status(), StatusCode::UNAUTHORIZED);
    }

    fn login_from(peer: &str, forwarded_for: &str) -> Request<Body> {
        let mut request = post_json("/login", json!({ "email": EMAIL, "password": "x" }));
        let peer: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        let headers = request.headers_mut();
        headers.insert(header::USER_AGENT, "Mozilla/5.0".parse().unwrap());
        headers.insert("x-forwarded-for", forwarded_for.parse().unwrap());
        request
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_evade_login_limit() {
        let app = app();

        let mut statuses = Vec::new();
        for i in 1..=6 {
            let request = login_from("203.0.113.50:40000", &format!("198.51.100.{}", i));
            statuses.push(app.router.clone().oneshot(request).await.unwrap().status());
        }

        assert!(statuses[..5].iter().all(|s| *s == StatusCode::UNAUTHORIZED));
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_trusted_proxy_hop_keys_on_appended_entry() {
        let settings = RateLimitSettings {
            login: RateLimitConfig::new(1, 60),
            trusted_proxy_hops: 1,
            ..RateLimitSettings::default()
        };
        let app = app_with(settings);
        let proxy = "10.0.0.2:443";

        let first = app
            .router
            .clone()
            .oneshot(login_from(proxy, "203.0.113.7"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

        // A forged leftmost entry does not change the key the proxy appended
        let forged = app
            .router
            .clone()
            .oneshot(login_from(proxy, "198.51.100.9, 203.0.113.7"))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::TOO_MANY_REQUESTS);

        let other_client = app
            .router
            .clone()
            .oneshot(login_from(proxy, "203.0.113.8"))
            .await
            .unwrap();
        assert_eq!(other_client.status(), StatusCode::UNAUTHORIZED);
    }
}
