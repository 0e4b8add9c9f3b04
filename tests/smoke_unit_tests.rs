//! Smoke Screen Unit tests for the gift exchange components
//!
//! These tests exercise each public building block in isolation from the
//! storage scenarios. They mostly cover the happy path plus the edge cases
//! each block documents.

use chrono::Utc;
use gift_exchange::{
    app::{App, Method, Request, Response},
    error::{GroupError, ValidationError},
    group::{Assignment, Group, MemberInput, TimeStamp, User},
    rate_limit::RateLimiter,
    service::{GroupService, parse_version},
    store::MemoryStore,
    utils::{GROUP_KEY_LEN, generate_group_key, is_group_key},
    validation::{validate_email, validate_group_name, validate_member_name},
    view::GroupView,
};
use serde_json::json;
use std::sync::Arc;

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Generated keys fit the route pattern used for group pages
    #[test]
    fn generates_route_safe_keys() {
        let key = generate_group_key();
        assert_eq!(key.len(), GROUP_KEY_LEN);
        assert!(is_group_key(&key));
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = generate_group_key();
        let id2 = generate_group_key();
        let id3 = generate_group_key();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}

// VALIDATION MODULE TESTS
#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn member_name_ceiling_is_100() {
        assert!(validate_member_name(&"n".repeat(100)).is_ok());
        assert!(validate_member_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn group_name_ceiling_is_128() {
        assert!(validate_group_name(&"n".repeat(128)).is_ok());
        assert!(validate_group_name(&"n".repeat(129)).is_err());
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(validate_member_name(""), Err(ValidationError::EmptyName));
        assert_eq!(validate_group_name(""), Err(ValidationError::EmptyName));
    }

    #[test]
    fn minimal_email_is_accepted() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("abc").is_err());
        assert!(validate_email("a@bc").is_err());
    }
}

// GROUP MODULE TESTS
#[cfg(test)]
mod group_tests {
    use super::*;

    /// TimeStamp::now() sits at whole-second precision close to the clock
    #[test]
    fn timestamp_now_is_whole_seconds() {
        let ts = TimeStamp::now();
        let diff = (Utc::now() - ts.to_datetime_utc()).num_seconds().abs();

        assert!(diff <= 1);
        assert_eq!(ts.to_datetime_utc().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn epoch_seconds_roundtrip() {
        let ts = TimeStamp::from_epoch_secs(1_700_000_000).unwrap();
        assert_eq!(ts.epoch_secs(), 1_700_000_000);
    }

    #[test]
    fn new_group_is_empty_and_unversioned() {
        let group = Group::new(generate_group_key(), "Potluck", "org@example.com").unwrap();

        assert!(group.users().is_empty());
        assert!(group.positive_constraints().is_empty());
        assert!(group.negative_constraints().is_empty());
        assert!(group.assignments().is_empty());
        assert!(group.version().is_none());
        assert!(!group.is_assigned());
    }

    #[test]
    fn group_requires_valid_admin_email() {
        let err = Group::new(generate_group_key(), "Potluck", "organizer").unwrap_err();
        assert_eq!(err, ValidationError::MalformedEmail("organizer".into()));
    }

    #[test]
    fn user_and_assignment_validate_on_construction() {
        assert!(User::new("Ann", "a@x.com").is_ok());
        assert!(User::new("Ann", "").is_err());
        assert!(Assignment::new("a@x.com", "b@x.com").is_ok());
        assert!(Assignment::new("a@x.com", "b").is_err());
    }

    #[test]
    fn member_input_trims_before_validating() {
        let input = MemberInput {
            name: "  Ann\t".into(),
            email: " a@x.com\n".into(),
        };
        let user = input.into_user().unwrap().unwrap();
        assert_eq!(user.name(), "Ann");
        assert_eq!(user.email(), "a@x.com");
    }
}

// SERVICE MODULE TESTS
#[cfg(test)]
mod service_tests {
    use super::*;

    #[test]
    fn version_tokens_must_be_integers() {
        assert_eq!(parse_version(" 1700000000 ").unwrap(), 1_700_000_000);
        assert!(matches!(parse_version("1.5"), Err(GroupError::InvalidVersion)));
        assert!(matches!(parse_version(""), Err(GroupError::InvalidVersion)));
    }

    #[test]
    fn view_reflects_stored_group() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        let group = service.create_group("Potluck", "org@example.com").unwrap();
        let view = GroupView::from(&group);

        assert_eq!(view.key, group.key());
        assert_eq!(view.version, group.version_token().unwrap());
        assert!(view.users.is_empty());
    }
}

// APP MODULE TESTS
#[cfg(test)]
mod app_tests {
    use super::*;

    fn app() -> App {
        App::new(
            GroupService::new(Arc::new(MemoryStore::new())),
            RateLimiter::new(),
        )
    }

    #[test]
    fn unknown_paths_are_not_found() {
        let response = app().handle(&Request::new(Method::Get, "/nowhere/", "1.1.1.1"));
        assert!(matches!(response, Response::Raw { status: 404, .. }));
    }

    #[test]
    fn update_over_json_round() {
        let app = app();
        let Response::Json(created) = app.handle(
            &Request::new(Method::Post, "/x/create-group/", "1.1.1.1")
                .param("name", "Potluck")
                .param("adminEmail", "org@example.com"),
        ) else {
            panic!("expected json");
        };

        let update = Request::new(Method::Post, "/x/update-group/", "1.1.1.1")
            .param("key", created["key"].as_str().unwrap())
            .param("version", created["version"].to_string())
            .param("users", r#"[{"name":"Ann","email":"a@x.com"}]"#);
        let Response::Json(updated) = app.handle(&update) else {
            panic!("expected json");
        };
        assert_eq!(updated["users"], json!([{"name": "Ann", "email": "a@x.com"}]));

        // a different client is not throttled by the first one's request
        let stale = Request {
            remote_addr: "2.2.2.2".into(),
            ..update
        };
        let Response::Json(rejected) = app.handle(&stale) else {
            panic!("expected json");
        };
        assert!(rejected["errors"].as_str().unwrap().contains("Refresh the page"));
    }

    #[test]
    fn missing_update_params_are_reported() {
        let app = app();
        let Response::Json(created) = app.handle(
            &Request::new(Method::Post, "/x/create-group/", "1.1.1.1")
                .param("name", "Potluck")
                .param("adminEmail", "org@example.com"),
        ) else {
            panic!("expected json");
        };
        let key = created["key"].as_str().unwrap();

        let response = app.handle(
            &Request::new(Method::Post, "/x/update-group/", "1.1.1.1").param("key", key),
        );
        assert_eq!(
            response,
            Response::Json(json!({"errors": "That's not a valid version."}))
        );

        let response = app.handle(
            &Request::new(Method::Post, "/x/update-group/", "3.3.3.3")
                .param("key", key)
                .param("version", created["version"].to_string()),
        );
        assert_eq!(
            response,
            Response::Json(json!({"errors": "The members list is not in a valid format."}))
        );
    }
}
