//! Integration tests per gli endpoints di moderazione
//!
//! Test per:
//! - GET /admin/messages
//! - DELETE /admin/messages/{message_id}
//! - POST /admin/notices/{receiver_id}

mod common;

#[cfg(test)]
mod admin_tests {
    use super::common::*;
    use axum_test::http::StatusCode;
    use marketchat::repositories::MessageStore;
    use serde_json::{Value, json};

    async fn send_text(server: &axum_test::TestServer, from: (&str, &str), to: &str, content: &str) -> Value {
        let (name, value) = auth_header(from.0, from.1);
        let response = server
            .post(&format!("/messages/{}", to))
            .add_header(name, value)
            .json(&json!({ "type": "text", "content": content }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_admin_lists_recent_messages_with_display_names() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());

        send_text(&server, ("u1", "mehmet"), "u2", "ilk").await;
        send_text(&server, ("u2", "ayse"), "u1", "ikinci").await;

        let (name, value) = auth_header("admin", "moderator");
        let response = server.get("/admin/messages").add_header(name, value).await;
        response.assert_status_ok();
        let listed: Vec<Value> = response.json();

        assert_eq!(listed.len(), 2);
        // dal più recente
        assert_eq!(listed[0]["content"], "ikinci");
        assert_eq!(listed[0]["sender_display"], "Ayşe Y.");
        assert_eq!(listed[0]["receiver_display"], "mehmet");

        let (name, value) = auth_header("admin", "moderator");
        let limited: Vec<Value> = server
            .get("/admin/messages")
            .add_query_param("limit", 1)
            .add_header(name, value)
            .await
            .json();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_message_disappears_from_both_feeds() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());

        let target = send_text(&server, ("u1", "mehmet"), "u2", "uygunsuz içerik").await;
        send_text(&server, ("u2", "ayse"), "u1", "normal").await;

        let (name, value) = auth_header("admin", "moderator");
        server
            .delete(&format!("/admin/messages/{}", target["id"].as_str().unwrap()))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        for (viewer, username, counterpart) in [("u1", "mehmet", "u2"), ("u2", "ayse", "u1")] {
            let (name, value) = auth_header(viewer, username);
            let feed: Vec<Value> = server
                .get(&format!("/messages/{}", counterpart))
                .add_header(name, value)
                .await
                .json();
            assert_eq!(feed.len(), 1);
            assert!(feed.iter().all(|m| m["id"] != target["id"]));
        }

        // seconda cancellazione: il messaggio non esiste più
        let (name, value) = auth_header("admin", "moderator");
        server
            .delete(&format!("/admin/messages/{}", target["id"].as_str().unwrap()))
            .add_header(name, value)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());
        let target = send_text(&server, ("u1", "mehmet"), "u2", "mesaj").await;

        let (name, value) = auth_header("u2", "ayse");
        server
            .get("/admin/messages")
            .add_header(name, value)
            .await
            .assert_status_forbidden();

        let (name, value) = auth_header("u2", "ayse");
        server
            .delete(&format!("/admin/messages/{}", target["id"].as_str().unwrap()))
            .add_header(name, value)
            .await
            .assert_status_forbidden();

        let (name, value) = auth_header("u2", "ayse");
        server
            .post("/admin/notices/u1")
            .add_header(name, value)
            .json(&json!({ "content": "sahte duyuru" }))
            .await
            .assert_status_forbidden();

        assert_eq!(ctx.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_guest_is_unauthorized() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());

        server.get("/admin/messages").await.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_system_notice_comes_from_support() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());

        let (name, value) = auth_header("admin", "moderator");
        let response = server
            .post("/admin/notices/u1")
            .add_header(name, value)
            .json(&json!({ "content": "İlanınız onaylandı" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let notice: Value = response.json();
        assert_eq!(notice["sender_id"], SUPPORT_ID);
        assert_eq!(notice["receiver_id"], "u1");
        assert_eq!(notice["message_type"], "system");

        let (name, value) = auth_header("u1", "mehmet");
        let feed: Vec<Value> = server
            .get("/support/messages")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0]["content"], "İlanınız onaylandı");
    }

    #[tokio::test]
    async fn test_empty_notice_is_rejected() {
        let ctx = create_test_context().await;
        let server = create_test_server(ctx.state.clone());

        let (name, value) = auth_header("admin", "moderator");
        server
            .post("/admin/notices/u1")
            .add_header(name, value)
            .json(&json!({ "content": "" }))
            .await
            .assert_status_bad_request();
    }
}
