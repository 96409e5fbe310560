//! Remote API Gateway Client
//!
//! This module provides async functions for every resource the remote HTTP
//! gateway exposes: auth, products, users, stores, orders, visits,
//! notifications and temporary assignments.
//!
//! All calls go through one private helper implementing the response
//! contract: JSON content type on the request, `204` means no body, any
//! other 2xx body is parsed as JSON (empty bodies parse as `null`), and a
//! non-2xx answer becomes an error carrying the status code and the body's
//! `message` field when the server sent one.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{ClientError, Result};
use crate::models::{
    Credentials, LoginResponse, NewOrder, NewProduct, NewStore, NewUser, Order, Product, Role,
    ServerNotification, Store, TemporaryAssignment, User, Visit, VisitScan,
};

/// Gateway client - stateless HTTP only, no business logic
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Create a client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        self.http
            .request(method, url)
            .header("Content-Type", "application/json")
    }

    /// Execute a request and apply the gateway response contract.
    ///
    /// Returns `Value::Null` for `204 No Content` and for empty bodies.
    async fn execute(&self, builder: RequestBuilder) -> Result<serde_json::Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::network(0, format!("fetch failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::network(status.as_u16(), e.to_string()))?;
        let body: serde_json::Value = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
        };

        if !status.is_success() {
            // Servers report rejections through a message field; keep the
            // status text as the fallback.
            return Err(match body.get("message").and_then(|m| m.as_str()) {
                Some(message) => ClientError::validation(status.as_u16(), message),
                None => ClientError::network(
                    status.as_u16(),
                    format!(
                        "Error: {} - {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("unknown")
                    ),
                ),
            });
        }

        debug!("gateway call ok ({})", status.as_u16());
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self.execute(self.request(Method::GET, endpoint)).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let value = self
            .execute(self.request(method, endpoint).json(body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn delete(&self, endpoint: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, endpoint)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/auth/login", &credentials)
            .await
    }

    /// `POST /auth/register`; the role defaults to the delivery agent
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<User> {
        let user = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.unwrap_or_default(),
        };
        self.send_json(Method::POST, "/auth/register", &user).await
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    /// `GET /products`
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.get_json("/products").await
    }

    /// `GET /products/:id`
    pub async fn get_product(&self, id: i64) -> Result<Product> {
        self.get_json(&format!("/products/{}", id)).await
    }

    /// `POST /products`
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        self.send_json(Method::POST, "/products", product).await
    }

    /// `PUT /products/:id`
    pub async fn update_product(&self, id: i64, product: &NewProduct) -> Result<Product> {
        self.send_json(Method::PUT, &format!("/products/{}", id), product)
            .await
    }

    /// `DELETE /products/:id`
    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.delete(&format!("/products/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// `GET /users`
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json("/users").await
    }

    /// `GET /users/:id`
    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.get_json(&format!("/users/{}", id)).await
    }

    /// `POST /users`
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.send_json(Method::POST, "/users", user).await
    }

    /// `PUT /users/:id`
    pub async fn update_user(&self, id: i64, user: &NewUser) -> Result<User> {
        self.send_json(Method::PUT, &format!("/users/{}", id), user)
            .await
    }

    /// `DELETE /users/:id`
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("/users/{}", id)).await
    }

    /// `POST /users/:id/assign-store/:storeId`
    pub async fn assign_store(&self, user_id: i64, store_id: i64) -> Result<()> {
        self.execute(self.request(
            Method::POST,
            &format!("/users/{}/assign-store/{}", user_id, store_id),
        ))
        .await?;
        Ok(())
    }

    /// `POST /users/:id/fcm-token`
    ///
    /// The token travels as a raw string body, not JSON-quoted; the backend
    /// reads it verbatim.
    pub async fn save_fcm_token(&self, user_id: i64, token: &str) -> Result<()> {
        self.execute(
            self.request(Method::POST, &format!("/users/{}/fcm-token", user_id))
                .body(token.to_string()),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stores
    // ------------------------------------------------------------------

    /// `GET /stores`
    pub async fn list_stores(&self) -> Result<Vec<Store>> {
        self.get_json("/stores").await
    }

    /// `POST /stores`
    pub async fn create_store(&self, store: &NewStore) -> Result<Store> {
        self.send_json(Method::POST, "/stores", store).await
    }

    /// `PUT /stores/:id`
    pub async fn update_store(&self, id: i64, store: &NewStore) -> Result<Store> {
        self.send_json(Method::PUT, &format!("/stores/{}", id), store)
            .await
    }

    /// `DELETE /stores/:id`
    pub async fn delete_store(&self, id: i64) -> Result<()> {
        self.delete(&format!("/stores/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// `GET /orders`
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.get_json("/orders").await
    }

    /// `POST /orders`
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        self.send_json(Method::POST, "/orders", order).await
    }

    /// `PUT /orders/:id`
    pub async fn update_order(&self, id: i64, order: &NewOrder) -> Result<Order> {
        self.send_json(Method::PUT, &format!("/orders/{}", id), order)
            .await
    }

    /// `DELETE /orders/:id`
    pub async fn delete_order(&self, id: i64) -> Result<()> {
        self.delete(&format!("/orders/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Visits
    // ------------------------------------------------------------------

    /// `GET /visits`
    pub async fn list_visits(&self) -> Result<Vec<Visit>> {
        self.get_json("/visits").await
    }

    /// `GET /visits/by-repartidor/:id`
    pub async fn visits_by_repartidor(&self, repartidor_id: i64) -> Result<Vec<Visit>> {
        self.get_json(&format!("/visits/by-repartidor/{}", repartidor_id))
            .await
    }

    /// `POST /visits/scan?...` - parameters travel in the query string
    pub async fn register_scan(&self, scan: &VisitScan) -> Result<Visit> {
        let value = self
            .execute(self.request(Method::POST, "/visits/scan").query(scan))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// `GET /notifications`
    pub async fn list_notifications(&self) -> Result<Vec<ServerNotification>> {
        self.get_json("/notifications").await
    }

    // ------------------------------------------------------------------
    // Temporary assignments
    // ------------------------------------------------------------------

    /// `POST /temporary-assignments?...`
    pub async fn assign_temporarily(
        &self,
        store_id: i64,
        repartidor_id: i64,
        date: &str,
    ) -> Result<TemporaryAssignment> {
        let value = self
            .execute(self.request(Method::POST, "/temporary-assignments").query(&[
                ("storeId", store_id.to_string()),
                ("repartidorId", repartidor_id.to_string()),
                ("date", date.to_string()),
            ]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `GET /temporary-assignments/repartidor/:id/date/:date`
    pub async fn assignments_for(
        &self,
        repartidor_id: i64,
        date: &str,
    ) -> Result<Vec<TemporaryAssignment>> {
        self.get_json(&format!(
            "/temporary-assignments/repartidor/{}/date/{}",
            repartidor_id, date
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;
    use wiremock::matchers::{body_string, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_order() -> NewOrder {
        NewOrder {
            client_name: "Ana".to_string(),
            store_id: 7,
            items: vec![OrderItem {
                sku: "A1".to_string(),
                qty: 2,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_order_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 42, "clientName": "Ana", "storeId": 7,
                "items": [{"sku": "A1", "qty": 2}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let order = client.create_order(&sample_order()).await.unwrap();
        assert_eq!(order.id, 42);
    }

    #[tokio::test]
    async fn test_delete_handles_204() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/products/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        assert!(client.delete_product(3).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_prefers_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"message": "storeId is required"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let error = client.create_order(&sample_order()).await.unwrap_err();
        match error {
            ClientError::Validation { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "storeId is required");
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_without_message_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let error = client.list_products().await.unwrap_err();
        assert_eq!(error.status(), Some(500));
    }

    #[tokio::test]
    async fn test_fcm_token_sends_raw_string_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/9/fcm-token"))
            .and(body_string("tok-123"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        client.save_fcm_token(9, "tok-123").await.unwrap();
    }

    #[tokio::test]
    async fn test_scan_travels_in_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/visits/scan"))
            .and(query_param("storeCode", "TC-07"))
            .and(query_param("repartidorId", "4"))
            .and(query_param("hadOrder", "true"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 1, "storeId": 7, "repartidorId": 4, "hadOrder": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let visit = client
            .register_scan(&VisitScan {
                store_code: "TC-07".to_string(),
                repartidor_id: 4,
                lat: 19.43,
                lng: -99.13,
                had_order: true,
                temporary: false,
            })
            .await
            .unwrap();
        assert_eq!(visit.id, 1);
    }
}
