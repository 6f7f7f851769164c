//! API client for the restoran backend.
//!
//! Every protected call goes through `ApiClient::request`, which reads the
//! bearer token from the `SessionStore` at the moment the call is made. A
//! client built before login therefore picks up the token as soon as the
//! session has one, and never sends anything while the session is empty.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortRegistration, Abortable};
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::{
    AddToCart, CartItem, CartQuantityUpdate, CartResponse, MenuItem, Order, OrderRequest,
    OrdersResponse,
};

use super::queue::CartMutationQueue;
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/api/auth/login";
const CART_PATH: &str = "/api/cart";
const MENUS_PATH: &str = "/api/menus";
const ORDER_PATH: &str = "/api/order";

/// HTTP request timeout in seconds. A call that hangs longer than this
/// surfaces as `ApiError::Timeout`.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const NO_BODY: Option<&()> = None;

/// What to do with the session when the backend answers 401/403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Log the session out so the route guard sends the user to login.
    #[default]
    ClearSession,
    /// Leave the session alone; callers only see the error.
    Keep,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub auth_failure_policy: AuthFailurePolicy,
    pub serialize_cart_mutations: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            auth_failure_policy: AuthFailurePolicy::default(),
            serialize_cart_mutations: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(rename = "userId", alias = "user_id", default)]
    pub user_id: Option<i64>,
}

/// One outbound protected call. Built per call and never stored.
pub struct AuthorizedRequest<'a, B: ?Sized> {
    pub method: Method,
    pub path: &'a str,
    pub body: Option<&'a B>,
    token: String,
    authorization: header::HeaderValue,
}

impl<B: ?Sized> std::fmt::Debug for AuthorizedRequest<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: ?Sized> AuthorizedRequest<'_, B> {
    /// The `Authorization` header value, `Bearer <token>`.
    pub fn authorization(&self) -> &header::HeaderValue {
        &self.authorization
    }
}

/// API client for the restoran backend.
/// Clone is cheap - reqwest::Client and the session store are shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    auth_failure_policy: AuthFailurePolicy,
    cart_queue: Option<Arc<CartMutationQueue>>,
}

impl ApiClient {
    /// Create a client with default options
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self, ApiError> {
        Self::with_options(base_url, session, ClientOptions::default())
    }

    pub fn with_options(
        base_url: &str,
        session: SessionStore,
        options: ClientOptions,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            auth_failure_policy: options.auth_failure_policy,
            cart_queue: options
                .serialize_cart_mutations
                .then(|| Arc::new(CartMutationQueue::new())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Authentication =====

    /// Exchange credentials for a bearer token. This is the only call made
    /// without one, and it does not touch the session store.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let response = Self::check_response(response).await?;
        Self::parse_body(LOGIN_PATH, response).await
    }

    // ===== Request pipeline =====

    /// Describe a protected call using the token held right now.
    /// Fails with `MissingSession` when there is none.
    pub fn authorize<'a, B: ?Sized>(
        &self,
        method: Method,
        path: &'a str,
        body: Option<&'a B>,
    ) -> Result<AuthorizedRequest<'a, B>, ApiError> {
        let token = self.session.token().ok_or(ApiError::MissingSession)?;
        let mut authorization = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidToken)?;
        authorization.set_sensitive(true);

        Ok(AuthorizedRequest {
            method,
            path,
            body,
            token,
            authorization,
        })
    }

    /// Issue a protected call and parse the JSON response body.
    ///
    /// Nothing is sent when the session has no token. Non-2xx responses are
    /// classified into `ApiError`; 401/403 additionally apply the client's
    /// `AuthFailurePolicy`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = match self.authorize(method, path, body) {
            Ok(request) => request,
            Err(e) => {
                debug!(path = path, error = %e, "Request not sent");
                return Err(e);
            }
        };
        let response = self.send(request).await?;
        Self::parse_body(path, response).await
    }

    /// Same as `request`, but resolves to `ApiError::Cancelled` as soon as
    /// the matching `AbortHandle` is aborted.
    pub async fn request_cancellable<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        registration: AbortRegistration,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match Abortable::new(self.request(method, path, body), registration).await {
            Ok(result) => result,
            Err(_) => {
                debug!(path = path, "Request cancelled");
                Err(ApiError::Cancelled)
            }
        }
    }

    async fn send<B: Serialize + ?Sized>(&self, request: AuthorizedRequest<'_, B>) -> Result<Response, ApiError> {
        let url = self.url(request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .header(header::AUTHORIZATION, request.authorization)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from_transport)?;
        match Self::check_response(response).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.apply_auth_failure_policy(request.path, &request.token, &e);
                Err(e)
            }
        }
    }

    /// `sent_token` is the token the rejected request carried. The session
    /// is only cleared while it still holds that token.
    fn apply_auth_failure_policy(&self, path: &str, sent_token: &str, err: &ApiError) {
        if !err.is_auth_failure() {
            return;
        }
        match self.auth_failure_policy {
            AuthFailurePolicy::ClearSession => match self.session.logout_if_token(sent_token) {
                Ok(true) => {
                    warn!(path = path, status = ?err.status(), "Token rejected, session cleared");
                }
                Ok(false) => {
                    debug!(path = path, "Rejected token already replaced, session kept");
                }
                Err(e) => warn!(error = %e, "Failed to clear stored session"),
            },
            AuthFailurePolicy::Keep => {
                warn!(path = path, status = ?err.status(), "Token rejected, session kept");
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Parse a JSON body. An empty body parses as JSON `null`.
    async fn parse_body<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        let json: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            &b"null"[..]
        } else {
            &bytes
        };
        serde_json::from_slice(json)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    async fn cart_turn(&self, user_id: i64) -> Option<OwnedMutexGuard<()>> {
        match &self.cart_queue {
            Some(queue) => Some(queue.acquire(user_id).await),
            None => None,
        }
    }

    // ===== Cart =====

    pub async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, ApiError> {
        let path = format!("{}/{}", CART_PATH, user_id);
        let response: Option<CartResponse> = self.request(Method::GET, &path, NO_BODY).await?;
        Ok(response.unwrap_or_default().data)
    }

    /// Set a cart line's quantity. The body carries the final quantity, so
    /// applying two updates out of order still converges on the last one sent.
    pub async fn update_cart_quantity(&self, update: &CartQuantityUpdate) -> Result<(), ApiError> {
        let _turn = self.cart_turn(update.user_id).await;
        let _: IgnoredAny = self.request(Method::PATCH, CART_PATH, Some(update)).await?;
        Ok(())
    }

    pub async fn remove_cart_item(&self, user_id: i64, menu_id: i64) -> Result<(), ApiError> {
        let _turn = self.cart_turn(user_id).await;
        let path = format!(
            "{}/{}/{}?userId={}&menuId={}",
            CART_PATH, user_id, menu_id, user_id, menu_id
        );
        let _: IgnoredAny = self.request(Method::DELETE, &path, NO_BODY).await?;
        Ok(())
    }

    pub async fn add_to_cart(&self, item: &AddToCart) -> Result<(), ApiError> {
        let _turn = self.cart_turn(item.user_id).await;
        let _: IgnoredAny = self.request(Method::POST, CART_PATH, Some(item)).await?;
        Ok(())
    }

    // ===== Menus =====

    pub async fn fetch_menus(&self) -> Result<Vec<MenuItem>, ApiError> {
        let menus: Option<Vec<MenuItem>> = self.request(Method::GET, MENUS_PATH, NO_BODY).await?;
        Ok(menus.unwrap_or_default())
    }

    // ===== Orders =====

    pub async fn place_order(&self, order: &OrderRequest) -> Result<(), ApiError> {
        let path = format!("{}/{}", ORDER_PATH, order.user_id);
        let _: IgnoredAny = self.request(Method::POST, &path, Some(order)).await?;
        Ok(())
    }

    pub async fn fetch_orders(&self, user_id: i64) -> Result<Vec<Order>, ApiError> {
        let path = format!("{}/{}", ORDER_PATH, user_id);
        let response: Option<OrdersResponse> = self.request(Method::GET, &path, NO_BODY).await?;
        Ok(response.map(OrdersResponse::into_orders).unwrap_or_default())
    }
}
