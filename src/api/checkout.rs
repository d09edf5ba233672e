use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::domain::checkout::{CheckoutError, CheckoutOutcome, CheckoutRequest, ExecutePaymentRequest};

use super::AppState;

pub async fn checkout(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, CheckoutError> {
    let response = match state.orchestrator.checkout(body.into_inner()).await? {
        CheckoutOutcome::Committed(order) => json!({
            "ok": true,
            "orderId": order.order_id,
            "total_cents": order.total_cents,
        }),
        CheckoutOutcome::Pending(pending) => json!({
            "ok": true,
            "payment": pending.payment,
            "total_cents": pending.total_cents,
        }),
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn execute_paypal(
    state: web::Data<AppState>,
    body: web::Json<ExecutePaymentRequest>,
) -> Result<HttpResponse, CheckoutError> {
    let executed = state.orchestrator.execute_payment(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "ok": true,
        "orderId": executed.order.order_id,
        "total_cents": executed.order.total_cents,
        "transactionId": executed.transaction_id,
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::api::{configure, testing};
    use crate::models::NewProduct;
    use crate::payment::fakes::{FakeRedirect, FakeWallet};
    use crate::payment::{ChargeOutcome, ExecuteOutcome, PaymentError};

    async fn post(
        wallet: FakeWallet,
        redirect: FakeRedirect,
        stock: i64,
        uri: &str,
        body: impl Fn(i64) -> Value,
    ) -> (StatusCode, Value, i64) {
        let state = testing::state(wallet, redirect).await;
        let product = state
            .products
            .create(NewProduct::new("Pollo entero", 650, stock))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri(uri).set_json(body(product.id)).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;

        let stock_after = state.products.find(product.id).await.unwrap().unwrap().stock;
        (status, body, stock_after)
    }

    fn wallet_body(product_id: i64, qty: i64) -> Value {
        json!({
            "userId": 1,
            "items": [{ "productId": product_id, "qty": qty }],
            "payment_method": "wallet",
            "wallet_email": "buyer@example.com",
        })
    }

    #[actix_web::test]
    async fn test_wallet_checkout_returns_order() {
        let (status, body, stock) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |id| wallet_body(id, 2),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["total_cents"], 1300);
        assert!(body["orderId"].as_i64().unwrap() > 0);
        assert_eq!(stock, 18);
    }

    #[actix_web::test]
    async fn test_insufficient_stock_is_conflict_with_available() {
        let (status, body, stock) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            1,
            "/api/orders/checkout",
            |id| wallet_body(id, 3),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["ok"], false);
        assert_eq!(body["kind"], "insufficient_stock");
        assert_eq!(body["available"], 1);
        assert_eq!(body["requested"], 3);
        assert_eq!(stock, 1);
    }

    #[actix_web::test]
    async fn test_insufficient_funds_is_payment_required() {
        let (status, body, stock) = post(
            FakeWallet::answering(Ok(ChargeOutcome::InsufficientFunds)),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |id| wallet_body(id, 1),
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["kind"], "payment_failed");
        assert_eq!(body["reason"], "insufficient_funds");
        assert_eq!(stock, 20);
    }

    #[actix_web::test]
    async fn test_unreachable_wallet_is_bad_gateway() {
        let (status, body, stock) = post(
            FakeWallet::answering(Err(PaymentError::Transport("timed out".to_string()))),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |id| wallet_body(id, 1),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["reason"], "provider_unreachable");
        assert_eq!(stock, 20);
    }

    #[actix_web::test]
    async fn test_unknown_product_is_not_found() {
        let (status, body, _) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |id| wallet_body(id + 100, 1),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[actix_web::test]
    async fn test_empty_items_is_validation_error() {
        let (status, body, _) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |_| json!({ "items": [], "payment_method": "wallet", "wallet_email": "a@b.io" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[actix_web::test]
    async fn test_malformed_body_uses_error_envelope() {
        let (status, body, _) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |_| json!({ "items": "lots", "payment_method": "wallet" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["kind"], "validation");
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("malformed request body: "), "{message}");
    }

    #[actix_web::test]
    async fn test_paypal_checkout_returns_approval() {
        let (status, body, stock) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/checkout",
            |id| {
                json!({
                    "items": [{ "productId": id, "qty": 1 }],
                    "payment_method": "paypal",
                    "paypal": { "return_url": "http://shop.test/ok" },
                })
            },
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payment"]["paymentId"], "PAY-test");
        assert_eq!(body["payment"]["approval_url"], "http://payment.test/pay/PAY-test");
        assert_eq!(body["total_cents"], 650);
        assert_eq!(stock, 20);
    }

    #[actix_web::test]
    async fn test_execute_paypal_commits_order() {
        let (status, body, stock) = post(
            FakeWallet::completing(),
            FakeRedirect::approving(),
            20,
            "/api/orders/execute-paypal",
            |id| {
                json!({
                    "paymentId": "PAY-test",
                    "payerId": "PAYER-1",
                    "items": [{ "productId": id, "qty": 2 }],
                })
            },
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_cents"], 1300);
        assert_eq!(body["transactionId"], "TX-test");
        assert_eq!(stock, 18);
    }

    #[actix_web::test]
    async fn test_execute_paypal_not_completed() {
        let redirect = FakeRedirect::new(
            Err(PaymentError::Unavailable),
            Ok(ExecuteOutcome::NotCompleted {
                status: "DENIED".to_string(),
            }),
        );
        let (status, body, stock) = post(
            FakeWallet::completing(),
            redirect,
            20,
            "/api/orders/execute-paypal",
            |id| json!({ "paymentId": "PAY-9", "items": [{ "productId": id, "qty": 1 }] }),
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["kind"], "payment_not_completed");
        assert_eq!(body["detail"]["status"], "DENIED");
        assert_eq!(stock, 20);
    }
}
