use ethers::types::U256;
use serde_json::json;
use unt_purchase::client::ApiClient;

const PLAN_BODY: &str = r#"{
    "success": true,
    "data": {
        "account": "0x1111111111111111111111111111111111111111",
        "plan": {
            "max_spend": "0.990000000000000000",
            "eligible": true,
            "shortfall": "0.000000000000000000"
        },
        "balance": "1.000000000000000000",
        "gas_cost": "0.010000000000000000",
        "estimate": null,
        "computed_at": "2024-05-01T12:00:00Z",
        "recent_success": true
    },
    "timestamp": "2024-05-01T12:00:01Z",
    "data_source": "planner",
    "request_id": "8f14e45f-ceea-467f-a0e6-2b6a1f3c0d11"
}"#;

#[tokio::test]
async fn decodes_plan_envelope() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/plan")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PLAN_BODY)
        .create_async()
        .await;

    let status = ApiClient::new(&server.url()).plan().await.unwrap();

    mock.assert_async().await;
    assert!(status.recent_success);
    assert!(status.snapshot.plan.eligible);
    assert_eq!(
        status.snapshot.plan.max_spend,
        U256::from(990_000_000_000_000_000u128)
    );
}

#[tokio::test]
async fn surfaces_shortfall_from_rejected_purchase() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/purchase")
        .match_header("authorization", "Bearer buyer-secret")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": false,
                "error": "Insufficient funds for purchase: 0.030000000000000000 ETH more required",
                "error_code": "INSUFFICIENT_FUNDS",
                "timestamp": "2024-05-01T12:00:00Z",
                "request_id": "c9f0f895-fb98-4b91-9f4b-5d6c3a1e2f00",
                "shortfall": "0.030000000000000000"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = ApiClient::new(&server.url())
        .with_api_key("buyer-secret")
        .buy()
        .await
        .unwrap_err();

    mock.assert_async().await;

    let message = err.to_string();
    assert!(message.contains("INSUFFICIENT_FUNDS"));
    assert!(message.contains("additional 0.030000000000000000 ETH required"));
}

#[tokio::test]
async fn posts_withdraw_amount_as_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/admin/withdraw")
        .match_header("authorization", "Bearer admin-secret")
        .match_body(mockito::Matcher::Json(json!({ "amount": "2" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {
                    "tx_hash": format!("0x{}", "cd".repeat(32)),
                    "amount": "2.000000",
                    "decimals": 6,
                    "block_number": 19000002
                },
                "timestamp": "2024-05-01T12:00:00Z",
                "data_source": "token-contract",
                "request_id": "45c48cce-2e2d-4fbd-a8d3-6a2c5f1b9e77"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let receipt = ApiClient::new(&server.url())
        .with_admin_api_key("admin-secret")
        .withdraw("2")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.amount, "2.000000");
    assert_eq!(receipt.decimals, 6);
    assert_eq!(receipt.block_number, Some(19_000_002));
}
