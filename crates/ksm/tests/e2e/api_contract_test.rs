//! Integration tests for the collaborator API response shapes.
//!
//! Success responses flatten the result object next to `success: true`;
//! failure responses carry `error`, `code` and `timestamp` and never panic.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    dead_code
)]

use serde_json::{json, Value};

use crate::common::{open_api, temp_data_dir, test_clock, TEST_NOW};

fn assert_failure(response: &Value, code: &str) {
    assert_eq!(response["success"], false, "response: {response}");
    assert_eq!(response["code"], code, "response: {response}");
    assert_eq!(response["timestamp"], TEST_NOW);
    assert!(response["error"].as_str().is_some_and(|e| !e.is_empty()));
}

fn call(api: &ksm::KsmApi<ksm_crypto::FileKeyStore>, method: &str, params: Value) -> Value {
    serde_json::to_value(api.handle(method, &params)).unwrap()
}

#[test]
fn test_health_shape() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());

    let response = call(&api, "health", Value::Null);
    assert_eq!(response["success"], true);
    assert_eq!(response["status"], "UP");
    assert_eq!(response["service"], "ksm");
    assert_eq!(response["signatureAlgorithm"], "DILITHIUM3");
    assert_eq!(response["encryptionAlgorithm"], "KYBER768");
    let supported = response["supportedAlgorithms"].as_array().unwrap();
    assert!(supported.contains(&json!("DILITHIUM2")));
    assert!(supported.contains(&json!("KYBER1024")));
}

#[test]
fn test_generate_then_public_key_agree() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());

    let generated = call(&api, "generateKey", json!({"entityId": "vietcombank"}));
    assert_eq!(generated["success"], true);
    assert_eq!(generated["entityId"], "vietcombank");
    assert_eq!(generated["algorithm"], "DILITHIUM3");
    assert_eq!(generated["publicKeySize"], 1952);

    let fetched = call(&api, "getPublicKey", json!({"entityId": "vietcombank"}));
    assert_eq!(fetched["publicKey"], generated["publicKey"]);
    assert_eq!(fetched["fingerprint"], generated["fingerprint"]);
}

#[test]
fn test_unknown_entity_operations_fail_uniformly() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());

    let cases = [
        ("getPublicKey", json!({"entityId": "ghost"})),
        ("sign", json!({"entityId": "ghost", "message": "hi"})),
        ("encrypt", json!({"entityId": "ghost", "data": "hi"})),
        (
            "verify",
            json!({"entityId": "ghost", "message": "hi", "signature": "AAAA"}),
        ),
        ("decrypt", json!({"entityId": "ghost", "encryptedData": "AAAA"})),
    ];

    for (method, params) in cases {
        assert_failure(&call(&api, method, params), "ENTITY_KEY_NOT_FOUND");
    }
}

#[test]
fn test_malformed_requests() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());
    call(&api, "generateKey", json!({"entityId": "vcb"}));

    assert_failure(&call(&api, "sign", json!({"entityId": "vcb"})), "INVALID_REQUEST");
    assert_failure(&call(&api, "rotateKey", json!({})), "INVALID_REQUEST");
    assert_failure(
        &call(
            &api,
            "verify",
            json!({"entityId": "vcb", "message": "m", "signature": "!!not base64!!"}),
        ),
        "INVALID_REQUEST",
    );
    assert_failure(
        &call(&api, "generateKey", json!({"entityId": "../escape"})),
        "INVALID_REQUEST",
    );
}

#[test]
fn test_verify_with_unknown_algorithm_name() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());
    call(&api, "generateKey", json!({"entityId": "vcb"}));
    let signed = call(&api, "sign", json!({"entityId": "vcb", "message": "m"}));

    let response = call(
        &api,
        "verify",
        json!({
            "entityId": "vcb",
            "message": "m",
            "signature": signed["signature"],
            "algorithm": "FALCON512",
        }),
    );
    assert_failure(&response, "INVALID_ALGORITHM");
}

#[test]
fn test_sign_verify_round_trip_through_api() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());
    call(&api, "generateKey", json!({"entityId": "vcb"}));

    let signed = call(&api, "sign", json!({"entityId": "vcb", "message": "pay 100"}));
    assert_eq!(signed["signatureSize"], 3309);

    let ok = call(
        &api,
        "verify",
        json!({"entityId": "vcb", "message": "pay 100", "signature": signed["signature"]}),
    );
    assert_eq!(ok["valid"], true);

    let tampered = call(
        &api,
        "verify",
        json!({"entityId": "vcb", "message": "pay 101", "signature": signed["signature"]}),
    );
    assert_eq!(tampered["success"], true);
    assert_eq!(tampered["valid"], false);
}

#[test]
fn test_transaction_round_trip_through_api() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());
    call(&api, "generateKey", json!({"entityId": "vietcombank"}));

    let created = call(
        &api,
        "createSignedTransaction",
        json!({"from": "vietcombank", "to": "vietinbank", "amount": 1_000_000.0, "description": "transfer"}),
    );
    assert_eq!(created["success"], true);
    let tx = created["transaction"].clone();
    assert_eq!(tx["timestamp"], TEST_NOW);
    assert!(tx["transactionData"]
        .as_str()
        .unwrap()
        .starts_with("FROM:vietcombank|TO:vietinbank|AMOUNT:1000000.00|DESC:transfer"));

    let verified = call(&api, "verifySignedTransaction", json!({"transaction": tx}));
    assert_eq!(verified["valid"], true);

    let mut tampered = tx;
    tampered["amount"] = json!(1.0);
    let verified = call(
        &api,
        "verifySignedTransaction",
        json!({"transaction": tampered}),
    );
    assert_eq!(verified["valid"], false);
}

#[test]
fn test_list_delete_and_stats() {
    let dir = temp_data_dir();
    let api = open_api(dir.path(), &test_clock());
    call(&api, "generateKey", json!({"entityId": "b"}));
    call(&api, "generateKey", json!({"entityId": "a"}));

    let listed = call(&api, "listEntities", Value::Null);
    assert_eq!(listed["entities"], json!(["a", "b"]));
    assert_eq!(listed["count"], 2);

    let deleted = call(&api, "deleteKey", json!({"entityId": "a"}));
    assert_eq!(deleted["deleted"], true);
    let again = call(&api, "deleteKey", json!({"entityId": "a"}));
    assert_eq!(again["deleted"], false);

    let stats = call(&api, "storageStats", Value::Null);
    assert_eq!(stats["recordCount"], 1);
    assert_eq!(stats["masterKeyPresent"], true);
    assert_eq!(stats["cachedKeys"], 1);
}
