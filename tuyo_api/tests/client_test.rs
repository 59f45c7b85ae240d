//! Request/response contract with the gateways.

mod common;

use common::client_for;
use serde_json::json;
use tuyo_api::{
    api::otp::DEFAULT_OTP_INVALID, AuthApi, CardsApi, OtpApi, OtpPurpose, RealtimeApi,
    TuyoError,
};
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn fake_token(user_id: i64) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "userId": user_id, "correo": "usuario@uao.edu.co", "nombre": "Ana" }).to_string(),
    );
    format!("{header}.{payload}.sig")
}

#[tokio::test]
async fn test_send_otp_hides_server_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cuenta/send-otp"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "No existe" })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send_otp("usuario@uao.edu.co", OtpPurpose::Recuperacion)
        .await
        .unwrap_err();
    assert!(matches!(err, TuyoError::OtpSend { status: 404 }));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_send_otp_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cuenta/send-otp"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let payload = client_for(&server)
        .send_otp("usuario@uao.edu.co", OtpPurpose::RegistroTarjeta)
        .await
        .unwrap();
    assert!(payload.is_null());
}

#[tokio::test]
async fn test_verify_otp_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cuenta/verify-otp"))
        .and(body_json(json!({ "correo": "a@b.co", "otp": "111111" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Código vencido" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cuenta/verify-otp"))
        .and(body_json(json!({ "correo": "a@b.co", "otp": "222222" })))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cuenta/verify-otp"))
        .and(body_json(json!({ "correo": "a@b.co", "otp": "333333" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "exito": false })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let with_reason = client.verify_otp("a@b.co", "111111").await.unwrap_err();
    assert_eq!(with_reason.to_string(), "Código vencido");

    let without_reason = client.verify_otp("a@b.co", "222222").await.unwrap_err();
    assert_eq!(without_reason.to_string(), DEFAULT_OTP_INVALID);

    let not_ok = client.verify_otp("a@b.co", "333333").await.unwrap_err();
    assert_eq!(not_ok.to_string(), DEFAULT_OTP_INVALID);
}

#[tokio::test]
async fn test_login_stores_token_as_cookie() {
    let server = MockServer::start().await;
    let token = fake_token(17);
    Mock::given(method("POST"))
        .and(path("/cuenta/login"))
        .and(body_json(json!({ "correo": "usuario@uao.edu.co", "contrasenia": "Secreta123*" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tarjetas/cuenta/17"))
        .and(header("cookie", format!("token={token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "idtarjeta": 1, "numero": "1234 5678 9012 3456", "saldo": 5200.0, "estado": "activa" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let claims = client.login("usuario@uao.edu.co", "Secreta123*").await.unwrap();
    assert_eq!(claims.user_id, 17);
    assert_eq!(claims.display_name(), "Ana");

    let cards = client.list_cards(claims.user_id).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].saldo, 5200.0);

    client.logout().await;
    assert_eq!(client.current_token().await, None);
}

#[tokio::test]
async fn test_card_errors_keep_nested_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tarjetas/eliminar/3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "La tarjeta no existe" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_card(3).await.unwrap_err();
    match err {
        TuyoError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "La tarjeta no existe");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_arrivals_snapshot_parses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info/llegadas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "idestacion": 4,
                "nombre": "Universidades",
                "buses": [{ "idbus": 40, "ruta": "E31", "tiempo_estimado_min": 2 }]
            },
            { "idestacion": 5, "nombre": "Centro", "buses": [] }
        ])))
        .mount(&server)
        .await;

    let stations = client_for(&server).arrivals().await.unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].buses[0].route, "E31");
    assert_eq!(stations[0].buses[0].eta_minutes, 2);
    assert!(stations[1].buses.is_empty());
}

#[tokio::test]
async fn test_card_mutations_succeed_on_any_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/tarjetas/eliminar/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tarjetas/crearTarjeta/17"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "idtarjeta": 5, "numero": "1234 5678 9012 3456"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.delete_card(4).await.unwrap(), None);

    let created = client.create_card(17, "1234 5678 9012 3456").await.unwrap();
    assert_eq!(created.map(|t| t.id), Some(5));
}
