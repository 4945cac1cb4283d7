//! End-to-end state-machine tests: a mockito HTTP server stands in for the
//! authorization service and a localhost UDP responder stands in for the
//! NTP server, so create → authenticate → heartbeat runs against fully
//! controlled inputs.

use {
    assert_matches::assert_matches,
    base64::{engine::general_purpose::STANDARD, Engine as _},
    mockito::Matcher,
    p256::{
        ecdsa::{signature::Signer as _, Signature, SigningKey},
        pkcs8::EncodePublicKey as _,
    },
    serde_json::{json, Value},
    std::{
        net::{SocketAddr, UdpSocket},
        thread,
        time::{SystemTime, UNIX_EPOCH},
    },
    tsar_client::{Client, ClientOptions, Error},
};

const APP_ID: &str = "f911842b-5b3d-4c59-b5d1-4adb8f71557b";

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Answers every NTP query on a localhost socket with the real current time,
/// so the skew seen by the freshness check is effectively zero.
fn spawn_ntp_responder() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();

    thread::spawn(move || {
        let mut buf = [0u8; 48];
        while let Ok((_, peer)) = socket.recv_from(&mut buf) {
            let mut reply = [0u8; 48];
            reply[0] = 0x24;
            let ntp_seconds = (unix_now() + 2_208_988_800) as u32;
            reply[40..44].copy_from_slice(&ntp_seconds.to_be_bytes());
            let _ = socket.send_to(&reply, peer);
        }
    });

    addr
}

/// The same stable identifier the SDK reads, needed up front to pre-sign
/// mock payloads that bind to this machine. `None` skips the test on hosts
/// without one (e.g. stripped-down containers).
fn local_hwid() -> Option<String> {
    match tsar_client::hwid() {
        Ok(hwid) => Some(hwid),
        Err(_) => {
            eprintln!("skipping: this host has no readable machine identifier");
            None
        }
    }
}

fn app_key() -> SigningKey {
    SigningKey::from_slice(&[41u8; 32]).unwrap()
}

fn session_key() -> SigningKey {
    SigningKey::from_slice(&[42u8; 32]).unwrap()
}

/// 124 base64 characters of the app verifying key, as an app would embed.
fn app_key_b64(key: &SigningKey) -> String {
    let der = key.verifying_key().to_public_key_der().unwrap();
    let encoded = STANDARD.encode(der.as_bytes());
    assert_eq!(encoded.len(), 124);
    encoded
}

fn envelope_body(key: &SigningKey, payload: &Value) -> String {
    let data = serde_json::to_vec(payload).unwrap();
    let signature: Signature = key.sign(&data);

    json!({
        "data": STANDARD.encode(&data),
        "signature": STANDARD.encode(signature.to_bytes()),
    })
    .to_string()
}

fn signed_body(key: &SigningKey, hwid: &str, inner: Value) -> String {
    envelope_body(
        key,
        &json!({
            "hwid": hwid,
            "timestamp": unix_now(),
            "data": inner,
        }),
    )
}

fn options_for(server: &mockito::Server, ntp: SocketAddr) -> ClientOptions {
    ClientOptions {
        api_base: server.url(),
        ntp_host: ntp.ip().to_string(),
        ntp_port: ntp.port(),
        dashboard_hostname: None,
    }
}

fn mock_initialize(server: &mut mockito::Server, hwid: &str) -> mockito::Mock {
    server
        .mock("GET", "/initialize")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app_id".into(), APP_ID.into()),
            Matcher::UrlEncoded("hwid".into(), hwid.into()),
        ]))
        .with_status(200)
        .with_body(signed_body(
            &app_key(),
            hwid,
            json!({ "dashboard_hostname": "my-app.tsar.app" }),
        ))
        .create()
}

fn user_payload(session_key: &SigningKey) -> Value {
    let session_key_der = session_key.verifying_key().to_public_key_der().unwrap();

    json!({
        "id": "user_1",
        "name": "alice",
        "avatar": null,
        "subscription": { "id": "sub_1", "expires": null, "tier": 2 },
        "session": "sess_abcdef",
        "session_key": STANDARD.encode(session_key_der.as_bytes()),
    })
}

fn authenticated_user(
    server: &mut mockito::Server,
    ntp: SocketAddr,
    hwid: &str,
) -> tsar_client::User {
    mock_initialize(server, hwid);
    server
        .mock("GET", "/authenticate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(signed_body(&app_key(), hwid, user_payload(&session_key())))
        .create();

    let client =
        Client::with_options(APP_ID, &app_key_b64(&app_key()), options_for(server, ntp)).unwrap();

    client.authenticate(false).unwrap()
}

#[test]
fn create_learns_the_dashboard_hostname() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let mock = mock_initialize(&mut server, &hwid);

    let client =
        Client::with_options(APP_ID, &app_key_b64(&app_key()), options_for(&server, ntp)).unwrap();

    assert_eq!(client.dashboard_hostname(), "my-app.tsar.app");
    assert_eq!(client.app_id(), APP_ID);
    assert_eq!(client.hwid(), hwid);
    assert_eq!(
        client.auth_url(),
        format!("https://my-app.tsar.app/auth/{hwid}")
    );
    mock.assert();
}

#[test]
fn explicit_hostname_overrides_the_payload() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    mock_initialize(&mut server, &hwid);

    let options = ClientOptions {
        dashboard_hostname: Some("staging.tsar.app".to_owned()),
        ..options_for(&server, ntp)
    };

    let client = Client::with_options(APP_ID, &app_key_b64(&app_key()), options).unwrap();

    assert_eq!(client.dashboard_hostname(), "staging.tsar.app");
}

#[test]
fn malformed_app_id_fails_before_any_network_call() {
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let untouched = server.mock("GET", Matcher::Any).expect(0).create();

    let result = Client::with_options(
        "too-short",
        &app_key_b64(&app_key()),
        options_for(&server, ntp),
    );

    assert_matches!(result, Err(Error::InvalidAppId(9)));
    untouched.assert();
}

#[test]
fn malformed_client_key_fails_before_any_network_call() {
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let untouched = server.mock("GET", Matcher::Any).expect(0).create();

    let result = Client::with_options(APP_ID, "bm90IGEga2V5", options_for(&server, ntp));

    assert_matches!(result, Err(Error::InvalidClientKey(12)));
    untouched.assert();
}

#[test]
fn paused_app_surfaces_at_initialize() {
    let Some(_) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/initialize")
        .match_query(Matcher::Any)
        .with_status(503)
        .create();

    let result = Client::with_options(APP_ID, &app_key_b64(&app_key()), options_for(&server, ntp));

    assert_matches!(result, Err(Error::AppPaused));
}

#[test]
fn unauthorized_machine_surfaces_from_authenticate() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    mock_initialize(&mut server, &hwid);
    server
        .mock("GET", "/authenticate")
        .match_query(Matcher::Any)
        .with_status(401)
        .create();

    let client =
        Client::with_options(APP_ID, &app_key_b64(&app_key()), options_for(&server, ntp)).unwrap();

    assert_matches!(client.authenticate(false), Err(Error::Unauthorized));
}

#[test]
fn authenticate_builds_the_user_from_the_signed_payload() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();

    let user = authenticated_user(&mut server, ntp, &hwid);

    assert_eq!(user.id(), "user_1");
    assert_eq!(user.name(), Some("alice"));
    assert_eq!(user.avatar(), None);
    assert_eq!(user.subscription().id, "sub_1");
    assert_eq!(user.subscription().expires, None);
    assert_eq!(user.subscription().tier, 2);
}

#[test]
fn heartbeat_verifies_under_the_session_key() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    let heartbeat = server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("session".into(), "sess_abcdef".into()),
            Matcher::UrlEncoded("hwid".into(), hwid.clone()),
        ]))
        .with_status(200)
        .with_body(signed_body(&session_key(), &hwid, json!({})))
        .expect_at_least(2)
        .create();

    // Success changes nothing locally; a second beat behaves identically.
    user.heartbeat().unwrap();
    user.heartbeat().unwrap();
    heartbeat.assert();
}

#[test]
fn heartbeat_signed_with_the_app_key_is_rejected() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(signed_body(&app_key(), &hwid, json!({})))
        .create();

    assert_matches!(user.heartbeat(), Err(Error::InvalidSignature));
}

#[test]
fn heartbeat_bound_to_another_machine_is_rejected() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(signed_body(&session_key(), "WRONG", json!({})))
        .create();

    assert_matches!(user.heartbeat(), Err(Error::HwidMismatch));
}

#[test]
fn stale_heartbeat_is_rejected() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    let stale = json!({
        "hwid": hwid,
        "timestamp": unix_now() - 120,
        "data": {},
    });
    server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope_body(&session_key(), &stale))
        .create();

    assert_matches!(user.heartbeat(), Err(Error::OldResponse));
}

#[test]
fn tampered_heartbeat_is_rejected() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    // Sign a fresh payload, then flip a byte of the decoded data.
    let payload = json!({
        "hwid": hwid,
        "timestamp": unix_now(),
        "data": { "note": "padding so the flipped byte lands in here" },
    });
    let mut data = serde_json::to_vec(&payload).unwrap();
    let signature: Signature = session_key().sign(&data);
    data[17] ^= 0x01;

    let body = json!({
        "data": STANDARD.encode(&data),
        "signature": STANDARD.encode(signature.to_bytes()),
    })
    .to_string();

    server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create();

    assert_matches!(user.heartbeat(), Err(Error::InvalidSignature));
}

#[test]
fn rate_limited_heartbeat_surfaces_as_policy_error() {
    let Some(hwid) = local_hwid() else { return };
    let ntp = spawn_ntp_responder();
    let mut server = mockito::Server::new();
    let user = authenticated_user(&mut server, ntp, &hwid);

    server
        .mock("GET", "/heartbeat")
        .match_query(Matcher::Any)
        .with_status(429)
        .create();

    assert_matches!(user.heartbeat(), Err(Error::RateLimited));
}
