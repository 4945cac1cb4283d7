//! Minimal integration of the SDK: initialize, wait for the user to bind
//! their machine, then hold the session open with heartbeats.

use {
    std::{process::exit, thread, time::Duration},
    tsar_client::{Client, Error},
};

const APP_ID: &str = "f911842b-5b3d-4c59-b5d1-4adb8f71557b";
const CLIENT_KEY: &str =
    "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEvJrwPvdeDUcV8Qr02tzgFrp+8qfCV/vG1HcQJYYV8u5vYUfGABMAYT0qOQltXEX9DTcB2fzLfwQnl7yiAaNruQ==";

fn fail(title: &str, err: Error) -> ! {
    eprintln!("[-] {title}: {err}");
    exit(1);
}

fn main() {
    env_logger::init();

    let client = match Client::create(APP_ID, CLIENT_KEY) {
        Ok(client) => client,
        Err(err) => fail("failed to create client", err),
    };

    println!("[*] checking for authorization");

    // The first unauthorized attempt opens the dashboard binding page; after
    // that we quietly poll until the user finishes the browser flow.
    let mut open_browser = true;
    let user = loop {
        match client.authenticate(open_browser) {
            Ok(user) => break user,
            Err(Error::Unauthorized) => {
                open_browser = false;
                thread::sleep(Duration::from_secs(5));
            }
            Err(err) => fail("failed to authenticate", err),
        }
    };

    println!("[+] authentication success, welcome {}!", user.name().unwrap_or("N/A"));
    println!(" *  user id: {}", user.id());
    println!(" *  avatar: {}", user.avatar().unwrap_or("N/A"));
    println!(" *  subscription id: {}", user.subscription().id);
    match user.subscription().expires {
        Some(expires) => println!(" *  subscription expires: {expires}"),
        None => println!(" *  subscription expires: never"),
    }

    loop {
        if let Err(err) = user.heartbeat() {
            fail("heartbeat failed", err);
        }

        println!("[*] heartbeat success");
        thread::sleep(Duration::from_secs(10));
    }
}
