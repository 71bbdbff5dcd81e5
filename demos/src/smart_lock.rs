//! A smart lock. The callback simulates an occasional jam so the
//! `{state: "JAMMED"}` response path (scenario-tested in
//! `sinric_core::capability::lock_controller`) is reachable live too.

use sinric_core::capability::CallbackOutcome;
use sinric_core::device::DeviceKind;
use sinric_core::{Config, DeviceBuilder, Sdk, SdkState, Transport};
use std::thread;
use std::time::Duration;

fn env_or_exit(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        eprintln!("missing required environment variable {key}");
        std::process::exit(1);
    })
}

fn main() {
    sinric_core::init_tracing("smart_lock");

    let config = Config {
        app_key: env_or_exit("SINRIC_APP_KEY"),
        app_secret: env_or_exit("SINRIC_APP_SECRET"),
        ..Config::default()
    };
    let device_id = env_or_exit("SINRIC_DEVICE_ID");

    let mut device = DeviceBuilder::new(device_id.as_str(), DeviceKind::Lock)
        .expect("device id must be 24 hex characters")
        .with_lock()
        .build();
    let mut attempts: u32 = 0;
    device.lock.as_mut().unwrap().on_set(move |locked| {
        attempts += 1;
        if locked && attempts % 5 == 0 {
            println!("lock mechanism jammed");
            return CallbackOutcome::refused(locked);
        }
        println!("lock -> {}", if locked { "locked" } else { "unlocked" });
        CallbackOutcome::ok(locked)
    });

    let mut sdk = Sdk::<'_, Transport>::init(config).expect("invalid configuration");
    sdk.add_device(&mut device).expect("device table is not full");

    loop {
        if sdk.state() == SdkState::Disconnected {
            if let Err(e) = sdk.begin() {
                tracing::warn!(error = %e, "connect failed, will retry");
            }
        }
        if let Err(e) = sdk.handle() {
            tracing::warn!(error = %e, "handle() returned an error");
        }
        thread::sleep(Duration::from_millis(100));
    }
}
