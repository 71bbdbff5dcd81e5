//! A doorbell button: no inbound requests, just a `DoorbellPress` event
//! fired on a simulated press, gated by the capability's own state
//! (1s) `EventLimiter`.

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
    sinric_core::init_tracing("doorbell");

    let config = Config {
        app_key: env_or_exit("SINRIC_APP_KEY"),
        app_secret: env_or_exit("SINRIC_APP_SECRET"),
        ..Config::default()
    };
    let device_id = env_or_exit("SINRIC_DEVICE_ID");

    let mut device = DeviceBuilder::new(device_id.as_str(), DeviceKind::Doorbell)
        .expect("device id must be 24 hex characters")
        .with_doorbell()
        .build();

    let mut sdk = Sdk::<'_, Transport>::init(config).expect("invalid configuration");
    sdk.add_device(&mut device).expect("device table is not full");

    let mut now_ms: u64 = 0;
    loop {
        if sdk.state() == SdkState::Disconnected {
            if let Err(e) = sdk.begin() {
                tracing::warn!(error = %e, "connect failed, will retry");
            }
        }
        if let Err(e) = sdk.handle() {
            tracing::warn!(error = %e, "handle() returned an error");
        }

        // Simulates a button press roughly every three seconds; a real
        // binary would call this from a GPIO interrupt handler instead.
        if sdk.state() == SdkState::Connected && now_ms % 3_000 == 0 {
            if let Some(device) = sdk.find_device_mut(&device_id) {
                if let Some(doorbell) = device.doorbell.as_mut() {
                    if let Some(value) = doorbell.try_emit(now_ms) {
                        println!("doorbell pressed");
                        sdk.send_event(&device_id, "DoorbellPress", value);
                    }
                }
            }
        }

        now_ms += 100;
        thread::sleep(Duration::from_millis(100));
    }
}
