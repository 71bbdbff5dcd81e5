//! A single on/off switch, polling `handle()` in a cooperative loop and
//! printing every state transition. Credentials and the device id come
//! from the environment so this binary can be pointed at a real account
//! without editing source.

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
    sinric_core::init_tracing("switch");

    let app_key = env_or_exit("SINRIC_APP_KEY");
    let app_secret = env_or_exit("SINRIC_APP_SECRET");
    let device_id = env_or_exit("SINRIC_DEVICE_ID");

    let config = Config {
        app_key,
        app_secret,
        ..Config::default()
    };

    let mut device = DeviceBuilder::new(device_id.as_str(), DeviceKind::Switch)
        .expect("device id must be 24 hex characters")
        .with_power_state()
        .build();
    device
        .power_state
        .as_mut()
        .expect("just built with power state")
        .on_set(|requested| {
            println!("relay set to {requested}");
            CallbackOutcome::ok(requested)
        });

    let mut sdk = Sdk::<'_, Transport>::init(config).expect("invalid configuration");
    sdk.on_state_change(|state: SdkState| tracing::info!(?state, "connection state changed"));
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
