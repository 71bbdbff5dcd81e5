//! A temperature/humidity sensor: no inbound requests, just periodic
//! `currentTemperature` events gated by the sensor's own `EventLimiter`
//! and pushed out through [`sinric_core::Sdk::send_event`].

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
    sinric_core::init_tracing("temperature_sensor");

    let config = Config {
        app_key: env_or_exit("SINRIC_APP_KEY"),
        app_secret: env_or_exit("SINRIC_APP_SECRET"),
        ..Config::default()
    };
    let device_id = env_or_exit("SINRIC_DEVICE_ID");

    let mut device = DeviceBuilder::new(device_id.as_str(), DeviceKind::TemperatureSensor)
        .expect("device id must be 24 hex characters")
        .with_temperature_sensor()
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

        if sdk.state() == SdkState::Connected {
            if let Some(device) = sdk.find_device_mut(&device_id) {
                if let Some(sensor) = device.temperature.as_mut() {
                    if let Some(value) = sensor.try_emit(now_ms, 21.5, 45.0) {
                        sdk.send_event(&device_id, "currentTemperature", value);
                    }
                }
            }
        }

        now_ms += 100;
        thread::sleep(Duration::from_millis(100));
    }
}
