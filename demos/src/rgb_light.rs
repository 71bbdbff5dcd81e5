//! An RGB light: power, brightness, and color. Also emits a periodic
//! power-usage event to demonstrate [`sinric_core::Sdk::send_event`]
//! alongside inbound request handling.

use sinric_core::capability::power_sensor::PowerReading;
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
    sinric_core::init_tracing("rgb_light");

    let config = Config {
        app_key: env_or_exit("SINRIC_APP_KEY"),
        app_secret: env_or_exit("SINRIC_APP_SECRET"),
        ..Config::default()
    };
    let device_id = env_or_exit("SINRIC_DEVICE_ID");

    let mut device = DeviceBuilder::new(device_id.as_str(), DeviceKind::Light)
        .expect("device id must be 24 hex characters")
        .with_power_state()
        .with_brightness()
        .with_color()
        .with_power_sensor()
        .build();
    device.power_state.as_mut().unwrap().on_set(|on| CallbackOutcome::ok(on));
    device.color.as_mut().unwrap().on_set(|rgb| {
        println!("color -> #{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b);
        CallbackOutcome::ok(rgb)
    });

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
                if let Some(sensor) = device.power_sensor.as_mut() {
                    let reading = PowerReading {
                        voltage: 120.0,
                        current: 0.5,
                        ..PowerReading::default()
                    };
                    if let Some(value) = sensor.try_emit(now_ms, epoch_now(), reading) {
                        sdk.send_event(&device_id, "powerUsage", value);
                    }
                }
            }
        }
        now_ms += 100;
        thread::sleep(Duration::from_millis(100));
    }
}

fn epoch_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
