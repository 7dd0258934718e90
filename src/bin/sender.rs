//! Plain ESP-NOW sender
//!
//! Registers a fixed receiver and sends it a telemetry message every second.

//% FEATURES: esp-wifi esp-wifi/wifi-default esp-wifi/wifi esp-wifi/utils esp-wifi/esp-now
//% CHIPS: esp32 esp32s2 esp32s3 esp32c2 esp32c3 esp32c6

#![no_std]
#![no_main]

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{
    prelude::*,
    rng::Rng,
    time::{self, Duration},
    timer::timg::TimerGroup,
};
use esp_println::println;
use esp_wifi::{esp_now::EspNow, init, EspWifiInitFor};
use now_network::{
    driver::{ReceiveInfo, SendStatus},
    esp::EspNowDriver,
    Encryption, MacAddress, NowMessage, RadioConfig, SimpleNetwork,
};

const CHANNEL: u8 = 6;
const RECEIVER: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0x0A, 0x1B, 0x9C]);

fn on_receive(info: &ReceiveInfo, data: &[u8]) {
    println!("Received {} bytes from {}", data.len(), info.src_address);
}

fn on_send(address: &MacAddress, status: SendStatus) {
    println!("Send to {} status: {:?}", address, status);
}

#[entry]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init({
        let mut config = esp_hal::Config::default();
        config.cpu_clock = CpuClock::max();
        config
    });

    esp_alloc::heap_allocator!(72 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);

    let init = init(
        EspWifiInitFor::Wifi,
        timg0.timer0,
        Rng::new(peripherals.RNG),
        peripherals.RADIO_CLK,
    )
    .unwrap();

    let wifi = peripherals.WIFI;
    let esp_now = EspNow::new(&init, wifi).unwrap();

    let config = RadioConfig::new(CHANNEL, Encryption::Disabled).unwrap();
    let mut network = SimpleNetwork::new(EspNowDriver::new(esp_now), config);
    if let Err(failures) = network.begin(on_receive, on_send) {
        println!("begin failed ({:#04x}): {}", failures.bits(), failures);
    }
    if let Err(failures) = network.register_peer(&RECEIVER, true) {
        println!("register_peer failed ({:#04x}): {}", failures.bits(), failures);
    }
    println!("Sending to {:?}", network.receiver());

    let started = time::now();
    let mut next_update = started;
    let mut counter: u16 = 0;
    loop {
        let now = time::now();
        if now >= next_update {
            next_update = now + Duration::secs(1);
            let message = NowMessage::Telemetry {
                uptime_secs: (now - started).to_secs() as u32,
                counter,
            };
            counter = counter.wrapping_add(1);
            if let Err(err) = network.send_message(&RECEIVER, &message) {
                println!("Send failed: {}", err);
            }
        }

        // Callbacks already reported these
        while network.poll().is_some() {}
    }
}
