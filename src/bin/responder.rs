//! Encrypted ESP-NOW responder
//!
//! Answers pings with a broadcast pong, registers the pinger as an encrypted peer
//! and then reports telemetry to it.

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
    AdvanceNetwork, Command, Encryption, Key, MacAddress, NowMessage, RadioConfig, RadioDriver,
    Transmittable,
};

const CHANNEL: u8 = 1;
static PRIMARY_KEY: &[u8; 16] = include_bytes!("../../keys/primary_key.dat");
static LINK_KEY: &[u8; 16] = include_bytes!("../../keys/link_key.dat");

fn on_receive(info: &ReceiveInfo, data: &[u8]) {
    log::debug!("{} bytes from {}", data.len(), info.src_address);
}

fn on_send(address: &MacAddress, status: SendStatus) {
    log::debug!("Send to {} status: {:?}", address, status);
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

    let link_key = Key::new(*LINK_KEY);
    let config = RadioConfig::new(CHANNEL, Encryption::Enabled).unwrap();
    let mut network = AdvanceNetwork::new(EspNowDriver::new(esp_now), config);
    if let Err(failures) =
        network
            .network_mut()
            .begin_encrypted(on_receive, on_send, &Key::new(*PRIMARY_KEY))
    {
        println!("begin failed ({:#04x}): {}", failures.bits(), failures);
    }

    let started = time::now();
    let mut next_update = started;
    let mut counter: u16 = 0;
    loop {
        while let Some(frame) = network.network_mut().poll() {
            let sender = frame.info.src_address;
            if !Command::from_frame(frame.data()).is_some_and(|command| command.is_ping()) {
                continue;
            }
            if let Err(failures) = network.broadcast_command(&Command::pong()) {
                println!("Pong failed ({:#04x}): {}", failures.bits(), failures);
            }
            if network.network().driver().peer_exists(&sender) {
                continue;
            }
            match network.ping_return_handle(&sender, frame.data(), &link_key) {
                Ok(_) => println!("Paired with {}", sender),
                Err(err) => println!("Could not pair with {}: {}", sender, err),
            }
        }

        let now = time::now();
        if now < next_update {
            continue;
        }
        next_update = now + Duration::secs(1);
        let Some(pinger) = network.network().last_peer() else {
            continue;
        };
        let message = NowMessage::Telemetry {
            uptime_secs: (now - started).to_secs() as u32,
            counter,
        };
        counter = counter.wrapping_add(1);
        if let Err(err) = network.network_mut().send_message(&pinger, &message) {
            println!("Send failed: {}", err);
        }
    }
}
