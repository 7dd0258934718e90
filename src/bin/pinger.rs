//! Encrypted ESP-NOW pinger
//!
//! Broadcasts a ping every two seconds and registers every node that answers as
//! an encrypted peer. Telemetry from paired nodes is printed.

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
    AdvanceNetwork, Encryption, Key, MacAddress, NowMessage, PingReturnError, RadioConfig,
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

    let mut next_ping = time::now();
    loop {
        let now = time::now();
        if now >= next_ping {
            next_ping = now + Duration::secs(2);
            if let Err(failures) = network.broadcast_ping_receiver(0) {
                println!("Ping failed ({:#04x}): {}", failures.bits(), failures);
            }
        }

        while let Some(frame) = network.network_mut().poll() {
            let sender = frame.info.src_address;
            match network.ping_return_handle(&sender, frame.data(), &link_key) {
                Ok(command) => println!("Paired with {} ({})", sender, command.cmd),
                Err(PingReturnError::Register(failures)) => {
                    log::debug!("{} not registered: {}", sender, failures);
                }
                Err(PingReturnError::NotACommand) => {
                    match bincode::decode_from_slice::<NowMessage, _>(
                        frame.data(),
                        bincode::config::standard(),
                    ) {
                        Ok((message, _len)) => println!("{}: {:?}", sender, message),
                        Err(_err) => {}
                    }
                }
            }
        }
    }
}
