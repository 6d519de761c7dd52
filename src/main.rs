//! Passive NET-bus monitor for a Raspberry Pi Pico wired to the heat
//! pump's NET port. Logs every decoded frame over RTT; never transmits.
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_main)]

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod firmware {
    use defmt::{info, Debug2Format};
    use defmt_rtt as _;
    use embassy_executor::Spawner;
    use embassy_time::Timer;
    use hayward_netbus::{BusStatics, NetBus, Never, Result};
    use panic_probe as _;

    #[embassy_executor::main]
    async fn main(spawner: Spawner) -> ! {
        // If it returns, something went wrong.
        let err = inner_main(spawner).await.unwrap_err();
        panic!("{err}");
    }

    async fn inner_main(spawner: Spawner) -> Result<Never> {
        let peripherals = embassy_rp::init(embassy_rp::config::Config::default());
        static BUS_STATICS: BusStatics = NetBus::new_static();
        let bus = NetBus::new(peripherals.PIN_14, &BUS_STATICS, spawner)?;
        info!("Monitoring the NET port in passive mode");

        loop {
            Timer::after_secs(30).await;
            let state = bus.poll();
            info!(
                "status={=str} inlet={} outlet={} target={} mode={}",
                bus.status().as_str(),
                Debug2Format(&state.t02_temperature_inlet),
                Debug2Format(&state.t03_temperature_outlet),
                Debug2Format(&state.target_temperature),
                Debug2Format(&state.mode),
            );
        }
    }
}

// The firmware only makes sense on the RP2040; give host builds an empty
// binary so `cargo test --features host` still links.
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn main() {}
