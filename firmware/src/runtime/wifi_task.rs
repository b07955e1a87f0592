//! CYW43 bring-up and network stack tasks.
//!
//! The radio firmware blobs are flashed separately so application
//! reflashes stay fast:
//!
//! ```text
//! probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
//! probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
//! ```

use cyw43::JoinOptions;
use cyw43_pio::PioSpi;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, DhcpConfig, Stack, StackResources};
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_time::{Duration, Instant, Timer};
use static_cell::StaticCell;

const WIFI_SSID: &str = match option_env!("POWER_ALARM_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "power-alarm",
};
const WIFI_PASSWORD: &str = match option_env!("POWER_ALARM_WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};

const CYW43_FIRMWARE_ADDR: usize = 0x1010_0000;
const CYW43_FIRMWARE_LEN: usize = 230_321;
const CYW43_CLM_ADDR: usize = 0x1014_0000;
const CYW43_CLM_LEN: usize = 4_752;

const JOIN_RETRY_DELAY: Duration = Duration::from_secs(5);
const SOCKET_COUNT: usize = 3;

type WifiSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, WifiSpi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Keeps the station associated, rejoining whenever the link drops.
#[embassy_executor::task]
async fn join_task(mut control: cyw43::Control<'static>, stack: Stack<'static>) -> ! {
    loop {
        defmt::info!("wifi: joining {=str}", WIFI_SSID);
        if let Err(error) = control
            .join(WIFI_SSID, JoinOptions::new(WIFI_PASSWORD.as_bytes()))
            .await
        {
            defmt::warn!("wifi: join failed (status {=u32})", error.status);
            Timer::after(JOIN_RETRY_DELAY).await;
            continue;
        }

        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            defmt::info!("wifi: serving on http://{}/", config.address.address());
        }

        stack.wait_link_down().await;
        defmt::warn!("wifi: link lost");
    }
}

/// Brings up the radio and DHCP stack; returns once the tasks are running.
pub async fn start(spawner: Spawner, pwr: Output<'static>, spi: WifiSpi) -> Stack<'static> {
    // SAFETY: both regions are programmed with the CYW43 blobs before the
    // application is flashed and are never written at runtime.
    let (firmware, clm) = unsafe {
        (
            core::slice::from_raw_parts(CYW43_FIRMWARE_ADDR as *const u8, CYW43_FIRMWARE_LEN),
            core::slice::from_raw_parts(CYW43_CLM_ADDR as *const u8, CYW43_CLM_LEN),
        )
    };

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, firmware).await;
    spawner
        .spawn(cyw43_task(runner))
        .expect("failed to spawn cyw43 task");

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    // Only used to randomise local ports.
    let seed = Instant::now().as_ticks() ^ 0x9E37_79B9_7F4A_7C15;

    static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        NetConfig::dhcpv4(DhcpConfig::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner
        .spawn(net_task(runner))
        .expect("failed to spawn network task");
    spawner
        .spawn(join_task(control, stack))
        .expect("failed to spawn Wi-Fi join task");

    stack
}
