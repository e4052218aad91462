#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_futures::join::join3;
use embassy_time::Timer;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::{ClientConfig, ModeConfig};
use log::{error, info, warn};
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

use spl_core::config::{AppConfig, TelemetryConfig};
use spl_core::driver::Driver;
use spl_core::framebuffer::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use spl_core::meter::DbMeter;
use spl_core::presenter::{NullDisplay, Presenter};
use spl_core::registers::BUS_RATE_KHZ;
use spl_core::sampler::Sampler;
use spl_core::uploader::{Transport, Uploader};
use spl_firmware::net::{ConnectivityHandle, TcpTransport, supervise};
use spl_firmware::secrets;

/// Halt with an error log when the panel does not come up, instead of
/// carrying on headless. Flip for unattended installs where telemetry
/// matters more than the local screen.
const HALT_ON_DISPLAY_INIT_FAILURE: bool = true;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static CONNECTIVITY: ConnectivityHandle = ConnectivityHandle::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // The framebuffer alone is 150 KiB, so it goes to PSRAM.
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("embassy initialized");

    if secrets::WIFI_SSID.is_empty() {
        warn!("no WiFi credentials baked in; set SPL_WIFI_SSID and SPL_WIFI_PASSWORD in .env");
    }

    let radio_init = esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller");
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let client_config = ClientConfig::default()
        .with_ssid(secrets::WIFI_SSID.into())
        .with_password(secrets::WIFI_PASSWORD.into());
    wifi_controller
        .set_config(&ModeConfig::Client(client_config))
        .expect("Failed to apply Wi-Fi client config");

    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        0x0DB0_5157_2EA7_641C,
    );

    // The meter is the only device on I2C0 and its firmware cannot keep
    // up with standard-mode clocks, so the whole bus runs at 10 kHz.
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(BUS_RATE_KHZ)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO12)
    .with_scl(peripherals.GPIO11)
    .into_async();

    // Configure and initialize the display

    // 1. Configure SPI bus
    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .unwrap()
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);

    // 2. Create a dummy CS pin (we don't use hardware CS for this display)
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());

    // 3. Wrap the SPI bus as a SPI device (required by embedded-hal traits)
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).unwrap();

    // 4. Set up DC (Data/Command) pin
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());

    // 5. Create a buffer for SPI batching (larger = faster, uses more RAM)
    let mut spi_buffer = [0u8; 64];

    // 6. Create display interface
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    // 7. Build and initialize the display driver
    let display_result = MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        .init(&mut embassy_time::Delay);

    let app_config = AppConfig {
        telemetry: TelemetryConfig {
            host: secrets::TELEMETRY_HOST,
            port: secrets::TELEMETRY_PORT,
            api_key: secrets::API_KEY,
        },
        ..Default::default()
    };

    let meter = DbMeter::new(i2c, embassy_time::Delay, app_config.sampling.settle_ms);
    let uploader = Uploader::new(
        TcpTransport::new(stack),
        &CONNECTIVITY,
        app_config.telemetry,
    );
    let mut driver = Driver::new(
        Sampler::new(meter),
        uploader,
        Presenter::new(),
        embassy_time::Delay,
        app_config.sampling,
        app_config.connect,
    );

    let net = net_runner.run();
    let wifi = supervise(&mut wifi_controller, stack, &CONNECTIVITY);

    match display_result {
        Ok(mut display) => {
            info!("display initialized");
            let _ = join3(net, wifi, run_app(&mut driver, &mut display)).await;
        }
        Err(e) if HALT_ON_DISPLAY_INIT_FAILURE => {
            error!("display init failed: {:?}", e);
            halt().await
        }
        Err(e) => {
            warn!("display init failed, running headless: {:?}", e);
            let _ = join3(net, wifi, run_app(&mut driver, &mut NullDisplay)).await;
        }
    }
    unreachable!()
}

async fn run_app<I2C, T, D>(
    driver: &mut Driver<'_, I2C, embassy_time::Delay, T, &'static ConnectivityHandle>,
    display: &mut D,
) -> !
where
    I2C: embedded_hal_async::i2c::I2c,
    T: Transport,
    D: DrawTarget<Color = Rgb565>,
    D::Error: core::fmt::Debug,
{
    match driver.run(display).await {
        Ok(never) => match never {},
        Err(err) => {
            error!("startup failed: {}", err);
            halt().await
        }
    }
}

/// Park the firmware after an unrecoverable fault, keeping RTT alive so
/// the error stays readable on an attached probe.
async fn halt() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}
