use alarm_core::{AlarmConfig, AlarmController};
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::pwm::Pwm;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::clock::FirmwareInstant;
use crate::commands::{CommandAck, CommandQueue};
use crate::hw::power::UsbRailAdc;
use crate::hw::{Buzzer, PicoButtons, PicoOutputs, PwmOutput, buzzer_config};

mod control_task;
mod http_task;
mod wifi_task;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

/// Controller type driven by the control task.
pub(super) type Controller = AlarmController<PicoOutputs<'static>, FirmwareInstant>;

pub(super) static COMMAND_QUEUE: CommandQueue = Channel::new();
pub(super) static COMMAND_ACK: CommandAck = Signal::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    defmt::info!("power-alarm: boot");

    let outputs = PicoOutputs::new(
        Output::new(p.PIN_12, Level::Low),
        Buzzer::new(
            Pwm::new_output_b(p.PWM_SLICE2, p.PIN_21, buzzer_config()),
            PwmOutput::B,
        ),
        Buzzer::new(
            Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, buzzer_config()),
            PwmOutput::A,
        ),
    );
    let buttons = PicoButtons::new(Input::new(p.PIN_5, Pull::Up), Input::new(p.PIN_6, Pull::Up));
    let rail = UsbRailAdc::new(
        Adc::new_blocking(p.ADC, AdcConfig::default()),
        AdcChannel::new_pin(p.PIN_28, Pull::None),
    );

    let controller =
        AlarmController::new(outputs, AlarmConfig::default()).expect("default alarm config");

    spawner
        .spawn(control_task::run(
            controller,
            rail,
            buttons,
            COMMAND_QUEUE.receiver(),
            &COMMAND_ACK,
        ))
        .expect("failed to spawn control task");

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let stack = wifi_task::start(spawner, pwr, spi).await;

    spawner
        .spawn(http_task::run(stack, COMMAND_QUEUE.sender(), &COMMAND_ACK))
        .expect("failed to spawn HTTP task");

    core::future::pending::<()>().await;
}
