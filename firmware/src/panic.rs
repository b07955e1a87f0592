use core::panic::PanicInfo;

use defmt::error;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("power-alarm: panic: {}", defmt::Display2Format(info));
    cortex_m::asm::udf();
}
