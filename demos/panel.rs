//! Example: a control panel on the simulated backend.
//!
//! This example demonstrates how to:
//! - Build button, encoder and current sensor registries from TOML
//! - Drive them from a periodic sampling loop
//! - Read debounced events, encoder position/speed and smoothed current
//!
//! Run with: `cargo run --example panel`

use device_hal::backend::sim::{SimAdc, SimClock, SimLines};
use device_hal::{
    parse_config, ButtonRegistry, Channel, CurrentSensors, EncoderRegistry, Line, Result, Volts,
};

const PANEL: &str = r#"
[timing]
debounce_ms = 20
speed_window_ms = 100

[[buttons]]
name = "start"
line = 17

[[buttons]]
name = "stop"
line = 27

[[encoders]]
name = "jog"
line_a = 5
line_b = 6

[[current_sensors]]
name = "spindle"
channel = 0
"#;

/// Quarter turn of a 96-count knob, one phase every 2 ms.
const QUARTER_TURN: usize = 24;

fn main() -> Result<()> {
    println!("=== Control Panel Example ===\n");

    let config = parse_config(PANEL)?;

    let lines = SimLines::new(32);
    let adc = SimAdc::new(2);
    let clock = SimClock::new();

    let mut buttons: ButtonRegistry<_, _, 4> = ButtonRegistry::new(lines.clone(), clock.clone());
    let mut encoders: EncoderRegistry<_, _, 2> =
        EncoderRegistry::new(lines.clone(), clock.clone());
    let mut sensors: CurrentSensors<_, 2> = CurrentSensors::new(adc.clone());

    println!("Buttons:  {}", buttons.init_from_config(&config)?);
    println!("Encoders: {}", encoders.init_from_config(&config)?);
    println!("Sensors:  {}", sensors.init_from_config(&config)?);
    println!();

    // Spindle draws 2.5 A
    adc.set(Channel(0), Volts(0.322 + 0.264 * 2.5));

    let start = config.button_id("start").unwrap_or(0);
    let jog = config.encoder_id("jog").unwrap_or(0);
    let (line_a, line_b) = (Line(5), Line(6));
    let cycle = [0b00, 0b01, 0b11, 0b10];

    println!("Simulating a bouncy press of 'start' and a quarter turn of 'jog'");
    println!("{}", "-".repeat(60));

    for ms in 0..200u32 {
        // Contact chatter for the first 8 ms of the press
        let level = match ms {
            10..=17 => ms % 2 == 0,
            18..=120 => false,
            _ => true,
        };
        lines.set(Line(17), level);

        if ms % 2 == 0 && (ms as usize / 2) <= QUARTER_TURN {
            lines.set_phase(line_a, line_b, cycle[(ms as usize / 2) % 4]);
        }

        clock.advance_ms(1);
        buttons.sample_tick()?;
        encoders.sample_tick()?;
        if ms % 20 == 0 {
            sensors.sample_tick()?;
        }

        while let Some(event) = buttons.next_event() {
            let name = buttons.name(event.id)?;
            match event.pressed_duration {
                Some(held) => println!(
                    "  t={:>4} ms  {} {} (held {} ms)",
                    event.at.value() / 1_000,
                    name,
                    event.state,
                    held.value() / 1_000
                ),
                None => println!(
                    "  t={:>4} ms  {} {}",
                    event.at.value() / 1_000,
                    name,
                    event.state
                ),
            }
        }

        if ms == 30 {
            let reading = encoders.reading(jog)?;
            println!(
                "  t={:>4} ms  jog position {} speed {} counts/s",
                ms + 1,
                reading.position,
                reading.speed
            );
        }
    }

    println!("{}", "-".repeat(60));
    let reading = encoders.reading(jog)?;
    println!("Final jog position: {}", reading.position);
    println!("Jog glitches:       {}", encoders.errors(jog)?);
    println!("'start' pressed since last check: {}", buttons.take_press(start)?);
    println!("Spindle (instant):  {:.2} A", sensors.read(0)?.value());
    println!("Spindle (smoothed): {:.2} A", sensors.smoothed(0)?.value());

    Ok(())
}
