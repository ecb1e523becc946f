//! Property-based tests for the debounce and quadrature state machines.
//! Verifies invariants hold for ALL generated signal histories.

use device_hal::backend::sim::{SimClock, SimLines};
use device_hal::{
    ButtonState, Debouncer, EncoderConfig, EncoderRegistry, Line, Micros, QuadratureDecoder,
};
use proptest::prelude::*;

const WINDOW_MS: u64 = 20;

/// Clockwise phase order.
const CYCLE: [u8; 4] = [0b00, 0b01, 0b11, 0b10];

/// Feed a run of `len` one-millisecond samples at `level`, collecting commits.
fn run(d: &mut Debouncer, t: &mut u64, level: bool, len: u64, out: &mut Vec<ButtonState>) {
    for _ in 0..len {
        *t += 1;
        if let Some(state) = d.sample(level, Micros(*t * 1_000)) {
            out.push(state);
        }
    }
}

fn bits(phase: u8) -> (bool, bool) {
    (phase & 0b10 != 0, phase & 0b01 != 0)
}

proptest! {
    /// Raw levels that never hold for a full window never commit.
    #[test]
    fn bounces_shorter_than_window_are_rejected(
        runs in proptest::collection::vec(1u64..WINDOW_MS, 1..50),
    ) {
        let mut d = Debouncer::new(Micros(WINDOW_MS * 1_000));
        let mut t = 0;
        let mut events = Vec::new();

        for (i, len) in runs.iter().enumerate() {
            run(&mut d, &mut t, i % 2 == 0, *len, &mut events);
        }

        prop_assert!(events.is_empty());
        prop_assert!(!d.is_pressed());
    }

    /// Every stable transition yields exactly one event, whatever the bounce
    /// preceding it.
    #[test]
    fn one_event_per_stable_transition(
        segments in proptest::collection::vec(
            (proptest::collection::vec(1u64..WINDOW_MS, 0..8), 0u64..40),
            1..10,
        ),
    ) {
        let mut d = Debouncer::new(Micros(WINDOW_MS * 1_000));
        let mut t = 0;
        let mut events = Vec::new();

        for (i, (bounces, extra)) in segments.iter().enumerate() {
            let target = i % 2 == 0;
            for (j, len) in bounces.iter().enumerate() {
                run(&mut d, &mut t, if j % 2 == 0 { target } else { !target }, *len, &mut events);
            }
            run(&mut d, &mut t, target, WINDOW_MS + 1 + extra, &mut events);
        }

        prop_assert_eq!(events.len(), segments.len());
        for (i, state) in events.iter().enumerate() {
            prop_assert_eq!(*state, ButtonState::from(i % 2 == 0));
        }
    }

    /// Adjacent phase moves decode to exactly the direction taken.
    #[test]
    fn decoder_follows_direction(
        start in 0usize..4,
        moves in proptest::collection::vec(any::<bool>(), 0..200),
    ) {
        let mut decoder = QuadratureDecoder::new();
        let mut idx = start;
        let (a, b) = bits(CYCLE[idx]);
        prop_assert_eq!(decoder.decode(a, b), 0);

        for clockwise in moves {
            idx = if clockwise { (idx + 1) % 4 } else { (idx + 3) % 4 };
            let (a, b) = bits(CYCLE[idx]);
            prop_assert_eq!(decoder.decode(a, b), if clockwise { 1 } else { -1 });
        }

        prop_assert_eq!(decoder.glitches(), 0);
    }

    /// Arbitrary phase sequences never move more than one count per sample,
    /// and every double flip is counted as a glitch.
    #[test]
    fn decoder_counts_glitches(phases in proptest::collection::vec(0u8..4, 1..200)) {
        let mut decoder = QuadratureDecoder::new();
        let mut expected_glitches = 0;

        for (i, &phase) in phases.iter().enumerate() {
            let (a, b) = bits(phase);
            let step = decoder.decode(a, b);
            prop_assert!((-1..=1).contains(&step));

            if i > 0 && (phases[i - 1] ^ phase) == 0b11 {
                expected_glitches += 1;
                prop_assert_eq!(step, 0);
            }
        }

        prop_assert_eq!(decoder.glitches(), expected_glitches);
    }

    /// Walking a path and then retracing it returns to the starting position.
    #[test]
    fn closed_loop_returns_to_start(
        moves in proptest::collection::vec(any::<bool>(), 0..100),
        range in proptest::option::of(1u32..50),
    ) {
        let lines = SimLines::new(4);
        let clock = SimClock::new();
        let mut config = EncoderConfig::new("knob", Line(0), Line(1));
        if let Some(range) = range {
            config = config.range(range);
        }

        let mut encoders: EncoderRegistry<_, _, 1> =
            EncoderRegistry::new(lines.clone(), clock.clone());
        encoders.init(&[config]).unwrap();

        let mut idx = 0usize;
        lines.set_phase(Line(0), Line(1), CYCLE[idx]);
        let start = encoders.get(0).unwrap().position;

        let path = moves.iter().copied().chain(moves.iter().rev().map(|cw| !cw));
        for clockwise in path {
            idx = if clockwise { (idx + 1) % 4 } else { (idx + 3) % 4 };
            clock.advance_ms(1);
            lines.set_phase(Line(0), Line(1), CYCLE[idx]);
            encoders.get(0).unwrap();
        }

        prop_assert_eq!(encoders.reading(0).unwrap().position, start);
        prop_assert_eq!(encoders.errors(0).unwrap(), 0);
    }
}
