//! Fuzz testing for signal name parsing.
//!
//! Signal lists come straight from the `INTERRUPT_SIGNALS` environment
//! variable, so parsing must never panic and anything it accepts must print
//! back to a list that parses to the same set.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_signal_names -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use interrupt_notifier::{InterruptSignal, SignalSet};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(signal) = s.parse::<InterruptSignal>() {
            assert_eq!(signal.to_string().parse::<InterruptSignal>().ok(), Some(signal));
        }

        if let Ok(set) = s.parse::<SignalSet>() {
            let reparsed = set.to_string().parse::<SignalSet>().ok();
            assert_eq!(reparsed, Some(set));
        }
    }
});
