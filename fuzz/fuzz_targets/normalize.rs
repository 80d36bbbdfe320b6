// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;
use ssp_core::{parse_str, ParseConfig};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    // Root errors are fine; anything below the root must never panic
    if let Ok(document) = parse_str(&input, &ParseConfig::default()) {
        let _ = document.word_count();
    }
});
